/// Stable sort of a SoA pair (inds/vals) by `inds` ascending.
/// - Reorders vals accordingly
/// - Equal keys keep their original relative order
#[inline]
pub fn sort_by_index_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // Small sizes: insertion sort beats building a permutation.
    if n <= 32 {
        insertion_sort_u32_soa(inds, vals);
        return;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| inds[i]);

    let sorted_inds: Vec<u32> = order.iter().map(|&i| inds[i]).collect();
    let sorted_vals: Vec<N> = order.iter().map(|&i| vals[i]).collect();
    inds.copy_from_slice(&sorted_inds);
    vals.copy_from_slice(&sorted_vals);
}

/// Tiny insertion sort for small n (SoA).
#[inline(always)]
fn insertion_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    let n = inds.len();
    for i in 1..n {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}
