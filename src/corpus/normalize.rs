//! String clean-up applied once, at the corpus loading boundary.
//! Everything downstream receives already normalised strings.

const QUOTES: &[char] = &['"', '\''];

/// Trim whitespace and any wrapping quote characters.
pub fn strip_quotes(raw: &str) -> &str {
    raw.trim().trim_matches(QUOTES).trim()
}

/// Normalise one researcher name.
/// `"Last, First"` becomes `"First Last"`, inner whitespace is collapsed.
pub fn normalize_name(raw: &str) -> String {
    let name = strip_quotes(raw);
    let ordered = match name.split_once(',') {
        Some((last, first)) => format!("{} {}", strip_quotes(first), strip_quotes(last)),
        None => name.to_string(),
    };
    ordered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a researcher list field into normalised, de-duplicated names.
///
/// Lists are comma-joined `"First Last"` names. A list joined with `;`
/// is read as `"Last, First"` entries instead.
pub fn split_researchers(raw: &str) -> Vec<String> {
    let field = strip_quotes(raw);
    let entries: Vec<String> = if field.contains(';') {
        field.split(';').map(normalize_name).collect()
    } else {
        field
            .split(',')
            .map(|n| strip_quotes(n).split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    };

    let mut out: Vec<String> = Vec::with_capacity(entries.len());
    for name in entries {
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Parse a 4-digit year, anything else is absent.
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = strip_quotes(raw);
    // tolerate a float rendering such as "2021.0"
    let digits = raw.strip_suffix(".0").unwrap_or(raw);
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}
