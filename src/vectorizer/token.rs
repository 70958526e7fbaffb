use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// TokenFrequency
/// Counts how often each token occurs inside one document.
/// Insertion order is kept so iteration is deterministic.
///
/// # Examples
/// ```
/// use grant_recommender::vectorizer::token::TokenFrequency;
/// let mut token_freq = TokenFrequency::new();
/// token_freq.add_token("quantum");
/// token_freq.add_token("error");
/// token_freq.add_token("quantum");
///
/// assert_eq!(token_freq.token_count("quantum"), 2);
/// assert_eq!(token_freq.token_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TokenFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    token_count: IndexMap<String, u32>,
    total_token_count: u64,
}

impl TokenFrequency {
    pub fn new() -> Self {
        TokenFrequency {
            token_count: IndexMap::new(),
            total_token_count: 0,
        }
    }

    /// Add a token
    ///
    /// # Arguments
    /// * `token` - token to add
    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        let count = self.token_count.entry(token.to_string()).or_insert(0);
        *count += 1;
        self.total_token_count += 1;
        self
    }

    /// Add multiple tokens
    ///
    /// # Arguments
    /// * `tokens` - Slice of tokens to add
    #[inline]
    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }

    /// Occurrence count of `token`, 0 when absent
    #[inline]
    pub fn token_count(&self, token: &str) -> u32 {
        self.token_count.get(token).copied().unwrap_or(0)
    }

    /// Total number of tokens added
    #[inline]
    pub fn token_sum(&self) -> u64 {
        self.total_token_count
    }

    /// Number of unique tokens
    #[inline]
    pub fn token_num(&self) -> usize {
        self.token_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.token_count.is_empty()
    }

    /// Iterator over `(token, count)` in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.token_count.iter().map(|(token, &count)| (token.as_str(), count))
    }

    /// Iterator over the unique tokens
    #[inline]
    pub fn token_set_iter(&self) -> impl Iterator<Item = &str> {
        self.token_count.keys().map(|s| s.as_str())
    }
}

impl<T> From<&[T]> for TokenFrequency
where
    T: AsRef<str>,
{
    fn from(tokens: &[T]) -> Self {
        let mut tf = TokenFrequency::new();
        tf.add_tokens(tokens);
        tf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_tokens() {
        let freq = TokenFrequency::from(&["grant", "quantum", "grant"][..]);
        assert_eq!(freq.token_count("grant"), 2);
        assert_eq!(freq.token_count("missing"), 0);
        assert_eq!(freq.token_num(), 2);
        assert_eq!(freq.token_sum(), 3);
    }

    #[test]
    fn iteration_keeps_first_seen_order() {
        let freq = TokenFrequency::from(&["b", "a", "b", "c"][..]);
        let order: Vec<&str> = freq.token_set_iter().collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }
}
