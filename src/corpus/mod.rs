pub mod loader;
pub mod normalize;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

/// One historical grant.
/// Built only through [`GrantRecord::new`], so title, theme and researchers
/// are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub id: String,
    pub title: String,
    pub theme: String,
    pub year: Option<i32>,
    pub researchers: Vec<String>,
}

impl GrantRecord {
    /// Validate and build a record from already normalised fields.
    /// `line` is only used to locate the error.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        theme: impl Into<String>,
        year: Option<i32>,
        researchers: Vec<String>,
        line: u64,
    ) -> Result<Self> {
        let record = Self {
            id: id.into(),
            title: title.into(),
            theme: theme.into(),
            year,
            researchers,
        };
        let missing = if record.title.trim().is_empty() {
            Some("title")
        } else if record.theme.trim().is_empty() {
            Some("theme")
        } else if record.researchers.is_empty() {
            Some("researchers")
        } else {
            None
        };
        match missing {
            Some(field) => Err(RecommendError::MalformedRecord {
                line,
                reason: format!("missing {field}"),
            }),
            None => Ok(record),
        }
    }

    pub fn has_researcher(&self, name: &str) -> bool {
        self.researchers.iter().any(|r| r == name)
    }
}

/// Immutable in-memory table of grant records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantCorpus {
    records: Vec<GrantRecord>,
}

impl GrantCorpus {
    pub fn new(records: Vec<GrantRecord>) -> Self {
        Self { records }
    }

    #[inline]
    pub fn records(&self) -> &[GrantRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All titles in record order
    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.title.as_str()).collect()
    }

    /// A new corpus holding every record of `self` followed by `record`.
    pub fn with_appended(&self, record: GrantRecord) -> Self {
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.extend_from_slice(&self.records);
        records.push(record);
        Self { records }
    }

    /// `(theme, record count)`, most common first, ties by theme name.
    pub fn theme_distribution(&self) -> Vec<(String, usize)> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for record in &self.records {
            *counts.entry(record.theme.as_str()).or_insert(0) += 1;
        }
        let mut dist: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(theme, n)| (theme.to_string(), n))
            .collect();
        dist.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        dist
    }
}

impl FromIterator<GrantRecord> for GrantCorpus {
    fn from_iter<I: IntoIterator<Item = GrantRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
