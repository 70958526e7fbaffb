use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::corpus::GrantCorpus;

/// One project in a researcher's history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub title: String,
    pub theme: String,
    pub year: Option<i32>,
    /// 100 / N for a record with N researchers, same for every co-author
    pub contribution_share: f64,
}

/// Aggregated history of one researcher
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherProfile {
    pub projects: Vec<ProjectEntry>,
    pub theme_counts: IndexMap<String, usize>,
    pub titles: Vec<String>,
}

impl ResearcherProfile {
    fn push(&mut self, entry: ProjectEntry) {
        *self.theme_counts.entry(entry.theme.clone()).or_insert(0) += 1;
        self.titles.push(entry.title.clone());
        self.projects.push(entry);
    }

    /// Projects whose theme equals `theme`
    pub fn theme_matches(&self, theme: &str) -> usize {
        self.theme_counts.get(theme).copied().unwrap_or(0)
    }

    /// Mean contribution share over projects in `theme`, `None` without any
    pub fn average_share_in(&self, theme: &str) -> Option<f64> {
        let (sum, n) = self
            .projects
            .iter()
            .filter(|p| p.theme == theme)
            .fold((0.0, 0usize), |(sum, n), p| (sum + p.contribution_share, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Projects with a known year at or after `since`
    pub fn projects_since(&self, since: i32) -> usize {
        self.projects
            .iter()
            .filter(|p| p.year.is_some_and(|y| y >= since))
            .count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Researcher name -> profile, in first-seen order over the corpus.
#[derive(Debug, Clone, Default)]
pub struct ResearcherProfileIndex {
    profiles: IndexMap<String, ResearcherProfile>,
}

impl ResearcherProfileIndex {
    /// Full rebuild from the corpus
    pub fn build(corpus: &GrantCorpus) -> Self {
        let mut profiles: IndexMap<String, ResearcherProfile> = IndexMap::new();
        for record in corpus.records() {
            let share = 100.0 / record.researchers.len() as f64;
            for researcher in &record.researchers {
                profiles.entry(researcher.clone()).or_default().push(ProjectEntry {
                    title: record.title.clone(),
                    theme: record.theme.clone(),
                    year: record.year,
                    contribution_share: share,
                });
            }
        }
        debug!(researchers = profiles.len(), "researcher profiles built");
        Self { profiles }
    }

    pub fn get(&self, researcher: &str) -> Option<&ResearcherProfile> {
        self.profiles.get(researcher)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResearcherProfile)> {
        self.profiles.iter().map(|(name, p)| (name.as_str(), p))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
