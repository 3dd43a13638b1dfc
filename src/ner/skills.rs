use regex::{RegexSet, RegexSetBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::{SkillNormalizer, TextAnalyzer};
use crate::error::{EngineError, Result};

const PATTERN_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Where the user's skills come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// Free text such as an extracted resume
    Text(String),
    /// Comma-separated list typed by the user
    Manual(String),
}

/// Deduplicated, lexicographically sorted skill names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedSkillSet {
    skills: Vec<String>,
}

impl NormalizedSkillSet {
    pub fn as_slice(&self) -> &[String] {
        &self.skills
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.skills.binary_search_by(|s| s.as_str().cmp(skill)).is_ok()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.skills
    }
}

impl<S: Into<String>> FromIterator<S> for NormalizedSkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let unique: BTreeSet<String> = iter
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            skills: unique.into_iter().collect(),
        }
    }
}

/// Turns resume text or a manual skill list into normalized skills.
pub struct SkillExtractor {
    normalizer: SkillNormalizer,
    analyzer: Arc<dyn TextAnalyzer>,
    patterns: RegexSet,
}

impl SkillExtractor {
    pub fn new(normalizer: SkillNormalizer, analyzer: Arc<dyn TextAnalyzer>) -> Result<Self> {
        let patterns = normalizer
            .vocabulary()
            .entries()
            .iter()
            .map(|entry| format!(r"(?:^|\W){}(?:\W|$)", regex::escape(entry)));

        let patterns = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| {
                EngineError::VocabularyUnavailable(format!("cannot compile skill patterns: {}", e))
            })?;

        Ok(Self {
            normalizer,
            analyzer,
            patterns,
        })
    }

    pub fn normalizer(&self) -> &SkillNormalizer {
        &self.normalizer
    }

    pub fn extract(&self, source: &CandidateSource) -> NormalizedSkillSet {
        match source {
            CandidateSource::Text(text) => self.extract_from_text(text),
            CandidateSource::Manual(input) => self.extract_manual(input),
        }
    }

    /// Union of vocabulary pattern hits and recognized entities that name a
    /// vocabulary entry verbatim, each normalized once.
    pub fn extract_from_text(&self, text: &str) -> NormalizedSkillSet {
        let vocabulary = self.normalizer.vocabulary();
        let mut candidates: BTreeSet<String> = self
            .patterns
            .matches(text)
            .into_iter()
            .map(|i| vocabulary.entries()[i].clone())
            .collect();
        let pattern_hits = candidates.len();

        candidates.extend(
            self.analyzer
                .entities(text)
                .into_iter()
                .filter(|entity| vocabulary.contains(&entity.text))
                .map(|entity| entity.text),
        );

        let skills: NormalizedSkillSet = candidates
            .iter()
            .map(|candidate| self.normalizer.normalize(candidate))
            .collect();

        debug!(
            "Extracted {} skills ({} pattern hits, {} from entities)",
            skills.len(),
            pattern_hits,
            candidates.len() - pattern_hits
        );

        skills
    }

    /// Split on commas, drop blank segments, normalize the rest.
    pub fn extract_manual(&self, input: &str) -> NormalizedSkillSet {
        let skills: NormalizedSkillSet = input
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| self.normalizer.normalize(segment))
            .collect();

        debug!("Parsed {} skills from manual input", skills.len());
        skills
    }
}
