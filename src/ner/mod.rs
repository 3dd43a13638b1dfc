//! Skill mention handling: text analysis, normalization, and candidate
//! extraction.

mod normalizer;
mod skills;

pub use normalizer::{
    normalize_skill, resolve_skill, MatchTier, Resolution, SkillNormalizer, DEFAULT_CUTOFF,
};
pub use skills::{CandidateSource, NormalizedSkillSet, SkillExtractor};

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// A named-entity span found in free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// Tokenizer / named-entity recognizer used for free-text input.
///
/// A statistical NER model can be plugged in here; the extractor only ever
/// reads the entity text.
pub trait TextAnalyzer: Send + Sync {
    fn tokenize(&self, text: &str) -> HashSet<String>;

    fn entities(&self, text: &str) -> Vec<Entity>;
}

/// Pattern-based analyzer.
///
/// Tokens are lower-cased word runs; entities are runs of capitalized words,
/// which is where skill names tend to show up in resumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAnalyzer;

const PROPER_NOUN: &str = "PROPN";

impl TextAnalyzer for RuleBasedAnalyzer {
    fn tokenize(&self, text: &str) -> HashSet<String> {
        static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9#+.-]+").unwrap());

        let lower = text.to_lowercase();
        WORD_RE
            .find_iter(&lower)
            .map(|m| m.as_str().trim_end_matches(|c: char| c == '.' || c == '-'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn entities(&self, text: &str) -> Vec<Entity> {
        static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"[A-Z][A-Za-z0-9#+.-]*(?:[ \t]+[A-Z][A-Za-z0-9#+.-]*)*").unwrap()
        });

        ENTITY_RE
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(|c: char| c == '.' || c == '-'))
            .filter(|span| !span.is_empty())
            .map(|span| Entity {
                text: span.to_string(),
                label: PROPER_NOUN.to_string(),
            })
            .collect()
    }
}
