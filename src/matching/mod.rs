//! Semantic matching of a user skill set against a role's required skills.

mod similarity;

pub use similarity::{cosine_similarity, round2, same_skill, BestMatch, EPSILON};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use crate::config::check_unit_interval;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use similarity::{best_similarity, EmbeddingTable};

/// Default similarity below which a role skill counts as missing
pub const DEFAULT_MISSING_THRESHOLD: f64 = 0.8;

/// Best user skill for one role skill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityDetail {
    /// Empty when the user has no skills
    pub matched_skill: String,
    /// Percentage in [0, 100], two decimals
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub match_score: f64,
    pub missing_skills: Vec<String>,
    pub similarity_details: BTreeMap<String, SimilarityDetail>,
}

/// Scores user skills against role skills by embedding similarity.
///
/// Every operation makes at most one call to the embedding provider.
#[derive(Clone)]
pub struct SemanticMatcher {
    provider: Arc<dyn EmbeddingProvider>,
    missing_threshold: f64,
}

impl SemanticMatcher {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, missing_threshold: f64) -> Result<Self> {
        check_unit_interval("missing threshold", missing_threshold)?;
        Ok(Self {
            provider,
            missing_threshold,
        })
    }

    pub fn missing_threshold(&self) -> f64 {
        self.missing_threshold
    }

    pub async fn best_similarity(&self, role_skill: &str, user: &[String]) -> Result<BestMatch> {
        let role = [role_skill.to_string()];
        let table = self.fetch_unmatched(user, &role).await?;
        best_similarity(role_skill, user, &table, true)
    }

    /// Role skills whose best similarity falls below `threshold`, sorted and
    /// deduplicated.
    pub async fn compute_missing(
        &self,
        user: &[String],
        role: &[String],
        threshold: f64,
    ) -> Result<Vec<String>> {
        check_unit_interval("missing threshold", threshold)?;
        let table = self.fetch_unmatched(user, role).await?;
        let missing = missing_skills(user, role, &table, threshold)?;

        debug!(
            "{} of {} role skills missing (threshold={})",
            missing.len(),
            role.len(),
            threshold
        );
        Ok(missing)
    }

    /// Mean best similarity over the role skills, as a percentage.
    pub async fn compute_match_score(&self, user: &[String], role: &[String]) -> Result<f64> {
        if user.is_empty() || role.is_empty() {
            return Ok(0.0);
        }

        let table = self.fetch_unmatched(user, role).await?;
        let score = match_score(user, role, &table)?;

        debug!("Match score {:.2} over {} role skills", score, role.len());
        Ok(score)
    }

    /// Best user skill and similarity percentage for every role skill.
    ///
    /// Exact name matches still go through the embeddings here.
    pub async fn compute_similarity_details(
        &self,
        user: &[String],
        role: &[String],
    ) -> Result<BTreeMap<String, SimilarityDetail>> {
        let table = self.fetch_all(user, role).await?;
        similarity_details(user, role, &table)
    }

    /// Score, missing skills, and details from a single embedding batch.
    pub async fn evaluate(&self, user: &[String], role: &[String]) -> Result<MatchResult> {
        let table = self.fetch_all(user, role).await?;

        let result = MatchResult {
            match_score: match_score(user, role, &table)?,
            missing_skills: missing_skills(user, role, &table, self.missing_threshold)?,
            similarity_details: similarity_details(user, role, &table)?,
        };

        debug!(
            "Evaluated {} user skills against {} role skills: score={:.2}, missing={}",
            user.len(),
            role.len(),
            result.match_score,
            result.missing_skills.len()
        );
        Ok(result)
    }

    /// Embeddings for every user and role skill. Nothing is fetched when
    /// either side is empty.
    async fn fetch_all(&self, user: &[String], role: &[String]) -> Result<EmbeddingTable> {
        if user.is_empty() || role.is_empty() {
            return Ok(EmbeddingTable::default());
        }
        EmbeddingTable::fetch(self.provider.as_ref(), user.iter().chain(role)).await
    }

    /// Embeddings needed when exact name matches short-circuit: skipped
    /// entirely if every role skill is matched by name.
    async fn fetch_unmatched(&self, user: &[String], role: &[String]) -> Result<EmbeddingTable> {
        if user.is_empty() {
            return Ok(EmbeddingTable::default());
        }

        let unmatched: Vec<&String> = role
            .iter()
            .filter(|r| !user.iter().any(|u| same_skill(u, r)))
            .collect();
        if unmatched.is_empty() {
            return Ok(EmbeddingTable::default());
        }

        EmbeddingTable::fetch(self.provider.as_ref(), user.iter().chain(unmatched)).await
    }
}

fn missing_skills(
    user: &[String],
    role: &[String],
    table: &EmbeddingTable,
    threshold: f64,
) -> Result<Vec<String>> {
    let mut missing = BTreeSet::new();
    for role_skill in role {
        if best_similarity(role_skill, user, table, true)?.score < threshold {
            missing.insert(role_skill.clone());
        }
    }
    Ok(missing.into_iter().collect())
}

fn match_score(user: &[String], role: &[String], table: &EmbeddingTable) -> Result<f64> {
    if user.is_empty() || role.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for role_skill in role {
        total += best_similarity(role_skill, user, table, true)?.score * 100.0;
    }
    Ok(round2(total / role.len() as f64))
}

fn similarity_details(
    user: &[String],
    role: &[String],
    table: &EmbeddingTable,
) -> Result<BTreeMap<String, SimilarityDetail>> {
    role.iter()
        .map(|role_skill| -> Result<(String, SimilarityDetail)> {
            let best = best_similarity(role_skill, user, table, false)?;
            Ok((
                role_skill.clone(),
                SimilarityDetail {
                    matched_skill: best.matched_skill.unwrap_or_default(),
                    score: round2(best.score * 100.0),
                },
            ))
        })
        .collect()
}
