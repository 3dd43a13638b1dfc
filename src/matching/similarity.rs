use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{EngineError, Result};

/// Guards the cosine denominator against near-zero norms
pub const EPSILON: f64 = 1e-8;

/// `dot(a, b) / (|a| * |b| + EPSILON)`, accumulated in f64.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    dot / (norm_a * norm_b + EPSILON)
}

/// Case-insensitive comparison of trimmed skill names
pub fn same_skill(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Best match for one role skill within a user skill set
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    /// Similarity in [0, 1]
    pub score: f64,
    /// `None` only when the user set is empty
    pub matched_skill: Option<String>,
}

impl BestMatch {
    fn none() -> Self {
        Self {
            score: 0.0,
            matched_skill: None,
        }
    }
}

/// Embeddings for one matching operation, fetched in a single batch.
#[derive(Debug, Default)]
pub(crate) struct EmbeddingTable {
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingTable {
    /// Request embeddings for the distinct `skills` in one provider call.
    pub async fn fetch<'a, I>(provider: &dyn EmbeddingProvider, skills: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut batch: Vec<String> = Vec::new();
        for skill in skills {
            if seen.insert(skill.as_str()) {
                batch.push(skill.clone());
            }
        }

        if batch.is_empty() {
            return Ok(Self::default());
        }

        debug!(
            "Fetching {} embeddings from {}",
            batch.len(),
            provider.name()
        );
        let vectors = provider.embed(&batch).await?;

        if vectors.len() != batch.len() {
            return Err(EngineError::EmbeddingUnavailable(format!(
                "requested {} embeddings, received {}",
                batch.len(),
                vectors.len()
            )));
        }

        let dim = vectors[0].len();
        if let Some((skill, vector)) = batch
            .iter()
            .zip(&vectors)
            .find(|(_, v)| v.is_empty() || v.len() != dim)
        {
            return Err(EngineError::EmbeddingUnavailable(format!(
                "embedding for '{}' has dimension {}, expected {}",
                skill,
                vector.len(),
                dim
            )));
        }

        Ok(Self {
            vectors: batch.into_iter().zip(vectors).collect(),
        })
    }

    fn get(&self, skill: &str) -> Result<&[f32]> {
        self.vectors
            .get(skill)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::EmbeddingUnavailable(format!("no embedding for '{}'", skill)))
    }
}

/// Highest similarity between `role_skill` and any user skill.
///
/// With `exact_first`, a case-insensitive exact hit scores 1.0 without
/// consulting embeddings. Ties keep the earliest user skill. Negative cosine
/// values are floored at zero.
pub(crate) fn best_similarity(
    role_skill: &str,
    user_skills: &[String],
    table: &EmbeddingTable,
    exact_first: bool,
) -> Result<BestMatch> {
    if user_skills.is_empty() {
        return Ok(BestMatch::none());
    }

    if exact_first {
        if let Some(skill) = user_skills.iter().find(|s| same_skill(s, role_skill)) {
            return Ok(BestMatch {
                score: 1.0,
                matched_skill: Some(skill.clone()),
            });
        }
    }

    let role_vector = table.get(role_skill)?;
    let mut best: Option<(&String, f64)> = None;

    for skill in user_skills {
        let score = cosine_similarity(role_vector, table.get(skill)?).clamp(0.0, 1.0);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((skill, score));
        }
    }

    Ok(best
        .map(|(skill, score)| BestMatch {
            score,
            matched_skill: Some(skill.clone()),
        })
        .unwrap_or_else(BestMatch::none))
}
