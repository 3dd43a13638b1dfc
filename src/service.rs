use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{RoleCatalog, Vocabulary};
use crate::embedding::EmbeddingProvider;
use crate::error::{EngineError, Result};
use crate::matching::{SemanticMatcher, SimilarityDetail};
use crate::ner::{CandidateSource, SkillExtractor, SkillNormalizer, TextAnalyzer};

/// One skill gap analysis: a role and the user's skills in some form.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub role: String,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub role: String,
    pub user_skills: Vec<String>,
    pub match_score: f64,
    pub missing_skills: Vec<String>,
    pub similarity_details: BTreeMap<String, SimilarityDetail>,
}

/// Runs analyses against the vocabulary and role catalog loaded at startup.
///
/// Holds only shared, immutable state, so one instance can serve concurrent
/// requests.
pub struct SkillGapService {
    roles: Arc<RoleCatalog>,
    extractor: SkillExtractor,
    matcher: SemanticMatcher,
}

impl SkillGapService {
    pub fn new(
        vocabulary: Arc<Vocabulary>,
        roles: Arc<RoleCatalog>,
        analyzer: Arc<dyn TextAnalyzer>,
        provider: Arc<dyn EmbeddingProvider>,
        normalize_cutoff: f64,
        missing_threshold: f64,
    ) -> Result<Self> {
        if let Some((role, skill)) = roles.unknown_skills(&vocabulary).first() {
            return Err(EngineError::VocabularyUnavailable(format!(
                "role '{}' requires '{}', which is not in the vocabulary",
                role, skill
            )));
        }

        let normalizer = SkillNormalizer::new(vocabulary, normalize_cutoff)?;
        let extractor = SkillExtractor::new(normalizer, analyzer)?;
        let matcher = SemanticMatcher::new(provider, missing_threshold)?;

        Ok(Self {
            roles,
            extractor,
            matcher,
        })
    }

    /// Role names in definition order
    pub fn list_roles(&self) -> Vec<&str> {
        self.roles.names()
    }

    pub fn extractor(&self) -> &SkillExtractor {
        &self.extractor
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let start = Instant::now();
        let analysis_id = Uuid::new_v4();

        let role = self.roles.get(&request.role)?;
        debug!(
            %analysis_id,
            "Analyzing skills for role '{}' ({} required)",
            role.name,
            role.required_skills.len()
        );

        let user_skills = self.extractor.extract(&request.source);
        if user_skills.is_empty() {
            warn!(%analysis_id, "No skills found in input");
        }

        let result = self
            .matcher
            .evaluate(user_skills.as_slice(), &role.required_skills)
            .await?;

        info!(
            %analysis_id,
            role = %role.name,
            match_score = result.match_score,
            missing = result.missing_skills.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            analysis_id,
            role: role.name.clone(),
            user_skills: user_skills.into_vec(),
            match_score: result.match_score,
            missing_skills: result.missing_skills,
            similarity_details: result.similarity_details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoleProfile;
    use crate::embedding::TableEmbeddingProvider;
    use crate::ner::RuleBasedAnalyzer;

    fn service() -> SkillGapService {
        let vocabulary =
            Vocabulary::new(["Python", "Docker", "JavaScript", "Machine Learning", "SQL", "Pandas"])
                .unwrap();
        let roles = RoleCatalog::new(vec![RoleProfile {
            name: "Data Analyst".to_string(),
            required_skills: vec!["Python".into(), "SQL".into(), "Pandas".into()],
        }]);
        let provider: TableEmbeddingProvider = [
            ("Python", vec![1.0, 0.0, 0.0, 0.0]),
            ("SQL", vec![0.0, 1.0, 0.0, 0.0]),
            ("Pandas", vec![0.3, 0.3, 0.905_539_3, 0.0]),
            ("Docker", vec![0.0, 0.0, 0.0, 1.0]),
        ]
        .into_iter()
        .collect();

        SkillGapService::new(
            Arc::new(vocabulary),
            Arc::new(roles),
            Arc::new(RuleBasedAnalyzer),
            Arc::new(provider),
            0.7,
            0.8,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_manual_input() {
        let request = AnalysisRequest {
            role: "Data Analyst".to_string(),
            source: CandidateSource::Manual("pyhton, sql".to_string()),
        };

        let report = service().analyze(&request).await.unwrap();

        assert_eq!(report.user_skills, vec!["Python", "SQL"]);
        assert_eq!(report.missing_skills, vec!["Pandas"]);
        assert_eq!(report.match_score, 76.67);
        assert_eq!(report.similarity_details.len(), 3);
    }

    #[tokio::test]
    async fn test_analyze_text_input() {
        let request = AnalysisRequest {
            role: "Data Analyst".to_string(),
            source: CandidateSource::Text(
                "Shipped Docker images for Python and SQL reporting jobs.".to_string(),
            ),
        };

        let report = service().analyze(&request).await.unwrap();

        assert_eq!(report.user_skills, vec!["Docker", "Python", "SQL"]);
        assert_eq!(report.missing_skills, vec!["Pandas"]);
    }

    #[tokio::test]
    async fn test_unknown_role_is_client_error() {
        let request = AnalysisRequest {
            role: "Astronaut".to_string(),
            source: CandidateSource::Manual("Python".to_string()),
        };

        let err = service().analyze(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownRole(_)));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_unrecognized_skill_surfaces_embedding_error() {
        let request = AnalysisRequest {
            role: "Data Analyst".to_string(),
            source: CandidateSource::Manual("K8s".to_string()),
        };

        let err = service().analyze(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_role_skills_must_be_in_vocabulary() {
        let vocabulary = Vocabulary::new(["Python", "SQL"]).unwrap();
        let roles = RoleCatalog::new(vec![RoleProfile {
            name: "Platform Engineer".to_string(),
            required_skills: vec!["Python".into(), "Kubernetes".into()],
        }]);
        let provider: TableEmbeddingProvider = std::iter::empty::<(&str, Vec<f32>)>().collect();

        let err = SkillGapService::new(
            Arc::new(vocabulary),
            Arc::new(roles),
            Arc::new(RuleBasedAnalyzer),
            Arc::new(provider),
            0.7,
            0.8,
        )
        .err()
        .unwrap();

        assert!(
            matches!(err, EngineError::VocabularyUnavailable(ref msg) if msg.contains("Kubernetes"))
        );
    }

    #[test]
    fn test_list_roles() {
        assert_eq!(service().list_roles(), vec!["Data Analyst"]);
    }
}
