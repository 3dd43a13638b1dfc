use std::sync::Arc;
use strsim::normalized_damerau_levenshtein;
use tracing::warn;

use crate::catalog::Vocabulary;
use crate::config::check_unit_interval;
use crate::error::Result;

/// Default minimum similarity for the fuzzy tier
pub const DEFAULT_CUTOFF: f64 = 0.7;

/// Which resolution tier produced a normalized skill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Substring,
    Fuzzy,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub skill: String,
    pub tier: MatchTier,
}

/// Resolve a raw skill mention to its canonical vocabulary entry.
///
/// Tiers are tried in order and the first hit wins:
/// 1. case-insensitive exact match
/// 2. a vocabulary entry contained in the raw string (first entry in
///    vocabulary order, not the longest)
/// 3. best normalized Damerau-Levenshtein similarity, if `>= cutoff`
/// 4. the trimmed raw string itself
pub fn resolve_skill(raw: &str, vocabulary: &Vocabulary, cutoff: f64) -> Resolution {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Resolution {
            skill: String::new(),
            tier: MatchTier::Fallback,
        };
    }

    if let Some(canonical) = vocabulary.get_ignore_case(trimmed) {
        return Resolution {
            skill: canonical.to_string(),
            tier: MatchTier::Exact,
        };
    }

    let lower = trimmed.to_lowercase();

    // No minimum length: a one-letter entry matches most inputs here.
    if let Some((canonical, _)) = vocabulary
        .iter_lowered()
        .find(|(_, entry)| lower.contains(*entry))
    {
        return Resolution {
            skill: canonical.to_string(),
            tier: MatchTier::Substring,
        };
    }

    let mut best: Option<(&str, f64)> = None;
    for (canonical, entry) in vocabulary.iter_lowered() {
        let score = normalized_damerau_levenshtein(&lower, entry);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((canonical, score));
        }
    }

    if let Some((canonical, score)) = best {
        if score >= cutoff {
            return Resolution {
                skill: canonical.to_string(),
                tier: MatchTier::Fuzzy,
            };
        }
    }

    Resolution {
        skill: trimmed.to_string(),
        tier: MatchTier::Fallback,
    }
}

/// Canonical form of `raw`, or the trimmed input when nothing resolves.
pub fn normalize_skill(raw: &str, vocabulary: &Vocabulary, cutoff: f64) -> String {
    resolve_skill(raw, vocabulary, cutoff).skill
}

/// Normalizer bound to a shared vocabulary and a fixed fuzzy cutoff.
#[derive(Debug, Clone)]
pub struct SkillNormalizer {
    vocabulary: Arc<Vocabulary>,
    cutoff: f64,
}

impl SkillNormalizer {
    pub fn new(vocabulary: Arc<Vocabulary>, cutoff: f64) -> Result<Self> {
        check_unit_interval("normalize cutoff", cutoff)?;
        Ok(Self { vocabulary, cutoff })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn normalize(&self, raw: &str) -> String {
        let resolution = resolve_skill(raw, &self.vocabulary, self.cutoff);
        if resolution.tier == MatchTier::Fallback && !resolution.skill.is_empty() {
            warn!("No vocabulary entry for '{}', keeping literal", resolution.skill);
        }
        resolution.skill
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> Vocabulary {
        Vocabulary::new(["Python", "Docker", "JavaScript", "Machine Learning", "SQL"]).unwrap()
    }

    fn tier(raw: &str) -> Resolution {
        resolve_skill(raw, &vocabulary(), DEFAULT_CUTOFF)
    }

    #[test]
    fn test_exact_match_ignores_case() {
        assert_eq!(
            tier("Javascript"),
            Resolution {
                skill: "JavaScript".into(),
                tier: MatchTier::Exact
            }
        );
        assert_eq!(tier("  sql ").skill, "SQL");
    }

    #[test]
    fn test_substring_match() {
        let resolution = tier("docker-compose");
        assert_eq!(resolution.skill, "Docker");
        assert_eq!(resolution.tier, MatchTier::Substring);
    }

    #[test]
    fn test_substring_prefers_vocabulary_order() {
        let vocabulary = Vocabulary::new(["SQL", "PostgreSQL Admin", "Postgre"]).unwrap();
        assert_eq!(normalize_skill("PostgreSQL Admin tools", &vocabulary, 0.7), "SQL");
    }

    #[test]
    fn test_fuzzy_match() {
        let resolution = tier("pyhton");
        assert_eq!(resolution.skill, "Python");
        assert_eq!(resolution.tier, MatchTier::Fuzzy);
        assert_eq!(tier("Machine-Learn").skill, "Machine Learning");
    }

    #[test]
    fn test_fuzzy_tie_goes_to_first_entry() {
        let forward = Vocabulary::new(["abcx", "abcy"]).unwrap();
        let reversed = Vocabulary::new(["abcy", "abcx"]).unwrap();

        let resolution = resolve_skill("abcz", &forward, DEFAULT_CUTOFF);
        assert_eq!(resolution.tier, MatchTier::Fuzzy);
        assert_eq!(resolution.skill, "abcx");
        assert_eq!(normalize_skill("abcz", &reversed, DEFAULT_CUTOFF), "abcy");
    }

    #[test]
    fn test_fallback_keeps_trimmed_literal() {
        let resolution = tier("  K8s ");
        assert_eq!(resolution.skill, "K8s");
        assert_eq!(resolution.tier, MatchTier::Fallback);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_skill("   ", &vocabulary(), DEFAULT_CUTOFF), "");
    }

    #[test]
    fn test_cutoff_controls_fuzzy_tier() {
        let vocabulary = vocabulary();
        assert_eq!(normalize_skill("pyhton", &vocabulary, 0.9), "pyhton");
        assert!(vocabulary.contains(&normalize_skill("K8s", &vocabulary, 0.0)));
    }

    #[test]
    fn test_empty_vocabulary_falls_back() {
        let vocabulary = Vocabulary::default();
        assert_eq!(normalize_skill(" Python ", &vocabulary, DEFAULT_CUTOFF), "Python");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let vocabulary = vocabulary();
        for raw in ["pyhton", "docker-compose", "Javascript", "Machine-Learn", "K8s", " sql ", ""] {
            let once = normalize_skill(raw, &vocabulary, DEFAULT_CUTOFF);
            let twice = normalize_skill(&once, &vocabulary, DEFAULT_CUTOFF);
            assert_eq!(once, twice, "normalizing '{}' twice changed the result", raw);
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fallback_logs_warning() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let normalizer = SkillNormalizer::new(Arc::new(vocabulary()), DEFAULT_CUTOFF).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            let _ = normalizer.normalize("K8s");
            let _ = normalizer.normalize("pyhton");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("'K8s'"));
        assert!(!output.contains("pyhton"));
    }

    #[test]
    fn test_normalizer_rejects_bad_cutoff() {
        let vocabulary = Arc::new(vocabulary());
        assert!(SkillNormalizer::new(vocabulary.clone(), 1.2).is_err());
        let normalizer = SkillNormalizer::new(vocabulary, 0.7).unwrap();
        assert_eq!(normalizer.normalize("javscript"), "JavaScript");
    }
}
