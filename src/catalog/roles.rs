use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

use super::Vocabulary;
use crate::error::{EngineError, Result};

/// A role and the skills it requires, in definition order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleProfile {
    pub name: String,
    pub required_skills: Vec<String>,
}

/// Read-only set of role definitions.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: Vec<RoleProfile>,
}

impl RoleCatalog {
    pub fn new(roles: Vec<RoleProfile>) -> Self {
        Self { roles }
    }

    /// Load roles from a JSON object mapping role name to an array of skills.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!("Loading role definitions from {:?}", path);

        let value = super::read_json(path).map_err(anyhow::Error::msg)?;
        let catalog = Self::from_json(value)?;

        info!("Role definitions loaded ({} roles)", catalog.len());
        Ok(catalog)
    }

    pub fn from_json(value: Value) -> anyhow::Result<Self> {
        let Value::Object(map) = value else {
            anyhow::bail!("role definitions must be a JSON object");
        };

        let roles = map
            .into_iter()
            .map(|(name, skills)| -> anyhow::Result<RoleProfile> {
                let required_skills: Vec<String> = serde_json::from_value(skills)
                    .map_err(|e| anyhow::anyhow!("role '{}': {}", name, e))?;
                Ok(RoleProfile {
                    name,
                    required_skills,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self { roles })
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Role names in definition order
    pub fn names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }

    /// `(role, skill)` pairs whose skill is not a canonical vocabulary entry
    pub fn unknown_skills(&self, vocabulary: &Vocabulary) -> Vec<(&str, &str)> {
        self.roles
            .iter()
            .flat_map(|role| {
                role.required_skills
                    .iter()
                    .filter(|skill| !vocabulary.contains(skill))
                    .map(move |skill| (role.name.as_str(), skill.as_str()))
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<&RoleProfile> {
        self.roles
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| EngineError::UnknownRole(name.to_string()))
    }
}
