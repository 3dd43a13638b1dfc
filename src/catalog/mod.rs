//! Static reference data loaded once at startup: the canonical skill
//! vocabulary and the role definitions.

mod roles;
mod vocabulary;

pub use roles::{RoleCatalog, RoleProfile};
pub use vocabulary::Vocabulary;

use std::fs;
use std::path::Path;

/// Read a JSON reference file into a value, preserving key order.
fn read_json(path: &Path) -> std::result::Result<serde_json::Value, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("{}: {}", path.display(), e))
}
