pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod matching;
pub mod ner;
pub mod service;

pub use error::{EngineError, Result};
