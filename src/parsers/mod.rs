//! Script parsers: one contract, two wire formats.
//!
//! The structured-object parser walks dot paths through JSON-like payloads;
//! the streaming-markup parser matches tag paths through XML/RSS feeds. Both
//! swallow payload failures into the outcome so one bad script cannot abort
//! a batch refresh covering other scripts.

pub mod json;
pub mod rss;

use crate::config::{ScriptConfig, SectionMapping, UrlType};
use crate::error::{EngineError, Result};
use crate::types::{Category, Item, Script};

/// A non-fatal problem recorded while parsing one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseIssue {
    /// Index of the record being built when the failure hit, if any.
    pub record_index: Option<usize>,
    pub message: String,
}

impl ParseIssue {
    pub fn payload(message: impl Into<String>) -> Self {
        Self {
            record_index: None,
            message: message.into(),
        }
    }
}

/// Partial-success parse result: the rows built before any failure, plus the
/// failures themselves. Callers that only want the rows can log the issues
/// and move on; the list shape alone does not distinguish "no data" from
/// "parse failed".
#[derive(Debug)]
pub struct ParseOutcome<T> {
    pub rows: Vec<T>,
    pub issues: Vec<ParseIssue>,
}

impl<T> ParseOutcome<T> {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            issues: vec![ParseIssue::payload(message)],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<T> Default for ParseOutcome<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Capability contract shared by the format implementations.
pub trait ScriptParser: Send + Sync {
    fn parse_items(&self, raw: &str, mapping: &SectionMapping, script_id: &str)
        -> ParseOutcome<Item>;

    fn parse_categories(
        &self,
        raw: &str,
        mapping: &SectionMapping,
        script_id: &str,
    ) -> ParseOutcome<Category>;

    /// Recover the mapping config carried by the script record itself.
    fn derive_mapping(&self, script: &Script) -> Result<ScriptConfig>;
}

/// Select the implementation for a script's format discriminator.
pub fn parser_for(url_type: UrlType) -> &'static dyn ScriptParser {
    match url_type {
        UrlType::Json => &json::JsonParser,
        UrlType::Rss => &rss::RssParser,
    }
}

/// Deserialize the serialized mapping config embedded in a script record.
pub(crate) fn parse_script_config(script: &Script) -> Result<ScriptConfig> {
    let raw = script.config.as_deref().ok_or_else(|| {
        EngineError::MalformedMapping(format!("script {} carries no mapping config", script.id))
    })?;
    serde_json::from_str(raw).map_err(|e| {
        EngineError::MalformedMapping(format!("script {} mapping config: {e}", script.id))
    })
}
