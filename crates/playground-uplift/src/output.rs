use playground_backend::UpliftResult;
use serde::Serialize;

/// Structured-document view of an input step: the raw text, reinterpreted downstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InputDocument {
    pub json: String,
}

/// What a step hands to the next one. Serialized untagged for display only; a
/// formats map with a single `json` entry is indistinguishable from a document,
/// so outputs are never read back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepOutput {
    Document(InputDocument),
    Formats(UpliftResult),
}

impl StepOutput {
    pub fn document(json: impl Into<String>) -> Self {
        Self::Document(InputDocument { json: json.into() })
    }

    pub fn document_text(&self) -> Option<&str> {
        match self {
            Self::Document(document) => Some(&document.json),
            Self::Formats(_) => None,
        }
    }

    /// Text of one conversion format (`ttl`, `json`).
    pub fn format(&self, value: &str) -> Option<&str> {
        match self {
            Self::Formats(formats) => formats.get(value).map(String::as_str),
            Self::Document(_) => None,
        }
    }
}
