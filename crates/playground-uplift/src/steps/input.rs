use crate::{
    ContentSource, EditorMode, ExecutionOutcome, ExecutionResult, StepExecution, StepOutput,
    StepServices, StepState,
};
use async_trait::async_trait;
use thiserror::Error;

pub const INPUT_STEP_TITLE: &str = "Input step";

/// Why a text is not usable as an input document.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Input data is not a valid JSON or YAML document")]
    Invalid,
    #[error("Input data must be an object or array")]
    NotComposite,
}

/// Checks that `text` is a JSON or YAML document whose root is an object or array.
///
/// JSON is tried first. Text that only parses as an unquoted YAML string is plain
/// prose, not a document, and is reported as invalid. Every other scalar (numbers,
/// booleans, null, single- or double-quoted strings) parses but is rejected as
/// non-composite. YAML tags are ignored: the tagged value is classified.
pub fn validate_document(text: &str) -> Result<(), DocumentError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DocumentError::NotComposite);
    }

    let composite = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value.is_object() || value.is_array(),
        Err(_) => {
            let value = serde_yaml::from_str::<serde_yaml::Value>(text)
                .map_err(|_| DocumentError::Invalid)?;
            match untag_ref(&value) {
                serde_yaml::Value::String(_) if !is_quoted_scalar(trimmed) => {
                    return Err(DocumentError::Invalid);
                }
                value => value.is_mapping() || value.is_sequence(),
            }
        }
    };

    if composite {
        Ok(())
    } else {
        Err(DocumentError::NotComposite)
    }
}

/// Strips any number of YAML tags (serde_yaml's own `untag_ref` is crate-private).
fn untag_ref(value: &serde_yaml::Value) -> &serde_yaml::Value {
    let mut cur = value;
    while let serde_yaml::Value::Tagged(tagged) = cur {
        cur = &tagged.value;
    }
    cur
}

fn is_quoted_scalar(text: &str) -> bool {
    text.starts_with('\'') || text.starts_with('"')
}

/// Pipeline entry point; its output is always `{ json: contents }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputStep {
    pub(crate) source: ContentSource,
    pub(crate) mode: EditorMode,
}

impl Default for InputStep {
    fn default() -> Self {
        Self {
            source: ContentSource::default(),
            mode: EditorMode::Json,
        }
    }
}

impl InputStep {
    pub(crate) fn output(state: &StepState) -> StepOutput {
        StepOutput::document(state.contents())
    }
}

#[async_trait]
impl StepExecution for InputStep {
    async fn execute(
        &mut self,
        state: &mut StepState,
        _input: Option<&StepOutput>,
        services: &StepServices,
    ) -> ExecutionResult {
        let fetched = self
            .source
            .fetch_contents(state, services.fetcher(), true)
            .await;
        if fetched.is_failure() {
            return Ok(ExecutionOutcome::Failed);
        }

        if let Err(error) = validate_document(state.contents()) {
            state.set_error(error.to_string());
        }
        Ok(ExecutionOutcome::Completed)
    }
}
