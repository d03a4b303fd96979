use crate::{
    ContentSource, EditorMode, ExecutionOutcome, ExecutionResult, StepExecution, StepFault,
    StepOutput, StepServices, StepState, UNKNOWN_ERROR,
};
use async_trait::async_trait;
use playground_backend::BackendError;
use serde_json::Value;
use tracing::{info, warn};

pub const UPLIFT_STEP_TITLE: &str = "Uplift step";
pub const MISSING_INPUT_DOCUMENT: &str = "No input document available";

/// Best-effort user message for a failed conversion call.
///
/// A server-provided `detail.msg` wins, with the part of `detail.cause` after the
/// first `|` appended. Anything else falls back to the error's own message.
pub fn conversion_error_message(error: &BackendError) -> String {
    if let Some(message) = error.body().and_then(server_detail_message) {
        return message;
    }
    let message = error.to_string();
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

fn server_detail_message(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    let detail = payload.get("detail")?;
    let msg = detail
        .get("msg")
        .and_then(Value::as_str)
        .filter(|msg| !msg.is_empty())?;

    let mut message = msg.to_string();
    if let Some(cause) = detail
        .get("cause")
        .and_then(Value::as_str)
        .filter(|cause| !cause.is_empty())
    {
        let reason = cause.split('|').nth(1).unwrap_or(cause);
        message.push_str(": ");
        message.push_str(reason);
    }
    Some(message)
}

/// Converts the upstream document using this step's contents as the uplift context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpliftStep {
    pub(crate) source: ContentSource,
    pub(crate) mode: EditorMode,
}

impl Default for UpliftStep {
    fn default() -> Self {
        Self {
            source: ContentSource::default(),
            mode: EditorMode::Yaml,
        }
    }
}

#[async_trait]
impl StepExecution for UpliftStep {
    async fn execute(
        &mut self,
        state: &mut StepState,
        input: Option<&StepOutput>,
        services: &StepServices,
    ) -> ExecutionResult {
        let fetched = self
            .source
            .fetch_contents(state, services.fetcher(), true)
            .await;
        if fetched.is_failure() {
            return Ok(ExecutionOutcome::Failed);
        }

        let document = input
            .and_then(StepOutput::document_text)
            .ok_or_else(|| StepFault::new(MISSING_INPUT_DOCUMENT))?;

        let converted = services
            .converter()
            .json_uplift(document, state.contents())
            .await;
        match converted {
            Ok(formats) => {
                info!(step = state.title(), formats = formats.len(), "uplift completed");
                state.set_output(Some(StepOutput::Formats(formats)));
            }
            Err(error) => {
                warn!(step = state.title(), %error, "uplift call failed");
                state.set_error(conversion_error_message(&error));
            }
        }
        Ok(ExecutionOutcome::Completed)
    }
}
