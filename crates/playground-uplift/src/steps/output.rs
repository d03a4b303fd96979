use crate::{ExecutionOutcome, ExecutionResult, StepExecution, StepOutput, StepServices, StepState};
use async_trait::async_trait;

pub const OUTPUT_STEP_TITLE: &str = "Output step";

/// Terminal sink: keeps whatever the previous step produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputStep;

#[async_trait]
impl StepExecution for OutputStep {
    async fn execute(
        &mut self,
        state: &mut StepState,
        input: Option<&StepOutput>,
        _services: &StepServices,
    ) -> ExecutionResult {
        state.set_output(input.cloned());
        Ok(ExecutionOutcome::Succeeded)
    }
}
