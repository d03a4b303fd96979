use crate::{StepFault, StepOutput, StepState};
use async_trait::async_trait;
use playground_backend::{
    ContentFetcher, SharedContentFetcher, SharedUpliftConverter, UpliftConverter,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Network capabilities a step may use while running.
#[derive(Clone)]
pub struct StepServices {
    fetcher: SharedContentFetcher,
    converter: SharedUpliftConverter,
}

impl StepServices {
    pub fn new(fetcher: SharedContentFetcher, converter: SharedUpliftConverter) -> Self {
        Self { fetcher, converter }
    }

    /// Uses one backend for both fetching and conversion.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ContentFetcher + UpliftConverter + 'static,
    {
        Self {
            fetcher: backend.clone(),
            converter: backend,
        }
    }

    pub fn fetcher(&self) -> &dyn ContentFetcher {
        self.fetcher.as_ref()
    }

    pub fn converter(&self) -> &dyn UpliftConverter {
        self.converter.as_ref()
    }
}

impl fmt::Debug for StepServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepServices").finish_non_exhaustive()
    }
}

/// How a step's execution ended when it did not raise a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Explicit success.
    Succeeded,
    /// Explicit failure; errors were recorded by the step.
    Failed,
    /// No verdict: success exactly when no error was recorded.
    Completed,
}

pub type ExecutionResult = Result<ExecutionOutcome, StepFault>;

/// Variant-specific execution logic driven by [`run_step`].
#[async_trait]
pub trait StepExecution: Send {
    async fn execute(
        &mut self,
        state: &mut StepState,
        input: Option<&StepOutput>,
        services: &StepServices,
    ) -> ExecutionResult;
}

/// Runs `execution` if the step is pending, modified or forced.
///
/// Errors are cleared before executing. A successful run clears the pending and
/// modified flags. The loading flag is raised for the duration of the execution and
/// lowered on every exit, including when the returned future is dropped early.
pub async fn run_step<E>(
    state: &mut StepState,
    execution: &mut E,
    input: Option<&StepOutput>,
    services: &StepServices,
    force: bool,
) -> bool
where
    E: StepExecution + ?Sized,
{
    if !state.needs_run() && !force {
        debug!(step = state.title(), "step is up to date; skipping");
        return true;
    }

    state.clear_errors();
    let _loading = state.loading_flag().hold();
    debug!(step = state.title(), force, "running step");

    let succeeded = match execution.execute(state, input, services).await {
        Ok(ExecutionOutcome::Succeeded) => true,
        Ok(ExecutionOutcome::Failed) => false,
        Ok(ExecutionOutcome::Completed) => state.errors().is_empty(),
        Err(fault) => {
            state.set_error(fault.user_message());
            false
        }
    };

    if succeeded {
        state.mark_clean();
    } else {
        warn!(step = state.title(), errors = ?state.errors(), "step failed");
    }
    succeeded
}
