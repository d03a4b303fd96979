use crate::{
    Step, StepOutput, StepRecord, StepServices, UPLIFT_STEP_TITLE, UpliftError,
    records_from_fragment, revive, share_fragment,
};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStatus {
    Success,
    Fail,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }
}

/// Summary of one pipeline run. Step positions are indices into the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineRunResult {
    pub status: PipelineStatus,
    /// Steps that ended in a successful state, whether or not they executed.
    pub completed_steps: Vec<usize>,
    /// Steps whose execution logic actually ran.
    pub executed_steps: Vec<usize>,
    pub failed_step: Option<usize>,
    /// Errors of the failed step, if any.
    pub errors: Vec<String>,
}

impl PipelineRunResult {
    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}

/// Ordered chain of steps where each step's output is the next step's input.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The default input -> uplift -> output chain.
    pub fn playground() -> Self {
        Self::new(vec![
            Step::new_input(),
            Step::new_uplift(UPLIFT_STEP_TITLE),
            Step::new_output(),
        ])
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn step_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Output of the last step.
    pub fn output(&self) -> Option<StepOutput> {
        self.steps.last().and_then(Step::output)
    }

    pub async fn run(&mut self, services: &StepServices, force: bool) -> PipelineRunResult {
        if self.steps.is_empty() {
            return PipelineRunResult {
                status: PipelineStatus::Success,
                completed_steps: Vec::new(),
                executed_steps: Vec::new(),
                failed_step: None,
                errors: Vec::new(),
            };
        }
        self.run_steps(0, services, force).await
    }

    /// Runs the pipeline starting at `index`, feeding that step the output of the
    /// step before it.
    pub async fn run_from(
        &mut self,
        index: usize,
        services: &StepServices,
        force: bool,
    ) -> Result<PipelineRunResult, UpliftError> {
        if index >= self.steps.len() {
            return Err(UpliftError::InvalidStepIndex {
                index,
                len: self.steps.len(),
            });
        }
        Ok(self.run_steps(index, services, force).await)
    }

    async fn run_steps(
        &mut self,
        start: usize,
        services: &StepServices,
        force: bool,
    ) -> PipelineRunResult {
        info!(start, steps = self.steps.len(), force, "pipeline run started");

        let mut completed_steps = Vec::new();
        let mut executed_steps = Vec::new();
        // Once a step executes, its output may have changed, so everything after it
        // has to run again.
        let mut force_rest = force;

        for index in start..self.steps.len() {
            let input = match index {
                0 => None,
                _ => self.steps[index - 1].output(),
            };
            let step = &mut self.steps[index];
            if force_rest || step.needs_run() {
                executed_steps.push(index);
            }

            let ok = step.run(input.as_ref(), services, force_rest).await;
            if !ok {
                let errors = step.errors().to_vec();
                info!(failed_step = index, title = step.title(), "pipeline run failed");
                return PipelineRunResult {
                    status: PipelineStatus::Fail,
                    completed_steps,
                    executed_steps,
                    failed_step: Some(index),
                    errors,
                };
            }

            completed_steps.push(index);
            force_rest = force_rest || executed_steps.last() == Some(&index);
        }

        info!(
            completed = completed_steps.len(),
            executed = executed_steps.len(),
            "pipeline run finished"
        );
        PipelineRunResult {
            status: PipelineStatus::Success,
            completed_steps,
            executed_steps,
            failed_step: None,
            errors: Vec::new(),
        }
    }

    pub fn to_records(&self) -> Vec<StepRecord> {
        self.steps.iter().map(|step| step.to_record(&[])).collect()
    }

    pub fn from_records(records: &[StepRecord]) -> Result<Self, UpliftError> {
        let steps = records.iter().map(revive).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(steps))
    }

    pub fn share_fragment(&self, route: &str) -> Result<String, UpliftError> {
        share_fragment(route, &self.to_records())
    }

    pub fn from_fragment(fragment: &str) -> Result<Self, UpliftError> {
        Self::from_records(&records_from_fragment(fragment)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InputSource, StepType};
    use playground_backend::{BackendError, MockBackend, UpliftResult};
    use std::sync::Arc;

    fn services(backend: &MockBackend) -> StepServices {
        StepServices::from_backend(Arc::new(backend.clone()))
    }

    fn formats(ttl: &str) -> UpliftResult {
        UpliftResult::from([
            ("json".to_string(), "{}".to_string()),
            ("ttl".to_string(), ttl.to_string()),
        ])
    }

    fn playground(input: &str, context: &str) -> Pipeline {
        let mut pipeline = Pipeline::playground();
        pipeline
            .step_mut(0)
            .expect("playground has an input step")
            .set_contents(input);
        pipeline
            .step_mut(1)
            .expect("playground has an uplift step")
            .set_contents(context);
        pipeline
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_playground_expected_output_reaches_last_step() {
        let backend = MockBackend::new();
        backend.push_uplift_response(Ok(formats("<urn:a> a <urn:b> .")));
        let mut pipeline = playground("{\"a\":1}", "transform: '.'");

        let result = pipeline.run(&services(&backend), false).await;

        assert!(result.is_success());
        assert_eq!(result.completed_steps, vec![0, 1, 2]);
        assert_eq!(result.executed_steps, vec![0, 1, 2]);
        let output = pipeline.output().expect("output step should hold the result");
        assert_eq!(output.format("ttl"), Some("<urn:a> a <urn:b> ."));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_twice_without_changes_expected_no_execution() {
        let backend = MockBackend::new();
        let services = services(&backend);
        let mut pipeline = playground("{\"a\":1}", "transform: '.'");
        assert!(pipeline.run(&services, false).await.is_success());

        let second = pipeline.run(&services, false).await;

        assert!(second.is_success());
        assert!(second.executed_steps.is_empty());
        assert_eq!(backend.uplift_calls().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_after_input_edit_expected_downstream_rerun() {
        let backend = MockBackend::new();
        let services = services(&backend);
        let mut pipeline = playground("{\"a\":1}", "transform: '.'");
        assert!(pipeline.run(&services, false).await.is_success());

        pipeline
            .step_mut(0)
            .expect("input step exists")
            .set_contents("{\"a\":2}");
        let result = pipeline.run(&services, false).await;

        assert_eq!(result.executed_steps, vec![0, 1, 2]);
        let calls = backend.uplift_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].json_doc, "{\"a\":2}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_with_invalid_input_expected_stop_at_first_failure() {
        let backend = MockBackend::new();
        let mut pipeline = playground("42", "transform: '.'");

        let result = pipeline.run(&services(&backend), false).await;

        assert_eq!(result.status, PipelineStatus::Fail);
        assert_eq!(result.failed_step, Some(0));
        assert_eq!(result.errors, vec!["Input data must be an object or array".to_string()]);
        assert!(result.completed_steps.is_empty());
        assert!(backend.uplift_calls().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_with_conversion_error_expected_uplift_failure_reported() {
        let backend = MockBackend::new();
        backend.push_uplift_response(Err(BackendError::Transport("connection refused".to_string())));
        let mut pipeline = playground("{}", "transform: '.'");

        let result = pipeline.run(&services(&backend), false).await;

        assert_eq!(result.failed_step, Some(1));
        assert_eq!(result.completed_steps, vec![0]);
        assert_eq!(result.errors, vec!["request failed: connection refused".to_string()]);
        assert!(pipeline.output().is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_from_uplift_expected_previous_output_as_input() {
        let backend = MockBackend::new();
        let services = services(&backend);
        let mut pipeline = playground("{\"a\":1}", "transform: '.'");

        let result = pipeline
            .run_from(1, &services, false)
            .await
            .expect("index 1 should be valid");

        assert_eq!(result.executed_steps, vec![1, 2]);
        assert_eq!(backend.uplift_calls()[0].json_doc, "{\"a\":1}");

        let error = pipeline
            .run_from(3, &services, false)
            .await
            .expect_err("index past the end should fail");
        assert!(matches!(error, UpliftError::InvalidStepIndex { index: 3, len: 3 }));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_empty_pipeline_expected_success() {
        let backend = MockBackend::new();
        let mut pipeline = Pipeline::default();
        assert!(pipeline.run(&services(&backend), true).await.is_success());
    }

    #[test]
    fn from_fragment_expected_equivalent_steps() {
        let mut pipeline = playground("{\"a\":1}", "transform: '.'");
        let uplift = pipeline.step_mut(1).expect("uplift step exists");
        uplift
            .set_input_source(InputSource::Url)
            .expect("uplift step has a source");
        uplift
            .set_url(Some("https://example.org/context.yaml".to_string()))
            .expect("uplift step has a url");

        let fragment = pipeline.share_fragment("/uplift").expect("fragment should encode");
        let revived = Pipeline::from_fragment(&fragment).expect("fragment should revive");

        let types: Vec<StepType> = revived.steps().iter().map(Step::step_type).collect();
        assert_eq!(types, vec![StepType::Input, StepType::Uplift, StepType::Output]);
        assert_eq!(revived.to_records(), pipeline.to_records());
        assert_eq!(
            revived.step(1).and_then(Step::url),
            Some("https://example.org/context.yaml")
        );
    }
}
