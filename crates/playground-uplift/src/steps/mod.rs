use crate::{
    ContentSource, EditorMode, FetchStatus, InputSource, StepExecution, StepOutput, StepServices,
    StepState, UpliftError, run_step,
};
use std::fmt;

pub mod input;
pub mod output;
pub mod uplift;

pub use input::{DocumentError, INPUT_STEP_TITLE, InputStep, validate_document};
pub use output::{OUTPUT_STEP_TITLE, OutputStep};
pub use uplift::{MISSING_INPUT_DOCUMENT, UPLIFT_STEP_TITLE, UpliftStep, conversion_error_message};

/// Discriminant of the closed set of step variants, as written in step records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepType {
    Input,
    Uplift,
    Output,
}

impl StepType {
    pub const ALL: [StepType; 3] = [Self::Input, Self::Uplift, Self::Output];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Input => "InputStep",
            Self::Uplift => "UpliftStep",
            Self::Output => "OutputStep",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, UpliftError> {
        Self::ALL
            .into_iter()
            .find(|step_type| step_type.tag() == tag)
            .ok_or_else(|| UpliftError::UnknownStepType(tag.to_string()))
    }

    /// A fresh step of this variant with its default title and settings.
    pub fn instantiate(&self) -> Step {
        match self {
            Self::Input => Step::new_input(),
            Self::Uplift => Step::new_uplift(UPLIFT_STEP_TITLE),
            Self::Output => Step::new_output(),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug)]
enum StepBody {
    Input(InputStep),
    Uplift(UpliftStep),
    Output(OutputStep),
}

impl StepBody {
    fn execution(&mut self) -> &mut dyn StepExecution {
        match self {
            Self::Input(step) => step,
            Self::Uplift(step) => step,
            Self::Output(step) => step,
        }
    }

    fn source(&self) -> Option<&ContentSource> {
        match self {
            Self::Input(step) => Some(&step.source),
            Self::Uplift(step) => Some(&step.source),
            Self::Output(_) => None,
        }
    }

    fn source_mut(&mut self) -> Option<&mut ContentSource> {
        match self {
            Self::Input(step) => Some(&mut step.source),
            Self::Uplift(step) => Some(&mut step.source),
            Self::Output(_) => None,
        }
    }

    fn mode(&self) -> Option<EditorMode> {
        match self {
            Self::Input(step) => Some(step.mode),
            Self::Uplift(step) => Some(step.mode),
            Self::Output(_) => None,
        }
    }

    fn mode_mut(&mut self) -> Option<&mut EditorMode> {
        match self {
            Self::Input(step) => Some(&mut step.mode),
            Self::Uplift(step) => Some(&mut step.mode),
            Self::Output(_) => None,
        }
    }
}

/// One pipeline stage. Only the input, uplift and output variants exist.
#[derive(Debug)]
pub struct Step {
    state: StepState,
    body: StepBody,
}

impl Step {
    pub fn new_input() -> Self {
        Self {
            state: StepState::always_ready(INPUT_STEP_TITLE),
            body: StepBody::Input(InputStep::default()),
        }
    }

    pub fn new_uplift(title: impl Into<String>) -> Self {
        Self {
            state: StepState::new(title),
            body: StepBody::Uplift(UpliftStep::default()),
        }
    }

    pub fn new_output() -> Self {
        Self {
            state: StepState::new(OUTPUT_STEP_TITLE),
            body: StepBody::Output(OutputStep),
        }
    }

    pub fn step_type(&self) -> StepType {
        match self.body {
            StepBody::Input(_) => StepType::Input,
            StepBody::Uplift(_) => StepType::Uplift,
            StepBody::Output(_) => StepType::Output,
        }
    }

    pub fn state(&self) -> &StepState {
        &self.state
    }

    pub fn title(&self) -> &str {
        self.state.title()
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.state.set_title(title);
    }

    pub fn contents(&self) -> &str {
        self.state.contents()
    }

    pub fn set_contents(&mut self, contents: impl Into<String>) -> bool {
        self.state.set_contents(contents)
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn is_modified(&self) -> bool {
        self.state.is_modified()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn needs_run(&self) -> bool {
        self.state.needs_run()
    }

    pub fn errors(&self) -> &[String] {
        self.state.errors()
    }

    /// The value handed to the next step. For an input step this is always the
    /// current contents, whether or not it has run.
    pub fn output(&self) -> Option<StepOutput> {
        match self.body {
            StepBody::Input(_) => Some(InputStep::output(&self.state)),
            _ => self.state.output().cloned(),
        }
    }

    pub fn content_source(&self) -> Option<&ContentSource> {
        self.body.source()
    }

    pub fn input_source(&self) -> Option<InputSource> {
        self.body.source().map(ContentSource::input_source)
    }

    pub fn url(&self) -> Option<&str> {
        self.body.source().and_then(ContentSource::url)
    }

    pub fn mode(&self) -> Option<EditorMode> {
        self.body.mode()
    }

    pub fn set_input_source(&mut self, input_source: InputSource) -> Result<(), UpliftError> {
        let step_type = self.step_type();
        let source = self
            .body
            .source_mut()
            .ok_or_else(|| unsupported_field(step_type, crate::record::INPUT_SOURCE_FIELD))?;
        source.set_input_source(&mut self.state, input_source);
        Ok(())
    }

    pub fn set_url(&mut self, url: Option<String>) -> Result<(), UpliftError> {
        let step_type = self.step_type();
        let source = self
            .body
            .source_mut()
            .ok_or_else(|| unsupported_field(step_type, crate::record::URL_FIELD))?;
        source.set_url(&mut self.state, url);
        Ok(())
    }

    pub fn set_mode(&mut self, mode: EditorMode) -> Result<(), UpliftError> {
        let step_type = self.step_type();
        let current = self
            .body
            .mode_mut()
            .ok_or_else(|| unsupported_field(step_type, crate::record::MODE_FIELD))?;
        *current = mode;
        Ok(())
    }

    /// Resolves the step's contents from its source. Steps without a content
    /// source report `FetchStatus::Local`.
    pub async fn fetch_contents(&mut self, services: &StepServices, force: bool) -> FetchStatus {
        match self.body.source_mut() {
            Some(source) => {
                source
                    .fetch_contents(&mut self.state, services.fetcher(), force)
                    .await
            }
            None => FetchStatus::Local,
        }
    }

    /// Runs the step if it is pending, modified or `force` is set. Returns whether
    /// the step is in a successful state afterwards.
    pub async fn run(
        &mut self,
        input: Option<&StepOutput>,
        services: &StepServices,
        force: bool,
    ) -> bool {
        run_step(
            &mut self.state,
            self.body.execution(),
            input,
            services,
            force,
        )
        .await
    }
}

fn unsupported_field(step_type: StepType, field: &str) -> UpliftError {
    UpliftError::UnsupportedField {
        step_type: step_type.tag(),
        field: field.to_string(),
    }
}
