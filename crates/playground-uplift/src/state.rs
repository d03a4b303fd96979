use crate::{StepOutput, UpliftError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Editor syntax for a step's contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Json,
    Yaml,
}

impl EditorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl FromStr for EditorMode {
    type Err = UpliftError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            other => Err(UpliftError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory "run in flight" flag. Clones observe the same flag, so a UI task can
/// watch a step that another task is running.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raises the flag until the returned guard is dropped.
    pub fn hold(&self) -> LoadingGuard {
        self.0.store(true, Ordering::SeqCst);
        LoadingGuard(self.0.clone())
    }
}

#[must_use = "the loading flag is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// State shared by every step variant.
#[derive(Debug)]
pub struct StepState {
    title: String,
    contents: String,
    pending: bool,
    always_ready: bool,
    modified: bool,
    output: Option<StepOutput>,
    errors: Vec<String>,
    loading: LoadingFlag,
}

impl StepState {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            contents: String::new(),
            pending: true,
            always_ready: false,
            modified: false,
            output: None,
            errors: Vec::new(),
            loading: LoadingFlag::default(),
        }
    }

    /// A state that is never pending, for steps whose output exists without a run.
    pub fn always_ready(title: impl Into<String>) -> Self {
        Self {
            always_ready: true,
            ..Self::new(title)
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Replaces the contents; marks the step modified only on an actual change.
    /// Returns whether the value changed.
    pub fn set_contents(&mut self, contents: impl Into<String>) -> bool {
        let contents = contents.into();
        if contents == self.contents {
            return false;
        }
        self.contents = contents;
        self.modified = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending && !self.always_ready
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn needs_run(&self) -> bool {
        self.is_pending() || self.modified
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn output(&self) -> Option<&StepOutput> {
        self.output.as_ref()
    }

    pub fn set_output(&mut self, output: Option<StepOutput>) {
        self.output = output;
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.errors = vec![error.into()];
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Forgets the last successful run.
    pub fn invalidate(&mut self) {
        self.pending = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.modified = false;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_state_new_expected_pending_and_clean() {
        let state = StepState::new("Uplift step");
        assert!(state.is_pending());
        assert!(!state.is_modified());
        assert!(!state.is_loading());
        assert!(state.output().is_none());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn set_contents_same_value_expected_not_modified() {
        let mut state = StepState::new("step");
        assert!(!state.set_contents(""));
        assert!(!state.is_modified());

        assert!(state.set_contents("{}"));
        assert!(state.is_modified());

        state.mark_clean();
        assert!(!state.set_contents("{}"));
        assert!(!state.is_modified());
    }

    #[test]
    fn set_error_after_several_errors_expected_single_message() {
        let mut state = StepState::new("step");
        state.set_error("first");
        state.set_error("second");
        assert_eq!(state.errors(), ["second"]);

        state.clear_errors();
        assert!(state.errors().is_empty());
    }

    #[test]
    fn always_ready_state_invalidate_expected_never_pending() {
        let mut state = StepState::always_ready("Input step");
        state.invalidate();
        assert!(!state.is_pending());
        assert!(!state.needs_run());
    }

    #[test]
    fn loading_guard_drop_expected_flag_cleared_for_all_handles() {
        let state = StepState::new("step");
        let observer = state.loading_flag();
        {
            let _guard = state.loading_flag().hold();
            assert!(observer.is_set());
            assert!(state.is_loading());
        }
        assert!(!observer.is_set());
    }

    #[test]
    fn editor_mode_from_str_unknown_expected_error() {
        assert_eq!("yaml".parse::<EditorMode>().expect("mode should parse"), EditorMode::Yaml);
        let error = "xml".parse::<EditorMode>().expect_err("unknown mode should fail");
        assert!(matches!(error, UpliftError::UnsupportedMode(mode) if mode == "xml"));
    }
}
