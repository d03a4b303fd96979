use crate::{StepState, UpliftError};
use playground_backend::ContentFetcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const URL_REQUIRED: &str = "A URL is required";
pub const FETCH_FAILED: &str = "Error fetching contents from URL";

/// Where a step's authoritative text comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    #[default]
    Contents,
    Url,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contents => "contents",
            Self::Url => "url",
        }
    }
}

impl FromStr for InputSource {
    type Err = UpliftError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "contents" => Ok(Self::Contents),
            "url" => Ok(Self::Url),
            other => Err(UpliftError::UnsupportedInputSource(other.to_string())),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving a step's contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    /// Contents were fetched from the URL just now.
    Fetched,
    /// A previous fetch is still valid.
    Cached,
    /// The step uses local contents; nothing to fetch.
    Local,
    /// The fetch could not be performed or failed; the reason is in the step's errors.
    Failed,
}

impl FetchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched | Self::Cached)
    }

    pub fn is_failure(&self) -> bool {
        *self == Self::Failed
    }
}

/// Content-source selection embedded in content-bearing steps.
///
/// With `InputSource::Url` the step's contents are a cache of the last successful
/// fetch; with `InputSource::Contents` the URL and fetch state are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentSource {
    input_source: InputSource,
    url: Option<String>,
    contents_fetched: bool,
}

impl ContentSource {
    pub fn input_source(&self) -> InputSource {
        self.input_source
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn contents_fetched(&self) -> bool {
        self.contents_fetched
    }

    pub(crate) fn set_input_source(&mut self, state: &mut StepState, input_source: InputSource) {
        if self.input_source == input_source {
            return;
        }
        self.input_source = input_source;
        self.contents_fetched = false;
        state.mark_modified();
    }

    pub(crate) fn set_url(&mut self, state: &mut StepState, url: Option<String>) {
        if self.url == url {
            return;
        }
        self.url = url;
        self.contents_fetched = false;
        if self.input_source == InputSource::Url {
            state.mark_modified();
        }
    }

    /// The serialized field that carries no information for the current source.
    pub(crate) fn irrelevant_field(&self) -> &'static str {
        match self.input_source {
            InputSource::Contents => crate::record::URL_FIELD,
            InputSource::Url => crate::record::CONTENTS_FIELD,
        }
    }

    pub async fn fetch_contents(
        &mut self,
        state: &mut StepState,
        fetcher: &dyn ContentFetcher,
        force: bool,
    ) -> FetchStatus {
        if self.input_source == InputSource::Contents {
            return FetchStatus::Local;
        }
        if self.contents_fetched && !state.is_modified() && !force {
            return FetchStatus::Cached;
        }

        let url = self.url.as_deref().map(str::trim).unwrap_or_default();
        if url.is_empty() {
            state.set_error(URL_REQUIRED);
            return FetchStatus::Failed;
        }

        debug!(step = state.title(), url, "fetching step contents");
        match fetcher.fetch_text(url).await {
            Ok(text) => {
                state.set_contents(text);
                self.contents_fetched = true;
                state.clear_errors();
                FetchStatus::Fetched
            }
            Err(error) => {
                warn!(step = state.title(), url, %error, "content fetch failed");
                state.set_error(FETCH_FAILED);
                FetchStatus::Failed
            }
        }
    }
}
