use crate::{
    BackendError, ContentFetcher, ProfileMap, ProfileSource, RemoteFetchPolicy,
    RemoteFetchPolicySource, UpliftConverter, UpliftResult,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A conversion request seen by [`MockBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpliftCall {
    pub json_doc: String,
    pub context: String,
}

/// In-memory backend. Clones share state, so a test can keep a handle while the
/// pipeline owns another.
///
/// Conversions pop queued responses first; with an empty queue they echo the
/// request back as `json` (document) and `ttl` (context).
#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockBackendState>>,
}

#[derive(Debug, Default)]
struct MockBackendState {
    documents: BTreeMap<String, Result<String, BackendError>>,
    uplift_responses: VecDeque<Result<UpliftResult, BackendError>>,
    profiles: ProfileMap,
    remote_fetch_policy: RemoteFetchPolicy,
    fetch_calls: Vec<String>,
    uplift_calls: Vec<UpliftCall>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockBackendState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_document(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.state().documents.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_fetch_error(self, url: impl Into<String>, error: BackendError) -> Self {
        self.state().documents.insert(url.into(), Err(error));
        self
    }

    pub fn push_uplift_response(&self, response: Result<UpliftResult, BackendError>) {
        self.state().uplift_responses.push_back(response);
    }

    pub fn set_profiles(&self, profiles: ProfileMap) {
        self.state().profiles = profiles;
    }

    pub fn set_remote_fetch_policy(&self, policy: RemoteFetchPolicy) {
        self.state().remote_fetch_policy = policy;
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.state().fetch_calls.clone()
    }

    pub fn uplift_calls(&self) -> Vec<UpliftCall> {
        self.state().uplift_calls.clone()
    }
}

#[async_trait]
impl ContentFetcher for MockBackend {
    async fn fetch_text(&self, url: &str) -> Result<String, BackendError> {
        let mut state = self.state();
        state.fetch_calls.push(url.to_string());
        state
            .documents
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(BackendError::NotFound {
                    resource: "document",
                    id: url.to_string(),
                })
            })
    }
}

#[async_trait]
impl UpliftConverter for MockBackend {
    async fn json_uplift(
        &self,
        json_doc: &str,
        context: &str,
    ) -> Result<UpliftResult, BackendError> {
        let mut state = self.state();
        state.uplift_calls.push(UpliftCall {
            json_doc: json_doc.to_string(),
            context: context.to_string(),
        });
        state.uplift_responses.pop_front().unwrap_or_else(|| {
            Ok(UpliftResult::from([
                ("json".to_string(), json_doc.to_string()),
                ("ttl".to_string(), context.to_string()),
            ]))
        })
    }
}

#[async_trait]
impl ProfileSource for MockBackend {
    async fn profiles(&self) -> Result<ProfileMap, BackendError> {
        Ok(self.state().profiles.clone())
    }
}

#[async_trait]
impl RemoteFetchPolicySource for MockBackend {
    async fn remote_fetch_policy(&self) -> Result<RemoteFetchPolicy, BackendError> {
        Ok(self.state().remote_fetch_policy.clone())
    }
}
