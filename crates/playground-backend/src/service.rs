use crate::BackendError;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Conversion output keyed by format value (`ttl`, `json`).
pub type UpliftResult = BTreeMap<String, String>;

/// Profile URI to profile data, passed through untouched.
pub type ProfileMap = BTreeMap<String, Value>;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, BackendError>;
}

#[async_trait]
pub trait UpliftConverter: Send + Sync {
    async fn json_uplift(&self, json_doc: &str, context: &str)
    -> Result<UpliftResult, BackendError>;
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profiles(&self) -> Result<ProfileMap, BackendError>;
}

#[async_trait]
pub trait RemoteFetchPolicySource: Send + Sync {
    async fn remote_fetch_policy(&self) -> Result<RemoteFetchPolicy, BackendError>;
}

pub type SharedContentFetcher = Arc<dyn ContentFetcher>;
pub type SharedUpliftConverter = Arc<dyn UpliftConverter>;

/// What the backend will fetch on the client's behalf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFetchPolicy {
    pub enabled: bool,
    #[serde(default)]
    pub regex: Vec<String>,
    #[serde(default)]
    pub context: ContextFetchPolicy,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFetchPolicy {
    #[serde(rename = "type")]
    pub kind: ContextFetchKind,
    #[serde(default)]
    pub whitelist: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextFetchKind {
    #[default]
    Open,
    Disabled,
    Whitelist,
}

impl RemoteFetchPolicy {
    /// Whether the backend would remote-fetch `url`. Patterns must match the whole URL.
    pub fn allows_url(&self, url: &str) -> Result<bool, BackendError> {
        if !self.enabled {
            return Ok(false);
        }
        for pattern in &self.regex {
            let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|error| {
                BackendError::Decode(format!("invalid remote fetch pattern '{pattern}': {error}"))
            })?;
            if anchored.is_match(url) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
