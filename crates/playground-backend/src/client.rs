use crate::{
    BackendConfig, BackendError, ContentFetcher, OutputSelector, ProfileMap, ProfileSource,
    RemoteFetchPolicy, RemoteFetchPolicySource, UpliftConverter, UpliftResult,
    extract_uplift_archive,
};
use async_trait::async_trait;
use reqwest::multipart::Form;
use tracing::debug;

/// HTTP client for the playground backend.
#[derive(Clone, Debug)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl ReqwestBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| BackendError::Transport(format!("http client setup failed: {err}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(BackendConfig::from_env())
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Posts a conversion request and returns the raw response body.
    pub async fn json_uplift_raw(
        &self,
        json_doc: &str,
        context: &str,
        output: OutputSelector,
    ) -> Result<Vec<u8>, BackendError> {
        let form = Form::new()
            .text("output", output.as_str())
            .text("context", context.to_string())
            .text("json", json_doc.to_string());

        let endpoint = self.config.endpoint("/json-uplift");
        debug!(%endpoint, output = output.as_str(), "posting uplift request");
        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| BackendError::Transport(format!("http post failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| BackendError::Transport(format!("http read body failed: {err}")))?;
        Ok(bytes.to_vec())
    }

    async fn get_text(&self, url: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| BackendError::Transport(format!("http get failed: {err}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| BackendError::Transport(format!("http read body failed: {err}")))?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl ContentFetcher for ReqwestBackend {
    async fn fetch_text(&self, url: &str) -> Result<String, BackendError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(BackendError::InvalidInput("url must not be empty".to_string()));
        }
        let resolved = self.config.resolve(url);
        debug!(url = %resolved, "fetching remote contents");
        self.get_text(&resolved).await
    }
}

#[async_trait]
impl UpliftConverter for ReqwestBackend {
    async fn json_uplift(
        &self,
        json_doc: &str,
        context: &str,
    ) -> Result<UpliftResult, BackendError> {
        let bytes = self
            .json_uplift_raw(json_doc, context, OutputSelector::All)
            .await?;
        extract_uplift_archive(&bytes)
    }
}

#[async_trait]
impl ProfileSource for ReqwestBackend {
    async fn profiles(&self) -> Result<ProfileMap, BackendError> {
        let text = self.get_text(&self.config.endpoint("/profiles")).await?;
        serde_json::from_str(&text)
            .map_err(|err| BackendError::Decode(format!("profile listing decode failed: {err}")))
    }
}

#[async_trait]
impl RemoteFetchPolicySource for ReqwestBackend {
    async fn remote_fetch_policy(&self) -> Result<RemoteFetchPolicy, BackendError> {
        let text = self.get_text(&self.config.endpoint("/remote-fetch")).await?;
        serde_json::from_str(&text)
            .map_err(|err| BackendError::Decode(format!("remote fetch policy decode failed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reqwest_backend_new_expected_config_retained() {
        let backend = ReqwestBackend::new(BackendConfig::new("http://backend:8000/"))
            .expect("client should build");
        assert_eq!(
            backend.config().endpoint("/json-uplift"),
            "http://backend:8000/json-uplift"
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reqwest_backend_fetch_blank_url_expected_invalid_input() {
        let backend = ReqwestBackend::new(BackendConfig::default()).expect("client should build");
        let error = backend
            .fetch_text("  ")
            .await
            .expect_err("blank url should be rejected before any request");
        assert!(matches!(error, BackendError::InvalidInput(_)));
    }
}
