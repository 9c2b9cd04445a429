#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::models::stack::{StackDetail, StackSummary};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: Method,
        path: String,
        status: u16,
        body: String,
    },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid backend url {0:?}")]
    InvalidBaseUrl(String),
    #[error("{0}")]
    Backend(String),
}

/// Narrow interface to the stack backend.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ClientError>;

    async fn get_stack_detail(&self, stack: &StackSummary) -> Result<StackDetail, ClientError>;

    async fn delete_stack(&self, stack: &StackSummary) -> Result<(), ClientError>;

    /// Direct-download link for the stack's CA certificate.
    fn certificate_download_url(&self, stack: &StackSummary) -> String;
}

pub struct HttpResourceClient {
    base: Url,
    http: Client,
    session: Arc<Session>,
}

impl HttpResourceClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<Session>,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidBaseUrl(base_url.to_string()))?;

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base,
            http,
            session,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn stack_endpoint(&self, stack: &StackSummary, suffix: Option<&str>) -> Url {
        let mut segments = vec!["api", "stacks", stack.account.as_str(), stack.name.as_str()];
        segments.extend(suffix);
        self.endpoint(&segments)
    }

    async fn send(&self, method: Method, url: Url) -> Result<reqwest::Response, ClientError> {
        let mut req = self
            .http
            .request(method.clone(), url.clone())
            .header("Accept", "application/json");
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                method,
                path: url.path().to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        Ok(self.send(Method::GET, url).await?.json().await?)
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ClientError> {
        let stacks: Vec<StackSummary> = self.get_json(self.endpoint(&["api", "stacks"])).await?;
        if stacks.iter().any(|s| s.name.is_empty()) {
            return Err(ClientError::Backend("stack list has an entry without a name".into()));
        }
        Ok(stacks)
    }

    async fn get_stack_detail(&self, stack: &StackSummary) -> Result<StackDetail, ClientError> {
        self.get_json(self.stack_endpoint(stack, None)).await
    }

    async fn delete_stack(&self, stack: &StackSummary) -> Result<(), ClientError> {
        self.send(Method::DELETE, self.stack_endpoint(stack, None))
            .await
            .map(|_| ())
    }

    fn certificate_download_url(&self, stack: &StackSummary) -> String {
        self.stack_endpoint(stack, Some("ca")).to_string()
    }
}
