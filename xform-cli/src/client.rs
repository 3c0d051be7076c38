//! HTTP implementation of [`Workspace`] against the transformations API.
//!
//! Every request carries basic auth built from the account email and access
//! token, and the `transformationAction` user agent. Nothing is retried.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::{general_purpose, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use xform_core::{EntityId, EntityKind, RemoteEntity, TestSuite, TestSuiteResult, WriteReceipt};
use xform_sync::{EntityDraft, Operation, RemoteError, Workspace};

pub const DEFAULT_ENDPOINT: &str = "https://api.rudderstack.com";
const USER_AGENT: &str = "transformationAction";

/// Connection settings for [`HttpWorkspace`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub endpoint: String,
    pub email: String,
    pub access_token: String,
    pub timeout: Duration,
}

pub struct HttpWorkspace {
    agent: ureq::Agent,
    base: Url,
    authorization: String,
}

#[derive(Deserialize)]
struct TestResponse {
    result: TestSuiteResult,
}

impl HttpWorkspace {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut base = Url::parse(&config.endpoint)
            .with_context(|| format!("invalid server endpoint '{}'", config.endpoint))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let credentials = format!("{}:{}", config.email, config.access_token);
        let authorization = format!("Basic {}", general_purpose::STANDARD.encode(credentials));

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build();

        Ok(Self {
            agent,
            base,
            authorization,
        })
    }

    fn url(&self, operation: Operation, path: &str) -> Result<Url, RemoteError> {
        self.base.join(path).map_err(|e| {
            RemoteError::new(operation, None, format!("invalid request path '{path}': {e}"))
        })
    }

    fn get<T: DeserializeOwned>(&self, operation: Operation, path: &str) -> Result<T, RemoteError> {
        let url = self.url(operation, path)?;
        tracing::debug!("GET {url}");
        let response = self
            .agent
            .get(url.as_str())
            .set("Authorization", &self.authorization)
            .call()
            .map_err(|e| remote_error(operation, e))?;
        decode(operation, response)
    }

    fn post<T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
        body: &Value,
    ) -> Result<T, RemoteError> {
        let url = self.url(operation, path)?;
        tracing::debug!("POST {url}");
        let response = self
            .agent
            .post(url.as_str())
            .set("Authorization", &self.authorization)
            .send_json(body)
            .map_err(|e| remote_error(operation, e))?;
        decode(operation, response)
    }
}

impl Workspace for HttpWorkspace {
    fn list(&self, kind: EntityKind) -> Result<Vec<RemoteEntity>, RemoteError> {
        let operation = Operation::List(kind);
        let mut body: Value = self.get(operation, collection(kind))?;
        let entities = body
            .get_mut(collection(kind))
            .map(Value::take)
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(entities).map_err(|e| {
            RemoteError::new(operation, None, format!("unexpected list response: {e}"))
        })
    }

    fn create(
        &self,
        kind: EntityKind,
        draft: &EntityDraft<'_>,
    ) -> Result<WriteReceipt, RemoteError> {
        let body = json!({
            "name": draft.name,
            "description": draft.description,
            "code": draft.code,
            "language": draft.language,
        });
        let path = format!("{}?publish=false", collection(kind));
        self.post(Operation::Create(kind), &path, &body)
    }

    fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        draft: &EntityDraft<'_>,
    ) -> Result<WriteReceipt, RemoteError> {
        let body = json!({
            "description": draft.description,
            "code": draft.code,
            "language": draft.language,
        });
        let path = format!("{}/{id}?publish=false", collection(kind));
        self.post(Operation::Update(kind), &path, &body)
    }

    fn test(&self, suite: &TestSuite) -> Result<TestSuiteResult, RemoteError> {
        let body = serde_json::to_value(suite)
            .map_err(|e| RemoteError::new(Operation::Test, None, e.to_string()))?;
        let response: TestResponse =
            self.post(Operation::Test, "transformations/libraries/test", &body)?;
        Ok(response.result)
    }

    fn publish(&self, suite: &TestSuite, commit_id: &str) -> Result<(), RemoteError> {
        let body = json!({
            "transformations": suite.transformations,
            "libraries": suite.libraries,
            "commitId": commit_id,
        });
        let _: Value = self.post(Operation::Publish, "transformations/libraries/publish", &body)?;
        Ok(())
    }
}

fn collection(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Transformation => "transformations",
        EntityKind::Library => "libraries",
    }
}

fn decode<T: DeserializeOwned>(
    operation: Operation,
    response: ureq::Response,
) -> Result<T, RemoteError> {
    let status = response.status();
    let text = response
        .into_string()
        .map_err(|e| RemoteError::new(operation, Some(status), e.to_string()))?;
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text).map_err(|e| {
        RemoteError::new(operation, Some(status), format!("unexpected response body: {e}"))
    })
}

fn remote_error(operation: Operation, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            RemoteError::new(operation, Some(status), body)
        }
        ureq::Error::Transport(transport) => {
            RemoteError::new(operation, None, transport.to_string())
        }
    }
}
