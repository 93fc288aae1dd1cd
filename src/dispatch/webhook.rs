//! HTTP webhook dispatcher

use super::{BackendDispatcher, DispatchError, DispatchRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;

/// Header carrying the backend API key, when one is configured
const API_KEY_HEADER: &str = "X-API-Key";

/// Posts player messages to the workflow webhook as JSON
pub struct WebhookDispatcher {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl WebhookDispatcher {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl BackendDispatcher for WebhookDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<Map<String, Value>, DispatchError> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;

        parse_response(status, &body)
    }
}

fn classify_transport_error(e: reqwest::Error) -> DispatchError {
    if e.is_timeout() {
        DispatchError::timeout(format!("Backend did not answer in time: {e}"))
    } else {
        DispatchError::network(format!("Could not reach the backend: {e}"))
    }
}

/// Turn a raw backend response into its JSON object
fn parse_response(status: StatusCode, body: &str) -> Result<Map<String, Value>, DispatchError> {
    if !status.is_success() {
        return Err(
            DispatchError::status(format!("Backend returned unexpected status: {}", status.as_u16()))
                .with_body(body),
        );
    }

    let value: Value = serde_json::from_str(body).map_err(|_| {
        DispatchError::invalid_json("Backend response is not valid JSON").with_body(body)
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DispatchError::invalid_payload("Backend response is not a JSON object").with_body(body)),
    }
}
