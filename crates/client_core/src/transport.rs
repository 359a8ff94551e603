//! Uniform HTTP call contract shared by every gateway operation.

use std::sync::Arc;

use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde::Serialize;
use serde_json::{Map, Value};
use shared::error::{ErrorBody, ServerError};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::{error::ClientError, session::Session};

/// Placeholder for calls that send no JSON body.
pub const NO_BODY: Option<&()> = None;

pub struct HttpTransport {
    http: Client,
    base_url: Url,
    session: Arc<RwLock<Session>>,
}

impl HttpTransport {
    pub fn new(server_url: &str, session: Arc<RwLock<Session>>) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(server_url.trim())?,
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Sends one request. Non-2xx statuses become [`ServerError`] carrying the body's
    /// `error` text or `fallback`. Bodies that are empty or not JSON decode as `{}`.
    pub async fn call<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        fallback: &'static str,
    ) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self
            .http
            .request(method.clone(), self.endpoint(path))
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.session.read().await.token.clone() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let decoded = decode_body(&text);
        debug!(%method, path, status = status.as_u16(), "api call");

        if !status.is_success() {
            return Err(ServerError::new(
                status.as_u16(),
                error_message(&decoded).unwrap_or_else(|| fallback.to_string()),
            )
            .into());
        }
        Ok(decoded)
    }

    /// Like [`Self::call`], but a 2xx body carrying `error` is also a failure.
    pub async fn call_auth<B>(
        &self,
        path: &str,
        body: &B,
        fallback: &'static str,
    ) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let decoded = self.call(Method::POST, path, &[], Some(body), fallback).await?;
        match error_message(&decoded) {
            Some(message) => Err(ServerError::new(200, message).into()),
            None => Ok(decoded),
        }
    }
}

pub(crate) fn decode_body(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) | Err(_) => Value::Object(Map::new()),
        Ok(value) => value,
    }
}

fn error_message(body: &Value) -> Option<String> {
    serde_json::from_value::<ErrorBody>(body.clone())
        .ok()
        .and_then(|parsed| parsed.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_and_invalid_bodies_decode_as_empty_objects() {
        assert_eq!(decode_body(""), json!({}));
        assert_eq!(decode_body("<html>502</html>"), json!({}));
        assert_eq!(decode_body("null"), json!({}));
        assert_eq!(decode_body("[1]"), json!([1]));
    }

    #[test]
    fn error_text_comes_from_the_error_field() {
        assert_eq!(
            error_message(&json!({ "error": "Invalid token" })).as_deref(),
            Some("Invalid token")
        );
        assert_eq!(error_message(&json!({ "error": "" })), None);
        assert_eq!(error_message(&json!([])), None);
    }

    #[test]
    fn endpoints_ignore_trailing_slashes_on_the_base() {
        let transport = HttpTransport::new(
            "http://localhost:5005/",
            Arc::new(RwLock::new(Session::default())),
        )
        .expect("transport");
        assert_eq!(transport.endpoint("/channel/3"), "http://localhost:5005/channel/3");
        assert!(HttpTransport::new("not a url", Arc::new(RwLock::new(Session::default()))).is_err());
    }
}
