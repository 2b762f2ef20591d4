//! HTTP client for the member service.
//!
//! Every request carries the configured timeout (10 seconds by default).
//! Non-success responses map onto [`BackendError`] by status, keeping the
//! service's own message (`detail` or `message` field) when it sends one.

use log::debug;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::{BackendError, BackendResult};
use super::{AuthResponse, Backend};
use crate::config::CoreConfig;
use crate::member::{MemberFields, MemberId, MemberPatch, MemberRecord};
use crate::session::{Identity, SessionToken};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RedeemRequest<'a> {
    token: &'a str,
    email: &'a str,
    password: &'a str,
}

/// [`Backend`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for the service at `config.api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CoreConfig) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Member URL with the id percent-encoded as a single path segment.
    fn member_endpoint(&self, id: &MemberId) -> BackendResult<Url> {
        let invalid =
            |detail: String| BackendError::Transport(format!("Invalid member URL: {detail}"));
        let mut url =
            Url::parse(&self.endpoint("/members")).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid(self.base_url.clone()))?
            .push(id.as_str());
        Ok(url)
    }

    /// Sends a request and turns any non-success status into an error.
    async fn send(request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Member service answered {status}");
        Err(status_error(status, &body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

fn transport_error(e: &reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Transport("Request timed out".to_string())
    } else if e.is_decode() {
        BackendError::InvalidResponse(e.to_string())
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Extracts the service's error message from a response body.
///
/// Accepts `{"detail": "..."}`, `{"message": "..."}`, and validation lists
/// of the form `{"detail": [{"msg": "..."}, ...]}`.
fn service_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value.get("detail").or_else(|| value.get("message"))?;

    let text = match message {
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}

fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = service_message(body);
    let or = |fallback: &str| message.clone().unwrap_or_else(|| fallback.to_string());

    match status.as_u16() {
        400 | 422 => BackendError::Input(or("Invalid request")),
        401 | 403 => BackendError::Auth(or("Not authorized")),
        404 => BackendError::NotFound(or("Not found")),
        500..=599 => BackendError::Server(or(&format!("HTTP {}", status.as_u16()))),
        code => BackendError::Transport(format!("Unexpected HTTP status {code}")),
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<AuthResponse> {
        let request = self
            .client
            .post(self.endpoint("/auth/login"))
            .json(&LoginRequest { email, password });
        Self::decode(Self::send(request).await?).await
    }

    async fn redeem_invite(
        &self,
        invite_token: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<()> {
        let request = self.client.post(self.endpoint("/auth/redeem")).json(&RedeemRequest {
            token: invite_token,
            email,
            password,
        });
        Self::send(request).await?;
        Ok(())
    }

    async fn verify_identity(&self, token: &SessionToken) -> BackendResult<Identity> {
        let request = self
            .client
            .get(self.endpoint("/auth/me"))
            .bearer_auth(token.expose());
        Self::decode(Self::send(request).await?).await
    }

    async fn list_members(&self, token: &SessionToken) -> BackendResult<Vec<MemberRecord>> {
        let request = self
            .client
            .get(self.endpoint("/members"))
            .bearer_auth(token.expose());
        Self::decode(Self::send(request).await?).await
    }

    async fn get_member(
        &self,
        token: &SessionToken,
        id: &MemberId,
    ) -> BackendResult<Option<MemberRecord>> {
        let request = self
            .client
            .get(self.member_endpoint(id)?)
            .bearer_auth(token.expose());
        match Self::send(request).await {
            Ok(response) => Self::decode(response).await.map(Some),
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_member(
        &self,
        token: &SessionToken,
        fields: &MemberFields,
    ) -> BackendResult<MemberRecord> {
        let request = self
            .client
            .post(self.endpoint("/members"))
            .bearer_auth(token.expose())
            .json(fields);
        Self::decode(Self::send(request).await?).await
    }

    async fn update_member(
        &self,
        token: &SessionToken,
        id: &MemberId,
        patch: &MemberPatch,
    ) -> BackendResult<MemberRecord> {
        let request = self
            .client
            .patch(self.member_endpoint(id)?)
            .bearer_auth(token.expose())
            .json(patch);
        Self::decode(Self::send(request).await?).await
    }
}
