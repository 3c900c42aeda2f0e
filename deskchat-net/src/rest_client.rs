//! JSON client for the admin API.
//!
//! Every response body is wrapped as `{ "data": ... }`; failures carry
//! `{ "message": ... }`. The bearer token is injected on each request when
//! one is set.

use crate::config::NetConfig;
use crate::error::{NetError, NetResult};
use deskchat_types::wire::DataEnvelope;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Shown when a failed response carries no usable `message`.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the admin API. Clones share the token.
#[derive(Clone)]
pub struct AdminRestClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl AdminRestClient {
    pub fn new(config: &NetConfig) -> NetResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(
            client,
            config.api_base_url.clone(),
            config.bearer_token.clone(),
        ))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ── Verbs ──

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> NetResult<T> {
        let req = self.client.get(self.url(path));
        self.send_json(req).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> NetResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.post(self.url(path)).json(body);
        self.send_json(req).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> NetResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.put(self.url(path)).json(body);
        self.send_json(req).await
    }

    /// Deletes a resource. The response body, if any, is ignored.
    pub async fn delete(&self, path: &str) -> NetResult<()> {
        let req = self.client.delete(self.url(path));
        self.send(req).await?;
        Ok(())
    }

    // ── Plumbing ──

    async fn send(&self, req: RequestBuilder) -> NetResult<Response> {
        let req = match self.token.read().await.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
        debug!("admin API returned {status}: {message}");
        Err(NetError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> NetResult<T> {
        let resp = self.send(req).await?;
        let bytes = resp.bytes().await?;
        let envelope: DataEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }
}
