//! HttpTransport - the chat API over HTTPS.
//!
//! Every operation is a JSON POST to `{base_url}/mobile/<name>.json`.

use super::{Transport, TransportError};
use async_trait::async_trait;
use chat_types::{
    decode, encode, AccountDataRequest, AccountDataResponse, AccountUsers, ApiFailure, ChatPass,
    ChatToken, ChatsByUser, ChatsRequest, ChatsResponse, CreateChatRequest, CreateChatResponse,
    Destination, GetTokenRequest, GetTokenResponse, Username,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://www.hackmud.com";

const GET_TOKEN_PATH: &str = "/mobile/get_token.json";
const ACCOUNT_DATA_PATH: &str = "/mobile/account_data.json";
const CHATS_PATH: &str = "/mobile/chats.json";
const CREATE_CHAT_PATH: &str = "/mobile/create_chat.json";

/// Configuration for HttpTransport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Scheme and host the `/mobile/*` paths are appended to.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// HttpTransport implements the Transport trait with reqwest.
///
/// # Example
///
/// ```ignore
/// let transport = HttpTransport::new()?;
/// let token = transport.exchange_token(&ChatPass::new("ab3de")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the production API.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a transport with custom configuration.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::new(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests go to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", path);

        let body = encode(body)
            .map_err(|e| TransportError::new(format!("{path} failed to encode request: {e}")))?;

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::new(format!("{path} request failed: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::new(format!("{path} failed to read body: {e}")))?;

        interpret_response(path, status, &text)
    }
}

/// Turn a status and body into a typed payload or a [`TransportError`].
///
/// For status >= 400 the error is the service's own message when the body is
/// `{"ok": false, "msg": ...}`, otherwise `"<path> <status> <body>"`. A 2xx
/// body with `ok: false` is a rejection too.
fn interpret_response<Resp: DeserializeOwned>(
    path: &str,
    status: u16,
    body: &str,
) -> Result<Resp, TransportError> {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let failure = parsed.as_ref().and_then(ApiFailure::from_value);

    if status >= 400 {
        if let Some(failure) = failure {
            return Err(TransportError::new(failure.msg));
        }
        let shown = match parsed {
            Some(value) => value.to_string(),
            None => serde_json::Value::String(body.to_string()).to_string(),
        };
        return Err(TransportError::new(format!("{path} {status} {shown}")));
    }

    if let Some(failure) = failure {
        return Err(TransportError::new(failure.msg));
    }

    decode(body).map_err(|e| TransportError::new(format!("{path} malformed response: {e}")))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange_token(&self, pass: &ChatPass) -> Result<ChatToken, TransportError> {
        let request = GetTokenRequest { pass: pass.clone() };
        let response: GetTokenResponse = self.post(GET_TOKEN_PATH, &request).await?;
        Ok(response.chat_token)
    }

    async fn fetch_account_data(
        &self,
        token: &ChatToken,
    ) -> Result<AccountUsers, TransportError> {
        let request = AccountDataRequest {
            chat_token: token.clone(),
        };
        let response: AccountDataResponse = self.post(ACCOUNT_DATA_PATH, &request).await?;
        Ok(response.users)
    }

    async fn fetch_chats(
        &self,
        token: &ChatToken,
        usernames: &[Username],
        after: i64,
    ) -> Result<ChatsByUser, TransportError> {
        let request = ChatsRequest {
            chat_token: token.clone(),
            usernames: usernames.to_vec(),
            before: None,
            after: Some(after),
        };
        let response: ChatsResponse = self.post(CHATS_PATH, &request).await?;
        Ok(response.chats)
    }

    async fn send_chat(
        &self,
        token: &ChatToken,
        sender: &str,
        msg: &str,
        destination: &Destination,
    ) -> Result<(), TransportError> {
        let request = CreateChatRequest {
            chat_token: token.clone(),
            username: sender.to_string(),
            msg: msg.to_string(),
            destination: destination.clone(),
        };
        let _: CreateChatResponse = self.post(CREATE_CHAT_PATH, &request).await?;
        Ok(())
    }
}
