//! `reqwest` implementation of [`ChatApi`].
//!
//! # Status mapping
//!
//! | Reply | Result |
//! |-------|--------|
//! | 2xx | decoded body |
//! | 409 on join | `Ok(())` (already a member) |
//! | 401 | [`ChatError::Unauthorized`], credential cleared |
//! | 404 | [`ChatError::NotFound`] |
//! | other | [`ChatError::Http`] |

use std::sync::Arc;

use huddle_core::{ChatApi, ChatError, Message, Room, RoomId, SessionStore};
use reqwest::{RequestBuilder, Response, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::ClientConfig;

/// Body of `POST /chat/rooms/{id}/messages`.
#[derive(Serialize)]
struct NewMessage<'a> {
    body: &'a str,
}

/// Chat backend reached over HTTP.
pub struct HttpChatApi {
    client: reqwest::Client,
    api_root: String,
    session: Arc<dyn SessionStore>,
}

impl HttpChatApi {
    /// Create a client for `config`, authenticating with `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Transport`] if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(Self { client, api_root: config.api_root(), session })
    }

    /// Absolute URL of an API path.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_root)
    }

    /// Attach common headers and the bearer token, send, and check status.
    async fn execute(&self, request: RequestBuilder, url: &str) -> Result<Response, ChatError> {
        let mut request = request.header(header::ACCEPT, "application/json");
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| request_error(&e, url))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(self.status_error(status, url))
    }

    fn status_error(&self, status: StatusCode, url: &str) -> ChatError {
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(url, "credential rejected; signing out");
                self.session.clear_credential();
                ChatError::Unauthorized
            },
            StatusCode::NOT_FOUND => ChatError::NotFound(url.to_string()),
            _ => ChatError::Http { status: status.as_u16(), url: url.to_string() },
        }
    }
}

/// Map a `reqwest` failure that happened before a status was received.
fn request_error(error: &reqwest::Error, url: &str) -> ChatError {
    if error.is_timeout() {
        ChatError::Timeout
    } else if error.is_decode() {
        ChatError::Decode(error.to_string())
    } else {
        ChatError::Transport(format!("{url}: {error}"))
    }
}

async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ChatError> {
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() { ChatError::Timeout } else { ChatError::Decode(format!("{url}: {e}")) }
    })
}

impl ChatApi for HttpChatApi {
    async fn list_rooms(&self, domain: Option<&str>) -> Result<Vec<Room>, ChatError> {
        let url = self.url("/chat/rooms");
        let mut request = self.client.get(&url);
        if let Some(domain) = domain {
            request = request.query(&[("domain", domain)]);
        }
        let response = self.execute(request, &url).await?;
        decode(response, &url).await
    }

    async fn join_room(&self, room_id: RoomId) -> Result<(), ChatError> {
        let url = self.url(&format!("/chat/rooms/{room_id}/join"));
        match self.execute(self.client.post(&url), &url).await {
            Ok(_) => Ok(()),
            Err(ChatError::Http { status: 409, .. }) => {
                tracing::debug!(%room_id, "already a member");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    async fn fetch_history(&self, room_id: RoomId) -> Result<Vec<Message>, ChatError> {
        let url = self.url(&format!("/chat/rooms/{room_id}/messages"));
        let response = self.execute(self.client.get(&url), &url).await?;
        decode(response, &url).await
    }

    async fn send_message(&self, room_id: RoomId, body: &str) -> Result<Message, ChatError> {
        let url = self.url(&format!("/chat/rooms/{room_id}/messages"));
        let request = self.client.post(&url).json(&NewMessage { body });
        let response = self.execute(request, &url).await?;
        decode(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use huddle_core::{Credential, MemorySession};

    use super::*;

    fn api(session: Arc<MemorySession>) -> HttpChatApi {
        HttpChatApi::new(&ClientConfig::new("http://localhost:9/"), session).unwrap()
    }

    #[test]
    fn urls_are_rooted_under_api() {
        let api = api(Arc::new(MemorySession::new()));
        assert_eq!(api.url("/chat/rooms"), "http://localhost:9/api/chat/rooms");
    }

    #[test]
    fn unauthorized_clears_credential() {
        let session = Arc::new(MemorySession::with_credential(Some(Credential::bearer("t"))));
        let api = api(Arc::clone(&session));

        let error = api.status_error(StatusCode::UNAUTHORIZED, "/x");

        assert_eq!(error, ChatError::Unauthorized);
        assert!(session.credential().is_none());
    }

    #[test]
    fn statuses_map_to_errors() {
        let api = api(Arc::new(MemorySession::new()));

        assert_eq!(api.status_error(StatusCode::NOT_FOUND, "/x"), ChatError::NotFound("/x".into()));
        let error = api.status_error(StatusCode::BAD_GATEWAY, "/x");
        assert_eq!(error, ChatError::Http { status: 502, url: "/x".into() });
        assert!(error.is_transient());
        assert!(!api.status_error(StatusCode::FORBIDDEN, "/x").is_transient());
    }
}
