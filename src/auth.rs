use crate::error::{ChefError, Result};
use crate::http;
use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// A signed-in user
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    /// Bearer token for the document database, absent for local identities
    pub id_token: Option<String>,
}

impl Identity {
    /// An identity that only exists in this process (offline mode)
    pub fn local() -> Self {
        let user_id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(28)
            .map(char::from)
            .collect();
        Self {
            user_id,
            id_token: None,
        }
    }

    /// Shortened user id for display, e.g. `Logged in as: abcd1234...`
    pub fn short_id(&self) -> String {
        short_user_id(&self.user_id)
    }
}

pub fn short_user_id(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(8).collect();
    format!("{}...", prefix)
}

/// The current sign-in state
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The identity needed for a write, or `AuthenticationRequired` naming `action`
    pub fn require(&self, action: &str) -> Result<&Identity> {
        self.identity.as_ref().ok_or_else(|| {
            ChefError::AuthenticationRequired(format!("You must be logged in to {}.", action))
        })
    }

    pub fn status(&self) -> String {
        match &self.identity {
            Some(identity) => format!("Logged in as: {}", identity.short_id()),
            None => "Not logged in".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    id_token: String,
    local_id: String,
}

/// Anonymous sign-in through the Identity Toolkit REST API
pub struct AnonymousAuth {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnonymousAuth {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: http::client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url,
        }
    }

    /// Give up on requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http::client(timeout);
        self
    }

    pub async fn sign_in(&self) -> Result<Identity> {
        let response = self
            .client
            .post(format!("{}/v1/accounts:signUp", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({ "returnSecureToken": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChefError::from_status("Identity Toolkit", response).await);
        }

        let body: SignUpResponse = response.json().await?;
        debug!("Anonymous sign-in returned uid {}", body.local_id);
        let identity = Identity {
            user_id: body.local_id,
            id_token: Some(body.id_token),
        };
        info!("Logged in as: {}", identity.short_id());
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_require_without_identity() {
        let session = Session::anonymous();
        let err = session.require("save recipes").unwrap_err();
        assert!(matches!(err, ChefError::AuthenticationRequired(_)));
        assert!(err.to_string().contains("You must be logged in to save recipes."));
        assert_eq!(session.status(), "Not logged in");
    }

    #[test]
    fn test_require_with_identity() {
        let session = Session::signed_in(Identity {
            user_id: "abcdefghijkl".to_string(),
            id_token: None,
        });
        assert_eq!(session.require("comment").unwrap().user_id, "abcdefghijkl");
        assert_eq!(session.status(), "Logged in as: abcdefgh...");
    }

    #[test]
    fn test_local_identity() {
        let a = Identity::local();
        let b = Identity::local();
        assert_eq!(a.user_id.len(), 28);
        assert_ne!(a.user_id, b.user_id);
        assert!(a.id_token.is_none());
    }

    #[test]
    fn test_short_user_id_handles_short_ids() {
        assert_eq!(short_user_id("abc"), "abc...");
    }

    #[tokio::test]
    async fn test_sign_in() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/accounts:signUp")
            .match_query(Matcher::UrlEncoded("key".into(), "web-key".into()))
            .match_body(Matcher::Json(serde_json::json!({"returnSecureToken": true})))
            .with_status(200)
            .with_body(r#"{"idToken": "tok", "localId": "uid-123", "expiresIn": "3600"}"#)
            .create_async()
            .await;

        let auth = AnonymousAuth::new("web-key".to_string(), server.url());
        let identity = auth.sign_in().await.unwrap();
        assert_eq!(identity.user_id, "uid-123");
        assert_eq!(identity.id_token.as_deref(), Some("tok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/accounts:signUp")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error": {"message": "ADMIN_ONLY_OPERATION"}}"#)
            .create_async()
            .await;

        let auth = AnonymousAuth::new("web-key".to_string(), server.url());
        let err = auth.sign_in().await.unwrap_err();
        assert!(err.to_string().contains("ADMIN_ONLY_OPERATION"));
    }
}
