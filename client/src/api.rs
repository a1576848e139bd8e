//! Typed HTTP client for the authentication API. Every call unwraps the
//! server's response envelope and maps failures onto [`ClientError`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response to signup and login: the user plus a fresh token pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|err| ClientError::Decode(err.to_string()))?;

        if envelope.success {
            envelope
                .data
                .ok_or_else(|| ClientError::Decode("success response without data".into()))
        } else {
            Err(ClientError::Api {
                status,
                message: envelope
                    .error
                    .unwrap_or_else(|| "Unknown server error".into()),
                code: envelope.code,
            })
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Self::unwrap_envelope(response).await
    }

    async fn post_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Self::unwrap_envelope(response).await
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthPayload, ClientError> {
        self.post(
            "/api/signup",
            &serde_json::json!({
                "email": email,
                "password": password,
                "fullName": full_name,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        self.post(
            "/api/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
        self.post(
            "/api/refresh",
            &serde_json::json!({ "refreshToken": refresh_token }),
        )
        .await
    }

    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<ServerMessage, ClientError> {
        self.post(
            "/api/logout",
            &serde_json::json!({ "refreshToken": refresh_token }),
        )
        .await
    }

    pub async fn logout_all(&self, access_token: &str) -> Result<ServerMessage, ClientError> {
        self.post_authed("/api/logout-all", access_token, &serde_json::json!({}))
            .await
    }

    pub async fn reset_password(&self, email: &str) -> Result<ServerMessage, ClientError> {
        self.post(
            "/api/reset-password",
            &serde_json::json!({ "email": email }),
        )
        .await
    }

    pub async fn update_password(
        &self,
        access_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<ServerMessage, ClientError> {
        let response = self
            .http
            .put(format!("{}/api/update-password", self.base_url))
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "currentPassword": current_password,
                "newPassword": new_password,
            }))
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Self::unwrap_envelope(response).await
    }

    pub async fn profile(&self, access_token: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/profile", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Self::unwrap_envelope(response).await
    }
}
