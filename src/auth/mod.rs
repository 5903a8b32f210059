//! Wallet login handshake against the points API.
//!
//! 1. `initiate`: post the address with `process=token`; the server answers with
//!    an opaque challenge. Not retried: a failure here means misconfiguration.
//! 2. `encode_challenge`: hex-encode the challenge as a `0x` string.
//! 3. `verify`: sign the challenge and post the signature with
//!    `process=verify`, retrying any failure until the server accepts it.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::chain::{MessageSigner, WalletError};
use crate::http::{HttpError, RetryPolicy, Session, SessionClient, Transport};

pub const LOGIN_PATH: &str = "/accounts/metamask/login/";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Http(#[from] HttpError),

    #[error("could not sign login challenge: {0}")]
    Signing(#[from] WalletError),

    #[error("login challenge is not valid hex: {0}")]
    BadChallenge(String),
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    account: &'a str,
    invite_code: &'a str,
    process: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginTokenResponse {
    data: String,
}

/// Drives the two-phase login for one wallet at a time.
pub struct AuthProtocol<'a, T> {
    client: &'a SessionClient<T>,
    login_url: String,
    invite_code: &'a str,
    verify_policy: &'a RetryPolicy,
}

impl<'a, T: Transport> AuthProtocol<'a, T> {
    pub fn new(
        client: &'a SessionClient<T>,
        base_url: &str,
        invite_code: &'a str,
        verify_policy: &'a RetryPolicy,
    ) -> Self {
        Self {
            client,
            login_url: format!("{}{}", base_url.trim_end_matches('/'), LOGIN_PATH),
            invite_code,
            verify_policy,
        }
    }

    /// Run the whole handshake. Returns the server's verify payload.
    pub async fn login<S: MessageSigner>(
        &self,
        session: &mut Session,
        wallet: &S,
    ) -> Result<serde_json::Value, AuthError> {
        let challenge = self.initiate(session, wallet.address()).await?;
        let encoded = encode_challenge(&challenge);
        let payload = self.verify(session, wallet, &encoded).await?;
        info!("Logged in as {}", wallet.address());
        Ok(payload)
    }

    /// Ask the server for a login challenge.
    pub async fn initiate(
        &self,
        session: &mut Session,
        address: &str,
    ) -> Result<String, AuthError> {
        let body = serde_json::to_value(LoginRequest {
            account: address,
            invite_code: self.invite_code,
            process: "token",
            login_token: None,
        })
        .map_err(|e| HttpError::Decode(e.to_string()))?;

        let response: LoginTokenResponse = self
            .client
            .send_json(session, Method::POST, &self.login_url, Some(&body), &RetryPolicy::none())
            .await?;
        debug!("Received login challenge for {}", address);
        Ok(response.data)
    }

    /// Sign the encoded challenge and submit it until the server accepts.
    pub async fn verify<S: MessageSigner>(
        &self,
        session: &mut Session,
        wallet: &S,
        encoded_challenge: &str,
    ) -> Result<serde_json::Value, AuthError> {
        // The wallet signs the bytes the hex string stands for
        let message = hex::decode(encoded_challenge.trim_start_matches("0x"))
            .map_err(|e| AuthError::BadChallenge(e.to_string()))?;
        let signature = wallet.sign_message(&message)?;

        let body = serde_json::to_value(LoginRequest {
            account: wallet.address(),
            invite_code: self.invite_code,
            process: "verify",
            login_token: Some(signature.as_str()),
        })
        .map_err(|e| HttpError::Decode(e.to_string()))?;

        let text = self
            .client
            .send(session, Method::POST, &self.login_url, Some(&body), self.verify_policy)
            .await?;
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}

/// Hex-encode a challenge string: two lowercase hex digits per byte, `0x` prefix.
pub fn encode_challenge(challenge: &str) -> String {
    format!("0x{}", hex::encode(challenge.as_bytes()))
}

/// Inverse of [`encode_challenge`].
pub fn decode_challenge(encoded: &str) -> Result<String, AuthError> {
    let bytes = hex::decode(encoded.strip_prefix("0x").unwrap_or(encoded))
        .map_err(|e| AuthError::BadChallenge(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AuthError::BadChallenge(e.to_string()))
}
