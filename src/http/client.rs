use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{ApiRequest, HttpError, RetryPolicy, Session, Transport};

/// HTTP client for the points API.
///
/// Every request carries the session headers, every response may refresh the
/// session cookie, and failures are retried according to the policy passed in
/// by the call site.
pub struct SessionClient<T> {
    transport: T,
}

impl<T: Transport> SessionClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request, retrying per `policy`, and return the raw response body.
    pub async fn send(
        &self,
        session: &mut Session,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        policy: &RetryPolicy,
    ) -> Result<String, HttpError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let err = match self.send_once(session, method.clone(), url, body).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if !policy.is_retryable(&err) {
                return Err(err);
            }
            if !policy.has_attempts_left(attempts) {
                return Err(HttpError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            warn!(
                "{} {} failed (attempt {}): {}. Retrying in {}s",
                method,
                url,
                attempts,
                err,
                policy.delay.as_secs()
            );
            sleep(policy.delay).await;
        }
    }

    /// Like [`send`](Self::send) but decodes the body as JSON.
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        session: &mut Session,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        policy: &RetryPolicy,
    ) -> Result<R, HttpError> {
        let text = self.send(session, method, url, body, policy).await?;
        serde_json::from_str(&text).map_err(|e| HttpError::Decode(e.to_string()))
    }

    async fn send_once(
        &self,
        session: &mut Session,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String, HttpError> {
        let request = ApiRequest {
            method,
            url: url.to_string(),
            headers: session.request_headers(),
            body: body.cloned(),
        };

        let response = self.transport.execute(request).await?;
        let refreshed = session.absorb_set_cookies(&response.set_cookies);

        if !response.is_success() {
            return Err(HttpError::status(response.status, &response.body));
        }
        if refreshed {
            debug!("Session cookie refreshed by {}", url);
        } else {
            warn!("No set-cookie header in response from {}", url);
        }
        Ok(response.body)
    }
}
