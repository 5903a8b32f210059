//! Per-account RPC endpoint catalog.

use reqwest::Method;
use serde::Deserialize;

use crate::http::{HttpError, RetryPolicy, Session, SessionClient, Transport};

pub const PROFILE_PATH: &str = "/api/v1/users/me";

/// Label substring (case-insensitive) marking a production endpoint.
const MAINNET_LABEL: &str = "mainnet";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChainUrl {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChainEntry {
    pub name: String,
    #[serde(default)]
    pub urls: Vec<ChainUrl>,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    #[serde(default)]
    chains: Option<Vec<ChainEntry>>,
}

/// Reads the authenticated account's chain catalog.
pub struct RpcFetcher<'a, T> {
    client: &'a SessionClient<T>,
    profile_url: String,
    policy: &'a RetryPolicy,
}

impl<'a, T: Transport> RpcFetcher<'a, T> {
    pub fn new(client: &'a SessionClient<T>, base_url: &str, policy: &'a RetryPolicy) -> Self {
        Self {
            client,
            profile_url: format!("{}{}", base_url.trim_end_matches('/'), PROFILE_PATH),
            policy,
        }
    }

    /// Fetch the catalog; a profile without chains yields an empty list.
    pub async fn fetch(&self, session: &mut Session) -> Result<Vec<ChainEntry>, HttpError> {
        let profile: UserProfile = self
            .client
            .send_json(session, Method::GET, &self.profile_url, None, self.policy)
            .await?;
        Ok(profile.chains.unwrap_or_default())
    }
}

/// `(chain name, url)` for every endpoint labelled as mainnet, in catalog order.
pub fn mainnet_endpoints(chains: &[ChainEntry]) -> Vec<(String, String)> {
    chains
        .iter()
        .flat_map(|chain| {
            chain
                .urls
                .iter()
                .filter(|url| url.name.to_lowercase().contains(MAINNET_LABEL))
                .map(move |url| (chain.name.clone(), url.value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{network_error, reply, ScriptedTransport};
    use crate::http::{BAD_GATEWAY, DEFAULT_RETRY_DELAY};
    use reqwest::header::HeaderMap;
    use serde_json::json;

    fn selective() -> RetryPolicy {
        RetryPolicy::on_statuses([BAD_GATEWAY], DEFAULT_RETRY_DELAY)
    }

    fn catalog() -> serde_json::Value {
        json!({
            "chains": [
                {"name": "eth", "urls": [
                    {"name": "Mainnet RPC", "value": "https://x"},
                    {"name": "Testnet RPC", "value": "https://y"}
                ]}
            ]
        })
    }

    #[test]
    fn test_mainnet_filtering() {
        let chains: Vec<ChainEntry> = serde_json::from_value(catalog()["chains"].clone()).unwrap();
        assert_eq!(
            mainnet_endpoints(&chains),
            vec![("eth".to_string(), "https://x".to_string())]
        );
    }

    #[test]
    fn test_mainnet_match_is_case_insensitive_substring() {
        let chains = vec![ChainEntry {
            name: "near".to_string(),
            urls: vec![
                ChainUrl {
                    name: "NEAR MAINNET (archive)".to_string(),
                    value: "https://a".to_string(),
                },
                ChainUrl { name: "mainnet-ws".to_string(), value: "wss://b".to_string() },
                ChainUrl { name: "Testnet".to_string(), value: "https://c".to_string() },
            ],
        }];
        let found = mainnet_endpoints(&chains);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1], ("near".to_string(), "wss://b".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_bad_gateway() {
        let client = SessionClient::new(ScriptedTransport::new(vec![
            reply(502, json!({})),
            reply(502, json!({})),
            reply(200, catalog()),
        ]));
        let policy = selective();
        let fetcher = RpcFetcher::new(&client, "https://api.test", &policy);
        let mut session = Session::new(HeaderMap::new());

        let chains = fetcher.fetch(&mut session).await.unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].name, "eth");

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].url, "https://api.test/api/v1/users/me");
    }

    #[tokio::test]
    async fn test_fetch_fails_fast_on_not_found() {
        let client = SessionClient::new(ScriptedTransport::new(vec![reply(404, json!({}))]));
        let policy = selective();
        let fetcher = RpcFetcher::new(&client, "https://api.test", &policy);
        let mut session = Session::new(HeaderMap::new());

        let err = fetcher.fetch(&mut session).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_propagates_network_errors() {
        let client = SessionClient::new(ScriptedTransport::new(vec![network_error()]));
        let policy = selective();
        let fetcher = RpcFetcher::new(&client, "https://api.test", &policy);
        let mut session = Session::new(HeaderMap::new());

        assert!(matches!(
            fetcher.fetch(&mut session).await,
            Err(HttpError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_or_null_chains_is_empty() {
        let client = SessionClient::new(ScriptedTransport::new(vec![
            reply(200, json!({"username": "x"})),
            reply(200, json!({"chains": null})),
        ]));
        let policy = selective();
        let fetcher = RpcFetcher::new(&client, "https://api.test", &policy);
        let mut session = Session::new(HeaderMap::new());

        assert!(fetcher.fetch(&mut session).await.unwrap().is_empty());
        assert!(fetcher.fetch(&mut session).await.unwrap().is_empty());
    }
}
