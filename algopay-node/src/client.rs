//! REST client for the algod v2 API.
//!
//! The node's JSON contract has shifted field naming across API generations
//! (`first-round` vs `firstValid`, `txId` vs `txid`). All of that is absorbed
//! here: responses are normalized into canonical structs at this boundary and
//! nothing downstream ever branches on a field-name variant.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use algopay::encoding;
use algopay::params::{MIN_TXN_FEE, NetworkParameters};

use crate::error::NodeError;

/// Boxed future used by the [`AlgodApi`] trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Header carrying the node API token.
const TOKEN_HEADER: &str = "X-Algo-API-Token";

/// One asset position held by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AssetHolding {
    /// Numeric asset id, normalized across `asset-id`/`assetId` naming.
    #[serde(rename = "asset-id", alias = "assetId")]
    pub asset_id: u64,
    /// Held amount in the asset's base units.
    #[serde(default)]
    pub amount: u64,
}

/// Pending-transaction status as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PendingTransaction {
    /// Round the transaction was confirmed in, if any.
    #[serde(default, rename = "confirmed-round", alias = "confirmedRound")]
    pub confirmed_round: Option<u64>,
    /// Pool rejection reason, if the transaction was kicked out.
    #[serde(default, rename = "pool-error", alias = "poolError")]
    pub pool_error: Option<String>,
}

impl PendingTransaction {
    /// Whether the node reports the transaction as included in a block.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.unwrap_or(0) > 0
    }
}

/// Node operations the checkout flow depends on.
///
/// [`AlgodClient`] is the production implementation; tests substitute stubs
/// to script node behavior without a network.
pub trait AlgodApi: Send + Sync {
    /// Fetches current transaction parameters, normalized and fee-floored.
    fn transaction_params(&self) -> BoxFuture<'_, Result<NetworkParameters, NodeError>>;

    /// Fetches the asset holdings of an account.
    fn account_assets<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<Vec<AssetHolding>, NodeError>>;

    /// Submits a signed transaction blob; returns the transaction id.
    fn submit_raw<'a>(&'a self, signed: &'a [u8]) -> BoxFuture<'a, Result<String, NodeError>>;

    /// Fetches pending-transaction status for a transaction id.
    fn pending_info<'a>(
        &'a self,
        tx_id: &'a str,
    ) -> BoxFuture<'a, Result<PendingTransaction, NodeError>>;

    /// Returns the last committed round.
    fn last_round(&self) -> BoxFuture<'_, Result<u64, NodeError>>;

    /// Waits until a block after `round` is committed; returns the new round.
    fn wait_for_round_after(&self, round: u64) -> BoxFuture<'_, Result<u64, NodeError>>;
}

/// Configuration for [`AlgodClient`].
pub struct NodeConfig {
    /// Node base URL (without trailing slash).
    pub url: String,
    /// Optional API token sent in the `X-Algo-API-Token` header.
    pub token: Option<String>,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Optional pre-configured reqwest client.
    pub http_client: Option<reqwest::Client>,
}

impl NodeConfig {
    /// Creates a config for the given node URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            timeout: Duration::from_secs(30),
            http_client: None,
        }
    }

    /// Sets the API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("url", &self.url)
            .field("has_token", &self.token.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Raw transaction-parameters response across API field-name generations.
#[derive(Debug, Deserialize)]
struct RawTransactionParams {
    #[serde(default, rename = "min-fee", alias = "minFee")]
    min_fee: Option<u64>,
    #[serde(default)]
    fee: Option<u64>,
    #[serde(
        default,
        rename = "first-round",
        alias = "firstRound",
        alias = "firstValid",
        alias = "first-valid"
    )]
    first_round: Option<u64>,
    #[serde(
        default,
        rename = "last-round",
        alias = "lastRound",
        alias = "lastValid",
        alias = "last-valid"
    )]
    last_round: Option<u64>,
    #[serde(default, rename = "genesis-id", alias = "genesisID", alias = "genesisId")]
    genesis_id: Option<String>,
    #[serde(default, rename = "genesis-hash", alias = "genesisHash")]
    genesis_hash: Option<String>,
}

impl RawTransactionParams {
    /// Normalizes into the canonical parameter struct.
    fn normalize(self) -> Result<NetworkParameters, NodeError> {
        let min_fee = self.min_fee.or(self.fee).unwrap_or(MIN_TXN_FEE);
        let first_valid = self
            .first_round
            .ok_or_else(|| NodeError::Parse("transaction params missing first round".into()))?;
        let last_valid = self
            .last_round
            .ok_or_else(|| NodeError::Parse("transaction params missing last round".into()))?;
        let genesis_id = self
            .genesis_id
            .ok_or_else(|| NodeError::Parse("transaction params missing genesis id".into()))?;
        let genesis_hash = self
            .genesis_hash
            .ok_or_else(|| NodeError::Parse("transaction params missing genesis hash".into()))?;
        let genesis_hash = encoding::decode(&genesis_hash)
            .map_err(|e| NodeError::Parse(format!("genesis hash is not base64: {e}")))?;

        let params = NetworkParameters {
            fee: min_fee.max(MIN_TXN_FEE),
            first_valid,
            last_valid,
            genesis_id,
            genesis_hash,
        };
        params
            .validate()
            .map_err(|e| NodeError::Parse(e.to_string()))?;
        Ok(params)
    }
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    #[serde(default)]
    assets: Vec<AssetHolding>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId", alias = "txid")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
struct NodeStatus {
    #[serde(rename = "last-round", alias = "lastRound")]
    last_round: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Async REST client for a single algod node.
pub struct AlgodClient {
    base: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl AlgodClient {
    /// Creates a client from the given configuration.
    #[must_use]
    pub fn new(config: NodeConfig) -> Self {
        let base = config.url.trim_end_matches('/').to_owned();
        let client = config.http_client.unwrap_or_else(|| {
            reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .expect("failed to build reqwest::Client")
        });
        Self {
            base,
            token: config.token,
            client,
        }
    }

    /// Returns the node base URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.base
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// Reads a response body, mapping non-success statuses to [`NodeError::Api`].
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, NodeError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(text);
            return Err(NodeError::Api {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&text).map_err(|e| NodeError::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let response = self
            .request(self.client.get(format!("{}{path}", self.base)))
            .send()
            .await?;
        Self::read(response).await
    }
}

impl std::fmt::Debug for AlgodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgodClient")
            .field("base", &self.base)
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl AlgodApi for AlgodClient {
    fn transaction_params(&self) -> BoxFuture<'_, Result<NetworkParameters, NodeError>> {
        Box::pin(async move {
            let raw: RawTransactionParams = self.get_json("/v2/transactions/params").await?;
            let params = raw.normalize()?;
            tracing::debug!(
                first_valid = params.first_valid,
                last_valid = params.last_valid,
                fee = params.fee,
                "fetched transaction params"
            );
            Ok(params)
        })
    }

    fn account_assets<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<Vec<AssetHolding>, NodeError>> {
        Box::pin(async move {
            let account: RawAccount = self.get_json(&format!("/v2/accounts/{address}")).await?;
            Ok(account.assets)
        })
    }

    fn submit_raw<'a>(&'a self, signed: &'a [u8]) -> BoxFuture<'a, Result<String, NodeError>> {
        Box::pin(async move {
            let response = self
                .request(
                    self.client
                        .post(format!("{}/v2/transactions", self.base))
                        .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
                        .body(signed.to_vec()),
                )
                .send()
                .await?;
            let submitted: SubmitResponse = Self::read(response).await?;
            tracing::info!(tx_id = %submitted.tx_id, "submitted raw transaction");
            Ok(submitted.tx_id)
        })
    }

    fn pending_info<'a>(
        &'a self,
        tx_id: &'a str,
    ) -> BoxFuture<'a, Result<PendingTransaction, NodeError>> {
        Box::pin(async move {
            self.get_json(&format!("/v2/transactions/pending/{tx_id}"))
                .await
        })
    }

    fn last_round(&self) -> BoxFuture<'_, Result<u64, NodeError>> {
        Box::pin(async move {
            let status: NodeStatus = self.get_json("/v2/status").await?;
            Ok(status.last_round)
        })
    }

    fn wait_for_round_after(&self, round: u64) -> BoxFuture<'_, Result<u64, NodeError>> {
        Box::pin(async move {
            let status: NodeStatus = self
                .get_json(&format!("/v2/status/wait-for-block-after/{round}"))
                .await?;
            Ok(status.last_round)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AlgodClient {
        AlgodClient::new(NodeConfig::new(server.uri()))
    }

    #[tokio::test]
    async fn normalizes_kebab_case_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/params"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "fee": 0,
                "min-fee": 1000,
                "first-round": 4000,
                "last-round": 5000,
                "genesis-id": "testnet-v1.0",
                "genesis-hash": algopay::encoding::encode([9u8; 32]),
            })))
            .mount(&server)
            .await;

        let params = client(&server).transaction_params().await.unwrap();
        assert_eq!(params.fee, 1000);
        assert_eq!(params.first_valid, 4000);
        assert_eq!(params.last_valid, 5000);
        assert_eq!(params.genesis_id, "testnet-v1.0");
        assert_eq!(params.genesis_hash, vec![9u8; 32]);
    }

    #[tokio::test]
    async fn normalizes_camel_case_params_and_floors_fee() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/params"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "minFee": 400,
                "firstValid": 10,
                "lastValid": 1010,
                "genesisID": "mainnet-v1.0",
                "genesisHash": algopay::encoding::encode([3u8; 32]),
            })))
            .mount(&server)
            .await;

        let params = client(&server).transaction_params().await.unwrap();
        assert_eq!(params.fee, MIN_TXN_FEE);
        assert_eq!(params.first_valid, 10);
        assert_eq!(params.genesis_id, "mainnet-v1.0");
    }

    #[tokio::test]
    async fn missing_window_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/params"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "min-fee": 1000,
                "genesis-id": "testnet-v1.0",
                "genesis-hash": algopay::encoding::encode([3u8; 32]),
            })))
            .mount(&server)
            .await;

        let err = client(&server).transaction_params().await.unwrap_err();
        assert!(matches!(err, NodeError::Parse(_)));
    }

    #[tokio::test]
    async fn account_assets_accepts_both_id_spellings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/accounts/ADDR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": "ADDR",
                "assets": [
                    {"asset-id": 10458941, "amount": 5},
                    {"assetId": 31566704, "amount": 0},
                ],
            })))
            .mount(&server)
            .await;

        let assets = client(&server).account_assets("ADDR").await.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].asset_id, 10_458_941);
        assert_eq!(assets[1].asset_id, 31_566_704);
    }

    #[tokio::test]
    async fn submit_returns_tx_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/transactions"))
            .and(header("content-type", "application/x-binary"))
            .and(body_bytes(vec![1u8, 2, 3]))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"txId": "ABCDEF"})),
            )
            .mount(&server)
            .await;

        let tx_id = client(&server).submit_raw(&[1, 2, 3]).await.unwrap();
        assert_eq!(tx_id, "ABCDEF");
    }

    #[tokio::test]
    async fn submit_surfaces_node_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/transactions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "message": "TransactionPool.Remember: overspend"
            })))
            .mount(&server)
            .await;

        let err = client(&server).submit_raw(&[1]).await.unwrap_err();
        match err {
            NodeError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("overspend"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn api_token_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/status"))
            .and(header(TOKEN_HEADER, "secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"last-round": 7})),
            )
            .mount(&server)
            .await;

        let client = AlgodClient::new(NodeConfig::new(server.uri()).with_token("secret"));
        assert_eq!(client.last_round().await.unwrap(), 7);
    }
}
