use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Error, Result};

pub mod dto;

use dto::{AddressResponse, BlockResponse, EmissionResponse, NodeStateResponse, TransactionResponse};

/// The remote explorer surface the crawler consumes. Requests are stateless
/// and independent; nothing is assumed to be cached on either side.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn node_state(&self) -> Result<NodeStateResponse>;

    async fn block(&self, number: i64) -> Result<BlockResponse>;

    async fn transaction(&self, hash: &str) -> Result<TransactionResponse>;

    async fn address(&self, address: &str) -> Result<AddressResponse>;

    async fn emission(&self) -> Result<String>;

    fn node_state_url(&self) -> String;

    fn emission_url(&self) -> String;

    fn block_url(&self, number: i64) -> String;

    fn transaction_url(&self, hash: &str) -> String;

    fn address_url(&self, address: &str) -> String;
}

#[derive(Clone)]
pub struct HttpExplorerClient {
    http: reqwest::Client,
    explorer_url: Url,
    node_state_url: String,
}

impl HttpExplorerClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            explorer_url: Url::parse(&config.explorer_url)?,
            node_state_url: config.node_state_url.clone(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.explorer_url.as_str().trim_end_matches('/'),
            path
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatusError(url.to_string(), status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ExplorerApi for HttpExplorerClient {
    async fn node_state(&self) -> Result<NodeStateResponse> {
        self.get_json(&self.node_state_url).await
    }

    async fn block(&self, number: i64) -> Result<BlockResponse> {
        self.get_json(&self.block_url(number)).await
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionResponse> {
        self.get_json(&self.transaction_url(hash)).await
    }

    async fn address(&self, address: &str) -> Result<AddressResponse> {
        self.get_json(&self.address_url(address)).await
    }

    async fn emission(&self) -> Result<String> {
        let response: EmissionResponse = self.get_json(&self.emission_url()).await?;
        Ok(response.emission)
    }

    fn node_state_url(&self) -> String {
        self.node_state_url.clone()
    }

    fn emission_url(&self) -> String {
        self.api_url("emission")
    }

    fn block_url(&self, number: i64) -> String {
        self.api_url(&format!("block/{}", number))
    }

    fn transaction_url(&self, hash: &str) -> String {
        self.api_url(&format!("tx/{}", hash))
    }

    fn address_url(&self, address: &str) -> String {
        self.api_url(&format!("a/{}", address))
    }
}
