use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::{
    config::{RetryConfig, RpcConfig},
    provider::{EthCaller, RetryOptions, RetryProvider},
    BlockTag, ChainId, Network, Result, TokenListError,
};

/// HTTP JSON-RPC connection bound to one network. Nothing is sent until the
/// first call.
#[derive(Debug)]
pub struct JsonRpcProvider {
    network: Network,
    transport: RetryProvider,
    chain_id: parking_lot::RwLock<Option<ChainId>>,
}

impl JsonRpcProvider {
    pub fn new(network: Network, url: Url, options: RetryOptions) -> Self {
        Self {
            network,
            transport: RetryProvider::new(url, options),
            chain_id: parking_lot::RwLock::new(None),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn url(&self) -> &Url {
        self.transport.url()
    }
}

/// Endpoint for `network`: its explicit override, else the provider template.
pub fn resolve_rpc_url(network: &Network, rpc: &RpcConfig) -> Result<Url> {
    if let Some(url) = &network.rpc_url {
        return Ok(url.clone());
    }

    let missing = |reason: String| TokenListError::MissingRpcEndpoint {
        network: network.name.clone(),
        reason,
    };

    let mut formatted = rpc.url_template.replace("{network}", &network.name);
    if formatted.contains("{key}") {
        let key = rpc
            .key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| missing("provider key is not set (DRPC_KEY)".to_string()))?;
        formatted = formatted.replace("{key}", key);
    }

    Url::parse(&formatted).map_err(|e| missing(format!("invalid endpoint URL: {e}")))
}

pub fn bind(network: &Network, rpc: &RpcConfig, retry: &RetryConfig) -> Result<JsonRpcProvider> {
    let url = resolve_rpc_url(network, rpc)?;
    tracing::debug!(
        network = %network.name,
        chain_id = network.chain_id,
        host = url.host_str().unwrap_or_default(),
        "Bound RPC provider"
    );
    Ok(JsonRpcProvider::new(network.clone(), url, RetryOptions::from(retry)))
}

fn parse_quantity(value: &serde_json::Value) -> Result<u64> {
    let raw = value
        .as_str()
        .ok_or_else(|| TokenListError::Decode(format!("expected hex quantity, got {value}")))?;
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| TokenListError::Decode(format!("invalid hex quantity {raw}: {e}")))
}

#[async_trait]
impl EthCaller for JsonRpcProvider {
    async fn chain_id(&self) -> Result<ChainId> {
        let cached = *self.chain_id.read();
        if let Some(chain_id) = cached {
            return Ok(chain_id);
        }

        let value = self.transport.send_request("eth_chainId", json!([])).await?;
        let chain_id = parse_quantity(&value)?;
        if chain_id != self.network.chain_id {
            return Err(TokenListError::ChainIdMismatch {
                network: self.network.name.clone(),
                expected: self.network.chain_id,
                actual: chain_id,
            });
        }

        *self.chain_id.write() = Some(chain_id);
        Ok(chain_id)
    }

    async fn eth_call(&self, to: Address, data: Bytes, block: BlockTag) -> Result<Bytes> {
        let params = json!([{ "to": to, "data": data }, block.as_param()]);
        let value = self.transport.send_request("eth_call", params).await?;
        Ok(serde_json::from_value(value)?)
    }
}
