pub mod create_provider;
pub mod retry_proxy;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::{BlockTag, ChainId, Result};

pub use create_provider::{bind, resolve_rpc_url, JsonRpcProvider};
pub use retry_proxy::{RetryOptions, RetryProvider};

/// Read-only chain access needed by the multicall aggregator.
#[async_trait]
pub trait EthCaller: Send + Sync {
    async fn chain_id(&self) -> Result<ChainId>;

    async fn eth_call(&self, to: Address, data: Bytes, block: BlockTag) -> Result<Bytes>;
}
