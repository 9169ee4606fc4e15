pub mod abi;
pub mod checks;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod multicall;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod scan;
pub mod tokenlist;
pub mod types;

pub use error::{Result, TokenListError};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use registry::NetworkRegistry;
pub use types::{
    format_address, parse_address, BlockTag, ChainId, FailedToken, LogLevel, NativeToken, Network, NetworkName,
    RunSettings, TokenInfo, TokenKey, TokenRecord, MULTICALL3_ADDRESS, NATIVE_DECIMALS, NATIVE_TOKEN_ADDRESS,
};

// Re-export commonly used items
pub use config::{resolve_config, NormalizedConfig};
pub use multicall::{Call, Multicall, MulticallOutcome};
pub use pipeline::{FailureLedger, GenerationOutcome, TokenListGenerator};
pub use provider::EthCaller;
pub use resolver::{ResolveOutcome, TokenIndex, TokenResolver};
pub use tokenlist::TokenList;
