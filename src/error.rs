use crate::{ChainId, NetworkName};

#[derive(Debug, thiserror::Error)]
pub enum TokenListError {
    #[error("Network information not found for {name}")]
    UnknownNetwork { name: NetworkName },

    #[error("Unsupported chain ID: {chain_id}")]
    UnsupportedChainId { chain_id: ChainId },

    #[error("Multicall address not found for network: {network}")]
    MissingMulticallAddress { network: NetworkName },

    #[error("No RPC endpoint for network {network}: {reason}")]
    MissingRpcEndpoint { network: NetworkName, reason: String },

    #[error("Endpoint for {network} reports chain ID {actual}, expected {expected}")]
    ChainIdMismatch { network: NetworkName, expected: ChainId, actual: ChainId },

    #[error("Duplicate network entry: {0}")]
    DuplicateNetwork(String),

    #[error("Execution reverted: {0}")]
    Revert(String),

    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("HTTP status {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("All {attempts} attempts failed, last error: {last}")]
    AllRetriesFailed { attempts: u32, last: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenListError {
    /// Errors that make a whole network unprocessable. Everything else is
    /// recorded against the affected calls or addresses.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownNetwork { .. }
                | Self::UnsupportedChainId { .. }
                | Self::MissingMulticallAddress { .. }
                | Self::MissingRpcEndpoint { .. }
                | Self::ChainIdMismatch { .. }
                | Self::DuplicateNetwork(_)
        )
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Revert(_))
    }

    /// Transport failures worth another attempt against the same endpoint.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Timeout { .. } | Self::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, TokenListError>;
