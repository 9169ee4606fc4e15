use std::{fmt, str::FromStr};

use alloy_primitives::{address, hex, Address};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub type ChainId = u64;
pub type NetworkName = String;

/// Placeholder address standing in for a chain's native coin.
pub const NATIVE_TOKEN_ADDRESS: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// Multicall3, deployed at the same address on every supported chain.
pub const MULTICALL3_ADDRESS: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

pub const NATIVE_DECIMALS: u8 = 18;

const ADDRESS_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeToken {
    pub name: String,
    pub symbol: String,
}

/// A supported chain. Networks are immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: NetworkName,
    pub chain_id: ChainId,
    pub multicall_address: Option<Address>,
    /// Explicit endpoint; when absent the URL comes from the provider template.
    pub rpc_url: Option<Url>,
    /// Directory under `images/` holding this network's logos.
    pub folder_name: String,
    pub native: NativeToken,
}

impl Network {
    pub fn new(name: &str, chain_id: ChainId, folder_name: &str, native_name: &str, native_symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            chain_id,
            multicall_address: Some(MULTICALL3_ADDRESS),
            rpc_url: None,
            folder_name: folder_name.to_string(),
            native: NativeToken {
                name: native_name.to_string(),
                symbol: native_symbol.to_string(),
            },
        }
    }

    pub fn with_rpc_url(mut self, url: Url) -> Self {
        self.rpc_url = Some(url);
        self
    }

    pub fn with_multicall(mut self, multicall: Option<Address>) -> Self {
        self.multicall_address = multicall;
        self
    }

    pub fn native_token_record(&self, logo_uri: Option<String>) -> TokenRecord {
        TokenRecord {
            chain_id: self.chain_id,
            address: format_address(&NATIVE_TOKEN_ADDRESS),
            name: self.native.name.clone(),
            symbol: self.native.symbol.clone(),
            decimals: NATIVE_DECIMALS,
            logo_uri,
            tags: None,
            extensions: None,
        }
    }
}

/// Deduplication key of a token: chain id plus lowercased address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenKey {
    pub chain_id: ChainId,
    pub address: String,
}

impl TokenKey {
    pub fn new(chain_id: ChainId, address: &str) -> Self {
        Self {
            chain_id,
            address: address.to_lowercase(),
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chain_id, self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub chain_id: ChainId,
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl TokenRecord {
    pub fn key(&self) -> TokenKey {
        TokenKey::new(self.chain_id, &self.address)
    }

    /// Whether the on-chain metadata is fully known. Zero decimals count as
    /// unknown, so such tokens are re-queried on every run.
    pub fn has_complete_metadata(&self) -> bool {
        !self.name.is_empty() && !self.symbol.is_empty() && self.decimals != 0
    }
}

/// Metadata read from an ERC20 contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedToken {
    pub address: String,
    pub reason: String,
}

impl FailedToken {
    pub fn new(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

impl BlockTag {
    pub fn as_param(&self) -> Value {
        match self {
            Self::Latest => Value::String("latest".to_string()),
            Self::Number(number) => Value::String(format!("{number:#x}")),
        }
    }
}

/// Parses a 20-byte address, with or without the `0x` prefix.
pub fn parse_address(candidate: &str) -> Option<Address> {
    let bytes = hex::decode(candidate.trim()).ok()?;
    (bytes.len() == ADDRESS_LEN).then(|| Address::from_slice(&bytes))
}

/// Lowercase `0x`-prefixed rendering used as the canonical list address.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Raw run settings as supplied by the environment. Every field is optional;
/// `config::resolve_config` fills in the defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunSettings {
    pub log_level: Option<LogLevel>,
    pub rpc_url_template: Option<String>,
    pub rpc_key: Option<String>,
    pub batch_size: Option<usize>,
    pub retry_count: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub rpc_call_timeout_ms: Option<u64>,
    pub images_dir: Option<String>,
    pub tokenlist_path: Option<String>,
    pub failure_report_path: Option<String>,
    pub logo_base_url: Option<String>,
    pub tokenlist_logo_uri: Option<String>,
    pub published_url: Option<String>,
    pub networks_to_include: Option<Vec<NetworkName>>,
    pub networks_to_ignore: Option<Vec<String>>,
}

impl RunSettings {
    pub fn from_env() -> Self {
        fn var(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        }
        fn parsed<T: FromStr>(key: &str) -> Option<T> {
            var(key).and_then(|v| v.trim().parse().ok())
        }

        Self {
            log_level: parsed("TOKENLIST_LOG_LEVEL"),
            rpc_url_template: var("TOKENLIST_RPC_URL_TEMPLATE"),
            rpc_key: var("DRPC_KEY"),
            batch_size: parsed("TOKENLIST_BATCH_SIZE"),
            retry_count: parsed("TOKENLIST_RETRY_COUNT"),
            retry_delay_ms: parsed("TOKENLIST_RETRY_DELAY_MS"),
            rpc_call_timeout_ms: parsed("TOKENLIST_RPC_TIMEOUT_MS"),
            images_dir: var("TOKENLIST_IMAGES_DIR"),
            tokenlist_path: var("TOKENLIST_PATH"),
            failure_report_path: var("TOKENLIST_FAILURE_REPORT"),
            logo_base_url: var("TOKENLIST_LOGO_BASE_URL"),
            tokenlist_logo_uri: var("TOKENLIST_LOGO_URI"),
            published_url: var("TOKENLIST_PUBLISHED_URL"),
            networks_to_include: None,
            networks_to_ignore: None,
        }
    }
}
