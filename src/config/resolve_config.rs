use std::{path::PathBuf, time::Duration};

use crate::types::{LogLevel, NetworkName, RunSettings};

pub const DEFAULT_RPC_URL_TEMPLATE: &str = "https://lb.drpc.org/ogrpc?network={network}&dkey={key}";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_LOGO_BASE_URL: &str = "https://cdn.jsdelivr.net/gh/curvefi/curve-assets/images";
pub const DEFAULT_TOKENLIST_LOGO_URI: &str =
    "https://cdn.jsdelivr.net/gh/curvefi/curve-assets/branding/logo.png";

#[derive(Debug, Clone)]
pub struct NormalizedConfig {
    /// Endpoint resolution for networks without an explicit RPC URL
    pub rpc: RpcConfig,
    /// Retry settings for transport-level RPC failures
    pub retry: RetryConfig,
    /// Maximum number of calls per aggregate request
    pub batch_size: usize,
    pub paths: PathsConfig,
    pub list: ListConfig,
    pub selection: SelectionConfig,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Endpoint template with `{network}` and `{key}` placeholders
    pub url_template: String,
    /// Provider key substituted into the template
    pub key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Number of attempts per RPC request
    pub retry_count: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
    /// Timeout for a single attempt
    pub rpc_call_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_delay: Duration::from_millis(500),
            rpc_call_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub images_dir: PathBuf,
    pub tokenlist: PathBuf,
    pub failure_report: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ListConfig {
    /// Base URL token logos are served from; `{base}/{folder}/{address}.png`
    pub logo_base_url: String,
    /// Logo of the list itself
    pub tokenlist_logo_uri: String,
    /// Previously published list, preferred over the local file when set
    pub published_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionConfig {
    pub include: Vec<NetworkName>,
    pub ignore: Vec<String>,
}

pub fn resolve_config(settings: RunSettings) -> NormalizedConfig {
    let retry_defaults = RetryConfig::default();

    NormalizedConfig {
        rpc: RpcConfig {
            url_template: settings
                .rpc_url_template
                .unwrap_or_else(|| DEFAULT_RPC_URL_TEMPLATE.to_string()),
            key: settings.rpc_key,
        },
        retry: RetryConfig {
            retry_count: settings.retry_count.unwrap_or(retry_defaults.retry_count).max(1),
            retry_delay: settings
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.retry_delay),
            rpc_call_timeout: settings
                .rpc_call_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.rpc_call_timeout),
        },
        batch_size: settings.batch_size.filter(|size| *size > 0).unwrap_or(DEFAULT_BATCH_SIZE),
        paths: PathsConfig {
            images_dir: settings.images_dir.unwrap_or_else(|| "images".to_string()).into(),
            tokenlist: settings
                .tokenlist_path
                .unwrap_or_else(|| "curve_tokenlist.json".to_string())
                .into(),
            failure_report: settings
                .failure_report_path
                .unwrap_or_else(|| "failed_tokens_report.json".to_string())
                .into(),
        },
        list: ListConfig {
            logo_base_url: settings
                .logo_base_url
                .unwrap_or_else(|| DEFAULT_LOGO_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            tokenlist_logo_uri: settings
                .tokenlist_logo_uri
                .unwrap_or_else(|| DEFAULT_TOKENLIST_LOGO_URI.to_string()),
            published_url: settings.published_url,
        },
        selection: SelectionConfig {
            include: settings.networks_to_include.unwrap_or_default(),
            ignore: settings
                .networks_to_ignore
                .unwrap_or_else(|| vec!["assets-harmony".to_string()]),
        },
        log_level: settings.log_level.unwrap_or(LogLevel::Info),
    }
}

impl Default for NormalizedConfig {
    fn default() -> Self {
        resolve_config(RunSettings::default())
    }
}
