pub mod resolve_config;

pub use resolve_config::{
    resolve_config, ListConfig, NormalizedConfig, PathsConfig, RetryConfig, RpcConfig, SelectionConfig,
    DEFAULT_BATCH_SIZE, DEFAULT_LOGO_BASE_URL, DEFAULT_RPC_URL_TEMPLATE, DEFAULT_TOKENLIST_LOGO_URI,
};
