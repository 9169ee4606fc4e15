use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TokenRecord;

pub const DEFAULT_LIST_NAME: &str = "Curve Token List";

fn default_list_name() -> String {
    DEFAULT_LIST_NAME.to_string()
}

fn default_keywords() -> Vec<String> {
    vec!["curve".to_string(), "defi".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Default for Version {
    fn default() -> Self {
        Self { major: 1, minor: 0, patch: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinition {
    pub name: String,
    pub description: String,
}

/// Uniswap-style token list document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenList {
    #[serde(default = "default_list_name")]
    pub name: String,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, TagDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
    /// `"{chainId}_{lowercase address}"` → token
    #[serde(default)]
    pub token_map: BTreeMap<String, TokenRecord>,
    #[serde(default)]
    pub version: Version,
}

impl Default for TokenList {
    fn default() -> Self {
        Self {
            name: default_list_name(),
            logo_uri: None,
            keywords: default_keywords(),
            tags: BTreeMap::new(),
            timestamp: None,
            tokens: Vec::new(),
            token_map: BTreeMap::new(),
            version: Version::default(),
        }
    }
}

impl TokenList {
    pub fn find(&self, chain_id: crate::ChainId, address: &str) -> Option<&TokenRecord> {
        self.token_map
            .get(&crate::TokenKey::new(chain_id, address).to_string())
            .or_else(|| {
                self.tokens
                    .iter()
                    .find(|token| token.chain_id == chain_id && token.address.eq_ignore_ascii_case(address))
            })
    }
}
