use std::{
    collections::{BTreeMap, HashSet},
    sync::LazyLock,
};

use regex::Regex;

use crate::{
    parse_address,
    provider::EthCaller,
    resolver::{TokenIndex, TokenResolver},
    scan::ImageScan,
    tokenlist::TokenList,
    ChainId, Network, NetworkName, NetworkRegistry, Result, TokenKey, TokenRecord, NATIVE_DECIMALS,
    NATIVE_TOKEN_ADDRESS,
};

static ASSET_ICON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^images/assets(-[a-z]+)*/[a-z0-9]+\.png$").expect("valid regex"));

const EXCLUDED_FILES: [&str; 3] = ["poetry.lock", "curve_tokenlist.json", "pyproject.toml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCoverage {
    pub network: NetworkName,
    /// Logo addresses present in the list.
    pub in_list: usize,
    /// Logo addresses absent from the list, sorted.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    pub networks: Vec<NetworkCoverage>,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.networks.iter().all(|network| network.missing.is_empty())
    }

    pub fn total_in_list(&self) -> usize {
        self.networks.iter().map(|network| network.in_list).sum()
    }

    pub fn total_missing(&self) -> usize {
        self.networks.iter().map(|network| network.missing.len()).sum()
    }

    pub fn log_summary(&self) {
        for network in &self.networks {
            if network.missing.is_empty() {
                tracing::info!(network = %network.network, in_list = network.in_list, "Coverage complete");
            } else {
                tracing::error!(
                    network = %network.network,
                    in_list = network.in_list,
                    missing = network.missing.len(),
                    addresses = %network.missing.join(", "),
                    "Tokens missing from list"
                );
            }
        }
        tracing::info!(in_list = self.total_in_list(), missing = self.total_missing(), "Total");
    }
}

/// Compares every registry network's logos with the list entries for its
/// chain. Folders without a registry network are not checked.
pub fn check_coverage(scan: &ImageScan, registry: &NetworkRegistry, list: &TokenList) -> CoverageReport {
    let listed: HashSet<TokenKey> = list.tokens.iter().map(TokenRecord::key).collect();

    let networks = registry
        .iter()
        .filter_map(|network| {
            let folder = scan.for_network(network)?;
            let (present, missing): (Vec<_>, Vec<_>) = folder
                .addresses
                .iter()
                .partition(|address| listed.contains(&TokenKey::new(network.chain_id, address)));
            Some(NetworkCoverage {
                network: network.name.clone(),
                in_list: present.len(),
                missing: missing.into_iter().cloned().collect(),
            })
        })
        .collect();

    CoverageReport { networks }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMismatch {
    pub chain_id: ChainId,
    pub address: String,
    pub reason: String,
}

impl TokenMismatch {
    fn new(token: &TokenRecord, reason: impl Into<String>) -> Self {
        Self {
            chain_id: token.chain_id,
            address: token.address.clone(),
            reason: reason.into(),
        }
    }
}

/// Tokens of `current` whose key does not appear in `cached`.
pub fn new_tokens<'a>(current: &'a TokenList, cached: &TokenList) -> Vec<&'a TokenRecord> {
    let known: HashSet<TokenKey> = cached.tokens.iter().map(TokenRecord::key).collect();
    current
        .tokens
        .iter()
        .filter(|token| !known.contains(&token.key()))
        .collect()
}

/// Re-reads the metadata of tokens added since `cached` and reports every
/// token whose name, symbol or decimals disagree with the chain.
pub async fn verify_new_tokens<F>(
    current: &TokenList,
    cached: &TokenList,
    resolver: &TokenResolver,
    binder: F,
) -> Vec<TokenMismatch>
where
    F: Fn(&Network) -> Result<Box<dyn EthCaller>>,
{
    let registry = resolver.multicall().registry();
    let mut by_chain: BTreeMap<ChainId, Vec<&TokenRecord>> = BTreeMap::new();
    for token in new_tokens(current, cached) {
        by_chain.entry(token.chain_id).or_default().push(token);
    }

    let mut mismatches = Vec::new();
    for (chain_id, tokens) in by_chain {
        let network = match registry.lookup_by_chain_id(chain_id) {
            Ok(network) => network,
            Err(e) => {
                mismatches.extend(tokens.iter().map(|token| TokenMismatch::new(token, e.to_string())));
                continue;
            }
        };

        let (native, erc20): (Vec<_>, Vec<_>) = tokens
            .into_iter()
            .partition(|token| parse_address(&token.address) == Some(NATIVE_TOKEN_ADDRESS));
        for token in native {
            if token.name != network.native.name
                || token.symbol != network.native.symbol
                || token.decimals != NATIVE_DECIMALS
            {
                mismatches.push(TokenMismatch::new(token, "native token metadata differs from registry"));
            }
        }
        if erc20.is_empty() {
            continue;
        }

        tracing::info!(network = %network.name, tokens = erc20.len(), "Verifying new tokens");
        mismatches.extend(verify_network(network, &erc20, resolver, &binder).await);
    }

    if mismatches.is_empty() {
        tracing::info!("All new tokens validated successfully");
    } else {
        for mismatch in &mismatches {
            tracing::error!(
                chain_id = mismatch.chain_id,
                address = %mismatch.address,
                reason = %mismatch.reason,
                "Token failed validation"
            );
        }
    }
    mismatches
}

async fn verify_network<F>(
    network: &Network,
    tokens: &[&TokenRecord],
    resolver: &TokenResolver,
    binder: &F,
) -> Vec<TokenMismatch>
where
    F: Fn(&Network) -> Result<Box<dyn EthCaller>>,
{
    let fail_all = |reason: String| {
        tokens
            .iter()
            .map(|token| TokenMismatch::new(token, reason.clone()))
            .collect::<Vec<_>>()
    };

    let caller = match binder(network) {
        Ok(caller) => caller,
        Err(e) => return fail_all(e.to_string()),
    };
    let addresses: Vec<String> = tokens.iter().map(|token| token.address.clone()).collect();
    let outcome = match resolver
        .resolve_batch(caller.as_ref(), network, &addresses, &TokenIndex::default())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return fail_all(e.to_string()),
    };

    let mut mismatches = Vec::new();
    for failed in &outcome.failed {
        if let Some(token) = tokens.iter().find(|token| token.address == failed.address) {
            mismatches.push(TokenMismatch::new(token, failed.reason.clone()));
        }
    }
    for info in &outcome.token_infos {
        let Some(token) = tokens.iter().find(|token| token.address == info.address) else {
            continue;
        };
        let mut diffs = Vec::new();
        if info.name != token.name {
            diffs.push(format!("name {:?} != {:?}", token.name, info.name));
        }
        if info.symbol != token.symbol {
            diffs.push(format!("symbol {:?} != {:?}", token.symbol, info.symbol));
        }
        if info.decimals != token.decimals {
            diffs.push(format!("decimals {} != {}", token.decimals, info.decimals));
        }
        if !diffs.is_empty() {
            mismatches.push(TokenMismatch::new(token, diffs.join("; ")));
        }
    }
    mismatches
}

/// Policy for files changed in a contribution: only token icons under
/// `images/` and platform logos under `platforms/`; icons must be lowercase
/// PNGs. Returns one message per violation.
pub fn check_changed_file(path: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if EXCLUDED_FILES.iter().any(|excluded| path.ends_with(excluded)) {
        return errors;
    }

    if !(path.starts_with("images/") || path.starts_with("platforms/")) {
        errors.push(format!(
            "Error with `{path}`: Only additions of token icons (in the /images folder) \
             or platform logos (in the /platforms folder) are permitted"
        ));
    }

    if path.starts_with("images/assets") {
        if !path.ends_with(".png") {
            errors.push(format!("Error with `{path}`: The new icon must be a PNG file"));
        } else if !ASSET_ICON.is_match(path) {
            errors.push(format!("Error with `{path}`: The new icon's filename must be entirely lowercase"));
        }
    }

    errors
}

/// Checks every whitespace-separated path in `changed_files`.
pub fn check_changed_files(changed_files: &str) -> Vec<String> {
    changed_files.split_whitespace().flat_map(check_changed_file).collect()
}
