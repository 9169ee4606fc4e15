use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path, sync::Arc};

use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;

use crate::{
    config::NormalizedConfig,
    format_address,
    multicall::Multicall,
    provider::{self, EthCaller},
    resolver::{TokenIndex, TokenResolver},
    scan::{FolderScan, ImageScan},
    tokenlist::{
        ensure_native_token, fetch_published_tokenlist, load_tokenlist, save_json, update_tokenlist,
        validate_token, SchemaViolation, TokenList,
    },
    FailedToken, Network, NetworkName, NetworkRegistry, Result, TokenInfo, TokenRecord, NATIVE_TOKEN_ADDRESS,
};

/// Unresolvable tokens per network. Each network task hands over its whole
/// failure list once, so concurrent tasks never share a list.
#[derive(Debug, Default)]
pub struct FailureLedger {
    entries: DashMap<NetworkName, Vec<FailedToken>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, network: &str, failed: Vec<FailedToken>) {
        if failed.is_empty() {
            return;
        }
        self.entries.entry(network.to_string()).or_default().extend(failed);
    }

    pub fn get(&self, network: &str) -> Option<Vec<FailedToken>> {
        self.entries.get(network).map(|entry| entry.value().clone())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total failed tokens across networks.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn to_report(&self) -> BTreeMap<NetworkName, Vec<FailedToken>> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(&self.to_report(), path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkReport {
    pub network: NetworkName,
    pub candidates: usize,
    pub resolved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub native_injected: bool,
    /// Set when the network was aborted before any token was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Records and failures produced for one network.
#[derive(Debug, Clone, Default)]
pub struct NetworkRun {
    pub tokens: Vec<TokenRecord>,
    pub failed: Vec<FailedToken>,
    pub report: NetworkReport,
}

impl NetworkRun {
    fn aborted(network: &Network, addresses: &[String], reason: String) -> Self {
        let failed: Vec<_> = addresses
            .iter()
            .map(|address| FailedToken::new(address.clone(), reason.clone()))
            .collect();
        Self {
            tokens: Vec::new(),
            report: NetworkReport {
                network: network.name.clone(),
                candidates: addresses.len(),
                failed: failed.len(),
                error: Some(reason),
                ..NetworkReport::default()
            },
            failed,
        }
    }
}

#[derive(Debug)]
pub struct GenerationOutcome {
    pub list: TokenList,
    pub violations: Vec<SchemaViolation>,
    pub reports: Vec<NetworkReport>,
    pub failures: FailureLedger,
}

impl GenerationOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// `{base}/{folder}/{address}.png`
pub fn logo_uri(logo_base_url: &str, network: &Network, address: &str) -> String {
    format!(
        "{}/{}/{}.png",
        logo_base_url.trim_end_matches('/'),
        network.folder_name,
        address.to_lowercase()
    )
}

/// Turns resolved metadata into a list record. Empty on-chain values fall
/// back to the existing record; a record failing the token schema comes back
/// as a failure.
pub fn build_record(
    info: &TokenInfo,
    network: &Network,
    logo_base_url: &str,
    existing: Option<&TokenRecord>,
) -> std::result::Result<TokenRecord, FailedToken> {
    let fallback = |value: &str, existing: Option<&str>| match (value.is_empty(), existing) {
        (true, Some(previous)) => previous.to_string(),
        _ => value.to_string(),
    };

    let record = TokenRecord {
        chain_id: network.chain_id,
        address: info.address.to_lowercase(),
        name: fallback(&info.name, existing.map(|record| record.name.as_str())),
        symbol: fallback(&info.symbol, existing.map(|record| record.symbol.as_str())),
        decimals: match (info.decimals, existing) {
            (0, Some(previous)) => previous.decimals,
            (decimals, _) => decimals,
        },
        logo_uri: Some(logo_uri(logo_base_url, network, &info.address)),
        tags: existing.and_then(|record| record.tags.clone()),
        extensions: existing.and_then(|record| record.extensions.clone()),
    };

    let violations = validate_token(&record);
    if violations.is_empty() {
        return Ok(record);
    }

    let reason = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    tracing::warn!(network = %network.name, address = %record.address, reason = %reason, "Invalid token data");
    Err(FailedToken::new(info.address.clone(), reason))
}

/// Drives a full generation run: image scan results in, merged list out.
pub struct TokenListGenerator {
    config: NormalizedConfig,
    registry: Arc<NetworkRegistry>,
    resolver: TokenResolver,
}

impl TokenListGenerator {
    pub fn new(config: NormalizedConfig, registry: Arc<NetworkRegistry>) -> Self {
        let multicall = Multicall::new(registry.clone()).with_batch_size(config.batch_size);
        Self {
            config,
            registry,
            resolver: TokenResolver::new(multicall),
        }
    }

    pub fn config(&self) -> &NormalizedConfig {
        &self.config
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Resolves one network's candidates and assembles their records.
    pub async fn process_network(
        &self,
        caller: &dyn EthCaller,
        network: &Network,
        addresses: &[String],
        existing: &TokenIndex,
    ) -> NetworkRun {
        tracing::info!(network = %network.name, candidates = addresses.len(), "Processing network");

        let outcome = match self.resolver.resolve_batch(caller, network, addresses, existing).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(network = %network.name, error = %e, "Network aborted");
                return NetworkRun::aborted(network, addresses, e.to_string());
            }
        };

        let mut run = NetworkRun {
            failed: outcome.failed,
            report: NetworkReport {
                network: network.name.clone(),
                candidates: addresses.len(),
                skipped: outcome.skipped.len(),
                ..NetworkReport::default()
            },
            ..NetworkRun::default()
        };

        for info in &outcome.token_infos {
            let previous = existing.get(network.chain_id, &info.address);
            match build_record(info, network, &self.config.list.logo_base_url, previous) {
                Ok(record) => run.tokens.push(record),
                Err(failed) => run.failed.push(failed),
            }
        }
        run.report.resolved = run.tokens.len();
        run.report.failed = run.failed.len();
        run.tokens.extend(outcome.skipped);

        if !run.failed.is_empty() {
            tracing::warn!(network = %network.name, failed = run.failed.len(), "Failed to fetch data for tokens");
        }
        run
    }

    /// Generates the list against live RPC endpoints.
    pub async fn generate(&self, existing: &TokenList, scan: &ImageScan) -> GenerationOutcome {
        self.generate_with(existing, scan, |network| {
            let provider = provider::bind(network, &self.config.rpc, &self.config.retry)?;
            Ok(Box::new(provider) as Box<dyn EthCaller>)
        })
        .await
    }

    /// Generates the list with `binder` supplying each network's chain
    /// access. Networks run concurrently; failures never abort the run.
    pub async fn generate_with<F>(&self, existing: &TokenList, scan: &ImageScan, binder: F) -> GenerationOutcome
    where
        F: Fn(&Network) -> Result<Box<dyn EthCaller>> + Sync,
    {
        let selection = &self.config.selection;
        let networks = self.registry.select(&selection.include, &selection.ignore);
        let index = TokenIndex::new(existing.tokens.iter().cloned());

        tracing::info!(networks = networks.len(), existing = index.len(), "Starting token list generation");

        let tasks = networks.iter().map(|network| {
            let folder = scan.for_network(network);
            let index = &index;
            let binder = &binder;
            async move {
                let Some(folder) = folder else {
                    tracing::warn!(network = %network.name, folder = %network.folder_name, "Network directory not found");
                    return (*network, None, NetworkRun::aborted(network, &[], "no image folder".to_string()));
                };
                let run = match binder(network) {
                    Ok(caller) => self.process_network(caller.as_ref(), network, &folder.addresses, index).await,
                    Err(e) => {
                        tracing::error!(network = %network.name, error = %e, "Failed to bind RPC provider");
                        NetworkRun::aborted(network, &folder.addresses, e.to_string())
                    }
                };
                (*network, Some(folder), run)
            }
        });
        let runs = join_all(tasks).await;

        let failures = FailureLedger::new();
        let mut tokens = Vec::new();
        let mut reports = Vec::with_capacity(runs.len());

        for (network, folder, mut run) in runs {
            failures.record(&network.name, std::mem::take(&mut run.failed));
            tokens.append(&mut run.tokens);

            if folder.is_some_and(|folder: &FolderScan| folder.has_native_image) {
                let native_logo = logo_uri(
                    &self.config.list.logo_base_url,
                    network,
                    &format_address(&NATIVE_TOKEN_ADDRESS),
                );
                ensure_native_token(&mut tokens, network, Some(native_logo));
                run.report.native_injected = true;
            }
            reports.push(run.report);
        }

        let merged = update_tokenlist(existing, tokens, &self.config.list.tokenlist_logo_uri, Utc::now());

        if failures.is_empty() {
            tracing::info!("All tokens processed successfully");
        } else {
            tracing::warn!(failed = failures.len(), "Some tokens failed to return data or validate");
        }

        GenerationOutcome {
            list: merged.list,
            violations: merged.violations,
            reports,
            failures,
        }
    }

    /// The list to merge into: the published list when a URL is configured
    /// and reachable, else the local file, else an empty list.
    pub async fn load_existing(&self, client: &reqwest::Client) -> Result<TokenList> {
        if let Some(url) = &self.config.list.published_url {
            match fetch_published_tokenlist(client, url).await {
                Ok(Some(list)) => return Ok(list),
                Ok(None) => {}
                Err(e) => tracing::warn!(url = %url, error = %e, "Failed to fetch published token list"),
            }
        }
        Ok(load_tokenlist(&self.config.paths.tokenlist)?.unwrap_or_default())
    }

    /// Writes the list, and the failure report when anything failed. A clean
    /// run removes the report left by an earlier one.
    pub fn write_outputs(&self, outcome: &GenerationOutcome) -> Result<()> {
        save_json(&outcome.list, &self.config.paths.tokenlist)?;
        let report = &self.config.paths.failure_report;
        if !outcome.failures.is_empty() {
            outcome.failures.save(report)?;
        } else {
            match fs::remove_file(report) {
                Ok(()) => tracing::info!(path = %report.display(), "Removed stale failure report"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
