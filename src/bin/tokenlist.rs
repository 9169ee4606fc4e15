use std::{path::Path, process::ExitCode, sync::Arc};

use anyhow::{bail, Context};
use curve_tokenlist::{
    checks::{check_changed_files, check_coverage, verify_new_tokens},
    provider::{self, EthCaller},
    resolve_config,
    scan::scan_images,
    tokenlist::load_tokenlist,
    Multicall, Network, NetworkRegistry, NormalizedConfig, RunSettings, TokenListGenerator, TokenResolver,
};

const USAGE: &str = "usage: tokenlist <generate [network|all_networks] | check | verify <cached list> | pr-check>";

fn init_tracing(config: &NormalizedConfig) {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.log_level))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut settings = RunSettings::from_env();

    let command = args.first().map(String::as_str).unwrap_or("generate");
    if command == "generate" {
        if let Some(network) = args.get(1).filter(|network| *network != "all_networks") {
            settings.networks_to_include = Some(vec![network.clone()]);
        }
    }

    let config = resolve_config(settings);
    init_tracing(&config);
    let registry = Arc::new(NetworkRegistry::builtin());

    match command {
        "generate" => generate(config, registry).await,
        "check" => check(&config, &registry),
        "verify" => {
            let cached = args.get(1).context(USAGE)?;
            verify(&config, registry, Path::new(cached)).await
        }
        "pr-check" => Ok(pr_check()),
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }
}

async fn generate(config: NormalizedConfig, registry: Arc<NetworkRegistry>) -> anyhow::Result<ExitCode> {
    for name in &config.selection.include {
        registry.lookup(name)?;
    }

    let scan = scan_images(&config.paths.images_dir, &registry)?;
    scan.log_summary();

    let generator = TokenListGenerator::new(config, registry);
    let existing = generator.load_existing(&reqwest::Client::new()).await?;
    let outcome = generator.generate(&existing, &scan).await;
    generator.write_outputs(&outcome)?;

    for report in &outcome.reports {
        tracing::info!(
            network = %report.network,
            candidates = report.candidates,
            resolved = report.resolved,
            skipped = report.skipped,
            failed = report.failed,
            native = report.native_injected,
            "Network finished"
        );
    }
    if !outcome.failures.is_empty() {
        tracing::warn!(
            path = %generator.config().paths.failure_report.display(),
            "Some tokens failed to return data or validate"
        );
    }

    if outcome.is_valid() {
        tracing::info!(tokens = outcome.list.tokens.len(), "Token list generation completed");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(violations = outcome.violations.len(), "Generated token list is invalid");
        Ok(ExitCode::FAILURE)
    }
}

fn check(config: &NormalizedConfig, registry: &NetworkRegistry) -> anyhow::Result<ExitCode> {
    let list = load_tokenlist(&config.paths.tokenlist)?
        .with_context(|| format!("no token list at {}", config.paths.tokenlist.display()))?;
    let scan = scan_images(&config.paths.images_dir, registry)?;

    let report = check_coverage(&scan, registry, &list);
    report.log_summary();

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("Tokenlist check failed. There are missing tokens or images.");
        Ok(ExitCode::FAILURE)
    }
}

async fn verify(config: &NormalizedConfig, registry: Arc<NetworkRegistry>, cached: &Path) -> anyhow::Result<ExitCode> {
    let current = load_tokenlist(&config.paths.tokenlist)?
        .with_context(|| format!("no token list at {}", config.paths.tokenlist.display()))?;
    let cached = load_tokenlist(cached)?.with_context(|| format!("no cached token list at {}", cached.display()))?;

    let resolver = TokenResolver::new(Multicall::new(registry).with_batch_size(config.batch_size));
    let mismatches = verify_new_tokens(&current, &cached, &resolver, |network: &Network| {
        let provider = provider::bind(network, &config.rpc, &config.retry)?;
        Ok(Box::new(provider) as Box<dyn EthCaller>)
    })
    .await;

    Ok(if mismatches.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn pr_check() -> ExitCode {
    let changed = std::env::var("ALL_CHANGED_FILES").unwrap_or_default();
    let errors = check_changed_files(&changed);

    if errors.is_empty() {
        println!("No errors found in PR checks.");
        return ExitCode::SUCCESS;
    }
    for error in &errors {
        println!("::error::{error}");
    }
    ExitCode::FAILURE
}
