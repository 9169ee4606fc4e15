use std::collections::HashMap;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;

use crate::{
    abi::IERC20Metadata,
    format_address,
    multicall::{Call, Multicall},
    parse_address,
    provider::EthCaller,
    BlockTag, ChainId, FailedToken, Network, Result, TokenInfo, TokenKey, TokenRecord, NATIVE_TOKEN_ADDRESS,
};

const CALLS_PER_TOKEN: usize = 3;

/// Existing list entries keyed by `(chainId, lowercase address)`.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    records: HashMap<TokenKey, TokenRecord>,
}

impl TokenIndex {
    /// Later records replace earlier ones with the same key.
    pub fn new(records: impl IntoIterator<Item = TokenRecord>) -> Self {
        records.into_iter().collect()
    }

    pub fn get(&self, chain_id: ChainId, address: &str) -> Option<&TokenRecord> {
        self.records.get(&TokenKey::new(chain_id, address))
    }

    pub fn insert(&mut self, record: TokenRecord) {
        self.records.insert(record.key(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<TokenRecord> for TokenIndex {
    fn from_iter<I: IntoIterator<Item = TokenRecord>>(iter: I) -> Self {
        let mut index = Self::default();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// `name()`, `symbol()` and `decimals()` against `token`, in that order.
pub fn erc20_metadata_calls(token: Address) -> [Call; CALLS_PER_TOKEN] {
    [
        Call::from_sol(token, &IERC20Metadata::nameCall {}, vec![DynSolType::String]),
        Call::from_sol(token, &IERC20Metadata::symbolCall {}, vec![DynSolType::String]),
        Call::from_sol(token, &IERC20Metadata::decimalsCall {}, vec![DynSolType::Uint(8)]),
    ]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveOutcome {
    /// Freshly resolved tokens, in candidate order.
    pub token_infos: Vec<TokenInfo>,
    /// Unresolvable candidates, in encounter order.
    pub failed: Vec<FailedToken>,
    /// Existing records carried forward without querying the chain.
    pub skipped: Vec<TokenRecord>,
    /// Native-token sentinel candidates left to the native metadata path.
    pub native_skipped: usize,
}

/// Resolves ERC20 metadata for a network's candidate addresses with a single
/// multicall batch.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    multicall: Multicall,
}

impl TokenResolver {
    pub fn new(multicall: Multicall) -> Self {
        Self { multicall }
    }

    pub fn multicall(&self) -> &Multicall {
        &self.multicall
    }

    pub async fn resolve_batch(
        &self,
        caller: &dyn EthCaller,
        network: &Network,
        addresses: &[String],
        existing: &TokenIndex,
    ) -> Result<ResolveOutcome> {
        let mut outcome = ResolveOutcome::default();
        let mut calls = Vec::new();
        let mut queried = Vec::new();

        for candidate in addresses {
            let Some(address) = parse_address(candidate) else {
                tracing::warn!(network = %network.name, address = %candidate, "Invalid address format");
                outcome.failed.push(FailedToken::new(candidate.clone(), "invalid address format"));
                continue;
            };

            if address == NATIVE_TOKEN_ADDRESS {
                outcome.native_skipped += 1;
                continue;
            }

            let canonical = format_address(&address);
            if let Some(record) = existing
                .get(network.chain_id, &canonical)
                .filter(|record| record.has_complete_metadata())
            {
                outcome.skipped.push(record.clone());
                continue;
            }

            calls.extend(erc20_metadata_calls(address));
            queried.push((address, canonical));
        }

        tracing::info!(
            network = %network.name,
            calls = calls.len(),
            tokens = queried.len(),
            "Preparing token metadata calls"
        );

        let results = self.multicall.execute(caller, &calls, BlockTag::Latest).await?;

        let mut reasons: HashMap<Address, Vec<String>> = HashMap::new();
        for failed in &results.failed {
            reasons
                .entry(failed.target)
                .or_default()
                .push(format!("{}: {}", failed.function, failed.reason));
        }

        for ((address, canonical), group) in queried.iter().zip(results.results.chunks(CALLS_PER_TOKEN)) {
            match assemble_token_info(canonical, group) {
                Some(info) => outcome.token_infos.push(info),
                None => {
                    let reason = reasons
                        .get(address)
                        .map(|reasons| reasons.join("; "))
                        .unwrap_or_else(|| "incomplete or malformed token metadata".to_string());
                    tracing::warn!(
                        network = %network.name,
                        address = %canonical,
                        reason = %reason,
                        "Failed to fetch complete token info"
                    );
                    outcome.failed.push(FailedToken::new(canonical.clone(), reason));
                }
            }
        }

        tracing::info!(
            network = %network.name,
            resolved = outcome.token_infos.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            "Token info batch finished"
        );

        Ok(outcome)
    }
}

/// All three values are required; partial metadata is rejected.
fn assemble_token_info(address: &str, group: &[Option<DynSolValue>]) -> Option<TokenInfo> {
    let [Some(name), Some(symbol), Some(decimals)] = group else {
        return None;
    };
    let decimals = decimals.as_uint().and_then(|(value, _)| u8::try_from(value).ok())?;

    Some(TokenInfo {
        address: address.to_string(),
        name: name.as_str()?.to_string(),
        symbol: symbol.as_str()?.to_string(),
        decimals,
    })
}
