use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::{
    tokenlist::{schema::validate_tokenlist, SchemaViolation, TokenList},
    Network, TokenRecord, NATIVE_TOKEN_ADDRESS,
};

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub list: TokenList,
    /// Schema violations of the merged list; empty when it validates.
    pub violations: Vec<SchemaViolation>,
}

impl MergeOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// One record per `(chainId, lowercase address)`. A later record replaces an
/// earlier one but keeps the earlier one's position.
pub fn dedupe_tokens(tokens: impl IntoIterator<Item = TokenRecord>) -> Vec<TokenRecord> {
    let mut unique: Vec<TokenRecord> = Vec::new();
    let mut positions = HashMap::new();

    for token in tokens {
        match positions.get(&token.key()) {
            Some(&idx) => unique[idx] = token,
            None => {
                positions.insert(token.key(), unique.len());
                unique.push(token);
            }
        }
    }

    unique
}

pub fn build_token_map(tokens: &[TokenRecord]) -> BTreeMap<String, TokenRecord> {
    tokens
        .iter()
        .map(|token| (token.key().to_string(), token.clone()))
        .collect()
}

/// Merges `new_tokens` over the existing list and validates the result.
/// Validation failures are reported, never fatal: the list is still returned.
pub fn update_tokenlist(
    existing: &TokenList,
    new_tokens: Vec<TokenRecord>,
    logo_uri: &str,
    now: DateTime<Utc>,
) -> MergeOutcome {
    let tokens = dedupe_tokens(existing.tokens.iter().cloned().chain(new_tokens));
    let token_map = build_token_map(&tokens);

    let list = TokenList {
        name: existing.name.clone(),
        logo_uri: Some(logo_uri.to_string()),
        keywords: existing.keywords.clone(),
        tags: existing.tags.clone(),
        timestamp: Some(now),
        tokens,
        token_map,
        version: existing.version.clone(),
    };

    let violations = validate_tokenlist(&list);
    if violations.is_empty() {
        tracing::info!(tokens = list.tokens.len(), "Token list validated");
    } else {
        tracing::error!(violations = violations.len(), "Token list validation failed");
        for violation in violations.iter().take(20) {
            tracing::error!(path = %violation.path, "{}", violation.message);
        }
    }

    MergeOutcome { list, violations }
}

/// Replaces any native-token entry for `network` with the registry's metadata.
pub fn ensure_native_token(tokens: &mut Vec<TokenRecord>, network: &Network, logo_uri: Option<String>) {
    let native = network.native_token_record(logo_uri);
    tokens.retain(|token| {
        !(token.chain_id == network.chain_id
            && crate::parse_address(&token.address) == Some(NATIVE_TOKEN_ADDRESS))
    });
    tokens.push(native);
}
