use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::{tokenlist::TokenList, TokenRecord};

/// ERC20 convention. The upstream list schema allows up to 255.
pub const MAX_DECIMALS: u8 = 18;
pub const MAX_TOKENS: usize = 10_000;
const MAX_KEYWORDS: usize = 20;
const MAX_TOKEN_TAGS: usize = 10;

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("valid regex"));
static TOKEN_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \S+]+$").expect("valid regex"));
static TOKEN_SYMBOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+$").expect("valid regex"));
static TAG_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w]+$").expect("valid regex"));
static WORDS_AND_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w ]+$").expect("valid regex"));
static TAG_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \w\.,:]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON-pointer-like location, e.g. `tokens[3].symbol`
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

struct Checker {
    violations: Vec<SchemaViolation>,
}

impl Checker {
    fn new() -> Self {
        Self { violations: Vec::new() }
    }

    fn fail(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(SchemaViolation::new(path, message));
    }

    fn text(&mut self, path: &str, value: &str, min: usize, max: usize, pattern: &Regex) {
        let len = value.chars().count();
        if len < min || len > max {
            self.fail(path, format!("length {len} outside {min}..={max}"));
        } else if !pattern.is_match(value) {
            self.fail(path, format!("{value:?} does not match {}", pattern.as_str()));
        }
    }

    fn uri(&mut self, path: &str, value: &str) {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https" | "ipfs") => {}
            Ok(url) => self.fail(path, format!("unsupported URI scheme {}", url.scheme())),
            Err(e) => self.fail(path, format!("invalid URI: {e}")),
        }
    }

    fn token(&mut self, prefix: &str, token: &TokenRecord) {
        if token.chain_id < 1 {
            self.fail(&format!("{prefix}.chainId"), "must be at least 1");
        }
        if !ADDRESS.is_match(&token.address) {
            self.fail(&format!("{prefix}.address"), format!("{:?} is not a 20-byte hex address", token.address));
        }
        if token.decimals > MAX_DECIMALS {
            self.fail(
                &format!("{prefix}.decimals"),
                format!("{} exceeds {MAX_DECIMALS}", token.decimals),
            );
        }
        self.text(&format!("{prefix}.name"), &token.name, 1, 60, &TOKEN_NAME);
        self.text(&format!("{prefix}.symbol"), &token.symbol, 1, 20, &TOKEN_SYMBOL);
        if let Some(logo) = &token.logo_uri {
            self.uri(&format!("{prefix}.logoURI"), logo);
        }
        if let Some(tags) = &token.tags {
            if tags.len() > MAX_TOKEN_TAGS {
                self.fail(&format!("{prefix}.tags"), format!("more than {MAX_TOKEN_TAGS} tags"));
            }
            for (idx, tag) in tags.iter().enumerate() {
                self.text(&format!("{prefix}.tags[{idx}]"), tag, 1, 10, &TAG_IDENTIFIER);
            }
        }
    }
}

pub fn validate_token(token: &TokenRecord) -> Vec<SchemaViolation> {
    let mut checker = Checker::new();
    checker.token("token", token);
    checker.violations
}

pub fn validate_tokenlist(list: &TokenList) -> Vec<SchemaViolation> {
    let mut checker = Checker::new();

    checker.text("name", &list.name, 1, 30, &WORDS_AND_SPACES);
    if let Some(logo) = &list.logo_uri {
        checker.uri("logoURI", logo);
    }
    if list.timestamp.is_none() {
        checker.fail("timestamp", "missing");
    }

    if list.keywords.len() > MAX_KEYWORDS {
        checker.fail("keywords", format!("more than {MAX_KEYWORDS} keywords"));
    }
    for (idx, keyword) in list.keywords.iter().enumerate() {
        checker.text(&format!("keywords[{idx}]"), keyword, 1, 20, &WORDS_AND_SPACES);
    }

    for (id, tag) in &list.tags {
        checker.text(&format!("tags.{id}"), id, 1, 10, &TAG_IDENTIFIER);
        checker.text(&format!("tags.{id}.name"), &tag.name, 1, 20, &WORDS_AND_SPACES);
        checker.text(&format!("tags.{id}.description"), &tag.description, 1, 200, &TAG_DESCRIPTION);
    }

    if list.tokens.is_empty() || list.tokens.len() > MAX_TOKENS {
        checker.fail("tokens", format!("{} tokens, expected 1..={MAX_TOKENS}", list.tokens.len()));
    }
    for (idx, token) in list.tokens.iter().enumerate() {
        checker.token(&format!("tokens[{idx}]"), token);
    }

    for (key, token) in &list.token_map {
        let expected = token.key().to_string();
        if *key != expected {
            checker.fail(&format!("tokenMap.{key}"), format!("key does not match token, expected {expected}"));
        }
        checker.token(&format!("tokenMap.{key}"), token);
    }

    checker.violations
}
