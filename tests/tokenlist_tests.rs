use chrono::{TimeZone, Utc};
use curve_tokenlist::{
    format_address,
    tokenlist::{
        build_token_map, dedupe_tokens, ensure_native_token, fetch_published_tokenlist, load_tokenlist, save_json,
        update_tokenlist, validate_token, validate_tokenlist, TokenList, Version,
    },
    Network, TokenRecord, NATIVE_TOKEN_ADDRESS,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGO: &str = "https://cdn.jsdelivr.net/gh/curvefi/curve-assets/branding/logo.png";

fn token(chain_id: u64, address: &str, symbol: &str) -> TokenRecord {
    TokenRecord {
        chain_id,
        address: address.to_string(),
        name: format!("{symbol} Token"),
        symbol: symbol.to_string(),
        decimals: 18,
        logo_uri: Some(format!("https://cdn.example.org/{address}.png")),
        tags: None,
        extensions: None,
    }
}

const A: &str = "0xd533a949740bb3306d119cc777fa900ba034cd52";
const B: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

#[test]
fn test_dedupe_keeps_later_value_at_first_position() {
    let tokens = vec![
        token(1, A, "OLD"),
        token(1, B, "USDC"),
        token(1, &A.to_uppercase().replacen("0X", "0x", 1), "NEW"),
        token(10, A, "OPA"),
    ];

    let unique = dedupe_tokens(tokens);

    let symbols: Vec<_> = unique.iter().map(|token| token.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["NEW", "USDC", "OPA"]);
}

#[test]
fn test_token_map_keys_are_chain_and_lowercase_address() {
    let map = build_token_map(&[token(1, &A.to_uppercase().replacen("0X", "0x", 1), "CRV")]);
    assert_eq!(map.keys().collect::<Vec<_>>(), vec![&format!("1_{A}")]);
}

#[test]
fn test_update_tokenlist_merges_and_stamps() {
    let existing = TokenList {
        tokens: vec![token(1, A, "CRV")],
        version: Version { major: 2, minor: 1, patch: 0 },
        ..TokenList::default()
    };
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let outcome = update_tokenlist(&existing, vec![token(1, B, "USDC"), token(1, A, "CRV2")], LOGO, now);

    assert!(outcome.is_valid(), "{:?}", outcome.violations);
    assert_eq!(outcome.list.tokens.len(), 2);
    assert_eq!(outcome.list.tokens[0].symbol, "CRV2");
    assert_eq!(outcome.list.token_map.len(), 2);
    assert_eq!(outcome.list.timestamp, Some(now));
    assert_eq!(outcome.list.logo_uri.as_deref(), Some(LOGO));
    assert_eq!(outcome.list.version, Version { major: 2, minor: 1, patch: 0 });
    assert_eq!(outcome.list.name, "Curve Token List");
    assert_eq!(outcome.list.keywords, vec!["curve", "defi"]);
}

#[test]
fn test_update_tokenlist_reports_violations_without_failing() {
    let mut bad = token(1, A, "CRV");
    bad.decimals = 19;

    let outcome = update_tokenlist(&TokenList::default(), vec![bad], LOGO, Utc::now());

    assert!(!outcome.is_valid());
    assert_eq!(outcome.list.tokens.len(), 1);
    assert!(outcome.violations.iter().any(|v| v.path == "tokens[0].decimals"));
}

#[test]
fn test_empty_list_is_invalid() {
    let outcome = update_tokenlist(&TokenList::default(), Vec::new(), LOGO, Utc::now());
    assert!(outcome.violations.iter().any(|v| v.path == "tokens"));
}

#[test]
fn test_validate_token_rules() {
    assert!(validate_token(&token(1, A, "CRV")).is_empty());

    let mut bad = token(0, "0x1234", "TWO WORDS");
    bad.name = String::new();
    bad.logo_uri = Some("ftp://example.org/logo.png".to_string());
    bad.tags = Some(vec!["not-valid".to_string()]);

    let paths: Vec<_> = validate_token(&bad).into_iter().map(|v| v.path).collect();
    assert_eq!(
        paths,
        vec![
            "token.chainId",
            "token.address",
            "token.name",
            "token.symbol",
            "token.logoURI",
            "token.tags[0]"
        ]
    );
}

#[test]
fn test_validate_tokenlist_detects_miskeyed_token_map() {
    let mut list = update_tokenlist(&TokenList::default(), vec![token(1, A, "CRV")], LOGO, Utc::now()).list;
    let entry = list.token_map.values().next().cloned().unwrap();
    list.token_map.insert("10_wrong".to_string(), entry);

    let violations = validate_tokenlist(&list);
    assert!(violations.iter().any(|v| v.path == "tokenMap.10_wrong"));
}

#[test]
fn test_ensure_native_token_replaces_existing_entry() {
    let network = Network::new("ethereum", 1, "assets", "Ether", "ETH");
    let native = format_address(&NATIVE_TOKEN_ADDRESS);
    let mut stale = token(1, "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE", "OLD");
    stale.decimals = 8;
    let mut tokens = vec![stale, token(1, A, "CRV"), token(10, &native, "OPETH")];

    ensure_native_token(&mut tokens, &network, Some("https://cdn.example.org/native.png".to_string()));

    let natives: Vec<_> = tokens
        .iter()
        .filter(|token| token.chain_id == 1 && token.address.eq_ignore_ascii_case(&native))
        .collect();
    assert_eq!(natives.len(), 1);
    assert_eq!(natives[0].symbol, "ETH");
    assert_eq!(natives[0].name, "Ether");
    assert_eq!(natives[0].decimals, 18);
    assert_eq!(natives[0].address, native);
    assert_eq!(tokens.len(), 3);
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested").join("curve_tokenlist.json");
    let list = update_tokenlist(&TokenList::default(), vec![token(1, A, "CRV")], LOGO, Utc::now()).list;

    save_json(&list, &file).unwrap();
    let raw = std::fs::read_to_string(&file).unwrap();
    assert!(raw.ends_with('\n'));
    assert!(raw.contains("\"logoURI\""));
    assert!(raw.contains("\"tokenMap\""));
    assert!(raw.contains("\"chainId\": 1"));

    assert_eq!(load_tokenlist(&file).unwrap(), Some(list));
}

#[test]
fn test_load_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_tokenlist(&dir.path().join("absent.json")).unwrap(), None);
}

#[test]
fn test_load_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("list.json");
    std::fs::write(&file, r#"{"tokens": [{"chainId": 1, "address": "0xabc"}]}"#).unwrap();

    let list = load_tokenlist(&file).unwrap().unwrap();
    assert_eq!(list.name, "Curve Token List");
    assert_eq!(list.version, Version::default());
    assert_eq!(list.tokens[0].name, "");
    assert_eq!(list.tokens[0].decimals, 0);
}

#[tokio::test]
async fn test_fetch_published_tokenlist() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/curve_tokenlist.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Curve Token List",
            "tokens": [{"chainId": 1, "address": A, "name": "Curve DAO Token", "symbol": "CRV", "decimals": 18}]
        })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let list = fetch_published_tokenlist(&client, &format!("{}/curve_tokenlist.json", server.uri()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(list.tokens.len(), 1);
    assert_eq!(list.tokens[0].symbol, "CRV");

    let missing = fetch_published_tokenlist(&client, &format!("{}/other.json", server.uri()))
        .await
        .unwrap();
    assert!(missing.is_none());
}
