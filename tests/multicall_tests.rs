mod common;

use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use common::*;
use curve_tokenlist::{
    abi::IERC20Metadata, BlockTag, Call, Multicall, Network, NetworkRegistry, TokenListError,
};

fn name_call(n: u64) -> Call {
    Call::from_sol(addr(n), &IERC20Metadata::nameCall {}, vec![DynSolType::String])
}

fn chain_with_tokens(count: u64) -> FakeChain {
    (0..count).fold(FakeChain::new(TEST_CHAIN_ID), |chain, n| {
        chain.with_contract(addr(n), erc20(&format!("Token {n}"), &format!("TK{n}"), 18))
    })
}

#[test]
fn test_call_from_sol_takes_function_name() {
    let call = name_call(1);
    assert_eq!(call.function, "name");
    assert_eq!(call.target, addr(1));
    assert_eq!(&call.call_data[..], &IERC20Metadata::nameCall::SELECTOR[..]);
}

#[test]
fn test_call_decode_unwraps_single_output() {
    let call = name_call(1);
    let data = DynSolValue::Tuple(vec![DynSolValue::String("Curve DAO".to_string())]).abi_encode_params();
    assert_eq!(call.decode(&data).unwrap(), DynSolValue::String("Curve DAO".to_string()));
}

#[test]
fn test_call_decode_rejects_truncated_payload() {
    let call = name_call(1);
    let data = DynSolValue::Tuple(vec![DynSolValue::String("Curve DAO".to_string())]).abi_encode_params();
    let err = call.decode(&data[..40]).unwrap_err();
    assert!(matches!(err, TokenListError::Decode(_)));
}

#[tokio::test]
async fn test_execute_empty_input_makes_no_rpc_calls() {
    let chain = FakeChain::new(TEST_CHAIN_ID);
    let multicall = Multicall::new(test_registry());

    let outcome = multicall.execute(&chain, &[], BlockTag::Latest).await.unwrap();

    assert!(outcome.results.is_empty());
    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.requests, 0);
    assert_eq!(chain.rpc_call_count(), 0);
}

#[tokio::test]
async fn test_execute_all_success_single_request() {
    let chain = chain_with_tokens(4);
    let calls: Vec<Call> = (0..4).map(name_call).collect();

    let outcome = Multicall::new(test_registry())
        .execute(&chain, &calls, BlockTag::Latest)
        .await
        .unwrap();

    assert_eq!(outcome.requests, 1);
    assert!(outcome.failed.is_empty());
    let names: Vec<_> = outcome
        .results
        .iter()
        .map(|value| value.as_ref().and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    assert_eq!(
        names,
        vec![
            Some("Token 0".to_string()),
            Some("Token 1".to_string()),
            Some("Token 2".to_string()),
            Some("Token 3".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_execute_isolates_single_revert_by_splitting() {
    let chain = chain_with_tokens(8).with_contract(addr(5), Contract::Reverts);
    let calls: Vec<Call> = (0..8).map(name_call).collect();

    let outcome = Multicall::new(test_registry())
        .execute(&chain, &calls, BlockTag::Latest)
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 8);
    for (idx, value) in outcome.results.iter().enumerate() {
        if idx == 5 {
            assert!(value.is_none());
        } else {
            assert_eq!(value.as_ref().and_then(|v| v.as_str()), Some(format!("Token {idx}").as_str()));
        }
    }
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].target, addr(5));
    assert_eq!(outcome.failed[0].function, "name");
    // 8 -> 4+4 -> 2+2 -> 1+1 along the poisoned path
    assert_eq!(outcome.requests, 7);
    assert_eq!(chain.eth_call_count(), 7);
}

#[tokio::test]
async fn test_execute_split_requests_stay_logarithmic() {
    let chain = chain_with_tokens(64).with_contract(addr(37), Contract::Reverts);
    let calls: Vec<Call> = (0..64).map(name_call).collect();

    let outcome = Multicall::new(test_registry())
        .execute(&chain, &calls, BlockTag::Latest)
        .await
        .unwrap();

    assert_eq!(outcome.results.iter().filter(|value| value.is_some()).count(), 63);
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.requests <= 1 + 2 * 6, "requests = {}", outcome.requests);
}

#[tokio::test]
async fn test_execute_respects_batch_size() {
    let chain = chain_with_tokens(5);
    let calls: Vec<Call> = (0..5).map(name_call).collect();

    let outcome = Multicall::new(test_registry())
        .with_batch_size(2)
        .execute(&chain, &calls, BlockTag::Latest)
        .await
        .unwrap();

    assert_eq!(outcome.requests, 3);
    assert!(outcome.results.iter().all(Option::is_some));
}

#[tokio::test]
async fn test_execute_records_undecodable_results() {
    let chain = chain_with_tokens(2)
        .with_contract(addr(2), Contract::NoCode)
        .with_contract(addr(3), Contract::Truncated);
    let calls: Vec<Call> = (0..4).map(name_call).collect();

    let outcome = Multicall::new(test_registry())
        .execute(&chain, &calls, BlockTag::Latest)
        .await
        .unwrap();

    assert_eq!(outcome.requests, 1);
    assert!(outcome.results[0].is_some());
    assert!(outcome.results[1].is_some());
    assert!(outcome.results[2].is_none());
    assert!(outcome.results[3].is_none());
    let targets: Vec<_> = outcome.failed.iter().map(|failed| failed.target).collect();
    assert_eq!(targets, vec![addr(2), addr(3)]);
}

#[tokio::test]
async fn test_execute_transport_failure_fails_window_without_split() {
    let chain = chain_with_tokens(4).with_transport_down();
    let calls: Vec<Call> = (0..4).map(name_call).collect();

    let outcome = Multicall::new(test_registry())
        .execute(&chain, &calls, BlockTag::Latest)
        .await
        .unwrap();

    assert_eq!(outcome.requests, 1);
    assert!(outcome.results.iter().all(Option::is_none));
    assert_eq!(outcome.failed.len(), 4);
}

#[tokio::test]
async fn test_execute_unsupported_chain_id() {
    let chain = FakeChain::new(999);
    let err = Multicall::new(test_registry())
        .execute(&chain, &[name_call(0)], BlockTag::Latest)
        .await
        .unwrap_err();

    assert!(matches!(err, TokenListError::UnsupportedChainId { chain_id: 999 }));
    assert!(err.is_configuration());
    assert_eq!(chain.eth_call_count(), 0);
}

#[tokio::test]
async fn test_execute_missing_multicall_address() {
    let network = Network::new("bare", TEST_CHAIN_ID, "assets-bare", "Ether", "ETH").with_multicall(None);
    let registry = Arc::new(NetworkRegistry::new(vec![network]).unwrap());
    let chain = FakeChain::new(TEST_CHAIN_ID);

    let err = Multicall::new(registry)
        .execute(&chain, &[name_call(0)], BlockTag::Latest)
        .await
        .unwrap_err();

    assert!(matches!(err, TokenListError::MissingMulticallAddress { ref network } if network == "bare"));
    assert_eq!(chain.eth_call_count(), 0);
}

#[test]
fn test_call_decode_rejects_uint_wider_than_declared() {
    let call = Call::from_sol(addr(1), &IERC20Metadata::decimalsCall {}, vec![DynSolType::Uint(8)]);
    let data = DynSolValue::Tuple(vec![DynSolValue::Uint(U256::from(1000u64), 256)]).abi_encode_params();

    let err = call.decode(&data).unwrap_err();
    assert!(matches!(err, TokenListError::Decode(_)));

    let data = DynSolValue::Tuple(vec![DynSolValue::Uint(U256::from(255u64), 256)]).abi_encode_params();
    assert_eq!(call.decode(&data).unwrap(), DynSolValue::Uint(U256::from(255u64), 8));
}

#[tokio::test]
async fn test_execute_out_of_range_decimals_is_a_failed_call() {
    let chain = FakeChain::new(TEST_CHAIN_ID).with_contract(addr(1), erc20_raw_decimals("Odd", "ODD", 1000));
    let calls = vec![Call::from_sol(addr(1), &IERC20Metadata::decimalsCall {}, vec![DynSolType::Uint(8)])];

    let outcome = Multicall::new(test_registry())
        .execute(&chain, &calls, BlockTag::Latest)
        .await
        .unwrap();

    assert!(outcome.results[0].is_none());
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].target, addr(1));
    assert_eq!(outcome.failed[0].function, "decimals");
}
