#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use curve_tokenlist::{
    abi::{IERC20Metadata, IMulticall},
    format_address, BlockTag, ChainId, EthCaller, Network, NetworkRegistry, Result, TokenListError,
    MULTICALL3_ADDRESS,
};

pub const TEST_CHAIN_ID: ChainId = 31337;

#[derive(Debug, Clone)]
pub enum Contract {
    /// `decimals` is the raw return word, so it can exceed `uint8`.
    Erc20 { name: String, symbol: String, decimals: u64 },
    /// Every call reverts, poisoning the aggregate it is part of.
    Reverts,
    /// Calls succeed with empty return data.
    NoCode,
    /// `name()` answers with a cut-off payload.
    Truncated,
}

pub fn erc20(name: &str, symbol: &str, decimals: u8) -> Contract {
    Contract::Erc20 {
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals: u64::from(decimals),
    }
}

pub fn erc20_raw_decimals(name: &str, symbol: &str, decimals: u64) -> Contract {
    Contract::Erc20 {
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
    }
}

/// In-memory chain with a Multicall3-style aggregator that reverts whenever
/// any of its inner calls reverts.
#[derive(Debug)]
pub struct FakeChain {
    chain_id: ChainId,
    contracts: HashMap<Address, Contract>,
    transport_down: bool,
    pub chain_id_calls: AtomicUsize,
    pub eth_calls: AtomicUsize,
}

impl FakeChain {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            contracts: HashMap::new(),
            transport_down: false,
            chain_id_calls: AtomicUsize::new(0),
            eth_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_contract(mut self, address: Address, contract: Contract) -> Self {
        self.contracts.insert(address, contract);
        self
    }

    /// Every `eth_call` fails as if the endpoint stopped answering.
    pub fn with_transport_down(mut self) -> Self {
        self.transport_down = true;
        self
    }

    pub fn eth_call_count(&self) -> usize {
        self.eth_calls.load(Ordering::SeqCst)
    }

    pub fn rpc_call_count(&self) -> usize {
        self.eth_call_count() + self.chain_id_calls.load(Ordering::SeqCst)
    }

    fn inner_call(&self, target: Address, data: &[u8]) -> std::result::Result<Vec<u8>, ()> {
        let selector: [u8; 4] = data.get(..4).and_then(|s| s.try_into().ok()).ok_or(())?;
        match self.contracts.get(&target) {
            Some(Contract::Erc20 { name, symbol, decimals }) => {
                let value = if selector == IERC20Metadata::nameCall::SELECTOR {
                    DynSolValue::String(name.clone())
                } else if selector == IERC20Metadata::symbolCall::SELECTOR {
                    DynSolValue::String(symbol.clone())
                } else if selector == IERC20Metadata::decimalsCall::SELECTOR {
                    DynSolValue::Uint(U256::from(*decimals), 256)
                } else {
                    return Err(());
                };
                Ok(DynSolValue::Tuple(vec![value]).abi_encode_params())
            }
            Some(Contract::Truncated) => {
                let full = DynSolValue::Tuple(vec![DynSolValue::String("Truncated".to_string())]).abi_encode_params();
                Ok(full[..full.len() / 2].to_vec())
            }
            Some(Contract::Reverts) => Err(()),
            Some(Contract::NoCode) | None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl EthCaller for FakeChain {
    async fn chain_id(&self) -> Result<ChainId> {
        self.chain_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_id)
    }

    async fn eth_call(&self, to: Address, data: Bytes, _block: BlockTag) -> Result<Bytes> {
        self.eth_calls.fetch_add(1, Ordering::SeqCst);
        if self.transport_down {
            return Err(TokenListError::Timeout { duration_ms: 30_000 });
        }
        if to != MULTICALL3_ADDRESS {
            return Ok(Bytes::new());
        }

        let request = IMulticall::aggregateCall::abi_decode(&data, true)
            .map_err(|e| TokenListError::Decode(e.to_string()))?;

        let mut return_data = Vec::with_capacity(request.calls.len());
        for call in &request.calls {
            match self.inner_call(call.target, &call.callData) {
                Ok(data) => return_data.push(DynSolValue::Bytes(data)),
                Err(()) => return Err(TokenListError::Revert("execution reverted".to_string())),
            }
        }

        let encoded = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(1u64), 256),
            DynSolValue::Array(return_data),
        ])
        .abi_encode_params();
        Ok(encoded.into())
    }
}

/// Lets a test keep a handle on a chain it hands over as a boxed caller.
pub struct SharedChain(pub Arc<FakeChain>);

#[async_trait]
impl EthCaller for SharedChain {
    async fn chain_id(&self) -> Result<ChainId> {
        self.0.chain_id().await
    }

    async fn eth_call(&self, to: Address, data: Bytes, block: BlockTag) -> Result<Bytes> {
        self.0.eth_call(to, data, block).await
    }
}

pub fn test_network() -> Network {
    Network::new("testnet", TEST_CHAIN_ID, "assets-testnet", "Test Ether", "TETH")
}

pub fn test_registry() -> Arc<NetworkRegistry> {
    Arc::new(NetworkRegistry::new(vec![test_network()]).expect("unique networks"))
}

/// Deterministic distinct address for fixtures.
pub fn addr(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..].copy_from_slice(&n.to_be_bytes());
    bytes[0] = 0x10;
    Address::from(bytes)
}

pub fn addr_str(n: u64) -> String {
    format_address(&addr(n))
}
