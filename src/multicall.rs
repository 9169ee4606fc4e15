use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use futures::future::BoxFuture;

use crate::{
    abi::IMulticall, config::DEFAULT_BATCH_SIZE, provider::EthCaller, BlockTag, NetworkRegistry, Result,
    TokenListError,
};

/// Number of failed calls listed individually in the run log.
const FAILED_CALLS_LOGGED: usize = 10;

/// A read-only contract call and the ABI types its return data decodes to.
#[derive(Debug, Clone)]
pub struct Call {
    pub target: Address,
    pub function: String,
    pub call_data: Bytes,
    pub outputs: Vec<DynSolType>,
}

impl Call {
    pub fn new(
        target: Address,
        function: impl Into<String>,
        call_data: impl Into<Bytes>,
        outputs: Vec<DynSolType>,
    ) -> Self {
        Self {
            target,
            function: function.into(),
            call_data: call_data.into(),
            outputs,
        }
    }

    /// Builds a call from a `sol!` binding; the function name is taken from
    /// the binding's signature.
    pub fn from_sol<C: SolCall>(target: Address, call: &C, outputs: Vec<DynSolType>) -> Self {
        let function = C::SIGNATURE.split('(').next().unwrap_or(C::SIGNATURE);
        Self::new(target, function, call.abi_encode(), outputs)
    }

    /// Decodes return data against `outputs`. A single declared output is
    /// unwrapped from its one-element tuple.
    pub fn decode(&self, data: &[u8]) -> Result<DynSolValue> {
        let decoded = DynSolType::Tuple(self.outputs.clone())
            .abi_decode_params(data)
            .map_err(|e| TokenListError::Decode(e.to_string()))?;
        check_uint_widths(&decoded)?;

        match decoded {
            DynSolValue::Tuple(mut values) if self.outputs.len() == 1 && values.len() == 1 => Ok(values.remove(0)),
            other => Ok(other),
        }
    }
}

/// The decoder reads whole 32-byte words, so a `uint8` slot can carry any
/// 256-bit value. Values wider than their declared type are malformed.
fn check_uint_widths(value: &DynSolValue) -> Result<()> {
    match value {
        DynSolValue::Uint(v, bits) if v.bit_len() > *bits => Err(TokenListError::Decode(format!(
            "value {v} out of range for uint{bits}"
        ))),
        DynSolValue::Tuple(values) | DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            values.iter().try_for_each(check_uint_widths)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCall {
    pub target: Address,
    pub function: String,
    pub reason: String,
}

impl FailedCall {
    fn new(call: &Call, reason: impl Into<String>) -> Self {
        Self {
            target: call.target,
            function: call.function.clone(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MulticallOutcome {
    /// One entry per submitted call, in submission order; `None` where the
    /// call reverted or its return data did not decode.
    pub results: Vec<Option<DynSolValue>>,
    pub failed: Vec<FailedCall>,
    /// Aggregate requests sent, split retries included.
    pub requests: usize,
}

struct WindowContext<'c> {
    caller: &'c dyn EthCaller,
    multicall: Address,
    block: BlockTag,
    failed: Vec<FailedCall>,
    requests: usize,
}

/// Executes batches of read-only calls through the network's aggregator
/// contract.
///
/// Batches are cut into windows of at most `batch_size` calls. When the
/// aggregate call for a window reverts, one bad call has poisoned it: the
/// window is halved and each half retried until the reverting call is
/// isolated in a window of its own. Results always line up with the input.
#[derive(Debug, Clone)]
pub struct Multicall {
    registry: Arc<NetworkRegistry>,
    batch_size: usize,
}

impl Multicall {
    pub fn new(registry: Arc<NetworkRegistry>) -> Self {
        Self {
            registry,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub async fn execute(&self, caller: &dyn EthCaller, calls: &[Call], block: BlockTag) -> Result<MulticallOutcome> {
        if calls.is_empty() {
            return Ok(MulticallOutcome::default());
        }

        let chain_id = caller.chain_id().await?;
        let network = self.registry.lookup_by_chain_id(chain_id).inspect_err(|_| {
            tracing::error!(chain_id, "Unsupported chain ID");
        })?;
        let multicall = network.multicall_address.ok_or_else(|| {
            tracing::error!(network = %network.name, "Multicall address not found");
            TokenListError::MissingMulticallAddress {
                network: network.name.clone(),
            }
        })?;

        let mut ctx = WindowContext {
            caller,
            multicall,
            block,
            failed: Vec::new(),
            requests: 0,
        };
        let mut results = Vec::with_capacity(calls.len());
        let batches = calls.len().div_ceil(self.batch_size);

        for (idx, window) in calls.chunks(self.batch_size).enumerate() {
            tracing::info!(
                network = %network.name,
                batch = idx + 1,
                batches,
                calls = window.len(),
                "Processing batch"
            );

            let raw = self.run_window(&mut ctx, window).await;
            for (call, data) in window.iter().zip(raw) {
                let decoded = match data {
                    Some(bytes) => match call.decode(&bytes) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            tracing::debug!(
                                contract = %call.target,
                                function = %call.function,
                                error = %e,
                                "Error decoding result"
                            );
                            ctx.failed.push(FailedCall::new(call, e.to_string()));
                            None
                        }
                    },
                    None => None,
                };
                results.push(decoded);
            }
        }

        if !ctx.failed.is_empty() {
            tracing::warn!(network = %network.name, total = ctx.failed.len(), "Failed calls");
            for failed in ctx.failed.iter().take(FAILED_CALLS_LOGGED) {
                tracing::warn!(
                    contract = %failed.target,
                    function = %failed.function,
                    reason = %failed.reason,
                    "Failed call"
                );
            }
            if ctx.failed.len() > FAILED_CALLS_LOGGED {
                tracing::warn!("... and {} more failed calls", ctx.failed.len() - FAILED_CALLS_LOGGED);
            }
        }

        Ok(MulticallOutcome {
            results,
            failed: ctx.failed,
            requests: ctx.requests,
        })
    }

    /// Raw return data for `window`, one slot per call.
    fn run_window<'a, 'c: 'a>(
        &'a self,
        ctx: &'a mut WindowContext<'c>,
        window: &'a [Call],
    ) -> BoxFuture<'a, Vec<Option<Bytes>>> {
        Box::pin(async move {
            match Self::aggregate(ctx, window).await {
                Ok(return_data) => return_data.into_iter().map(Some).collect(),
                Err(e) if e.is_revert() && window.len() > 1 => {
                    let mid = window.len() / 2;
                    tracing::warn!(batch_size = window.len(), "Splitting batch after aggregate revert");

                    let mut results = self.run_window(&mut *ctx, &window[..mid]).await;
                    results.extend(self.run_window(&mut *ctx, &window[mid..]).await);
                    results
                }
                Err(e) => {
                    if let [call] = window {
                        tracing::warn!(
                            contract = %call.target,
                            function = %call.function,
                            error = %e,
                            "Call failed"
                        );
                    } else {
                        tracing::warn!(calls = window.len(), error = %e, "Aggregate call failed");
                    }
                    let reason = e.to_string();
                    ctx.failed
                        .extend(window.iter().map(|call| FailedCall::new(call, reason.clone())));
                    vec![None; window.len()]
                }
            }
        })
    }

    async fn aggregate(ctx: &mut WindowContext<'_>, window: &[Call]) -> Result<Vec<Bytes>> {
        let calls = window
            .iter()
            .map(|call| IMulticall::Call {
                target: call.target,
                callData: call.call_data.clone(),
            })
            .collect();
        let data = IMulticall::aggregateCall { calls }.abi_encode();

        ctx.requests += 1;
        let raw = ctx.caller.eth_call(ctx.multicall, data.into(), ctx.block).await?;

        let decoded = IMulticall::aggregateCall::abi_decode_returns(&raw, true)
            .map_err(|e| TokenListError::Decode(format!("malformed aggregate return: {e}")))?;
        if decoded.returnData.len() != window.len() {
            return Err(TokenListError::Decode(format!(
                "aggregate returned {} results for {} calls",
                decoded.returnData.len(),
                window.len()
            )));
        }

        tracing::trace!(block_number = %decoded.blockNumber, calls = window.len(), "Aggregate call succeeded");
        Ok(decoded.returnData)
    }
}
