//! Solidity bindings for the contracts the resolver talks to.

use alloy_sol_types::sol;

sol! {
    /// Multicall2-style aggregator. Multicall3 keeps this entry point, so the
    /// same binding works for every supported network.
    interface IMulticall {
        struct Call {
            address target;
            bytes callData;
        }

        function aggregate(Call[] calls) external returns (uint256 blockNumber, bytes[] returnData);
    }

    /// ERC20 metadata extension.
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}
