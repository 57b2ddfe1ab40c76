//! Definitions of Solidity functions called during deployment and upgrades

use alloy_sol_types::sol;

sol! {
    /// The OpenZeppelin v5 `ProxyAdmin`, created by each `TransparentUpgradeableProxy`
    #[sol(rpc)]
    interface ProxyAdminContract {
        function owner() external view returns (address);
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }
}
