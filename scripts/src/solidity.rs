//! Definitions of Solidity functions called when upgrading proxies

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IUUPSUpgradeable {
        function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
    }
}

sol! {
    #[sol(rpc)]
    interface IProxyAdmin {
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }
}
