//! Utilities for the deployment playbooks.

use std::str::FromStr;

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::{Function, JsonAbi},
    network::EthereumWallet,
    providers::{DynProvider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::{hex, Address, Bytes};
use itertools::Itertools;

use crate::errors::ScriptError;

/// Sets up an RPC client that can sign for every one of the given private keys.
///
/// Returns the client along with the addresses it can sign for, the first of
/// which is the default sender. Without keys the client is read-only.
pub fn setup_client(
    priv_keys: &[String],
    rpc_url: &str,
) -> Result<(DynProvider, Vec<Address>), ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let mut signers = priv_keys
        .iter()
        .map(|key| PrivateKeySigner::from_str(key.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
        .into_iter();

    let Some(default_signer) = signers.next() else {
        let provider = ProviderBuilder::new().connect_http(url);
        return Ok((DynProvider::new(provider), Vec::new()));
    };

    let mut addresses = vec![default_signer.address()];
    let mut wallet = EthereumWallet::new(default_signer);
    for signer in signers {
        addresses.push(signer.address());
        wallet.register_signer(signer);
    }

    let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);
    Ok((DynProvider::new(provider), addresses))
}

/// Find the overload of `method` in `abi` taking `arity` arguments
pub fn find_function<'a>(
    abi: &'a JsonAbi,
    method: &str,
    arity: usize,
) -> Result<&'a Function, ScriptError> {
    abi.function(method)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
        .ok_or_else(|| {
            ScriptError::CalldataConstruction(format!(
                "no method {} taking {} arguments",
                method, arity
            ))
        })
}

/// Prepare calldata for invoking `method` with the given arguments
pub fn encode_function_call(
    abi: &JsonAbi,
    method: &str,
    args: &[DynSolValue],
) -> Result<Bytes, ScriptError> {
    find_function(abi, method, args.len())?
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| ScriptError::CalldataConstruction(format!("{}: {}", method, e)))
}

/// ABI-encode constructor arguments, to be appended to creation bytecode
pub fn encode_constructor_args(abi: &JsonAbi, args: &[DynSolValue]) -> Result<Bytes, ScriptError> {
    match abi.constructor() {
        Some(constructor) => constructor
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ScriptError::CalldataConstruction(format!("constructor: {}", e))),
        None if args.is_empty() => Ok(Bytes::new()),
        None => Err(ScriptError::CalldataConstruction(
            "arguments given for a contract without a constructor".to_string(),
        )),
    }
}

/// Render a value the way it would be written in Solidity
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(addr) => format!("{:#x}", addr),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::String(s) => format!("{:?}", s),
        DynSolValue::Bytes(b) => hex::encode_prefixed(b),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..*size]),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            format!("[{}]", format_args(values))
        }
        DynSolValue::Tuple(values) => format!("({})", format_args(values)),
        other => format!("{:?}", other),
    }
}

/// Render a list of arguments, comma separated
pub fn format_args(values: &[DynSolValue]) -> String {
    values.iter().map(format_value).join(", ")
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    fn staking_manager_abi() -> JsonAbi {
        JsonAbi::parse([
            "constructor()",
            "function initialize(address owner, address staker) external",
            "function setActiveStrategy(address asset, uint256 index) external",
            "function setActiveStrategy(address asset) external",
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_function_call() {
        let abi = staking_manager_abi();
        let calldata = encode_function_call(
            &abi,
            "initialize",
            &[
                DynSolValue::Address(Address::with_last_byte(1)),
                DynSolValue::Address(Address::with_last_byte(2)),
            ],
        )
        .unwrap();

        // 4-byte selector followed by two words
        assert_eq!(calldata.len(), 4 + 64);
        assert_eq!(calldata[4 + 31], 1);
        assert_eq!(calldata[4 + 63], 2);
    }

    #[test]
    fn test_overload_resolution() {
        let abi = staking_manager_abi();
        let f = find_function(&abi, "setActiveStrategy", 2).unwrap();
        assert_eq!(f.signature(), "setActiveStrategy(address,uint256)");

        assert!(find_function(&abi, "setActiveStrategy", 3).is_err());
        assert!(find_function(&abi, "addStrategy", 2).is_err());
    }

    #[test]
    fn test_wrong_argument_type() {
        let abi = staking_manager_abi();
        let res = encode_function_call(
            &abi,
            "initialize",
            &[DynSolValue::Bool(true), DynSolValue::Bool(false)],
        );
        assert!(matches!(res, Err(ScriptError::CalldataConstruction(_))));
    }

    #[test]
    fn test_constructor_args() {
        let abi = staking_manager_abi();
        assert!(encode_constructor_args(&abi, &[]).unwrap().is_empty());

        let no_constructor = JsonAbi::parse(["function foo() external"]).unwrap();
        assert!(encode_constructor_args(&no_constructor, &[]).is_ok());
        assert!(encode_constructor_args(&no_constructor, &[DynSolValue::Bool(true)]).is_err());
    }

    #[test]
    fn test_setup_client_signers() {
        // The first default anvil account
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let address = Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();

        let (_, signers) = setup_client(&[key.to_string()], "http://localhost:8545").unwrap();
        assert_eq!(signers, vec![address]);
    }

    #[test]
    fn test_setup_client_without_keys() {
        let (_, signers) = setup_client(&[], "http://localhost:8545").unwrap();
        assert!(signers.is_empty());
    }

    #[test]
    fn test_format_args() {
        let args = [
            DynSolValue::Address(Address::with_last_byte(0xab)),
            DynSolValue::Uint(U256::from(0), 256),
            DynSolValue::Bool(false),
        ];
        assert_eq!(
            format_args(&args),
            "0x00000000000000000000000000000000000000ab, 0, false"
        );
    }
}
