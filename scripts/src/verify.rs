//! Block explorer source verification, delegated to `forge verify-contract`.
//!
//! Assumes that `forge` is locally available and that `contracts_dir` is the
//! root of the Foundry project the artifacts were compiled from.

use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

use tracing::{debug, info, warn};

use crate::{
    constants::{FORGE_COMMAND, VERIFY_CONTRACT_COMMAND},
    errors::ScriptError,
    types::Deployment,
};

/// Verifies deployed contracts against their sources
#[derive(Clone, Debug)]
pub struct Verifier {
    /// The block explorer API key
    api_key: Option<String>,
    /// The chain the contracts are deployed on
    chain_id: Option<u64>,
    /// The root of the Foundry project
    contracts_dir: PathBuf,
}

impl Verifier {
    /// A verifier for contracts compiled in `contracts_dir`
    pub fn new(api_key: Option<String>, contracts_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.is_empty()),
            chain_id: None,
            contracts_dir: contracts_dir.into(),
        }
    }

    /// Set the chain the contracts are deployed on
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Whether an explorer API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the verification command for a ledger record.
    ///
    /// Returns `None` for records that carry no source information, such as
    /// aliases of contracts created by other contracts.
    pub fn verification_command(
        &self,
        deployment: &Deployment,
    ) -> Result<Option<Command>, ScriptError> {
        let Some(contract_name) = &deployment.contract_name else {
            return Ok(None);
        };
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ScriptError::Verification("no explorer API key".to_string()))?;
        let chain_id = self
            .chain_id
            .ok_or_else(|| ScriptError::Verification("chain ID unknown".to_string()))?;

        let mut cmd = Command::new(FORGE_COMMAND);
        cmd.current_dir(&self.contracts_dir)
            .arg(VERIFY_CONTRACT_COMMAND)
            .arg(format!("{:#x}", deployment.address))
            .arg(contract_name)
            .args(["--chain", &chain_id.to_string()])
            .args(["--etherscan-api-key", api_key])
            .arg("--watch");

        if let Some(args) = deployment.constructor_args.as_ref().filter(|a| !a.is_empty()) {
            cmd.args(["--constructor-args", &args.to_string()]);
        }

        Ok(Some(cmd))
    }

    /// Verify every record that carries source information.
    ///
    /// A failure to verify one contract does not stop the others from being
    /// attempted.
    pub fn verify_all(&self, records: &[(String, Deployment)]) -> Result<(), ScriptError> {
        let mut failed = Vec::new();
        for (name, deployment) in records {
            let Some(cmd) = self.verification_command(deployment)? else {
                debug!("no sources recorded for \"{}\", not verifying", name);
                continue;
            };

            info!("verifying \"{}\" at {:#x}", name, deployment.address);
            if let Err(e) = command_success_or(cmd, "forge verify-contract failed") {
                warn!("failed to verify \"{}\": {}", name, e);
                failed.push(name.as_str());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ScriptError::Verification(format!(
                "could not verify {}",
                failed.join(", ")
            )))
        }
    }
}

/// Run a command with its output streamed, failing with `err_msg` if it exits unsuccessfully
fn command_success_or(mut cmd: Command, err_msg: &str) -> Result<(), ScriptError> {
    cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    if !cmd
        .status()
        .map_err(|e| ScriptError::Verification(e.to_string()))?
        .success()
    {
        Err(ScriptError::Verification(String::from(err_msg)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use alloy::json_abi::JsonAbi;
    use alloy_primitives::{Address, Bytes};

    use super::*;

    fn proxy_record() -> Deployment {
        let mut deployment = Deployment::new(Address::with_last_byte(0x11), JsonAbi::new());
        deployment.contract_name = Some("ERC1967Proxy".to_string());
        deployment.constructor_args = Some(Bytes::from(vec![0xab, 0xcd]));
        deployment
    }

    fn args_of(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_command_arguments() {
        let verifier = Verifier::new(Some("KEY".to_string()), "contracts").with_chain_id(5);
        let cmd = verifier
            .verification_command(&proxy_record())
            .unwrap()
            .unwrap();

        assert_eq!(cmd.get_program(), FORGE_COMMAND);
        assert_eq!(cmd.get_current_dir(), Some(PathBuf::from("contracts").as_path()));
        assert_eq!(
            args_of(&cmd),
            vec![
                "verify-contract",
                "0x0000000000000000000000000000000000000011",
                "ERC1967Proxy",
                "--chain",
                "5",
                "--etherscan-api-key",
                "KEY",
                "--watch",
                "--constructor-args",
                "0xabcd",
            ]
        );
    }

    #[test]
    fn test_no_constructor_args() {
        let verifier = Verifier::new(Some("KEY".to_string()), ".").with_chain_id(1);
        let mut record = proxy_record();
        record.constructor_args = Some(Bytes::new());

        let cmd = verifier.verification_command(&record).unwrap().unwrap();
        assert!(!args_of(&cmd).contains(&OsStr::new("--constructor-args")));
    }

    #[test]
    fn test_alias_not_verified() {
        let verifier = Verifier::new(Some("KEY".to_string()), ".").with_chain_id(1);
        let alias = Deployment::new(Address::with_last_byte(1), JsonAbi::new());

        assert!(verifier.verification_command(&alias).unwrap().is_none());
        assert!(verifier.verify_all(&[("Edgeless Wrapped ETH".to_string(), alias)]).is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let verifier = Verifier::new(Some(String::new()), ".").with_chain_id(1);

        assert!(!verifier.has_api_key());
        assert!(matches!(
            verifier.verification_command(&proxy_record()),
            Err(ScriptError::Verification(_))
        ));
    }
}
