//! The deployment ledger: a per-network directory of JSON records mapping
//! contract names to addresses and interfaces.
//!
//! Layout:
//! ```text
//! <root>/<network>/<Name>.json      one record per deployment or alias
//! <root>/<network>/.chainId         the chain the records belong to
//! <root>/<network>/.migrations.json completed playbook ids
//! ```

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::debug;

use crate::{
    constants::{CHAIN_ID_FILE, JSON_EXTENSION, MIGRATIONS_FILE},
    errors::ScriptError,
    types::Deployment,
};

/// Completed playbook ids, mapped to the unix time at which they completed
pub type Migrations = BTreeMap<String, u64>;

/// A handle on one network's deployment ledger
#[derive(Clone, Debug)]
pub struct DeploymentLedger {
    /// The directory holding the network's records
    dir: PathBuf,
}

impl DeploymentLedger {
    /// Open the ledger for `network` under the `root` directory.
    ///
    /// The directory is created on the first write.
    pub fn open(root: &Path, network: &str) -> Self {
        Self {
            dir: root.join(network),
        }
    }

    /// The directory holding the network's records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the record for `name`, if one exists
    pub fn get(&self, name: &str) -> Result<Option<Deployment>, ScriptError> {
        let path = self.record_path(name)?;
        if !path.exists() {
            return Ok(None);
        }

        let contents =
            fs::read_to_string(&path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
        let deployment = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", path.display(), e)))?;

        Ok(Some(deployment))
    }

    /// Write the record for `name`, replacing any previous one
    pub fn save(&self, name: &str, deployment: &Deployment) -> Result<(), ScriptError> {
        let path = self.record_path(name)?;
        self.ensure_dir()?;

        let contents = serde_json::to_string_pretty(deployment)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(&path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

        debug!("saved {} to {}", name, path.display());
        Ok(())
    }

    /// All records in the ledger, sorted by name
    pub fn all(&self) -> Result<Vec<(String, Deployment)>, ScriptError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(&self.dir).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?
                .path();

            let is_record = path.extension().is_some_and(|ext| ext == JSON_EXTENSION)
                && path.file_name() != Some(OsStr::new(MIGRATIONS_FILE));
            if let Some(stem) = path.file_stem().filter(|_| is_record) {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
        names.sort();

        let mut records = Vec::with_capacity(names.len());
        for name in names {
            if let Some(deployment) = self.get(&name)? {
                records.push((name, deployment));
            }
        }

        Ok(records)
    }

    /// Check that the ledger belongs to the given chain, claiming it for
    /// the chain if no chain has been recorded yet
    pub fn check_chain_id(&self, chain_id: u64) -> Result<(), ScriptError> {
        let path = self.dir.join(CHAIN_ID_FILE);
        if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
            let expected = contents.trim().parse::<u64>().map_err(|e| {
                ScriptError::ReadDeployments(format!("{}: {}", path.display(), e))
            })?;

            if expected != chain_id {
                return Err(ScriptError::ChainIdMismatch {
                    expected,
                    actual: chain_id,
                });
            }
            return Ok(());
        }

        self.ensure_dir()?;
        fs::write(&path, chain_id.to_string())
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))
    }

    /// The playbooks that have completed on this network
    pub fn migrations(&self) -> Result<Migrations, ScriptError> {
        let path = self.dir.join(MIGRATIONS_FILE);
        if !path.exists() {
            return Ok(Migrations::new());
        }

        let contents =
            fs::read_to_string(&path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", path.display(), e)))
    }

    /// Record that the playbook with the given id has completed
    pub fn record_migration(&self, id: &str) -> Result<(), ScriptError> {
        let mut migrations = self.migrations()?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?
            .as_secs();
        migrations.insert(id.to_string(), now);

        self.ensure_dir()?;
        let contents = serde_json::to_string_pretty(&migrations)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(self.dir.join(MIGRATIONS_FILE), contents)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))
    }

    // -----------
    // | Helpers |
    // -----------

    /// The path of the record for `name`
    fn record_path(&self, name: &str) -> Result<PathBuf, ScriptError> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(ScriptError::WriteDeployments(format!(
                "invalid deployment name {:?}",
                name
            )));
        }

        Ok(self.dir.join(format!("{}.{}", name, JSON_EXTENSION)))
    }

    /// Create the ledger directory if it does not exist
    fn ensure_dir(&self) -> Result<(), ScriptError> {
        fs::create_dir_all(&self.dir).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use alloy::json_abi::JsonAbi;
    use alloy_primitives::Address;
    use tempfile::tempdir;

    use super::*;

    fn wrapped_token_abi() -> JsonAbi {
        JsonAbi::parse(["function balanceOf(address account) external view returns (uint256)"])
            .unwrap()
    }

    #[test]
    fn test_save_then_get() {
        let root = tempdir().unwrap();
        let ledger = DeploymentLedger::open(root.path(), "sepolia");

        let mut deployment = Deployment::new(Address::with_last_byte(7), wrapped_token_abi());
        deployment.implementation = Some(Address::with_last_byte(8));
        ledger.save("Edgeless Wrapped ETH", &deployment).unwrap();

        let read = ledger.get("Edgeless Wrapped ETH").unwrap();
        assert_eq!(read, Some(deployment));
        assert!(root.path().join("sepolia/Edgeless Wrapped ETH.json").exists());
    }

    #[test]
    fn test_missing_record() {
        let root = tempdir().unwrap();
        let ledger = DeploymentLedger::open(root.path(), "sepolia");

        assert_eq!(ledger.get("EdgelessDeposit").unwrap(), None);
        assert!(ledger.all().unwrap().is_empty());
    }

    #[test]
    fn test_all_skips_bookkeeping_files() {
        let root = tempdir().unwrap();
        let ledger = DeploymentLedger::open(root.path(), "goerli");

        let abi = wrapped_token_abi();
        ledger
            .save("StakingManager", &Deployment::new(Address::with_last_byte(2), abi.clone()))
            .unwrap();
        ledger
            .save("EdgelessDeposit", &Deployment::new(Address::with_last_byte(1), abi))
            .unwrap();
        ledger.record_migration("001_deploy").unwrap();
        ledger.check_chain_id(5).unwrap();

        let names: Vec<_> = ledger.all().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["EdgelessDeposit", "StakingManager"]);
    }

    #[test]
    fn test_chain_id_mismatch() {
        let root = tempdir().unwrap();
        let ledger = DeploymentLedger::open(root.path(), "sepolia");

        ledger.check_chain_id(11155111).unwrap();
        ledger.check_chain_id(11155111).unwrap();
        assert!(matches!(
            ledger.check_chain_id(1),
            Err(ScriptError::ChainIdMismatch {
                expected: 11155111,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_migrations_persist() {
        let root = tempdir().unwrap();
        DeploymentLedger::open(root.path(), "sepolia")
            .record_migration("002_set_l2_token_addresses")
            .unwrap();

        let reopened = DeploymentLedger::open(root.path(), "sepolia");
        let migrations = reopened.migrations().unwrap();
        assert!(migrations.contains_key("002_set_l2_token_addresses"));
        assert_eq!(migrations.len(), 1);
    }

    #[test]
    fn test_invalid_name() {
        let root = tempdir().unwrap();
        let ledger = DeploymentLedger::open(root.path(), "sepolia");

        assert!(ledger.get("../escape").is_err());
        assert!(ledger.get(".chainId").is_err());
    }
}
