//! Resolution of compiled contract artifacts.
//!
//! Both Hardhat (`bytecode: "0x.."`) and Foundry (`bytecode: { object: "0x.." }`)
//! artifact layouts are accepted. Artifacts are found by contract name anywhere
//! beneath the artifacts directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::json_abi::JsonAbi;
use alloy_primitives::{keccak256, Bytes, B256};
use serde::Deserialize;

use crate::{
    constants::{DEBUG_ARTIFACT_SUFFIX, JSON_EXTENSION},
    errors::ScriptError,
};

/// A compiled contract
#[derive(Clone, Debug)]
pub struct Artifact {
    /// The contract name
    pub name: String,
    /// The contract interface
    pub abi: JsonAbi,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

impl Artifact {
    /// The keccak256 hash of the creation bytecode
    pub fn bytecode_hash(&self) -> B256 {
        keccak256(&self.bytecode)
    }
}

/// The on-disk artifact representation
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract interface
    abi: JsonAbi,
    /// The creation bytecode, in either layout
    bytecode: RawBytecode,
}

/// Creation bytecode as emitted by Hardhat or Foundry
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat emits the bytecode as a hex string
    Hex(Bytes),
    /// Foundry nests it under `object`
    Object {
        /// The hex bytecode
        object: Bytes,
    },
}

impl From<RawBytecode> for Bytes {
    fn from(raw: RawBytecode) -> Self {
        match raw {
            RawBytecode::Hex(bytes) | RawBytecode::Object { object: bytes } => bytes,
        }
    }
}

/// Parse an artifact from its JSON representation
pub fn parse_artifact(name: &str, contents: &str) -> Result<Artifact, ScriptError> {
    let raw: RawArtifact = serde_json::from_str(contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", name, e)))?;

    Ok(Artifact {
        name: name.to_string(),
        abi: raw.abi,
        bytecode: raw.bytecode.into(),
    })
}

/// Locates artifacts beneath a root directory
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    /// The root of the artifacts tree
    root: PathBuf,
}

impl ArtifactStore {
    /// Search for artifacts beneath `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the artifact for the contract `name`
    pub fn load(&self, name: &str) -> Result<Artifact, ScriptError> {
        let path = self.find(name)?;
        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        parse_artifact(name, &contents)
    }

    /// Find the unique artifact file for the contract `name`
    fn find(&self, name: &str) -> Result<PathBuf, ScriptError> {
        let file_name = format!("{}.{}", name, JSON_EXTENSION);
        let mut matches = Vec::new();
        collect_matches(&self.root, &file_name, &mut matches)?;

        match matches.len() {
            0 => Err(ScriptError::ArtifactParsing(format!(
                "no artifact for {} under {}",
                name,
                self.root.display()
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(ScriptError::ArtifactParsing(format!(
                "multiple artifacts for {}: {:?}",
                name, matches
            ))),
        }
    }
}

/// Recursively collect files beneath `dir` named `file_name`
fn collect_matches(
    dir: &Path,
    file_name: &str,
    matches: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let entry = entry.map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
        let path = entry.path();

        // Symlinks are not followed, a cycle would otherwise recurse forever
        let file_type = entry
            .file_type()
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
        if file_type.is_dir() {
            collect_matches(&path, file_name, matches)?;
            continue;
        }

        let Some(candidate) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if candidate == file_name && !candidate.ends_with(DEBUG_ARTIFACT_SUFFIX) {
            matches.push(path);
        }
    }

    Ok(())
}
