//! Loading of compiled contract artifacts into deployable contract factories.
//!
//! Both the Hardhat layout (`artifacts/contracts/<Source>.sol/<Name>.json`) and
//! the Foundry layout (`out/<Source>.sol/<Name>.json`) are understood.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
};
use alloy_primitives::{hex, Bytes};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    constants::{SOLIDITY_EXTENSION, UNLINKED_LIBRARY_MARKER},
    errors::ScriptError,
};

/// The subset of a compilation artifact the scripts care about
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract's JSON ABI
    abi: JsonAbi,
    /// The contract's creation bytecode
    bytecode: RawBytecode,
    /// Compiler metadata, only present in Foundry artifacts
    #[serde(default)]
    metadata: Option<Value>,
}

/// Creation bytecode, either inline (Hardhat) or wrapped in an object (Foundry)
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// A bare hex string
    Hex(String),
    /// An object holding the hex string under `object`
    Object {
        /// The hex-encoded bytecode
        object: String,
    },
}

impl RawBytecode {
    /// The hex-encoded bytecode, whichever layout it came in
    fn into_hex(self) -> String {
        match self {
            RawBytecode::Hex(s) | RawBytecode::Object { object: s } => s,
        }
    }
}

/// A named contract's ABI and creation bytecode, ready to be deployed
#[derive(Clone, Debug)]
pub struct ContractFactory {
    /// The contract name
    pub name: String,
    /// The contract's JSON ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
    /// The compiler version recorded in the artifact, if any
    pub compiler_version: Option<String>,
}

impl ContractFactory {
    /// Locate the artifact for contract `name` under `artifacts_dir` and load it
    pub fn load(artifacts_dir: &Path, name: &str) -> Result<Self, ScriptError> {
        let path = find_artifact(artifacts_dir, name)?;
        debug!("Loading {name} from {}", path.display());

        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ReadArtifact(format!("{}: {e}", path.display())))?;
        Self::from_artifact_json(name, &contents)
    }

    /// Parse a factory out of the JSON contents of an artifact
    pub fn from_artifact_json(name: &str, json: &str) -> Result<Self, ScriptError> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

        let bytecode_hex = raw.bytecode.into_hex();
        if bytecode_hex.contains(UNLINKED_LIBRARY_MARKER) {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name} references unlinked libraries"
            )));
        }

        let bytecode = hex::decode(bytecode_hex.trim())
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name} bytecode: {e}")))?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name} has no creation bytecode, is it an interface or abstract contract?"
            )));
        }

        let compiler_version = raw
            .metadata
            .as_ref()
            .and_then(|m| m.pointer("/compiler/version"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self { name: name.to_string(), abi: raw.abi, bytecode: bytecode.into(), compiler_version })
    }

    /// Warn if the artifact was produced by a compiler other than `expected`
    pub fn check_compiler_version(&self, expected: &str) {
        if let Some(version) = &self.compiler_version {
            // Versions look like `0.8.2+commit.661d1103`
            let release = version.split('+').next().unwrap_or(version);
            if release != expected {
                warn!("{} was compiled with solc {release}, expected {expected}", self.name);
            }
        }
    }

    /// The creation code with the ABI-encoded constructor arguments appended
    pub fn deploy_code(&self, constructor_args: &[u8]) -> Bytes {
        [self.bytecode.as_ref(), constructor_args].concat().into()
    }

    /// Encode a call to `function` with `args`, coerced to the types declared in the ABI.
    ///
    /// Overloads are told apart by their number of arguments.
    pub fn encode_call(&self, function: &str, args: &[String]) -> Result<Bytes, ScriptError> {
        let overloads = self.abi.function(function).ok_or_else(|| {
            ScriptError::CalldataConstruction(format!("{} has no function {function}", self.name))
        })?;

        let func = overloads.iter().find(|f| f.inputs.len() == args.len()).ok_or_else(|| {
            ScriptError::CalldataConstruction(format!(
                "{}.{function} does not take {} argument(s)",
                self.name,
                args.len()
            ))
        })?;

        let values = func
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve().map_err(|e| {
                    ScriptError::CalldataConstruction(format!("parameter {}: {e}", param.name))
                })?;
                ty.coerce_str(arg).map_err(|e| {
                    ScriptError::CalldataConstruction(format!(
                        "argument {arg:?} for parameter {} ({}): {e}",
                        param.name, param.ty
                    ))
                })
            })
            .collect::<Result<Vec<DynSolValue>, _>>()?;

        let calldata = func
            .abi_encode_input(&values)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
        Ok(calldata.into())
    }
}

/// Find the unique artifact file for contract `name` beneath `dir`
fn find_artifact(dir: &Path, name: &str) -> Result<PathBuf, ScriptError> {
    if !dir.is_dir() {
        return Err(ScriptError::ReadArtifact(format!(
            "artifacts directory {} does not exist",
            dir.display()
        )));
    }

    let file_name = format!("{name}.json");
    let mut matches = Vec::new();
    collect_artifacts(dir, &file_name, &mut matches)?;

    match matches.len() {
        0 => Err(ScriptError::ReadArtifact(format!(
            "no artifact for {name} under {}, have the contracts been compiled?",
            dir.display()
        ))),
        1 => Ok(matches.remove(0)),
        _ => Err(ScriptError::ReadArtifact(format!(
            "multiple artifacts for {name}: {}",
            matches.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

/// Recursively collect files named `file_name` that sit in a `<Source>.sol` directory
fn collect_artifacts(
    dir: &Path,
    file_name: &str,
    matches: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ReadArtifact(format!("{}: {e}", dir.display())))?;

    for entry in entries {
        let path = entry.map_err(|e| ScriptError::ReadArtifact(e.to_string()))?.path();
        if path.is_dir() {
            collect_artifacts(&path, file_name, matches)?;
            continue;
        }

        // Hardhat's `<Name>.dbg.json` siblings never match the exact file name
        let is_match = path.file_name().is_some_and(|f| f == file_name)
            && path
                .parent()
                .and_then(Path::file_name)
                .and_then(|p| p.to_str())
                .is_some_and(|p| p.ends_with(SOLIDITY_EXTENSION));
        if is_match {
            matches.push(path);
        }
    }

    Ok(())
}
