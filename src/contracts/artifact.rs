use std::fs;
use std::path::{Path, PathBuf};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::{JsonAbi, Param},
    primitives::Bytes,
};
use eyre::{Result, WrapErr, eyre};
use serde::Deserialize;

use crate::project::{Project, ProjectType};

/// Compiled contract: ABI plus creation bytecode
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub path: PathBuf,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// Build artifact as written by Hardhat or Foundry
#[derive(Debug, Deserialize)]
struct RawArtifact {
    #[serde(default)]
    abi: JsonAbi,
    bytecode: RawBytecode,
}

/// Hardhat stores `bytecode` as a hex string, Foundry as `{ "object": "0x..." }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn as_hex(&self) -> &str {
        match self {
            RawBytecode::Hex(s) | RawBytecode::Object { object: s } => s,
        }
    }
}

impl ContractArtifact {
    /// Locate and load the artifact for `contract_name` in the project's build output
    pub fn load(project: &Project, contract_name: &str) -> Result<Self> {
        let path = find_artifact(project, contract_name)?;
        Self::from_file(contract_name, &path)
    }

    pub fn from_file(contract_name: &str, path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {:?}", path))?;
        Self::from_json(contract_name, path, &content)
    }

    fn from_json(contract_name: &str, path: &Path, content: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(content)
            .wrap_err_with(|| format!("Failed to parse artifact {:?}", path))?;

        let hex = raw.bytecode.as_hex();
        if hex.contains("__$") {
            return Err(eyre!(
                "{} has unlinked library references and cannot be deployed",
                contract_name
            ));
        }

        let bytecode: Bytes = hex
            .parse()
            .wrap_err_with(|| format!("Invalid bytecode in {:?}", path))?;

        if bytecode.is_empty() {
            return Err(eyre!(
                "{} has no bytecode (is it an interface or abstract contract?)",
                contract_name
            ));
        }

        Ok(Self {
            name: contract_name.to_string(),
            path: path.to_path_buf(),
            abi: raw.abi,
            bytecode,
        })
    }

    /// Creation code with ABI-encoded constructor arguments appended
    pub fn deploy_code(&self, args: &[String]) -> Result<Bytes> {
        let mut code = self.bytecode.to_vec();

        match &self.abi.constructor {
            Some(constructor) => {
                let values = coerce_args(&constructor.inputs, args)
                    .wrap_err_with(|| format!("Invalid constructor arguments for {}", self.name))?;
                let encoded = constructor
                    .abi_encode_input(&values)
                    .wrap_err("Failed to encode constructor arguments")?;
                code.extend(encoded);
            }
            None if args.is_empty() => {}
            None => {
                return Err(eyre!(
                    "{} has no constructor but {} argument(s) were given",
                    self.name,
                    args.len()
                ));
            }
        }

        Ok(code.into())
    }

    /// Calldata for `function(args...)`, choosing the overload by arity
    pub fn encode_call(&self, function: &str, args: &[String]) -> Result<Bytes> {
        let overloads = self
            .abi
            .function(function)
            .ok_or_else(|| eyre!("{} has no function named {}", self.name, function))?;

        let func = overloads
            .iter()
            .find(|f| f.inputs.len() == args.len())
            .ok_or_else(|| {
                eyre!(
                    "{}.{} does not take {} argument(s)",
                    self.name,
                    function,
                    args.len()
                )
            })?;

        let values = coerce_args(&func.inputs, args)
            .wrap_err_with(|| format!("Invalid arguments for {}", func.signature()))?;

        let calldata = func
            .abi_encode_input(&values)
            .wrap_err_with(|| format!("Failed to encode {}", func.signature()))?;

        Ok(calldata.into())
    }
}

/// Parse string arguments against the ABI parameter types
fn coerce_args(params: &[Param], args: &[String]) -> Result<Vec<DynSolValue>> {
    if params.len() != args.len() {
        return Err(eyre!(
            "expected {} argument(s), got {}",
            params.len(),
            args.len()
        ));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .wrap_err_with(|| format!("Unsupported parameter type {}", param.ty))?;
            ty.coerce_str(arg)
                .wrap_err_with(|| format!("Cannot parse {:?} as {}", arg, param.ty))
        })
        .collect()
}

/// Find `<Name>.json` inside a `*.sol` directory under the artifacts dir
fn find_artifact(project: &Project, contract_name: &str) -> Result<PathBuf> {
    let dir = &project.artifacts_dir;
    if !dir.exists() {
        return Err(eyre!(
            "Artifacts directory {:?} does not exist; compile the contracts first",
            dir
        ));
    }

    // Foundry's default layout is flat: out/<Name>.sol/<Name>.json
    if project.project_type == ProjectType::Foundry {
        let direct = dir
            .join(format!("{}.sol", contract_name))
            .join(format!("{}.json", contract_name));
        if direct.exists() {
            return Ok(direct);
        }
    }

    let mut found = Vec::new();
    scan_dir(dir, &format!("{}.json", contract_name), &mut found)?;

    match found.len() {
        0 => Err(eyre!(
            "No artifact found for {} under {:?}",
            contract_name,
            dir
        )),
        1 => Ok(found.remove(0)),
        _ => Err(eyre!(
            "Several artifacts found for {}: {:?}",
            contract_name,
            found
        )),
    }
}

fn scan_dir(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).wrap_err_with(|| format!("Failed to read {:?}", dir))?;

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == "build-info") {
                continue;
            }
            scan_dir(&path, file_name, found)?;
        } else if path.file_name().is_some_and(|n| n == file_name)
            && path
                .parent()
                .and_then(|p| p.extension())
                .is_some_and(|ext| ext == "sol")
        {
            found.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    const PUBLIC_VOTING_ARTIFACT: &str = r#"{
        "_format": "hh-sol-artifact-1",
        "contractName": "PublicVotingSystem",
        "abi": [
            {
                "type": "function",
                "name": "createProduct",
                "inputs": [
                    { "name": "name", "type": "string", "internalType": "string" },
                    { "name": "description", "type": "string", "internalType": "string" }
                ],
                "outputs": [],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": "0x6080604052",
        "deployedBytecode": "0x6080"
    }"#;

    const OWNED_ARTIFACT: &str = r#"{
        "abi": [
            {
                "type": "constructor",
                "inputs": [
                    { "name": "owner", "type": "address", "internalType": "address" },
                    { "name": "limit", "type": "uint256", "internalType": "uint256" }
                ],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": { "object": "0x6080604052", "sourceMap": "", "linkReferences": {} }
    }"#;

    fn parse(name: &str, json: &str) -> ContractArtifact {
        ContractArtifact::from_json(name, Path::new("test.json"), json).unwrap()
    }

    #[test]
    fn test_parse_hardhat_and_foundry_bytecode() {
        let hardhat = parse("PublicVotingSystem", PUBLIC_VOTING_ARTIFACT);
        assert_eq!(hardhat.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);

        let foundry = parse("Owned", OWNED_ARTIFACT);
        assert_eq!(foundry.bytecode, hardhat.bytecode);
        assert!(foundry.abi.constructor.is_some());
    }

    #[test]
    fn test_empty_bytecode_is_rejected() {
        let err = ContractArtifact::from_json(
            "IVoting",
            Path::new("IVoting.json"),
            r#"{ "abi": [], "bytecode": "0x" }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no bytecode"));
    }

    #[test]
    fn test_encode_call_prefixes_selector() {
        let artifact = parse("PublicVotingSystem", PUBLIC_VOTING_ARTIFACT);
        let calldata = artifact
            .encode_call(
                "createProduct",
                &["MetaMask Wallet Extension".to_string(), "Browser wallet".to_string()],
            )
            .unwrap();

        let selector = &keccak256("createProduct(string,string)")[..4];
        assert_eq!(&calldata[..4], selector);
        // two offsets, then each string as length word + one padded data word
        assert_eq!(calldata.len(), 4 + 32 * 2 + 64 * 2);
    }

    #[test]
    fn test_encode_call_rejects_wrong_arity_and_unknown_functions() {
        let artifact = parse("PublicVotingSystem", PUBLIC_VOTING_ARTIFACT);
        assert!(artifact.encode_call("createProduct", &["only one".to_string()]).is_err());
        assert!(artifact.encode_call("vote", &[]).is_err());
    }

    #[test]
    fn test_deploy_code_appends_constructor_args() {
        let artifact = parse("Owned", OWNED_ARTIFACT);
        let code = artifact
            .deploy_code(&[
                "0x1234567890123456789012345678901234567890".to_string(),
                "42".to_string(),
            ])
            .unwrap();

        assert_eq!(&code[..5], artifact.bytecode.as_ref());
        assert_eq!(code.len(), 5 + 64);
        assert_eq!(code[code.len() - 1], 42);

        assert!(artifact.deploy_code(&["not-an-address".to_string(), "1".to_string()]).is_err());
    }

    #[test]
    fn test_deploy_code_without_constructor() {
        let artifact = parse("PublicVotingSystem", PUBLIC_VOTING_ARTIFACT);
        assert_eq!(artifact.deploy_code(&[]).unwrap(), artifact.bytecode);
        assert!(artifact.deploy_code(&["1".to_string()]).is_err());
    }

    #[test]
    fn test_find_hardhat_artifact_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("hardhat.config.js"), "module.exports = {};").unwrap();

        let nested = root.join("artifacts/contracts/voting/Voting.sol");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("PublicVotingSystem.json"), PUBLIC_VOTING_ARTIFACT).unwrap();
        std::fs::write(nested.join("PublicVotingSystem.dbg.json"), "{}").unwrap();
        std::fs::create_dir_all(root.join("artifacts/build-info")).unwrap();

        let project = Project::new_hardhat(root).unwrap();
        let artifact = ContractArtifact::load(&project, "PublicVotingSystem").unwrap();
        assert_eq!(artifact.path, nested.join("PublicVotingSystem.json"));

        assert!(ContractArtifact::load(&project, "PrivateVotingSystem").is_err());
    }
}
