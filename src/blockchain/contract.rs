//! Contract artifacts and dynamic ABI encoding.
//!
//! The registry contract is described by two files written at deployment
//! time: an address record and the contract interface (ABI). Both are read
//! once at startup; either one missing leaves the gateway without a bound
//! contract.

use std::path::Path;

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::Address;
use serde::Deserialize;

use crate::blockchain::address::normalize_address;
use crate::blockchain::types::{ChainError, ChainResult};

/// Functions the gateway invokes. Binding fails if the ABI lacks any of them.
pub const REQUIRED_FUNCTIONS: &[&str] = &[
    "issueCredential",
    "verifyCredential",
    "getCredential",
    "revokeCredential",
    "authorizeIssuer",
    "getIssuerCredentials",
    "getRecipientCredentials",
    "isAuthorizedIssuer",
];

/// Deployment record (`contract-address.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub address: String,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub deployer: Option<String>,
    #[serde(default)]
    pub deployment_time: Option<String>,
}

/// Raw artifacts as found on disk. Each is `None` when its file is absent.
#[derive(Debug, Clone, Default)]
pub struct ContractArtifacts {
    pub address: Option<AddressRecord>,
    pub abi: Option<JsonAbi>,
}

impl ContractArtifacts {
    /// Read both artifacts. A missing file is not an error; an unreadable or
    /// malformed one is.
    pub fn load(address_file: &Path, abi_file: &Path) -> ChainResult<Self> {
        let address = match read_optional(address_file)? {
            Some(content) => Some(serde_json::from_str::<AddressRecord>(&content).map_err(|e| {
                ChainError::Artifact(format!("{}: {}", address_file.display(), e))
            })?),
            None => None,
        };

        let abi = match read_optional(abi_file)? {
            Some(content) => Some(parse_abi(&content).map_err(|e| {
                ChainError::Artifact(format!("{}: {}", abi_file.display(), e))
            })?),
            None => None,
        };

        Ok(Self { address, abi })
    }
}

fn read_optional(path: &Path) -> ChainResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ChainError::Artifact(format!("{}: {}", path.display(), e))),
    }
}

/// Accept either a bare ABI array or a compiler artifact with an `abi` key.
pub fn parse_abi(content: &str) -> Result<JsonAbi, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("abi") => {
            serde_json::from_value(map.remove("abi").unwrap_or_default())
        }
        other => serde_json::from_value(other),
    }
}

/// A deployed contract: address plus interface.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    address: Address,
    network: Option<String>,
    abi: JsonAbi,
}

impl ContractHandle {
    /// Bind `abi` to `address`, checking every required function is present.
    pub fn new(address: Address, network: Option<String>, abi: JsonAbi) -> ChainResult<Self> {
        let missing: Vec<&str> = REQUIRED_FUNCTIONS
            .iter()
            .copied()
            .filter(|name| abi.function(name).map_or(true, |f| f.is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(ChainError::Artifact(format!(
                "ABI is missing functions: {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            address,
            network,
            abi,
        })
    }

    /// Build a handle from loaded artifacts. `Ok(None)` when either is absent.
    pub fn from_artifacts(artifacts: ContractArtifacts) -> ChainResult<Option<Self>> {
        let (record, abi) = match (artifacts.address, artifacts.abi) {
            (Some(record), Some(abi)) => (record, abi),
            _ => return Ok(None),
        };
        let address = normalize_address(&record.address)
            .map_err(|_| ChainError::Artifact(format!("bad contract address '{}'", record.address)))?;
        Self::new(address, record.network, abi).map(Some)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    fn function(&self, name: &str) -> ChainResult<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ChainError::Call(format!("function '{}' not in ABI", name)))
    }

    /// ABI-encode a call to `name` (selector included).
    pub fn encode(&self, name: &str, args: &[DynSolValue]) -> ChainResult<Vec<u8>> {
        self.function(name)?
            .abi_encode_input(args)
            .map_err(|e| ChainError::Call(format!("cannot encode {}: {}", name, e)))
    }

    /// Decode the return data of `name`.
    ///
    /// A function returning a single struct yields that struct's fields, so
    /// callers always index outputs positionally.
    pub fn decode(&self, name: &str, data: &[u8]) -> ChainResult<Vec<DynSolValue>> {
        let mut values = self
            .function(name)?
            .abi_decode_output(data)
            .map_err(|e| ChainError::Call(format!("cannot decode {} output: {}", name, e)))?;

        if values.len() == 1 && matches!(values[0], DynSolValue::Tuple(_)) {
            if let Some(DynSolValue::Tuple(fields)) = values.pop() {
                return Ok(fields);
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABI: &str = include_str!("../../contracts/contract-abi.json");

    fn handle() -> ContractHandle {
        ContractHandle::new(Address::repeat_byte(0x11), None, parse_abi(ABI).unwrap()).unwrap()
    }

    #[test]
    fn test_shipped_abi_has_required_functions() {
        let abi = parse_abi(ABI).unwrap();
        for name in REQUIRED_FUNCTIONS {
            assert!(abi.function(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_artifact_wrapper_accepted() {
        let wrapped = format!("{{\"contractName\":\"X\",\"abi\":{}}}", ABI);
        assert!(parse_abi(&wrapped).is_ok());
    }

    #[test]
    fn test_missing_function_rejected() {
        let abi: JsonAbi = serde_json::from_str("[]").unwrap();
        let err = ContractHandle::new(Address::ZERO, None, abi).unwrap_err();
        assert!(err.to_string().contains("issueCredential"));
    }

    #[test]
    fn test_encode_includes_selector() {
        let data = handle()
            .encode("revokeCredential", &[DynSolValue::String("abc".into())])
            .unwrap();
        // keccak256("revokeCredential(string)")[..4]
        let selector = alloy::primitives::keccak256("revokeCredential(string)");
        assert_eq!(&data[..4], &selector[..4]);
    }

    #[test]
    fn test_encode_wrong_arity() {
        let result = handle().encode("revokeCredential", &[]);
        assert!(matches!(result, Err(ChainError::Call(_))));
    }

    #[test]
    fn test_decode_bool_output() {
        let encoded = DynSolValue::Bool(true).abi_encode();
        let values = handle().decode("isAuthorizedIssuer", &encoded).unwrap();
        assert_eq!(values, vec![DynSolValue::Bool(true)]);
    }

    #[test]
    fn test_missing_files_are_none() {
        let artifacts = ContractArtifacts::load(
            Path::new("no/such/address.json"),
            Path::new("no/such/abi.json"),
        )
        .unwrap();
        assert!(artifacts.address.is_none());
        assert!(artifacts.abi.is_none());
        assert!(ContractHandle::from_artifacts(artifacts).unwrap().is_none());
    }

    #[test]
    fn test_address_record_parse() {
        let record: AddressRecord = serde_json::from_str(
            r#"{"address":"0x5FbDB2315678afecb367f032d93F642f64180aa3","network":"localhost","deployer":"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266","deploymentTime":"2024-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(record.network.as_deref(), Some("localhost"));
        assert!(record.deployment_time.is_some());
    }
}
