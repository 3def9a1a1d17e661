//! Contract call encoding from a JSON ABI description

use crate::error::{SubmitterError, SubmitterResult};

use ethers::abi::Abi;
use ethers::types::Bytes;

/// Encodes named contract calls into transaction input data
pub trait CallEncoder {
    /// Encode a call to a zero-argument function
    fn encode_call(&self, function: &str) -> SubmitterResult<Bytes>;
}

/// Parsed contract interface
#[derive(Debug, Clone)]
pub struct ContractAbi {
    abi: Abi,
}

impl ContractAbi {
    /// Parse a JSON ABI (the array form emitted by solc)
    pub fn parse(json: &str) -> SubmitterResult<Self> {
        let abi: Abi = serde_json::from_str(json)
            .map_err(|e| SubmitterError::Abi(format!("Invalid ABI JSON: {}", e)))?;
        Ok(Self { abi })
    }
}

impl CallEncoder for ContractAbi {
    fn encode_call(&self, function: &str) -> SubmitterResult<Bytes> {
        let func = self
            .abi
            .functions_by_name(function)
            .map_err(|_| SubmitterError::Abi(format!("Function '{}' not found in ABI", function)))?
            .iter()
            .find(|f| f.inputs.is_empty())
            .ok_or_else(|| {
                SubmitterError::Abi(format!(
                    "Function '{}' has no zero-argument overload",
                    function
                ))
            })?;

        let data = func
            .encode_input(&[])
            .map_err(|e| SubmitterError::Abi(format!("Failed to encode '{}': {}", function, e)))?;

        Ok(Bytes::from(data))
    }
}
