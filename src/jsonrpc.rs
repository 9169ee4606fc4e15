use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, TokenListError};

/// Geth and most clients report `eth_call` reverts with this code.
const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub jsonrpc: String,
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
    pub id: u64,
}

impl<T> JsonRpcResponse<T> {
    pub fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        self.result
            .ok_or_else(|| TokenListError::Decode("response carried neither result nor error".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn is_revert(&self) -> bool {
        self.code == EXECUTION_REVERTED_CODE || self.message.to_lowercase().contains("revert")
    }
}

impl From<JsonRpcError> for TokenListError {
    fn from(error: JsonRpcError) -> Self {
        if error.is_revert() {
            let detail = match &error.data {
                Some(Value::String(data)) => format!("{} ({data})", error.message),
                _ => error.message,
            };
            TokenListError::Revert(detail)
        } else {
            TokenListError::JsonRpc { code: error.code, message: error.message }
        }
    }
}
