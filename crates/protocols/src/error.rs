use alloy::sol_types::decode_revert_reason;
use alloy::transports::{RpcError, TransportError};
use thiserror::Error;

/// Errors talking to the ledger node or decoding its answers.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON-RPC level error returned by the node.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Node supplied message.
        message: String,
    },

    /// A read-only call reverted.
    #[error("call reverted: {0}")]
    Reverted(String),

    /// Response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A call argument does not fit its ABI type.
    #[error("encode error: {0}")]
    Encode(String),

    /// The node did not answer in time.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl From<TransportError> for ProtocolError {
    fn from(err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => {
                // Geth reports reverts as code 3 with the payload in `data`;
                // other nodes use -32000 and only a message.
                if payload.code == 3 || payload.message.contains("revert") {
                    let reason = payload
                        .as_revert_data()
                        .and_then(|data| decode_revert_reason(&data))
                        .unwrap_or_else(|| payload.message.to_string());
                    ProtocolError::Reverted(reason)
                } else {
                    ProtocolError::Rpc {
                        code: payload.code,
                        message: payload.message.to_string(),
                    }
                }
            }
            RpcError::DeserError { err, .. } => ProtocolError::Decode(err.to_string()),
            RpcError::NullResp => ProtocolError::Decode("null response".into()),
            other => ProtocolError::Transport(other.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for ProtocolError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(err) => err.into(),
            other => ProtocolError::Decode(other.to_string()),
        }
    }
}
