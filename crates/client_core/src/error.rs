use shared::error::{RemoteCall, RemoteCallFailed};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("json-rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed json-rpc response: {0}")]
    MalformedResponse(String),
    #[error("abi error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
    #[error("cannot encode {field} {value:?}: {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },
    #[error("no receipt for transaction {tx_hash} after {attempts} polls")]
    ReceiptTimeout { tx_hash: String, attempts: u32 },
    #[error("identity provider exposes no accounts")]
    NoAccount,
}

impl GatewayError {
    pub fn invalid_argument(
        field: &'static str,
        value: &str,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidArgument {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn into_remote(self, call: RemoteCall) -> RemoteCallFailed {
        RemoteCallFailed::new(call, self.to_string())
    }
}
