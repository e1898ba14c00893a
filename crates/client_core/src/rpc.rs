use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use shared::domain::{AccountRef, StudentRecord, StudentRef, TxHash};
use tracing::{debug, info, warn};

use crate::{
    abi::{
        addStudentCall, addTeacherCall, adminCall, assignGradeCall, getAllStudentsCall,
        getStudentCall, teachersCall, viewGradesCall,
    },
    config::Settings,
    error::GatewayError,
    gateway::{IdentityProvider, LedgerGateway},
};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransactionReceipt {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "blockNumber")]
    block_number: Option<String>,
}

impl TransactionReceipt {
    fn succeeded(&self) -> bool {
        // Receipts without a status field predate EIP-658 and only exist
        // for included transactions.
        self.status.as_deref() != Some("0x0")
    }
}

pub struct JsonRpcClient {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, GatewayError> {
        self.request_optional(method, params).await?.ok_or_else(|| {
            GatewayError::MalformedResponse(format!("{method} returned neither result nor error"))
        })
    }

    /// Like [`Self::request`], but a `null` result is `Ok(None)`.
    pub async fn request_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "json-rpc: request");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?;
        // Nodes may pair an HTTP error status with a JSON-RPC error body; the
        // body wins when it parses.
        let status = response.error_for_status_ref().map(|_| ());
        let body = response.bytes().await?;

        match serde_json::from_slice::<RpcResponse<T>>(&body) {
            Ok(RpcResponse {
                error: Some(error), ..
            }) => Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            }),
            Ok(envelope) => {
                status?;
                Ok(envelope.result)
            }
            Err(err) => {
                status?;
                Err(GatewayError::MalformedResponse(format!(
                    "{method} returned an unreadable body: {err}"
                )))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            attempts: 60,
        }
    }
}

impl From<&Settings> for ReceiptPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            interval: Duration::from_millis(settings.receipt_poll_interval_ms),
            attempts: settings.receipt_poll_attempts,
        }
    }
}

pub struct RpcLedgerGateway {
    rpc: Arc<JsonRpcClient>,
    contract: Address,
    receipts: ReceiptPolicy,
}

impl RpcLedgerGateway {
    pub fn new(rpc: Arc<JsonRpcClient>, contract: Address, receipts: ReceiptPolicy) -> Self {
        Self {
            rpc,
            contract,
            receipts,
        }
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return, GatewayError> {
        let data = hex::encode_prefixed(call.abi_encode());
        let raw: String = self
            .rpc
            .request(
                "eth_call",
                json!([{ "to": self.contract.to_string(), "data": data }, "latest"]),
            )
            .await?;
        let bytes = decode_hex(&raw)?;
        Ok(C::abi_decode_returns(&bytes, true)?)
    }

    async fn transact<C: SolCall>(
        &self,
        from: &AccountRef,
        call: C,
    ) -> Result<TxHash, GatewayError> {
        let data = hex::encode_prefixed(call.abi_encode());
        let tx_hash: String = self
            .rpc
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": from.as_str(),
                    "to": self.contract.to_string(),
                    "data": data,
                }]),
            )
            .await?;
        info!(%tx_hash, signature = C::SIGNATURE, from = %from, "rpc: transaction submitted");
        self.await_receipt(&tx_hash).await?;
        Ok(TxHash(tx_hash))
    }

    async fn await_receipt(&self, tx_hash: &str) -> Result<(), GatewayError> {
        for attempt in 1..=self.receipts.attempts {
            let receipt: Option<TransactionReceipt> = self
                .rpc
                .request_optional("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            match receipt {
                Some(receipt) if receipt.succeeded() => {
                    info!(
                        tx_hash,
                        block = receipt.block_number.as_deref().unwrap_or("unknown"),
                        "rpc: transaction included"
                    );
                    return Ok(());
                }
                Some(_) => {
                    warn!(tx_hash, "rpc: transaction reverted");
                    return Err(GatewayError::Reverted {
                        tx_hash: tx_hash.to_string(),
                    });
                }
                None if attempt < self.receipts.attempts => {
                    debug!(tx_hash, attempt, "rpc: receipt pending");
                    tokio::time::sleep(self.receipts.interval).await;
                }
                None => {}
            }
        }
        Err(GatewayError::ReceiptTimeout {
            tx_hash: tx_hash.to_string(),
            attempts: self.receipts.attempts,
        })
    }
}

#[async_trait]
impl LedgerGateway for RpcLedgerGateway {
    async fn list_student_refs(&self) -> Result<Vec<StudentRef>, GatewayError> {
        let listed = self.call(getAllStudentsCall {}).await?;
        Ok(listed
            .students
            .into_iter()
            .map(|address| StudentRef(address.to_string()))
            .collect())
    }

    async fn fetch_student_record(
        &self,
        student: &StudentRef,
    ) -> Result<StudentRecord, GatewayError> {
        let student = parse_address("student", student.as_str())?;
        let record = self.call(getStudentCall { student }).await?;
        Ok(StudentRecord::new(record.id, record.name))
    }

    async fn fetch_grades(
        &self,
        student: &StudentRef,
        subjects: &[String],
    ) -> Result<Vec<u8>, GatewayError> {
        let student = parse_address("student", student.as_str())?;
        let report = self
            .call(viewGradesCall {
                student,
                subjects: subjects.to_vec(),
            })
            .await?;
        Ok(report.grades)
    }

    async fn register_teacher(
        &self,
        from: &AccountRef,
        teacher: &str,
    ) -> Result<TxHash, GatewayError> {
        let teacher = parse_address("teacher", teacher)?;
        self.transact(from, addTeacherCall { teacher }).await
    }

    async fn register_student(
        &self,
        from: &AccountRef,
        student: &str,
        id: &str,
        name: &str,
    ) -> Result<TxHash, GatewayError> {
        let student = parse_address("student", student)?;
        let id = id
            .parse::<U256>()
            .map_err(|err| GatewayError::invalid_argument("id", id, err))?;
        self.transact(
            from,
            addStudentCall {
                student,
                id,
                name: name.to_string(),
            },
        )
        .await
    }

    async fn assign_grade(
        &self,
        from: &AccountRef,
        student: &str,
        subject: &str,
        grade: &str,
    ) -> Result<TxHash, GatewayError> {
        let student = parse_address("student", student)?;
        let grade = grade
            .parse::<u8>()
            .map_err(|err| GatewayError::invalid_argument("grade", grade, err))?;
        self.transact(
            from,
            assignGradeCall {
                student,
                subject: subject.to_string(),
                grade,
            },
        )
        .await
    }

    async fn fetch_admin(&self) -> Result<AccountRef, GatewayError> {
        let admin = self.call(adminCall {}).await?.admin;
        Ok(AccountRef(admin.to_string()))
    }

    async fn is_teacher(&self, account: &str) -> Result<bool, GatewayError> {
        let account = parse_address("account", account)?;
        Ok(self.call(teachersCall { account }).await?.registered)
    }
}

pub struct RpcIdentityProvider {
    rpc: Arc<JsonRpcClient>,
}

impl RpcIdentityProvider {
    pub fn new(rpc: Arc<JsonRpcClient>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl IdentityProvider for RpcIdentityProvider {
    async fn primary_identity(&self) -> Result<AccountRef, GatewayError> {
        let accounts: Vec<String> = self.rpc.request("eth_accounts", json!([])).await?;
        accounts
            .into_iter()
            .next()
            .map(AccountRef)
            .ok_or(GatewayError::NoAccount)
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, GatewayError> {
    value
        .parse::<Address>()
        .map_err(|err| GatewayError::invalid_argument(field, value, err))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, GatewayError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|err| {
        GatewayError::MalformedResponse(format!("eth_call returned invalid hex: {err}"))
    })
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
