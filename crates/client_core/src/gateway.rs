use async_trait::async_trait;
use shared::domain::{AccountRef, StudentRecord, StudentRef, TxHash};

use crate::error::GatewayError;

// User input arrives as `&str`; encoding it is up to the implementation.
// Writes resolve once the transaction has landed.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn list_student_refs(&self) -> Result<Vec<StudentRef>, GatewayError>;
    async fn fetch_student_record(&self, student: &StudentRef)
        -> Result<StudentRecord, GatewayError>;
    async fn fetch_grades(
        &self,
        student: &StudentRef,
        subjects: &[String],
    ) -> Result<Vec<u8>, GatewayError>;
    async fn register_teacher(
        &self,
        from: &AccountRef,
        teacher: &str,
    ) -> Result<TxHash, GatewayError>;
    async fn register_student(
        &self,
        from: &AccountRef,
        student: &str,
        id: &str,
        name: &str,
    ) -> Result<TxHash, GatewayError>;
    async fn assign_grade(
        &self,
        from: &AccountRef,
        student: &str,
        subject: &str,
        grade: &str,
    ) -> Result<TxHash, GatewayError>;
    async fn fetch_admin(&self) -> Result<AccountRef, GatewayError>;
    async fn is_teacher(&self, account: &str) -> Result<bool, GatewayError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn primary_identity(&self) -> Result<AccountRef, GatewayError>;
}
