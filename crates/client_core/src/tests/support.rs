use std::sync::{Mutex, MutexGuard};

use alloy_primitives::U256;
use async_trait::async_trait;
use shared::{
    domain::{AccountRef, StudentRecord, StudentRef, TxHash},
    error::RemoteCall,
};

use crate::{
    error::GatewayError,
    gateway::{IdentityProvider, LedgerGateway},
};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("test mutex")
}

pub(crate) fn reverted(message: &str) -> GatewayError {
    GatewayError::Rpc {
        code: -32000,
        message: message.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedWrite {
    pub call: RemoteCall,
    pub from: AccountRef,
    pub args: Vec<String>,
}

/// In-memory stand-in for the records contract.
///
/// `log` records `list`, `start:<ref>` and `end:<ref>` entries so tests can
/// check how calls were ordered.
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub students: Mutex<Vec<(StudentRef, StudentRecord)>>,
    pub list_failure: Mutex<Option<String>>,
    pub fetch_failure_for: Mutex<Option<String>>,
    pub grades: Mutex<Vec<u8>>,
    pub write_failure: Mutex<Option<String>>,
    pub log: Mutex<Vec<String>>,
    pub writes: Mutex<Vec<RecordedWrite>>,
}

impl FakeGateway {
    pub fn with_students(students: &[(&str, u64, &str)]) -> Self {
        let gateway = Self::default();
        *lock(&gateway.students) = students
            .iter()
            .map(|(student, id, name)| {
                (
                    StudentRef::new(*student),
                    StudentRecord::new(U256::from(*id), *name),
                )
            })
            .collect();
        gateway
    }

    pub fn failing_listing(self, message: &str) -> Self {
        *lock(&self.list_failure) = Some(message.to_string());
        self
    }

    pub fn failing_fetch_for(self, student: &str) -> Self {
        *lock(&self.fetch_failure_for) = Some(student.to_string());
        self
    }

    pub fn with_grades(self, grades: Vec<u8>) -> Self {
        *lock(&self.grades) = grades;
        self
    }

    pub fn failing_writes(self, message: &str) -> Self {
        *lock(&self.write_failure) = Some(message.to_string());
        self
    }

    pub fn log(&self) -> Vec<String> {
        lock(&self.log).clone()
    }

    pub fn fetch_starts(&self) -> usize {
        self.log()
            .iter()
            .filter(|entry| entry.starts_with("start:"))
            .count()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        lock(&self.writes).clone()
    }

    fn record_write(
        &self,
        call: RemoteCall,
        from: &AccountRef,
        args: &[&str],
    ) -> Result<TxHash, GatewayError> {
        lock(&self.writes).push(RecordedWrite {
            call,
            from: from.clone(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });
        if let Some(message) = lock(&self.write_failure).clone() {
            return Err(reverted(&message));
        }
        Ok(TxHash(format!("0xtx{}", lock(&self.writes).len())))
    }
}

#[async_trait]
impl LedgerGateway for FakeGateway {
    async fn list_student_refs(&self) -> Result<Vec<StudentRef>, GatewayError> {
        lock(&self.log).push("list".to_string());
        tokio::task::yield_now().await;
        if let Some(message) = lock(&self.list_failure).clone() {
            return Err(reverted(&message));
        }
        Ok(lock(&self.students)
            .iter()
            .map(|(student, _)| student.clone())
            .collect())
    }

    async fn fetch_student_record(
        &self,
        student: &StudentRef,
    ) -> Result<StudentRecord, GatewayError> {
        lock(&self.log).push(format!("start:{student}"));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        lock(&self.log).push(format!("end:{student}"));

        if lock(&self.fetch_failure_for).as_deref() == Some(student.as_str()) {
            return Err(reverted("execution reverted: student not found"));
        }
        lock(&self.students)
            .iter()
            .find(|(candidate, _)| candidate == student)
            .map(|(_, record)| record.clone())
            .ok_or_else(|| reverted("execution reverted: student not found"))
    }

    async fn fetch_grades(
        &self,
        student: &StudentRef,
        subjects: &[String],
    ) -> Result<Vec<u8>, GatewayError> {
        lock(&self.log).push(format!("grades:{student}:{}", subjects.join(",")));
        Ok(lock(&self.grades).clone())
    }

    async fn register_teacher(
        &self,
        from: &AccountRef,
        teacher: &str,
    ) -> Result<TxHash, GatewayError> {
        self.record_write(RemoteCall::RegisterTeacher, from, &[teacher])
    }

    async fn register_student(
        &self,
        from: &AccountRef,
        student: &str,
        id: &str,
        name: &str,
    ) -> Result<TxHash, GatewayError> {
        let tx_hash = self.record_write(RemoteCall::RegisterStudent, from, &[student, id, name])?;
        let id = id
            .parse::<U256>()
            .map_err(|err| GatewayError::invalid_argument("id", id, err))?;
        lock(&self.students).push((StudentRef::new(student), StudentRecord::new(id, name)));
        Ok(tx_hash)
    }

    async fn assign_grade(
        &self,
        from: &AccountRef,
        student: &str,
        subject: &str,
        grade: &str,
    ) -> Result<TxHash, GatewayError> {
        self.record_write(RemoteCall::AssignGrade, from, &[student, subject, grade])
    }

    async fn fetch_admin(&self) -> Result<AccountRef, GatewayError> {
        Ok(AccountRef::new("0xadmin"))
    }

    async fn is_teacher(&self, account: &str) -> Result<bool, GatewayError> {
        Ok(lock(&self.writes)
            .iter()
            .any(|write| write.call == RemoteCall::RegisterTeacher && write.args[0] == account))
    }
}

pub(crate) struct FakeIdentity(pub Option<AccountRef>);

impl FakeIdentity {
    pub fn signer() -> Self {
        Self(Some(AccountRef::new("0xsigner")))
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn primary_identity(&self) -> Result<AccountRef, GatewayError> {
        self.0.clone().ok_or(GatewayError::NoAccount)
    }
}
