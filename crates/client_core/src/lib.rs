use std::sync::Arc;

use anyhow::Result;
use shared::{
    domain::{AccountRef, StudentRef, TxHash},
    error::{RemoteCall, RemoteCallFailed},
    view::{GradeReport, Notice, RosterView},
};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub mod abi;
pub mod config;
pub mod error;
pub mod gateway;
pub mod presentation;
pub mod roster;
pub mod rpc;

pub use config::{load_settings, Settings};
pub use error::GatewayError;
pub use gateway::{IdentityProvider, LedgerGateway};
pub use presentation::{MemorySurface, PresentationSurface, SurfaceSnapshot};
pub use roster::{FetchMode, RosterLoader};
pub use rpc::{JsonRpcClient, ReceiptPolicy, RpcIdentityProvider, RpcLedgerGateway};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordsEvent {
    RosterRendered {
        students: usize,
    },
    GradesRendered {
        student: StudentRef,
        subjects: usize,
    },
    WriteConfirmed {
        call: RemoteCall,
        tx_hash: TxHash,
    },
    CallFailed(RemoteCallFailed),
}

pub struct RecordsClient {
    gateway: Arc<dyn LedgerGateway>,
    identity: Arc<dyn IdentityProvider>,
    surface: Arc<dyn PresentationSurface>,
    roster: RosterLoader,
    subjects: Vec<String>,
    events: broadcast::Sender<RecordsEvent>,
}

impl RecordsClient {
    pub fn connect(
        settings: &Settings,
        surface: Arc<dyn PresentationSurface>,
    ) -> Result<Arc<Self>> {
        settings.validate()?;
        let contract = settings.contract_address()?;
        let rpc = Arc::new(JsonRpcClient::new(settings.rpc_url.clone()));
        info!(rpc_url = %settings.rpc_url, %contract, "records: connecting");

        Ok(Self::new_with_dependencies(
            Arc::new(RpcLedgerGateway::new(
                rpc.clone(),
                contract,
                ReceiptPolicy::from(settings),
            )),
            Arc::new(RpcIdentityProvider::new(rpc)),
            surface,
            settings.subjects.clone(),
            FetchMode::from_concurrency(settings.roster_fetch_concurrency),
        ))
    }

    pub fn new_with_dependencies(
        gateway: Arc<dyn LedgerGateway>,
        identity: Arc<dyn IdentityProvider>,
        surface: Arc<dyn PresentationSurface>,
        subjects: Vec<String>,
        fetch_mode: FetchMode,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let roster = RosterLoader::new(gateway.clone(), surface.clone()).with_fetch_mode(fetch_mode);
        Arc::new(Self {
            gateway,
            identity,
            surface,
            roster,
            subjects,
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RecordsEvent> {
        self.events.subscribe()
    }

    pub async fn load_students(&self) -> Result<RosterView, RemoteCallFailed> {
        match self.roster.refresh().await {
            Ok(view) => {
                let _ = self.events.send(RecordsEvent::RosterRendered {
                    students: view.len(),
                });
                Ok(view)
            }
            Err(err) => {
                // The loader already logged it.
                let _ = self.events.send(RecordsEvent::CallFailed(err.clone()));
                Err(err)
            }
        }
    }

    pub async fn add_teacher(&self, teacher: &str) -> Result<TxHash, RemoteCallFailed> {
        let from = self.primary_identity().await?;
        info!(%from, teacher, "records: adding teacher");
        let outcome = self.gateway.register_teacher(&from, teacher).await;
        self.confirm_write(RemoteCall::RegisterTeacher, outcome, Notice::TeacherAdded)
    }

    /// A failed follow-up roster refresh does not fail the registration.
    pub async fn add_student(
        &self,
        student: &str,
        id: &str,
        name: &str,
    ) -> Result<TxHash, RemoteCallFailed> {
        let from = self.primary_identity().await?;
        info!(%from, student, id, name, "records: adding student");
        let outcome = self.gateway.register_student(&from, student, id, name).await;
        let tx_hash = self.confirm_write(RemoteCall::RegisterStudent, outcome, Notice::StudentAdded)?;
        if let Err(err) = self.load_students().await {
            warn!(error = %err, "records: roster refresh after registration failed");
        }
        Ok(tx_hash)
    }

    pub async fn assign_grade(
        &self,
        student: &str,
        subject: &str,
        grade: &str,
    ) -> Result<TxHash, RemoteCallFailed> {
        let from = self.primary_identity().await?;
        info!(%from, student, subject, grade, "records: assigning grade");
        let outcome = self
            .gateway
            .assign_grade(&from, student, subject, grade)
            .await;
        self.confirm_write(RemoteCall::AssignGrade, outcome, Notice::GradeAssigned)
    }

    pub async fn view_grades(&self, student: &str) -> Result<GradeReport, RemoteCallFailed> {
        self.view_grades_for(student, &self.subjects).await
    }

    pub async fn view_grades_for(
        &self,
        student: &str,
        subjects: &[String],
    ) -> Result<GradeReport, RemoteCallFailed> {
        let student = StudentRef::new(student);
        let grades = self
            .gateway
            .fetch_grades(&student, subjects)
            .await
            .map_err(|err| self.report_failure(err.into_remote(RemoteCall::FetchGrades)))?;
        let returned = grades.len();
        let report = GradeReport::align(student.clone(), subjects, grades).ok_or_else(|| {
            self.report_failure(RemoteCallFailed::new(
                RemoteCall::FetchGrades,
                format!("asked for {} subjects, got {returned} grades", subjects.len()),
            ))
        })?;

        self.surface.render_grades(&report);
        let _ = self.events.send(RecordsEvent::GradesRendered {
            student,
            subjects: subjects.len(),
        });
        Ok(report)
    }

    pub async fn admin(&self) -> Result<AccountRef, RemoteCallFailed> {
        self.gateway
            .fetch_admin()
            .await
            .map_err(|err| self.report_failure(err.into_remote(RemoteCall::FetchAdmin)))
    }

    pub async fn is_teacher(&self, account: &str) -> Result<bool, RemoteCallFailed> {
        self.gateway
            .is_teacher(account)
            .await
            .map_err(|err| self.report_failure(err.into_remote(RemoteCall::CheckTeacher)))
    }

    pub async fn primary_identity(&self) -> Result<AccountRef, RemoteCallFailed> {
        self.identity
            .primary_identity()
            .await
            .map_err(|err| self.report_failure(err.into_remote(RemoteCall::ResolveIdentity)))
    }

    fn confirm_write(
        &self,
        call: RemoteCall,
        outcome: Result<TxHash, GatewayError>,
        notice: Notice,
    ) -> Result<TxHash, RemoteCallFailed> {
        match outcome {
            Ok(tx_hash) => {
                info!(%call, %tx_hash, "records: write confirmed");
                self.surface.notify(&notice);
                let _ = self.events.send(RecordsEvent::WriteConfirmed {
                    call,
                    tx_hash: tx_hash.clone(),
                });
                Ok(tx_hash)
            }
            Err(err) => Err(self.report_failure(err.into_remote(call))),
        }
    }

    fn report_failure(&self, failure: RemoteCallFailed) -> RemoteCallFailed {
        error!(call = %failure.call, error = %failure.message, "records: remote call failed");
        let _ = self.events.send(RecordsEvent::CallFailed(failure.clone()));
        failure
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
