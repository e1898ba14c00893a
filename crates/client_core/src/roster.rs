use std::{num::NonZeroUsize, sync::Arc};

use futures::{stream, StreamExt, TryStreamExt};
use shared::{
    domain::{StudentRecord, StudentRef},
    error::{RemoteCall, RemoteCallFailed},
    view::RosterView,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{gateway::LedgerGateway, presentation::PresentationSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Sequential,
    /// Up to `n` fetches in flight, results kept in listing order. The first
    /// failure drops the fetches still in flight.
    Buffered(NonZeroUsize),
}

impl FetchMode {
    pub fn from_concurrency(limit: usize) -> Self {
        match NonZeroUsize::new(limit) {
            Some(limit) if limit.get() > 1 => Self::Buffered(limit),
            _ => Self::Sequential,
        }
    }
}

pub struct RosterLoader {
    gateway: Arc<dyn LedgerGateway>,
    surface: Arc<dyn PresentationSurface>,
    mode: FetchMode,
    in_flight: Mutex<()>,
}

impl RosterLoader {
    pub fn new(gateway: Arc<dyn LedgerGateway>, surface: Arc<dyn PresentationSurface>) -> Self {
        Self {
            gateway,
            surface,
            mode: FetchMode::Sequential,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.mode
    }

    /// Any failed call abandons the whole refresh: nothing is rendered, the
    /// surface keeps whatever it showed before, and the failure is logged
    /// once and returned. Overlapping calls queue behind each other.
    pub async fn refresh(&self) -> Result<RosterView, RemoteCallFailed> {
        let _guard = self.in_flight.lock().await;
        match self.load().await {
            Ok(view) => {
                self.surface.render_roster(&view);
                info!(students = view.len(), "roster: rendered");
                Ok(view)
            }
            Err(err) => {
                error!(call = %err.call, error = %err.message, "roster: refresh abandoned");
                Err(err)
            }
        }
    }

    async fn load(&self) -> Result<RosterView, RemoteCallFailed> {
        info!("roster: listing students");
        let students = self
            .gateway
            .list_student_refs()
            .await
            .map_err(|err| err.into_remote(RemoteCall::ListStudents))?;
        debug!(count = students.len(), mode = ?self.mode, "roster: students listed");

        let records = match self.mode {
            FetchMode::Sequential => self.fetch_sequential(&students).await?,
            FetchMode::Buffered(limit) => self.fetch_buffered(&students, limit).await?,
        };

        RosterView::zip(students, records).ok_or_else(|| {
            RemoteCallFailed::new(RemoteCall::FetchStudent, "record count differs from listing")
        })
    }

    async fn fetch_sequential(
        &self,
        students: &[StudentRef],
    ) -> Result<Vec<StudentRecord>, RemoteCallFailed> {
        let mut records = Vec::with_capacity(students.len());
        for (index, student) in students.iter().enumerate() {
            records.push(self.fetch_one(index, student).await?);
        }
        Ok(records)
    }

    async fn fetch_buffered(
        &self,
        students: &[StudentRef],
        limit: NonZeroUsize,
    ) -> Result<Vec<StudentRecord>, RemoteCallFailed> {
        stream::iter(
            students
                .iter()
                .enumerate()
                .map(|(index, student)| self.fetch_one(index, student)),
        )
        .buffered(limit.get())
        .try_collect()
        .await
    }

    async fn fetch_one(
        &self,
        index: usize,
        student: &StudentRef,
    ) -> Result<StudentRecord, RemoteCallFailed> {
        let record = self
            .gateway
            .fetch_student_record(student)
            .await
            .map_err(|err| {
                RemoteCallFailed::new(
                    RemoteCall::FetchStudent,
                    format!("{student} (index {index}): {err}"),
                )
            })?;
        debug!(index, %student, id = %record.id, "roster: student fetched");
        Ok(record)
    }
}

#[cfg(test)]
#[path = "tests/roster_tests.rs"]
mod tests;
