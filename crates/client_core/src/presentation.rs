use std::sync::{Mutex, MutexGuard};

use shared::view::{GradeReport, Notice, RosterView};

pub trait PresentationSurface: Send + Sync {
    fn render_roster(&self, view: &RosterView);
    fn render_grades(&self, report: &GradeReport);
    fn notify(&self, notice: &Notice);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub roster: Option<Vec<String>>,
    pub roster_renders: usize,
    pub grades: Option<Vec<String>>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceSnapshot>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceSnapshot> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PresentationSurface for MemorySurface {
    fn render_roster(&self, view: &RosterView) {
        let mut state = self.lock();
        state.roster = Some(view.lines());
        state.roster_renders += 1;
    }

    fn render_grades(&self, report: &GradeReport) {
        self.lock().grades = Some(report.lines());
    }

    fn notify(&self, notice: &Notice) {
        self.lock().notices.push(*notice);
    }
}
