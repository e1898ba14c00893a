use client_core::PresentationSurface;
use shared::view::{GradeReport, Notice, RosterView};

/// Prints every render to stdout.
pub struct TerminalSurface;

impl PresentationSurface for TerminalSurface {
    fn render_roster(&self, view: &RosterView) {
        if view.is_empty() {
            println!("No students registered.");
            return;
        }
        for line in view.lines() {
            println!("{line}");
        }
    }

    fn render_grades(&self, report: &GradeReport) {
        println!("Grades for {}:", report.student);
        for line in report.lines() {
            println!("  {line}");
        }
    }

    fn notify(&self, notice: &Notice) {
        println!("{}", notice.message());
    }
}
