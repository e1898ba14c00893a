use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{StudentRecord, StudentRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student: StudentRef,
    pub record: StudentRecord,
}

impl fmt::Display for RosterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Address: {}",
            self.record.id, self.record.name, self.student
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterView {
    entries: Vec<RosterEntry>,
}

impl RosterView {
    pub fn zip(students: Vec<StudentRef>, records: Vec<StudentRecord>) -> Option<Self> {
        if students.len() != records.len() {
            return None;
        }
        let entries = students
            .into_iter()
            .zip(records)
            .map(|(student, record)| RosterEntry { student, record })
            .collect();
        Some(Self { entries })
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub subject: String,
    pub grade: u8,
}

impl fmt::Display for GradeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.grade)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub student: StudentRef,
    entries: Vec<GradeEntry>,
}

impl GradeReport {
    pub fn align(student: StudentRef, subjects: &[String], grades: Vec<u8>) -> Option<Self> {
        if subjects.len() != grades.len() {
            return None;
        }
        let entries = subjects
            .iter()
            .cloned()
            .zip(grades)
            .map(|(subject, grade)| GradeEntry { subject, grade })
            .collect();
        Some(Self { student, entries })
    }

    pub fn entries(&self) -> &[GradeEntry] {
        &self.entries
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    TeacherAdded,
    StudentAdded,
    GradeAssigned,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Self::TeacherAdded => "Teacher added successfully",
            Self::StudentAdded => "Student added successfully",
            Self::GradeAssigned => "Grade assigned successfully",
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    #[test]
    fn roster_lines_follow_listing_order() {
        let view = RosterView::zip(
            vec![StudentRef::new("0xA"), StudentRef::new("0xB")],
            vec![
                StudentRecord::new(U256::from(1u64), "Alice"),
                StudentRecord::new(U256::from(2u64), "Bob"),
            ],
        )
        .expect("aligned");

        assert_eq!(
            view.lines(),
            vec![
                "ID: 1, Name: Alice, Address: 0xA".to_string(),
                "ID: 2, Name: Bob, Address: 0xB".to_string(),
            ]
        );
    }

    #[test]
    fn roster_rejects_misaligned_records() {
        let view = RosterView::zip(
            vec![StudentRef::new("0xA"), StudentRef::new("0xB")],
            vec![StudentRecord::new(U256::from(1u64), "Alice")],
        );
        assert!(view.is_none());
    }

    #[test]
    fn grade_report_pairs_subjects_in_order() {
        let subjects = ["Math", "Science", "English"].map(String::from);
        let report = GradeReport::align(StudentRef::new("0xA"), &subjects, vec![88, 91, 76])
            .expect("aligned");
        assert_eq!(report.lines(), vec!["Math: 88", "Science: 91", "English: 76"]);
    }

    #[test]
    fn grade_report_rejects_short_answers() {
        let subjects = ["Math", "Science"].map(String::from);
        assert!(GradeReport::align(StudentRef::new("0xA"), &subjects, vec![88]).is_none());
    }
}
