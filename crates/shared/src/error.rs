use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCall {
    ResolveIdentity,
    ListStudents,
    FetchStudent,
    FetchGrades,
    RegisterTeacher,
    RegisterStudent,
    AssignGrade,
    FetchAdmin,
    CheckTeacher,
}

impl RemoteCall {
    pub fn method(self) -> &'static str {
        match self {
            Self::ResolveIdentity => "eth_accounts",
            Self::ListStudents => "getAllStudents",
            Self::FetchStudent => "getStudent",
            Self::FetchGrades => "viewGrades",
            Self::RegisterTeacher => "addTeacher",
            Self::RegisterStudent => "addStudent",
            Self::AssignGrade => "assignGrade",
            Self::FetchAdmin => "admin",
            Self::CheckTeacher => "teachers",
        }
    }
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("remote call {call} failed: {message}")]
pub struct RemoteCallFailed {
    pub call: RemoteCall,
    pub message: String,
}

impl RemoteCallFailed {
    pub fn new(call: RemoteCall, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }
}
