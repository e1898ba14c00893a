use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

macro_rules! ref_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

ref_newtype!(StudentRef);
ref_newtype!(AccountRef);
ref_newtype!(TxHash);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: U256,
    pub name: String,
}

impl StudentRecord {
    pub fn new(id: U256, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
