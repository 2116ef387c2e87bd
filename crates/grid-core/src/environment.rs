//! Grid environment tag sent with every request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grid deployment the client talks to. Only the sandbox is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridEnvironment {
    #[default]
    Sandbox,
}

impl GridEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridEnvironment::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for GridEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(GridEnvironment::Sandbox),
            other => Err(format!("unsupported Grid environment: {}", other)),
        }
    }
}
