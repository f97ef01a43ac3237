//! SO-002: OS families and the package-manager commands for each.
//!
//! Each supported family plans:
//! 1. A "dist-upgrade" sequence that brings the system up to date
//! 2. A "dependencies" sequence that installs what Ruby needs to compile
//!
//! Commands are returned unprivileged; callers elevate them.

pub mod apt;
pub mod yum;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target OS family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Os {
    #[default]
    Ubuntu,
    Centos,
    /// Any family we have no commands for.
    Other(String),
}

impl From<String> for Os {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ubuntu" => Self::Ubuntu,
            "centos" => Self::Centos,
            _ => Self::Other(s),
        }
    }
}

impl From<Os> for String {
    fn from(os: Os) -> Self {
        os.to_string()
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ubuntu => write!(f, "ubuntu"),
            Self::Centos => write!(f, "centos"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A bootstrap step that depends on the package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DistUpgrade,
    Dependencies,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistUpgrade => write!(f, "dist-upgrade"),
            Self::Dependencies => write!(f, "dependencies"),
        }
    }
}

/// Command planning for one OS family.
pub trait Family {
    fn dist_upgrade(&self) -> Vec<String>;
    fn dependencies(&self) -> Vec<String>;

    /// Prefix placed after `sudo` on every elevated command.
    fn sudo_env(&self) -> Option<&'static str> {
        None
    }
}

impl Os {
    /// Planner for this family, if we know it.
    pub fn family(&self) -> Option<&'static dyn Family> {
        match self {
            Self::Ubuntu => Some(&apt::Apt),
            Self::Centos => Some(&yum::Yum),
            Self::Other(_) => None,
        }
    }

    pub fn sudo_env(&self) -> Option<&'static str> {
        self.family().and_then(|f| f.sudo_env())
    }
}

/// Commands for `step` on `os`, in execution order.
///
/// Unknown families plan nothing; the step becomes a logged no-op.
pub fn commands_for(step: Step, os: &Os) -> Vec<String> {
    let Some(family) = os.family() else {
        log::warn!("no {} commands for os '{}', skipping", step, os);
        return Vec::new();
    };
    match step {
        Step::DistUpgrade => family.dist_upgrade(),
        Step::Dependencies => family.dependencies(),
    }
}
