//! SO-000: Error taxonomy.
//!
//! Configuration errors are raised before any remote call. Remote failures
//! carry the host and the command so the operator can re-run by hand.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while bootstrapping or provisioning a host.
#[derive(Debug, Error)]
pub enum Error {
    /// `solo` was called without any recipe identifiers.
    #[error("please specify a run list, e.g. `soloist solo 'recipe[foo]' 'recipe[bar]'`")]
    EmptyRunList,

    /// No cookbook directory was found or configured.
    #[error(
        "please put some cookbooks in `config/cookbooks` or `vendor/cookbooks`, \
         or set `solo.cookbooks` to the directories containing them"
    )]
    NoCookbooks,

    /// The project file could not be read or parsed.
    #[error("cannot load {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The project file parsed but failed validation.
    #[error("{count} validation error(s)")]
    Validation { count: usize },

    /// A `--host` filter named a host that is not in the inventory.
    #[error("unknown host '{0}'")]
    UnknownHost(String),

    /// A remote command exited non-zero.
    #[error("{host}: `{command}` exited with {exit_code}: {stderr}")]
    CommandFailed {
        host: String,
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// The transport itself failed (spawn, pipe, scp).
    #[error("{host}: {message}")]
    Transport { host: String, message: String },

    /// Building the cookbook archive failed.
    #[error("cannot archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot serialize attributes: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// True for errors detected locally before anything touched a host.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyRunList
                | Self::NoCookbooks
                | Self::Config { .. }
                | Self::Validation { .. }
                | Self::UnknownHost(_)
        )
    }

    /// Process exit status: 2 for configuration errors, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        if self.is_configuration() {
            2
        } else {
            1
        }
    }
}
