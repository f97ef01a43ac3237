//! SO-020: Idempotency probes.

use crate::transport::Remote;

/// Whether `command` resolves on the host.
///
/// Any failure, including a broken connection, counts as "not installed".
pub fn is_installed(remote: &mut dyn Remote, command: &str) -> bool {
    match remote.capture(&format!("which {}", command)) {
        Ok(_) => {
            log::info!("[{}] {} has been installed", remote.host(), command);
            true
        }
        Err(e) => {
            log::info!("[{}] {} has not been installed", remote.host(), command);
            log::debug!("[{}] probe for {} failed: {}", remote.host(), command, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{Error, Result};
    use crate::transport::recording::RecordingRemote;
    use crate::transport::{ExecOutput, Mode};
    use std::path::Path;

    #[test]
    fn test_so020_present() {
        let mut r = RecordingRemote::new("web1").with_installed("chef-solo");
        assert!(is_installed(&mut r, "chef-solo"));
        assert_eq!(r.commands(), vec!["which chef-solo"]);
    }

    #[test]
    fn test_so020_absent() {
        let mut r = RecordingRemote::new("web1");
        assert!(!is_installed(&mut r, "ruby"));
    }

    struct Unreachable;

    impl Remote for Unreachable {
        fn host(&self) -> &str {
            "down"
        }
        fn exec(&mut self, _cmd: &str, _mode: Mode) -> Result<ExecOutput> {
            Err(Error::Transport {
                host: "down".into(),
                message: "connection refused".into(),
            })
        }
        fn put(&mut self, _content: &str, _remote_path: &str) -> Result<()> {
            unreachable!()
        }
        fn upload(&mut self, _local: &Path, _remote_path: &str) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_so020_transport_error_is_absent() {
        assert!(!is_installed(&mut Unreachable, "chef-solo"));
    }
}
