//! SO-004: RHEL/CentOS planning (yum).

use super::Family;

const PACKAGES: [&str; 19] = [
    "git-core",
    "curl",
    "patch",
    "bison",
    "openssl",
    "readline",
    "readline-devel",
    "zlib",
    "zlib-devel",
    "openssl-devel",
    "libyaml-devel",
    "libxml2-devel",
    "libxslt-devel",
    "autoconf",
    "glibc-devel",
    "ncurses-devel",
    "vim",
    "wget",
    "tree",
];

pub struct Yum;

impl Family for Yum {
    fn dist_upgrade(&self) -> Vec<String> {
        vec!["yum update -y".to_string()]
    }

    fn dependencies(&self) -> Vec<String> {
        vec![format!("yum install -y {}", PACKAGES.join(" "))]
    }

    /// sudo resets PATH on CentOS, which hides /usr/local/bin.
    fn sudo_env(&self) -> Option<&'static str> {
        Some("env PATH=$PATH")
    }
}
