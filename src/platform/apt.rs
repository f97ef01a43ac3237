//! SO-003: Debian/Ubuntu planning (aptitude + apt-get).

use super::Family;

/// Build and runtime libraries for compiling Ruby, plus a few tools nobody
/// wants to live without on a server.
const PACKAGES: [&str; 19] = [
    "git-core",
    "curl",
    "build-essential",
    "bison",
    "openssl",
    "libreadline6",
    "libreadline6-dev",
    "zlib1g",
    "zlib1g-dev",
    "libssl-dev",
    "libyaml-dev",
    "libxml2-dev",
    "libxslt-dev",
    "autoconf",
    "libc6-dev",
    "ncurses-dev",
    "vim",
    "wget",
    "tree",
];

pub struct Apt;

impl Family for Apt {
    fn dist_upgrade(&self) -> Vec<String> {
        vec![
            "aptitude update".to_string(),
            "apt-get -o Dpkg::Options::=\"--force-confnew\" --force-yes -fuy dist-upgrade"
                .to_string(),
        ]
    }

    fn dependencies(&self) -> Vec<String> {
        vec![format!("aptitude install -y {}", PACKAGES.join(" "))]
    }
}
