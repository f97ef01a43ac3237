//! Core provisioning logic: config, bootstrap, payload staging and chef-solo.

pub mod archive;
pub mod attributes;
pub mod bootstrap;
pub mod driver;
pub mod error;
pub mod parser;
pub mod payload;
pub mod probe;
pub mod script;
pub mod solo;
pub mod types;
