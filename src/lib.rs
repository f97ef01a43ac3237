//! Soloist: bootstrap and converge hosts with chef-solo.
//!
//! Installs Ruby from source and the chef gems on bare hosts, then ships
//! cookbooks, node attributes and a chef-solo config and runs it.

pub mod cli;
pub mod core;
pub mod platform;
pub mod transport;
