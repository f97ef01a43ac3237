//! SO-030: CLI subcommands: init, validate, bootstrap, install, solo, attributes.

use crate::core::bootstrap::{InstallStep, Installer};
use crate::core::error::{Error, Result};
use crate::core::payload::PayloadBuilder;
use crate::core::solo::{self, SoloRun};
use crate::core::{parser, types};
use crate::transport::recording::RecordingRemote;
use crate::transport::{self, Remote};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "soloist",
    version,
    about = "Bootstrap hosts with Ruby and chef-solo, then converge them with a run list"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new soloist project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate soloist.yaml without connecting to hosts
    Validate {
        /// Path to soloist.yaml
        #[arg(short, long, default_value = "soloist.yaml")]
        file: PathBuf,
    },

    /// Install Ruby and chef-solo on hosts that lack chef-solo
    Bootstrap {
        /// Path to soloist.yaml
        #[arg(short, long, default_value = "soloist.yaml")]
        file: PathBuf,

        /// Target a single host
        #[arg(long)]
        host: Option<String>,

        /// Install even when chef-solo is already present
        #[arg(long)]
        force: bool,

        /// Print what would be executed without running
        #[arg(long)]
        dry_run: bool,
    },

    /// Run one bootstrap step
    Install {
        /// Step to run
        #[arg(value_enum)]
        step: InstallStep,

        /// Path to soloist.yaml
        #[arg(short, long, default_value = "soloist.yaml")]
        file: PathBuf,

        /// Target a single host
        #[arg(long)]
        host: Option<String>,

        /// Print what would be executed without running
        #[arg(long)]
        dry_run: bool,
    },

    /// Converge hosts with chef-solo
    Solo {
        /// Recipes and roles, e.g. 'recipe[nginx]' 'role[web]'
        run_list: Vec<String>,

        /// Path to soloist.yaml
        #[arg(short, long, default_value = "soloist.yaml")]
        file: PathBuf,

        /// Target a single host
        #[arg(long)]
        host: Option<String>,

        /// Print what would be executed without running
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the node attributes a solo run would upload
    Attributes {
        /// Recipes and roles
        run_list: Vec<String>,

        /// Path to soloist.yaml
        #[arg(short, long, default_value = "soloist.yaml")]
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Bootstrap {
            file,
            host,
            force,
            dry_run,
        } => cmd_bootstrap(&file, host.as_deref(), force, dry_run),
        Commands::Install {
            step,
            file,
            host,
            dry_run,
        } => cmd_install(&file, step, host.as_deref(), dry_run),
        Commands::Solo {
            run_list,
            file,
            host,
            dry_run,
        } => cmd_solo(&file, &run_list, host.as_deref(), dry_run),
        Commands::Attributes { run_list, file } => cmd_attributes(&file, &run_list),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "soloist",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

fn cmd_init(path: &Path) -> Result<()> {
    let config_path = path.join("soloist.yaml");
    if config_path.exists() {
        return Err(Error::Config {
            path: config_path,
            message: "already exists".to_string(),
        });
    }

    let cookbooks = path.join("config").join("cookbooks");
    std::fs::create_dir_all(&cookbooks)?;

    let template = r#"version: "1.0"
name: my-app
description: "Provisioned by soloist"

hosts:
  local:
    hostname: localhost
    addr: 127.0.0.1

deploy:
  application: my-app

solo:
  os: ubuntu
  chef_attributes: {}
"#;
    std::fs::write(&config_path, template)?;

    println!("Initialized soloist project at {}", path.display());
    println!("  Created: {}", config_path.display());
    println!("  Created: {}/", cookbooks.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let config = parse_and_validate(file)?;
    println!(
        "OK: {} ({} hosts, {} releasable)",
        config.name,
        config.hosts.len(),
        config.release_hosts().count()
    );
    Ok(())
}

fn cmd_bootstrap(file: &Path, host: Option<&str>, force: bool, dry_run: bool) -> Result<()> {
    let config = parse_and_validate(file)?;
    let installer = Installer::new(&config.solo);
    on_hosts(&config, host, dry_run, |remote| {
        if force {
            return installer.install(remote);
        }
        if !installer.ensure_installed(remote)? {
            println!("{}: chef-solo already installed", remote.host());
        }
        Ok(())
    })
}

fn cmd_install(file: &Path, step: InstallStep, host: Option<&str>, dry_run: bool) -> Result<()> {
    let config = parse_and_validate(file)?;
    let installer = Installer::new(&config.solo);
    on_hosts(&config, host, dry_run, |remote| {
        log::info!("[{}] install {}", remote.host(), step);
        installer.run_step(remote, step)
    })
}

fn cmd_solo(file: &Path, run_list: &[String], host: Option<&str>, dry_run: bool) -> Result<()> {
    let config = parse_and_validate(file)?;
    let context = config.resolved_context();
    let root = project_root(file);
    let run = SoloRun {
        config: &config.solo,
        context: &context,
        root: &root,
        run_list,
    };
    run.check()?;
    on_hosts(&config, host, dry_run, |remote| {
        solo::solo(remote, &run)?;
        if !dry_run {
            println!("{}: converged ({})", remote.host(), run_list.join(", "));
        }
        Ok(())
    })
}

fn cmd_attributes(file: &Path, run_list: &[String]) -> Result<()> {
    let config = parse_and_validate(file)?;
    let context = config.resolved_context();
    let root = project_root(file);
    let attrs = PayloadBuilder::new(&config.solo, &context, &root).attributes(run_list)?;
    println!("{}", serde_json::to_string_pretty(&attrs)?);
    Ok(())
}

/// Parse and validate a soloist config file, returning errors if invalid.
fn parse_and_validate(file: &Path) -> Result<types::ProjectConfig> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(Error::Validation {
        count: errors.len(),
    })
}

/// Cookbook paths are relative to the directory holding the config file.
fn project_root(file: &Path) -> PathBuf {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Releasable hosts, narrowed to `filter` (inventory key or hostname).
fn target_hosts<'a>(
    config: &'a types::ProjectConfig,
    filter: Option<&str>,
) -> Result<Vec<&'a types::Host>> {
    let hosts: Vec<_> = config
        .release_hosts()
        .filter(|(id, h)| filter.is_none_or(|f| id.as_str() == f || h.hostname == f))
        .map(|(_, h)| h)
        .collect();
    match filter {
        Some(f) if hosts.is_empty() => Err(Error::UnknownHost(f.to_string())),
        _ => Ok(hosts),
    }
}

/// Run `task` against each target host in order, stopping at the first error.
/// With `dry_run` a recording remote stands in and its operations are printed.
fn on_hosts<F>(
    config: &types::ProjectConfig,
    filter: Option<&str>,
    dry_run: bool,
    mut task: F,
) -> Result<()>
where
    F: FnMut(&mut dyn Remote) -> Result<()>,
{
    for host in target_hosts(config, filter)? {
        if dry_run {
            let mut recorder = RecordingRemote::new(&host.hostname);
            let result = task(&mut recorder);
            println!("{} ({}):", host.hostname, host.addr);
            for op in recorder.ops() {
                println!("  {}", op);
            }
            result?;
        } else {
            let mut remote = transport::connect(host);
            task(remote.as_mut())?;
        }
    }
    if dry_run {
        println!("Dry run: nothing was executed.");
    }
    Ok(())
}
