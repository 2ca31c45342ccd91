//! CLI command definitions and handlers.

use std::path::PathBuf;

use bootmount_common::BootPaths;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};

use crate::config::BootConfig;
use crate::mount::MountPlan;
use crate::stages::{BootSequence, cgroup_plan, early_plan, finalize_plan, rootfs_plan};

/// Bootmount - guest mount orchestrator for sandbox micro-VMs
#[derive(Parser)]
#[command(name = "bootmount")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Stages that can be previewed with `plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    /// Initrd pseudo-filesystems
    Early,
    /// Real root and extra mounts
    Rootfs,
    /// Pseudo-filesystems of the staged root
    Finalize,
    /// Cgroup hierarchies
    Cgroups,
}

/// Boot stage commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Mount /proc, /dev, /sys and /dev/pts in the initrd
    Early,

    /// Mount the real root on the staging path, then the extra mounts
    Rootfs {
        /// Path to the boot configuration JSON
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Mount the pseudo-filesystems of the staged root
    Finalize {
        /// Path to the boot configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Mount one hierarchy per enabled cgroup controller
    Cgroups,

    /// Apply read-only lockdown and path masking
    Harden {
        /// Path to the boot configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Detach every disk-backed filesystem before shutdown
    Teardown,

    /// Print a stage's mount plan as JSON without mounting anything
    Plan {
        /// Stage to plan
        #[arg(value_enum)]
        stage: Stage,

        /// Path to the boot configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns the stage error, wrapped with the stage name.
    pub fn execute(self) -> Result<()> {
        let boot = BootSequence::kernel();

        match self.command {
            Commands::Early => boot.mount_early().wrap_err("Early stage failed"),

            Commands::Rootfs { config } => {
                let config = BootConfig::load(&config)?;
                boot.mount_rootfs(&config.rootfs, &config.extra_mounts)
                    .wrap_err("Root transition failed")
            }

            Commands::Finalize { config } => {
                let config = BootConfig::load_or_default(config.as_deref())?;
                boot.mount_finalize(&config.finalize)
                    .wrap_err("Root finalization failed")
            }

            Commands::Cgroups => boot
                .mount_cgroups()
                .map(|_| ())
                .wrap_err("Cgroup mounting failed"),

            Commands::Harden { config } => {
                let config = BootConfig::load_or_default(config.as_deref())?;
                boot.harden(&config.security).wrap_err("Path hardening failed")
            }

            Commands::Teardown => {
                boot.teardown();
                Ok(())
            }

            Commands::Plan { stage, config } => {
                let config = BootConfig::load_or_default(config.as_deref())?;
                let plan = plan_for(stage, boot.paths(), &config)?;
                let json = serde_json::to_string_pretty(&plan)?;
                println!("{json}");
                Ok(())
            }
        }
    }
}

fn plan_for(stage: Stage, paths: &BootPaths, config: &BootConfig) -> Result<MountPlan> {
    let plan = match stage {
        Stage::Early => early_plan(),
        Stage::Rootfs => rootfs_plan(paths, &config.rootfs, &config.extra_mounts),
        Stage::Finalize => finalize_plan(paths, &config.finalize),
        Stage::Cgroups => cgroup_plan(paths)?.unwrap_or_default(),
    };
    Ok(plan)
}
