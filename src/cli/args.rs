//! Command-line arguments for ace-install

use ace_installer::{InstallError, InstallOptions, ProxySetting};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command-line arguments for ace-install
#[derive(Parser, Debug, Clone)]
#[command(name = "ace-install")]
#[command(version, about = "Download the Ace editor and install it into a web directory")]
pub struct Cli {
    /// Installation directory [default: Resources/public]
    pub path: Option<String>,

    /// Ace release tag to install, or "latest"
    #[arg(long, value_name = "VERSION")]
    pub tag: Option<String>,

    /// What to do with an existing installation: drop, keep or skip
    #[arg(long, value_name = "POLICY")]
    pub clear: Option<String>,

    /// Archive path not to extract (repeatable)
    #[arg(long = "exclude", value_name = "PATH")]
    pub excludes: Vec<String>,

    /// TOML file with default options; command-line values take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Download URL template containing {version}
    #[arg(long, value_name = "URL")]
    pub archive_url: Option<String>,

    /// Ignore https_proxy / http_proxy
    #[arg(long)]
    pub no_proxy: bool,

    /// Non-interactive mode for CI/server environments
    ///
    /// Never prompts. An existing installation is dropped unless --clear
    /// says otherwise.
    #[arg(long)]
    pub no_interaction: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build installation options, filling gaps from `--config`.
    pub fn options(&self) -> Result<InstallOptions, InstallError> {
        let mut options = InstallOptions {
            path: self.path.clone(),
            version: self.tag.clone(),
            clear: self.clear.clone(),
            excludes: self.excludes.clone(),
            archive_url: self.archive_url.clone(),
            ..Default::default()
        };

        if self.no_proxy {
            options = options.with_proxy(ProxySetting::Disabled);
        }

        match &self.config {
            Some(path) => Ok(options.merge(InstallOptions::from_toml_file(path)?)),
            None => Ok(options),
        }
    }
}
