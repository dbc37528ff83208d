//! Config subcommand implementation.
//!
//! - `trawl config show` - print the effective settings and port lists
//! - `trawl config init` - write default settings and port files

use crate::config::{AppSettings, Paths, PortConfig};
use crate::error::{CliError, CliResult};
use crate::output;
use clap::{Parser, Subcommand};

/// Show or initialize configuration.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings and port lists
    Show,

    /// Write default settings.json and ports.yaml
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self, paths: &Paths) -> CliResult<()> {
        match &self.action {
            ConfigAction::Show => show(paths),
            ConfigAction::Init { force } => init(paths, *force).map(|written| {
                for path in written {
                    output::print_success(&format!("wrote {}", path));
                }
            }),
        }
    }
}

fn show(paths: &Paths) -> CliResult<()> {
    let settings = AppSettings::load(paths)?;
    let ports = settings.port_config(paths)?;

    println!("# {}", paths.settings_file().display());
    println!(
        "{}",
        serde_json::to_string_pretty(&settings).map_err(|e| CliError::Other(e.to_string()))?
    );
    println!();
    println!("# ports");
    print!("{}", ports.to_yaml()?);
    Ok(())
}

/// Write the default files, returning the paths written.
fn init(paths: &Paths, force: bool) -> CliResult<Vec<String>> {
    let settings_file = paths.settings_file();
    let ports_file = paths.ports_file();

    if !force {
        if let Some(existing) = [&settings_file, &ports_file].into_iter().find(|p| p.exists()) {
            return Err(CliError::Other(format!(
                "{} already exists (use --force to overwrite)",
                existing.display()
            )));
        }
    }

    AppSettings::default().save(paths)?;
    PortConfig::default().save(&ports_file)?;

    Ok(vec![
        settings_file.display().to_string(),
        ports_file.display().to_string(),
    ])
}
