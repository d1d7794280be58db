//! Command dispatch: settings, services and terminal output

use std::io::{self, Write};
use std::path::Path;

use clap::{Command, CommandFactory};
use clap_complete::{generate, Generator};
use tracing::{debug, instrument};

use crate::cli::args::Cli;
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::infrastructure::{InfraError, ServiceContainer};

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Some(generator) = cli.generator {
        let mut cmd = Cli::command();
        debug!("generating completion file for {generator:?}");
        print_completions(generator, &mut cmd);
        return Ok(());
    }

    let settings = load_settings(cli)?;

    if cli.show_config {
        let toml = settings.to_toml()?;
        let mut stdout = io::stdout().lock();
        write!(stdout, "{toml}").map_err(|e| InfraError::io("write config", e))?;
        return Ok(());
    }

    let entities_dir = cli
        .entities_dir
        .as_deref()
        .ok_or_else(|| CliError::Usage("missing <ENTITIES_DIR> argument".into()))?;

    let container = ServiceContainer::new(settings);
    run_genesis(&container, entities_dir, cli.dry_run)
}

/// Layered settings with `--node-binary` applied on top.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(node_binary) = &cli.node_binary {
        settings.node_binary = node_binary.clone();
    }
    Ok(settings)
}

/// Plan the genesis command and either print it (`dry_run`) or run it.
#[instrument(skip(container))]
pub fn run_genesis(container: &ServiceContainer, entities_dir: &Path, dry_run: bool) -> CliResult<()> {
    let service = container.genesis_service();
    let command = service.plan(entities_dir)?;

    if command.entity_pairs().is_empty() {
        output::warning(&format!(
            "no entity directories found in {}",
            entities_dir.display()
        ));
    }

    if dry_run {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{command}").map_err(|e| InfraError::io("write command line", e))?;
        return Ok(());
    }

    service.invoke(&command)?;
    Ok(())
}
