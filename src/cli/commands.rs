//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::IoResultExt;
use crate::cli::args::{Cli, Commands, ConfigCommands, NodeTarget};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{Resolution, TreeArena};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::snapshot::load_snapshot;
use crate::infrastructure::traits::ArchiveMode;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `flowexport --help`".to_string(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Tree { snapshot } => cmd_tree(&container, snapshot),
        Commands::Resolve { target, json } => cmd_resolve(&container, target, *json),
        Commands::Actions { target, json } => cmd_actions(&container, target, *json),
        Commands::Export { target, mode } => cmd_export(&container, target, *mode),
        Commands::Details { target, json } => cmd_details(&container, target, *json),
        Commands::Config { command } => cmd_config(&container, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn load_target(container: &ServiceContainer, target: &NodeTarget) -> CliResult<(TreeArena, Index)> {
    let tree = load_snapshot(container.fs.as_ref(), &target.snapshot)?;
    let idx = tree.find_by_titles(target.path.as_slice()).map_err(InfraError::from)?;
    Ok((tree, idx))
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| InfraError::json("serialize output", e))?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, snapshot: &Path) -> CliResult<()> {
    let tree = load_snapshot(container.fs.as_ref(), snapshot)?;
    output::info(&tree.to_termtree());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_resolve(container: &ServiceContainer, target: &NodeTarget, json: bool) -> CliResult<()> {
    let (tree, idx) = load_target(container, target)?;
    let resolution = container.export_service().resolve(&tree, idx)?;

    if json {
        return print_json(&resolution);
    }
    match resolution {
        Resolution::Export(d) => {
            output::action("type", &d.type_code);
            output::action("identifier", &d.identifier);
            output::action("specimen", &d.specimen_name);
            output::action("experiment", &d.experiment_id);
        }
        Resolution::NotReady => output::warning("node is still loading, reselect it later"),
        Resolution::NoAction => output::info("no export available for this node"),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_actions(container: &ServiceContainer, target: &NodeTarget, json: bool) -> CliResult<()> {
    let (tree, idx) = load_target(container, target)?;
    let panel = container.export_service().panel(&tree, idx)?;

    if json {
        return print_json(&panel);
    }
    if let Some(status) = &panel.status {
        output::status(status.level, &status.text);
    }
    if panel.actions.is_empty() && panel.status.is_none() {
        output::info("no actions");
    }
    for action in &panel.actions {
        output::detail(action);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_export(container: &ServiceContainer, target: &NodeTarget, mode: ArchiveMode) -> CliResult<()> {
    let (tree, idx) = load_target(container, target)?;
    let request = container.export_service().export(&tree, idx, mode)?;
    debug!("handed over: {:?}", request);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_details(container: &ServiceContainer, target: &NodeTarget, json: bool) -> CliResult<()> {
    let (tree, idx) = load_target(container, target)?;
    let Some(view) = container.details_service().details(&tree, idx)? else {
        output::info("node is not selectable");
        return Ok(());
    };

    if json {
        return print_json(&view);
    }
    output::header(&view.node.title);
    if let Some(geometry) = &view.node.plate_geometry {
        output::action("Plate geometry", geometry);
    }
    if let Some(sort_type) = view.node.sort_type {
        output::detail(sort_type.label());
    }
    if let Some(summary) = &view.node.parameter_summary {
        output::detail(summary);
    }
    if let Some(plot) = &view.node.plot {
        output::action(
            "Plot",
            &format!("{} vs. {} ({} events)", plot.param_y, plot.param_x, plot.num_events),
        );
    }
    for axis in &view.node.axis_options {
        output::action("Axis", &format!("{} ({})", axis.label, axis.name));
    }
    if let Some(exp) = &view.experiment {
        output::header(&exp.name);
        output::action("Tags", &exp.tags);
        output::action("Description", &exp.description);
        output::action("Acquisition details", &exp.acquisition);
        match &exp.attachment_link {
            Some(link) => output::action("Attachments", &format!("{} {}", exp.attachments, link)),
            None => output::action("Attachments", &exp.attachments),
        }
    }
    Ok(())
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => {
                let state = if container.fs.exists(&path) { "" } else { " (missing)" };
                output::action("global", &format!("{}{}", path.display(), state));
            }
            None => output::warning("no home directory, global config unavailable"),
        },
        ConfigCommands::Init { force } => {
            let path = global_config_path().ok_or_else(|| {
                CliError::Usage("no home directory, cannot place global config".to_string())
            })?;
            if container.fs.exists(&path) && !force {
                return Err(CliError::InvalidArgs(format!(
                    "{} exists, use --force to overwrite",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .and_then(|_| container.fs.write(&path, &Settings::template()))
                .with_path_context("write config", &path)?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}
