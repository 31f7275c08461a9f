//! riivo - manage riivolution presets and launch them in Dolphin
//!
//! Every subcommand is one atomic command against the preset, game dir and
//! settings stores. Listing commands print JSON on stdout.
//!
//! ```bash
//! riivo set-dolph-path /usr/bin/dolphin-emu
//! riivo create-gamedir "Wii Games" /games/mkw.iso
//! riivo create-preset --name CTGP --source /mods/riivolution/ctgp.xml \
//!     --option "Tracks=Disabled|Custom"
//! riivo set-game-path <preset-id> --path /games/mkw.iso
//! riivo run <preset-id>
//! ```

mod error_handling;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use error_handling::{log_error, ErrorInfo};
use riivo_core::logging::init_logging;
use riivo_core::{BindTarget, CoreConfig, DirectoryRef, ParsedOption, Riivo};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "riivo")]
#[command(about = "Manage riivolution presets and launch them in Dolphin")]
#[command(version)]
struct Cli {
    /// Directory holding presets.json, gamedirs.json and settings.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print failures as JSON on stderr
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a preset from parsed option definitions
    CreatePreset(CreatePresetArgs),
    /// List all presets
    Presets,
    /// Delete a preset
    RemovePreset { id: String },
    /// Change one option of a preset
    SetSelection {
        id: String,
        option: String,
        value: String,
    },
    /// Launch Dolphin with a preset
    Run {
        id: String,
        /// Print the invocation instead of starting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Register a named game path
    CreateGamedir { name: String, path: PathBuf },
    /// List registered game paths
    Gamedirs,
    /// Remove a registered game path
    RemoveGamedir(RemoveGamedirArgs),
    /// Bind a preset to a game path
    SetGamePath(SetGamePathArgs),
    /// Show the name of the game path bound to a preset
    PathName { id: String },
    /// Set the Dolphin binary
    SetDolphPath { path: String },
    /// Show the Dolphin binary
    DolphPath,
    /// Write a Dolphin game mod descriptor for a preset
    ExportDescriptor {
        id: String,
        /// Output directory (defaults to the current directory)
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct CreatePresetArgs {
    #[arg(long)]
    name: String,
    /// Riivolution XML the options were read from
    #[arg(long)]
    source: PathBuf,
    #[arg(long, default_value = "")]
    section: String,
    /// Option as NAME=CHOICE1|CHOICE2|..., repeatable
    #[arg(long = "option", value_parser = parse_option)]
    options: Vec<ParsedOption>,
    /// JSON file with a list of {"name", "choices"} objects
    #[arg(long)]
    options_file: Option<PathBuf>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct RemoveGamedirArgs {
    #[arg(long)]
    index: Option<usize>,
    #[arg(long)]
    id: Option<String>,
}

#[derive(Args)]
struct SetGamePathArgs {
    id: String,
    #[command(flatten)]
    target: GamePathTarget,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct GamePathTarget {
    /// Registered game dir id
    #[arg(long)]
    dir_id: Option<String>,
    /// Raw game path, registered on first use
    #[arg(long)]
    path: Option<PathBuf>,
}

fn parse_option(raw: &str) -> Result<ParsedOption, String> {
    let (name, choices) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=CHOICE1|CHOICE2, got {raw:?}"))?;
    if name.trim().is_empty() {
        return Err("option name is empty".to_string());
    }
    let choices = choices
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    Ok(ParsedOption::new(name.trim(), choices))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn execute(app: &Riivo, command: Commands) -> Result<()> {
    match command {
        Commands::CreatePreset(args) => {
            let mut options = Vec::new();
            if let Some(file) = &args.options_file {
                let data = std::fs::read_to_string(file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                let parsed: Vec<ParsedOption> = serde_json::from_str(&data)
                    .with_context(|| format!("invalid options file {}", file.display()))?;
                options.extend(parsed);
            }
            options.extend(args.options);
            if options.is_empty() {
                bail!("no options given, use --option or --options-file");
            }
            let preset = app.create_preset(&args.name, &args.source, &args.section, options)?;
            print_json(&preset)
        }
        Commands::Presets => print_json(&app.get_presets()),
        Commands::RemovePreset { id } => Ok(app.remove_preset(&id)?),
        Commands::SetSelection { id, option, value } => {
            Ok(app.set_selection(&id, &option, &value)?)
        }
        Commands::Run { id, dry_run } => {
            if dry_run {
                print_json(&app.plan_game(&id)?)
            } else {
                let outcome = app.run_game(&id)?;
                println!("started dolphin with pid: {}", outcome.pid);
                Ok(())
            }
        }
        Commands::CreateGamedir { name, path } => print_json(&app.create_gamedir(&name, &path)?),
        Commands::Gamedirs => print_json(&app.get_gamedirs()),
        Commands::RemoveGamedir(args) => {
            let target = match (args.index, args.id) {
                (Some(index), _) => DirectoryRef::Index(index),
                (None, Some(id)) => DirectoryRef::Id(id),
                (None, None) => bail!("either --index or --id is required"),
            };
            Ok(app.remove_gamedir(&target)?)
        }
        Commands::SetGamePath(args) => {
            let target = match (args.target.dir_id, args.target.path) {
                (Some(id), _) => BindTarget::Id(id),
                (None, Some(path)) => BindTarget::Path(path),
                (None, None) => bail!("either --dir-id or --path is required"),
            };
            Ok(app.set_game_path(&args.id, target)?)
        }
        Commands::PathName { id } => print_json(&app.get_path_name(&id)),
        Commands::SetDolphPath { path } => Ok(app.set_dolph_path(&path)?),
        Commands::DolphPath => {
            println!("{}", app.get_dolph_path());
            Ok(())
        }
        Commands::ExportDescriptor { id, out } => {
            let path = app.export_descriptor(&id, &out)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut cfg = CoreConfig::from_env();
    if let Some(dir) = cli.data_dir.clone() {
        cfg = cfg.with_data_dir(dir);
    }
    init_logging(&cfg);

    let result = Riivo::open(&cfg)
        .map_err(anyhow::Error::from)
        .and_then(|app| execute(&app, cli.command));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error("riivo", &e);
            let info = ErrorInfo::from_anyhow(&e);
            if cli.json {
                match serde_json::to_string(&info) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("error[{}]: {}", info.tag(), info.message),
                }
            } else {
                eprintln!("error[{}]: {}", info.tag(), info.message);
            }
            ExitCode::FAILURE
        }
    }
}
