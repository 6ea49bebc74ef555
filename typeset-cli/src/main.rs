//! `typeset-cli` command line front-end.
//!
//! Drives the typeset engine on JSON/TOML files: validates input typesets,
//! prints default value trees, casts submitted values, evaluates input
//! conditions and applies submissions to a screen's values file.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::info;
use serde_json::Value;
use typeset::{
    Caster, DefaultsMode, Effect, FormData, SanitizeRegistry, ScreenRegistry, get_defaults,
    parse_value_typesets, validate_typesets,
    data::typeset::typesets_to_value,
    eval::resolve_typesets,
};

mod screens;

#[derive(Parser, Debug)]
#[command(name = "typeset-cli", version, about = "Typeset form engine tools")]
struct Cli {
    /// Raise log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate raw input typesets and print their canonical form.
    Validate {
        /// Input typesets file (JSON or TOML).
        inputs: PathBuf,
    },
    /// Print the default value tree of value typesets.
    Defaults {
        /// Value typesets file (JSON or TOML).
        options: PathBuf,
        /// Expand dynamic containers per registered item.
        #[arg(long)]
        fill: bool,
    },
    /// Cast raw values against value typesets.
    Cast {
        /// Value typesets file (JSON or TOML).
        options: PathBuf,
        /// Raw values file (JSON or TOML).
        values: PathBuf,
    },
    /// Evaluate input conditions against a values file.
    Eval {
        /// Input typesets file (JSON or TOML).
        inputs: PathBuf,
        /// Current values file (JSON or TOML).
        values: PathBuf,
    },
    /// List the screens found in a screens directory.
    Screens {
        /// Directory of screen files.
        dir: PathBuf,
    },
    /// Apply a submission to a screen's values file.
    Submit {
        /// Directory of screen files.
        #[arg(long, conflicts_with = "screen_file")]
        screens: Option<PathBuf>,
        /// A single screen file.
        #[arg(long)]
        screen_file: Option<PathBuf>,
        /// Slug of the screen to submit to; defaults to the only screen.
        #[arg(long)]
        screen: Option<String>,
        /// Values file to update (JSON or TOML).
        #[arg(long)]
        values: Option<PathBuf>,
        /// Treat the submission as partial and keep unsubmitted values.
        #[arg(long)]
        partial: bool,
        /// Submitted values file (JSON or TOML).
        submission: PathBuf,
    },
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn effect_label(effect: Effect) -> String {
    let label = format!("{effect:?}").to_lowercase();
    match effect {
        Effect::Show | Effect::Enable | Effect::Editable => label.green().to_string(),
        Effect::Hide | Effect::Disable => label.red().to_string(),
        Effect::Readonly => label.yellow().to_string(),
    }
}

fn pick_screen(registry: &ScreenRegistry, slug: Option<String>) -> anyhow::Result<String> {
    if let Some(slug) = slug {
        return Ok(slug);
    }
    let slugs: Vec<&str> = registry.slugs().collect();
    match slugs.as_slice() {
        [only] => Ok(only.to_string()),
        [] => anyhow::bail!("no screens registered"),
        many => anyhow::bail!("several screens registered, pick one with --screen: {many:?}"),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Validate { inputs } => {
            let raw = Value::Object(screens::read_map(&inputs)?);
            let typesets = validate_typesets(&raw);
            info!("{} top-level typesets kept", typesets.len());
            print_json(&typesets_to_value(&typesets))?;
        }
        Command::Defaults { options, fill } => {
            let typesets = parse_value_typesets(&Value::Object(screens::read_map(&options)?))?;
            let mode = if fill {
                DefaultsMode::Fill
            } else {
                DefaultsMode::Default
            };
            print_json(&Value::Object(get_defaults(&typesets, mode)))?;
        }
        Command::Cast { options, values } => {
            let typesets = parse_value_typesets(&Value::Object(screens::read_map(&options)?))?;
            let raw = screens::read_map(&values)?;
            let registry = SanitizeRegistry::with_builtins();
            let clean = Caster::new(&registry).cast_values(&raw, &typesets);
            print_json(&Value::Object(clean))?;
        }
        Command::Eval { inputs, values } => {
            let typesets = validate_typesets(&Value::Object(screens::read_map(&inputs)?));
            let values = screens::read_map(&values)?;
            for field in resolve_typesets(&typesets, &values) {
                let target = match &field.item {
                    Some(item) => format!("{}[{item}]", field.path),
                    None => field.path.clone(),
                };
                println!("{} {}", target.bold(), effect_label(field.effect));
            }
        }
        Command::Screens { dir } => {
            let registry = screens::load_dir(&dir)?;
            for slug in registry.slugs() {
                let screen = registry.build(slug)?;
                println!(
                    "{} {} ({} inputs, {} options)",
                    slug.bold(),
                    screen.title,
                    screen.input_typesets().len(),
                    screen.options.len()
                );
            }
        }
        Command::Submit {
            screens: dir,
            screen_file,
            screen,
            values,
            partial,
            submission,
        } => {
            let registry = match (dir, screen_file) {
                (Some(dir), _) => screens::load_dir(&dir)?,
                (None, Some(file)) => screens::load_file(&file)?,
                (None, None) => anyhow::bail!("one of --screens or --screen-file is required"),
            };
            let slug = pick_screen(&registry, screen)?;
            let screen = registry.build(&slug)?;

            let mut form = FormData::new(&screen, values, SanitizeRegistry::with_builtins())
                .with_context(|| format!("Failed to load values of screen `{slug}`"))?;
            let raw = screens::read_map(&submission)?;
            let changed = if partial {
                form.update(&raw)
            } else {
                form.submit(&raw)
            };

            if changed {
                form.on_exit()?;
                println!(
                    "{}",
                    format!("Values saved to {}", form.path.display()).bold().purple()
                );
            } else {
                println!("{}", "No values changed".yellow());
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    run(cli)
}
