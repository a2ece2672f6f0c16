use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};

mod inspect;
mod present;
mod summary;

use inspect::{SortBy, View};
use present::{Presenter, PresenterOptions};

/// Prints basic information about an FL Studio project file (.flp).
#[derive(Debug, Parser)]
#[command(name = "flpinfo", version)]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// The FLP to summarize. Zipped FLPs are not supported.
    #[arg(value_parser = existing_file)]
    flp: Option<PathBuf>,

    /// Print the summary as JSON. Not available with subcommands.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Lists will not appear truncated.
    #[arg(long, global = true)]
    full_lists: bool,

    /// Disables colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Log what the parser is doing to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List arrangements and their track counts.
    Arrangements {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
    },
    /// List channels of every type.
    Channels {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
        #[arg(long, value_enum, default_value_t = SortBy::Index)]
        sort_by: SortBy,
    },
    /// List mixer inserts and the effects in their slots.
    Inserts {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
    },
    /// List instrument channels and the generators they host.
    Instruments {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
        /// Only show channels hosting third-party plugins.
        #[arg(long)]
        plugins_only: bool,
    },
    /// List sampler channels and their samples.
    Samplers {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
    },
    /// List the sample files the project uses.
    Samples {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
    },
    /// List patterns and their note counts.
    Patterns {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
    },
    /// List native and third-party plugins used anywhere in the project.
    Plugins {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
    },
    /// List the named tracks of an arrangement (the first one by default).
    Tracks {
        #[arg(value_parser = existing_file)]
        flp: PathBuf,
        arrangement: Option<u16>,
    },
}

impl Command {
    fn split(self) -> (PathBuf, View) {
        match self {
            Command::Arrangements { flp } => (flp, View::Arrangements),
            Command::Channels { flp, sort_by } => (flp, View::Channels { sort_by }),
            Command::Inserts { flp } => (flp, View::Inserts),
            Command::Instruments { flp, plugins_only } => (flp, View::Instruments { plugins_only }),
            Command::Samplers { flp } => (flp, View::Samplers),
            Command::Samples { flp } => (flp, View::Samples),
            Command::Patterns { flp } => (flp, View::Patterns),
            Command::Plugins { flp } => (flp, View::Plugins),
            Command::Tracks { flp, arrangement } => (flp, View::Tracks { arrangement }),
        }
    }
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_file() {
        Ok(path)
    } else if path.exists() {
        Err(format!("not a file: {s}"))
    } else {
        Err(format!("no such file: {s}"))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn parse(path: &Path) -> anyhow::Result<flp_parser::Parsed> {
    flp_parser::parse_file(path).with_context(|| format!("failed to parse: {}", path.display()))
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::BrokenPipe)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.output.verbose);

    if cli.json && cli.command.is_some() {
        Cli::command()
            .error(
                ErrorKind::ArgumentConflict,
                "--json only applies to the summary, not to subcommands",
            )
            .exit();
    }

    match run(cli) {
        // Reader went away (e.g. `| head`); nothing left to report.
        Err(e) if is_broken_pipe(&e) => Ok(()),
        other => other,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let opts = PresenterOptions {
        color: !cli.output.no_color && console::colors_enabled(),
        full: cli.output.full_lists || cli.output.verbose,
        width: present::terminal_width(),
    };
    let stdout = io::stdout();
    let mut presenter = Presenter::new(stdout.lock(), opts);

    match (cli.command, cli.flp) {
        (Some(command), _) => {
            let (flp, view) = command.split();
            log::debug!("{view:?} view of {}", flp.display());
            let project = parse(&flp)?.project();
            inspect::run(&mut presenter, &project, view)?;
        }
        (None, Some(flp)) => {
            let parsed = parse(&flp)?;
            let summary = summary::summarize(&parsed.events);
            log::debug!(
                "{} channels, {} arrangements, {} patterns",
                summary.channels.len(),
                summary.arrangements.len(),
                summary.patterns.len()
            );
            if cli.json {
                let json =
                    serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
                presenter.line(json)?;
            } else {
                summary::print_report(&mut presenter, &summary)?;
            }
        }
        (None, None) => {
            Cli::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "an FLP path or a subcommand is required",
                )
                .exit();
        }
    }

    presenter.into_inner().flush()?;
    Ok(())
}
