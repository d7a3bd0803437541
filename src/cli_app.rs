//! Top-level CLI definition and dispatch.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use conlist::actions::{CommandScriptExecutor, CommandTemplate, RecordingExecutor};
use conlist::cli::screen::{self, ScreenOptions};
use conlist::core::config::Config;
use conlist::core::errors::ConlistError;
use conlist::logger::ActivityLog;
use conlist::logger::jsonl::{JsonlConfig, WriterState};
use conlist::roster::commit::{ActionExecutor, CommitReport, ExecutedAction};
use conlist::roster::store::Roster;
use conlist::session::{LineOutcome, OperatorCommand, Session};

/// Interactive connection list for chat network operators.
#[derive(Debug, Parser)]
#[command(
    name = "conlist",
    author,
    version,
    about = "Interactive connection list - page, flag and batch-ban recent connections",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Track a live feed on stdin and accept operator commands.
    Watch(WatchArgs),
    /// Ingest a saved log and print the resulting list.
    Replay(ReplayArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct WatchArgs {
    /// Rows of connections per screen (defaults to the terminal height).
    #[arg(long, value_name = "ROWS", value_parser = clap::value_parser!(u16).range(1..))]
    height: Option<u16>,
    /// Record actions without emitting services commands.
    #[arg(long)]
    dry_run: bool,
    /// Write services commands to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    emit: Option<PathBuf>,
    /// Do not paint the list after changes.
    #[arg(long)]
    no_display: bool,
    /// Do not write the activity log.
    #[arg(long)]
    no_log: bool,
}

#[derive(Debug, Clone, Args)]
struct ReplayArgs {
    /// Log file containing connect/exit notices (and optional commands).
    #[arg(value_name = "FILE")]
    path: PathBuf,
    /// Rows of connections per screen.
    #[arg(long, value_name = "ROWS", value_parser = clap::value_parser!(u16).range(1..))]
    height: Option<u16>,
    /// Operator command applied after ingest; may be repeated.
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    commands: Vec<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Operation partially succeeded.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Watch(args) => run_watch(cli, args),
        Command::Replay(args) => run_replay(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref()).map_err(|e| match e {
        ConlistError::MissingConfig { .. }
        | ConlistError::InvalidConfig { .. }
        | ConlistError::ConfigParse { .. } => CliError::User(e.to_string()),
        _ => CliError::Runtime(e.to_string()),
    })
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

fn run_watch(cli: &Cli, args: &WatchArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut display = io::stderr();
    let is_terminal = display.is_terminal();
    let mode = output_mode_for(cli, is_terminal);
    let hash = config
        .stable_hash()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let log = if args.no_log || config.paths.jsonl_log.as_os_str().is_empty() {
        ActivityLog::disabled()
    } else {
        ActivityLog::open(JsonlConfig::at(&config.paths.jsonl_log))
    };
    if let Some(state) = log.writer_state()
        && state != WriterState::Normal
    {
        writeln!(
            display,
            "{}",
            format!("conlist: activity log degraded to {}", state.as_str()).yellow()
        )?;
    }

    let dry_run = args.dry_run || config.actions.dry_run;
    let template = CommandTemplate::from_config(&config.actions);
    let executor: Box<dyn ActionExecutor> = if dry_run {
        Box::new(RecordingExecutor::default())
    } else if let Some(path) = &args.emit {
        Box::new(CommandScriptExecutor::new(open_emit_file(path)?, template))
    } else {
        Box::new(CommandScriptExecutor::new(io::stdout(), template))
    };

    let mut session =
        Session::new(&config, executor, log).map_err(|e| CliError::User(e.to_string()))?;
    session.log_session_start(env!("CARGO_PKG_VERSION"), &hash);

    let mut screen_options = ScreenOptions {
        height: resolve_height(args.height, &config, is_terminal),
        timestamp_format: config.display.timestamp_format.clone(),
        clear: is_terminal,
    };
    let show = !args.no_display;
    if show {
        redraw(&mut display, mode, session.roster(), &screen_options)?;
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        // The terminal may have been resized since the last redraw.
        screen_options.height = resolve_height(args.height, &config, is_terminal);
        let outcome = session.handle_input(&line, Utc::now(), screen_options.height);
        match &outcome {
            LineOutcome::Rejected(err) => {
                writeln!(display, "{} {err}", "conlist:".yellow())?;
            }
            LineOutcome::Command(OperatorCommand::Commit, result) if result.changed => {
                writeln!(
                    display,
                    "{}",
                    commit_summary(session.last_commit(), dry_run).green()
                )?;
            }
            _ => {}
        }
        if show && outcome.needs_redraw() {
            redraw(&mut display, mode, session.roster(), &screen_options)?;
        }
    }

    let (roster, _) = session.finish();
    let pending = roster.pending_count();
    if pending > 0 {
        writeln!(
            display,
            "{}",
            format!("conlist: {pending} flagged connections were never committed").yellow()
        )?;
    }
    Ok(())
}

fn open_emit_file(path: &Path) -> Result<File, CliError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CliError::Runtime(format!("open {}: {e}", path.display())))
}

fn redraw<W: Write>(
    out: &mut W,
    mode: OutputMode,
    roster: &Roster,
    options: &ScreenOptions,
) -> Result<(), CliError> {
    match mode {
        OutputMode::Human => screen::paint(out, roster, options)?,
        OutputMode::Json => {
            serde_json::to_writer(&mut *out, &screen::frame_json("watch", roster, options.height))?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn commit_summary(report: &CommitReport, dry_run: bool) -> String {
    let verb = if dry_run { "would issue" } else { "issued" };
    format!(
        "{verb} {} KILL and {} AKILL",
        report.kills(),
        report.akills()
    )
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

fn run_replay(cli: &Cli, args: &ReplayArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mode = output_mode(cli);
    let height = resolve_height(args.height, &config, io::stdout().is_terminal());

    let commands = args
        .commands
        .iter()
        .map(|raw| {
            raw.parse::<OperatorCommand>()
                .map_err(|e| CliError::User(format!("--command {raw:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let raw = fs::read_to_string(&args.path)
        .map_err(|e| CliError::User(format!("read {}: {e}", args.path.display())))?;

    let mut session = Session::new(&config, RecordingExecutor::default(), ActivityLog::disabled())
        .map_err(|e| CliError::User(e.to_string()))?;

    let now = Utc::now();
    let mut feed_events = 0usize;
    let mut rejected = 0usize;
    for line in raw.lines() {
        match session.handle_input(line, now, height) {
            LineOutcome::Feed(_) => feed_events += 1,
            LineOutcome::Rejected(err) => {
                rejected += 1;
                eprintln!("conlist: {}: {err}", args.path.display());
            }
            LineOutcome::Command(..) | LineOutcome::Ignored => {}
        }
    }
    for command in commands {
        session.dispatch(command, height);
    }

    let (roster, executor) = session.finish();
    match mode {
        OutputMode::Human => {
            let options = ScreenOptions {
                height,
                timestamp_format: config.display.timestamp_format.clone(),
                clear: false,
            };
            let mut stdout = io::stdout().lock();
            screen::paint(&mut stdout, &roster, &options)?;
            for action in &executor.actions {
                writeln!(stdout, "{}", describe_action(action))?;
            }
        }
        OutputMode::Json => {
            let mut payload = screen::frame_json("replay", &roster, height);
            if let Value::Object(map) = &mut payload {
                map.insert("feed_events".to_string(), json!(feed_events));
                map.insert("rejected".to_string(), json!(rejected));
                map.insert("actions".to_string(), serde_json::to_value(&executor.actions)?);
            }
            write_json_line(&payload)?;
        }
    }

    if rejected > 0 {
        return Err(CliError::Partial(format!(
            "{rejected} command lines in {} were not understood",
            args.path.display()
        )));
    }
    Ok(())
}

fn describe_action(action: &ExecutedAction) -> String {
    match action {
        ExecutedAction::Kill { nick, reason } => format!("KILL {nick} ({reason})"),
        ExecutedAction::Akill { address, reason } => format!("AKILL {address} ({reason})"),
    }
}

fn resolve_height(flag: Option<u16>, config: &Config, is_terminal: bool) -> usize {
    flag.map(usize::from)
        .or_else(|| {
            if is_terminal {
                screen::terminal_list_height()
            } else {
                None
            }
        })
        .unwrap_or(config.display.default_height)
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = config
                        .to_toml()
                        .map_err(|e| CliError::Runtime(e.to_string()))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let value = serde_json::to_value(&config)?;
                    let payload = json!({
                        "command": "config show",
                        "config": value,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config
                    .stable_hash()
                    .map_err(|e| CliError::Runtime(e.to_string()))?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("{}", "Configuration is valid.".green());
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("{} {e}", "Configuration is INVALID:".red());
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ---------------------------------------------------------------------------
// output helpers
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    output_mode_for(cli, io::stdout().is_terminal())
}

/// Output mode for a stream other than stdout (the watch display).
fn output_mode_for(cli: &Cli, is_terminal: bool) -> OutputMode {
    let env_mode = std::env::var("CONLIST_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), is_terminal)
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
