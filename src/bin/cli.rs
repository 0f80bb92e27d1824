use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use event_schedule::persistence::{InMemoryTaskStore, TaskStore};
use event_schedule::{
    DanglingDependencyPolicy, Schedule, ScheduleError, ScheduleRequest, Scheduler,
    SchedulerOptions, TaskId, Viewer, load_event_from_json, load_tasks_from_json, logging,
    parse_anchor, write_schedule_csv,
};

#[derive(Debug, Parser)]
#[command(
    name = "cli",
    version,
    about = "Preview event schedules computed from a task catalogue.",
    long_about = None
)]
struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EVENT_SCHEDULE_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Schedule tasks from a catalogue against an anchor date.
    Preview {
        /// Task catalogue (JSON).
        #[arg(long, value_name = "PATH")]
        tasks: PathBuf,

        /// Anchor date: RFC 3339, `YYYY-MM-DD[THH:MM[:SS]]` or epoch milliseconds.
        #[arg(long)]
        anchor: String,

        /// Comma-separated task ids. Default: every task in the catalogue.
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        ids: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Fail when a task depends on something outside the selection.
        #[arg(long)]
        strict: bool,
    },
    /// Schedule a stored event (JSON) against a task catalogue.
    Event {
        #[arg(long, value_name = "PATH")]
        tasks: PathBuf,

        #[arg(long, value_name = "PATH")]
        event: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let level = args
        .log_level
        .map(LogLevel::as_str)
        .or_else(|| std::env::var(event_schedule::config::ENV_LOG).is_err().then_some("warn"));
    if let Err(err) = logging::init_logging(level) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> CliResult<()> {
    match command {
        Command::Preview {
            tasks,
            anchor,
            ids,
            format,
            strict,
        } => {
            let catalog = load_tasks_from_json(&tasks)?;
            let store = InMemoryTaskStore::from_tasks(catalog)?;
            let ids: Vec<TaskId> = if ids.is_empty() {
                store.list_tasks()?.into_iter().map(|t| t.id).collect()
            } else {
                ids.iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(TaskId::from)
                    .collect()
            };
            let anchor = parse_anchor(&anchor)?;

            let policy = if strict {
                DanglingDependencyPolicy::Reject
            } else {
                DanglingDependencyPolicy::Ignore
            };
            let scheduler = Scheduler::new(SchedulerOptions {
                dangling_dependencies: policy,
            });
            let request = ScheduleRequest::new(ids, Some(anchor.into()));
            let schedule = request.execute(&store, Viewer::Trusted, &scheduler)?;
            print_schedule(&schedule, format)
        }
        Command::Event {
            tasks,
            event,
            format,
        } => {
            let store = InMemoryTaskStore::from_tasks(load_tasks_from_json(&tasks)?)?;
            let event = load_event_from_json(&event)?;
            let schedule: Result<Schedule, ScheduleError> =
                event.schedule(&store, Viewer::Trusted, &Scheduler::default());
            print_schedule(&schedule?, format)
        }
    }
}

/// Table and summary go to stdout; for json/csv the summary goes to stderr so
/// stdout stays machine-readable.
fn print_schedule(schedule: &Schedule, format: OutputFormat) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => {
            write!(out, "{}", render_schedule_as_text_table(schedule))?;
            writeln!(out, "{}", schedule.to_cli_summary())?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, schedule)?;
            writeln!(out)?;
            eprintln!("{}", schedule.to_cli_summary());
        }
        OutputFormat::Csv => {
            write_schedule_csv(schedule, &mut out)?;
            eprintln!("{}", schedule.to_cli_summary());
        }
    }
    out.flush()?;
    Ok(())
}

fn render_schedule_as_text_table(schedule: &Schedule) -> String {
    let header = ["task_id", "description", "start", "end", "hours", "dependencies", "fixed"];
    let rows: Vec<[String; 7]> = schedule
        .tasks()
        .iter()
        .map(|task| {
            [
                task.task_id.to_string(),
                task.description.clone(),
                task.start_time.to_rfc3339(),
                task.end_time.to_rfc3339(),
                task.duration.to_string(),
                task.dependencies
                    .iter()
                    .map(TaskId::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                if task.is_fixed_start { "yes".into() } else { String::new() },
            ]
        })
        .collect();

    // Compute column widths
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, header.iter().copied(), &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.zip(widths) {
        out.push(' ');
        out.push_str(cell);
        let pad = width - cell.chars().count();
        if pad > 0 {
            out.push_str(&" ".repeat(pad));
        }
        out.push_str(" |");
    }
    out.push('\n');
}
