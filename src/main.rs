mod app;
mod calendar;
mod config;
mod datekit;
mod help;
mod palette;
mod remote;
mod store;
mod streak;
mod theme;
use crate::app::App;
use crate::config::{default_data_dir, Config, Options, Storage, LOG_VAR};
use crate::datekit::normalize;
use crate::palette::{ColorPicker, RandomColorPicker, BLANK_COLOR, PALETTE};
use crate::remote::{JsonDirBackend, MemoryBackend, RemoteDocuments};
use crate::store::ReadDayStore;
use crate::streak::calculate_streak;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run { options: Options },
    Stats { options: Options },
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut options = Options::default();
        let mut stats = false;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Long("year") => options.year = Some(parser.value()?.parse()?),
                Arg::Long("today") => {
                    options.today = Some(parser.value()?.parse_with(|s| Date::parse(s, &YMD_FMT))?);
                }
                Arg::Long("data-dir") => options.data_dir = Some(PathBuf::from(parser.value()?)),
                Arg::Long("collection") => options.collection = Some(parser.value()?.string()?),
                Arg::Long("ephemeral") => options.ephemeral = true,
                Arg::Long("stats") => stats = true,
                _ => return Err(arg.unexpected()),
            }
        }
        if stats {
            Ok(Command::Stats { options })
        } else {
            Ok(Command::Run { options })
        }
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run { options } => start(options, false),
            Command::Stats { options } => start(options, true),
            Command::Help => {
                println!("Usage: readtrack [<options>]");
                println!();
                println!("Terminal year calendar for tracking daily reading streaks");
                println!();
                println!("Options:");
                println!("  --year YYYY              Show the given year [default: this year]");
                println!("  --today YYYY-MM-DD       Treat the given date as today");
                println!("  --data-dir DIR           Store read days under DIR");
                println!("  --collection NAME        Name of the collection of year documents");
                println!("                           [default: readDays]");
                println!("  --ephemeral              Keep read days in memory only");
                println!("  --stats                  Print the year's totals and exit");
                println!("  -h, --help               Display this help message and exit");
                println!("  -V, --version            Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn start(options: Options, stats: bool) -> anyhow::Result<()> {
    let config = options.resolve(
        || OffsetDateTime::now_local().map(|now| normalize(now).date()),
        default_data_dir(),
    )?;
    init_logging(&config)?;
    info!(
        year = %config.year,
        today = %config.today,
        collection = %config.collection,
        storage = ?config.storage,
        "starting up"
    );
    let picker = RandomColorPicker::new(PALETTE, BLANK_COLOR)?;
    debug!(colors = picker.colors().count(), "loaded palette");
    match &config.storage {
        Storage::Ephemeral => launch(MemoryBackend::new(), picker, &config, stats),
        Storage::Directory(dir) => launch(JsonDirBackend::new(dir), picker, &config, stats),
    }
}

fn launch<R: RemoteDocuments, P: ColorPicker>(
    remote: R,
    picker: P,
    config: &Config,
    stats: bool,
) -> anyhow::Result<()> {
    let mut store = ReadDayStore::new(remote, picker, config.collection.as_str());
    store.subscribe(config.year);
    if stats {
        if let Some(e) = store.last_error() {
            anyhow::bail!("failed to load read days for {}: {e}", config.year);
        }
        let read_days = store.read_days();
        let streak = calculate_streak(&*read_days, config.year, config.today);
        println!("Year:           {}", config.year);
        println!("Days read:      {}", read_days.len());
        println!("Current streak: {streak}");
        Ok(())
    } else {
        with_terminal(|mut terminal| {
            terminal.hide_cursor().context("failed to hide cursor")?;
            App::new(store, config.year, config.today).run(terminal)?;
            Ok(())
        })
    }
}

/// Send log events to a file, as the terminal belongs to the calendar
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let path = config.log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
