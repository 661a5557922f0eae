use clap::{Args, Parser, Subcommand};
use crossterm::{style::Stylize, tty::IsTty};
use itertools::Itertools;
use recite::{
    config::{Config, ConfigStore, FileConfigStore},
    error::SessionError,
    history::{HistoryLog, HistoryReport},
    missing_words::{load_missing_words, save_missing_words},
    practice::Practice,
    scorer::{highlight, normalize_word, score},
    stats::WordStatsDb,
    summary::accuracy_label,
    transcript::LineTranscriptSource,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin, stdout, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// read-aloud practice: split texts into reading units and score what you said
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Splits a text file into short reading units and scores transcripts of your spoken attempts, tracking accuracy and the words you missed."
)]
pub struct Cli {
    /// config file to use instead of the default location; history and stats are kept beside it
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct SegmentArgs {
    /// maximum characters per reading unit
    #[clap(short = 'm', long)]
    max_length: Option<usize>,

    /// separator to split on, highest priority first; repeat to build the list (\n is a newline)
    #[clap(short = 's', long = "separator")]
    separators: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the reading units of a text file
    Split {
        file: PathBuf,
        #[clap(flatten)]
        segment: SegmentArgs,
        /// print units as JSON
        #[clap(long)]
        json: bool,
    },
    /// score a transcript against a reference sentence
    Score {
        reference: String,
        transcript: String,
        /// print the result as JSON
        #[clap(long)]
        json: bool,
    },
    /// read files unit by unit, one transcript per stdin line (":q" stops)
    Practice {
        #[clap(required = true)]
        files: Vec<PathBuf>,
        #[clap(flatten)]
        segment: SegmentArgs,
        /// disable colored highlighting
        #[clap(long)]
        no_color: bool,
        /// do not record per-word statistics
        #[clap(long)]
        no_stats: bool,
        /// do not append finished sessions to the history log
        #[clap(long)]
        no_history: bool,
        /// seed the missing-word list from a previously saved file
        #[clap(long)]
        missing_from: Option<PathBuf>,
        /// save the accumulated missing words to this file when done
        #[clap(long)]
        export_missing: Option<PathBuf>,
    },
    /// show logged practice sessions
    History {
        /// number of most recent sessions to show
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// show the most frequently missed words
    Words {
        #[clap(short = 'n', long, default_value_t = 20)]
        limit: usize,
        /// show every recorded attempt at this word instead
        #[clap(short = 'w', long)]
        word: Option<String>,
        /// delete all recorded word statistics
        #[clap(long)]
        clear: bool,
    },
    /// show the active configuration
    Config {
        /// overwrite the config file with defaults
        #[clap(long)]
        reset: bool,
    },
}

/// Settings for this run: the config file overlaid with command-line flags
#[derive(Debug, Clone)]
struct RuntimeSettings {
    config: Config,
    history_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
}

impl RuntimeSettings {
    fn new(config: Config, config_override: Option<&Path>) -> Self {
        Self {
            config,
            history_path: config_override.map(|p| p.with_file_name("history.csv")),
            db_path: config_override.map(|p| p.with_file_name("stats.db")),
        }
    }

    fn apply_segment_args(&mut self, args: &SegmentArgs) {
        if let Some(max_length) = args.max_length {
            self.config.max_length = max_length;
        }
        if !args.separators.is_empty() {
            self.config.separators = args
                .separators
                .iter()
                .map(|s| s.replace("\\n", "\n"))
                .collect();
        }
    }

    fn history(&self) -> HistoryLog {
        match &self.history_path {
            Some(path) => HistoryLog::with_path(path),
            None => HistoryLog::new(),
        }
    }

    fn stats_db(&self) -> rusqlite::Result<WordStatsDb> {
        match &self.db_path {
            Some(path) => WordStatsDb::open(path),
            None => WordStatsDb::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut settings = RuntimeSettings::new(store.load(), cli.config.as_deref());

    match cli.command {
        Command::Split {
            file,
            segment,
            json,
        } => {
            settings.apply_segment_args(&segment);
            split(&file, &settings.config, json)
        }
        Command::Score {
            reference,
            transcript,
            json,
        } => score_once(&reference, &transcript, settings.config.color, json),
        Command::Practice {
            files,
            segment,
            no_color,
            no_stats,
            no_history,
            missing_from,
            export_missing,
        } => {
            settings.apply_segment_args(&segment);
            settings.config.color &= !no_color;
            settings.config.record_stats &= !no_stats;
            settings.config.log_history &= !no_history;
            practice(
                &files,
                &settings,
                missing_from.as_deref(),
                export_missing.as_deref(),
            )
        }
        Command::History { limit } => show_history(&settings.history(), limit),
        Command::Words { limit, word, clear } => {
            show_words(&settings, limit, word.as_deref(), clear)
        }
        Command::Config { reset } => show_config(&store, reset),
    }
}

fn split(file: &Path, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
    let units = config.segment_config().segment(&text)?;

    let mut out = stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &units)?;
        writeln!(out)?;
    } else {
        for unit in &units {
            writeln!(out, "{:>4}  {}", unit.position() + 1, unit.text())?;
        }
    }

    if units.is_empty() {
        warn!(file = %file.display(), "file has no readable text");
    }
    Ok(())
}

fn score_once(reference: &str, transcript: &str, color: bool, json: bool) -> Result<(), Box<dyn Error>> {
    let result = score(reference, transcript);
    let tokens = highlight(reference, transcript);

    let mut out = stdout().lock();
    if json {
        let value = serde_json::json!({
            "result": result,
            "recall": result.recall(),
            "highlight": tokens,
        });
        serde_json::to_writer_pretty(&mut out, &value)?;
        writeln!(out)?;
        return Ok(());
    }

    let color = color && io::stdout().is_tty();
    let heard = tokens
        .iter()
        .map(|t| match (t.matched, color) {
            (true, _) => t.token.clone(),
            (false, true) => t.token.as_str().red().to_string(),
            (false, false) => format!("*{}*", t.token),
        })
        .join(" ");

    writeln!(
        out,
        "matched {}/{} ({})",
        result.matched_count,
        result.total_count,
        result
            .recall()
            .map_or_else(|| "nothing to score".to_string(), |r| format!("{r:.2}%"))
    )?;
    writeln!(out, "heard: {heard}")?;
    if !result.missing_words.is_empty() {
        writeln!(out, "missing: {}", result.missing_words.iter().join(", "))?;
    }
    Ok(())
}

fn practice(
    files: &[PathBuf],
    settings: &RuntimeSettings,
    missing_from: Option<&Path>,
    export_missing: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut config = settings.config.clone();
    config.color = config.color && io::stdout().is_tty();

    let source = LineTranscriptSource::new(stdin().lock());
    let mut practice = Practice::new(config.clone(), source, stdout());

    if config.record_stats {
        match settings.stats_db() {
            Ok(db) => practice = practice.with_stats_db(db),
            Err(e) => warn!(error = %e, "word statistics disabled"),
        }
    }
    if config.log_history {
        practice = practice.with_history(settings.history());
    }
    if let Some(path) = missing_from {
        let words = load_missing_words(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        practice.session.extend_missing(words);
    }

    for file in files {
        let name = file.display().to_string();
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %name, error = %e, "skipping unreadable file");
                continue;
            }
        };

        match practice.run_document(&name, &text) {
            Ok(Some(summary)) => {
                info!(document = %name, accuracy = summary.accuracy, "document finished")
            }
            Ok(None) => break,
            Err(recite::Error::Session(SessionError::EmptyDocument)) => {
                warn!(file = %name, "no readable text, skipping");
            }
            Err(e) => warn!(file = %name, error = %e, "skipping document"),
        }
    }

    let missing = practice.session.cumulative_missing().clone();
    println!();
    println!("{}", accuracy_label(practice.session.current_accuracy()));
    if let Some(path) = export_missing {
        let count = save_missing_words(path, &missing)?;
        println!("Saved {count} missing words to {}", path.display());
    } else if !missing.is_empty() {
        println!("Missing words: {}", missing.iter().join(", "));
    }
    Ok(())
}

fn show_history(log: &HistoryLog, limit: usize) -> Result<(), Box<dyn Error>> {
    let entries = log.load()?;
    if entries.is_empty() {
        println!("No sessions logged yet ({})", log.path().display());
        return Ok(());
    }

    let start = entries.len().saturating_sub(limit);
    for entry in &entries[start..] {
        println!(
            "{}  {:>7.2}%  {:>4} units  {}",
            entry.date.format("%Y-%m-%d %H:%M"),
            entry.accuracy,
            entry.units,
            entry.document
        );
    }

    let report = HistoryReport::from_entries(&entries);
    if let (Some(mean), Some(best)) = (report.mean_accuracy, report.best_accuracy) {
        println!();
        println!(
            "{} sessions, mean accuracy {:.2}%, best {:.2}%",
            report.sessions, mean, best
        );
    }
    Ok(())
}

fn show_words(
    settings: &RuntimeSettings,
    limit: usize,
    word: Option<&str>,
    clear: bool,
) -> Result<(), Box<dyn Error>> {
    let db = settings.stats_db()?;
    if clear {
        db.clear_all_stats()?;
        println!("Word statistics cleared");
        return Ok(());
    }

    if let Some(word) = word {
        let word = normalize_word(word.trim());
        let attempts = db.get_word_stats(&word)?;
        if attempts.is_empty() {
            println!("No attempts at \"{word}\" recorded yet");
            return Ok(());
        }
        for stat in attempts.iter().take(limit) {
            println!(
                "{}  {:<6}  {}",
                stat.timestamp.format("%Y-%m-%d %H:%M"),
                if stat.was_missed { "missed" } else { "read" },
                stat.unit_text
            );
        }
        if let Some(summary) = db.get_word_summary(&word)? {
            println!();
            println!(
                "{} missed {} of {} ({:.0}%)",
                summary.word, summary.misses, summary.attempts, summary.miss_rate
            );
        }
        return Ok(());
    }

    let words = db.get_most_missed(limit)?;
    if words.is_empty() {
        println!("No missed words recorded yet");
    }
    for summary in words {
        println!(
            "{:<20} missed {:>3} of {:>3} ({:.0}%)",
            summary.word, summary.misses, summary.attempts, summary.miss_rate
        );
    }
    Ok(())
}

fn show_config(store: &FileConfigStore, reset: bool) -> Result<(), Box<dyn Error>> {
    let config = if reset {
        let config = Config::default();
        store.save(&config)?;
        config
    } else {
        store.load()
    };

    println!("{}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
