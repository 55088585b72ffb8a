//! CLI entry point for `smsmime`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use smsmime::config::{Config, PrefStore, Preferences, DEFAULT_MAX_SYNCED_DATE};
use smsmime::contacts::directory::StaticDirectory;
use smsmime::convert::batch::{pending_rows, BatchConverter};
use smsmime::convert::identity;
use smsmime::convert::record::{ConversionContext, RecordConverter};
use smsmime::model::row;

#[derive(Parser)]
#[command(
    name = "smsmime",
    version,
    about = "Convert SMS message-store rows into MIME email messages for backup"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Eml,
    Mbox,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a JSON dump of message rows into email messages
    Convert {
        /// JSON array of rows, one object per message
        rows: PathBuf,
        /// JSON contact directory used to resolve phone numbers
        #[arg(short, long)]
        contacts: Option<PathBuf>,
        /// Output directory (eml) or file (mbox)
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value = "eml")]
        format: Format,
        /// Maximum number of messages to convert (default from config)
        #[arg(short, long)]
        max: Option<usize>,
        /// Only convert rows newer than this epoch-millis date
        #[arg(long, value_name = "MILLIS")]
        since: Option<i64>,
        /// Ignore the saved watermark and convert everything
        #[arg(long, conflicts_with = "since")]
        full: bool,
        /// Owner address used for sent messages (default from config)
        #[arg(long, env = "SMSMIME_USER_EMAIL")]
        user_email: Option<String>,
    },
    /// Print the Message-ID for a date, address and type code
    MessageId {
        millis: i64,
        address: String,
        type_code: i32,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = smsmime::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Convert {
            rows,
            contacts,
            output,
            format,
            max,
            since,
            full,
            user_email,
        } => cmd_convert(
            &config,
            ConvertArgs {
                rows: &rows,
                contacts: contacts.as_deref(),
                output: &output,
                format,
                max,
                since,
                full,
                user_email: user_email.as_deref(),
            },
        ),
        Commands::MessageId {
            millis,
            address,
            type_code,
        } => {
            println!("{}", identity::message_id(millis, &address, type_code));
            Ok(())
        }
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = smsmime::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "smsmime.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "smsmime", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

struct ConvertArgs<'a> {
    rows: &'a Path,
    contacts: Option<&'a Path>,
    output: &'a Path,
    format: Format,
    max: Option<usize>,
    since: Option<i64>,
    full: bool,
    user_email: Option<&'a str>,
}

/// Convert rows newer than the watermark, export them, and save the new watermark.
fn cmd_convert(config: &Config, args: ConvertArgs<'_>) -> anyhow::Result<()> {
    let start = Instant::now();

    let directory = match args.contacts {
        Some(path) => StaticDirectory::load(path)?,
        None => StaticDirectory::default(),
    };

    let mut prefs = PrefStore::for_config(config);
    let floor = if args.full {
        DEFAULT_MAX_SYNCED_DATE
    } else {
        args.since.unwrap_or_else(|| prefs.max_synced_date())
    };

    let rows = pending_rows(row::load_rows(args.rows)?, floor);
    let max_entries = args.max.unwrap_or(config.backup.max_entries);

    let user_email = args.user_email.unwrap_or(&config.general.user_email);
    let context = ConversionContext::from_preferences(user_email, &mut prefs);
    let converter =
        RecordConverter::with_cache_size(context, directory, config.backup.person_cache_size);
    let mut batch = BatchConverter::new(converter);

    let pending = rows.len();
    let result = batch.convert_batch(&rows, max_entries, floor);

    let pb = ProgressBar::new(result.messages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Writing [{bar:40.cyan/blue}] {pos}/{len} messages")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    let progress = |current: usize, _total: usize| pb.set_position(current as u64);

    let (written_bytes, duplicates) = match args.format {
        Format::Eml => {
            let paths = smsmime::export::eml::export_eml(&result.messages, args.output, &progress)?;
            let bytes = paths
                .iter()
                .filter_map(|p| std::fs::metadata(p).ok())
                .map(|m| m.len())
                .sum::<u64>();
            (bytes, None)
        }
        Format::Mbox => {
            let stats =
                smsmime::export::mbox::export_mbox(&result.messages, args.output, true, &progress)?;
            (stats.output_size, Some(stats.duplicates_skipped))
        }
    };
    pb.finish_and_clear();

    prefs.set_max_synced_date(result.max_date);
    prefs.save()?;

    use humansize::{format_size, BINARY};
    println!();
    println!("  Conversion complete:");
    println!("  {:<25} {}", "Pending rows", pending);
    println!("  {:<25} {}", "Messages converted", result.messages.len());
    if let Some(duplicates) = duplicates {
        println!("  {:<25} {}", "Duplicates skipped", duplicates);
    }
    println!("  {:<25} {}", "New watermark", result.max_date);
    println!("  {:<25} {}", "Output size", format_size(written_bytes, BINARY));
    println!("  {:<25} {}", "Output", args.output.display());
    println!("  {:<25} {:.2?}", "Elapsed", start.elapsed());
    println!();

    Ok(())
}
