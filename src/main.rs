use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use glosstool::convert::{convert, ConvertRequest};
use glosstool::filters::FilterPrefs;
use glosstool::reader::Options;
use glosstool::registry::Registry;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "glosstool")]
#[command(about = "Convert dictionary glossaries between formats")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a glossary file to another format
    Convert(ConvertArgs),
    /// List supported formats and their capabilities
    Formats(FormatsArgs),
}

#[derive(Args)]
struct FormatsArgs {
    /// Emit the format table as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input glossary file (.gz/.bz2/.zip archives are unpacked first)
    input: PathBuf,

    /// Output file; the extension selects the format unless overridden
    output: PathBuf,

    /// Input format name (default: detect from the input extension)
    #[arg(long)]
    read_format: Option<String>,

    /// Output format name (default: detect from the output extension)
    #[arg(long)]
    write_format: Option<String>,

    /// Stream entries instead of loading them into memory
    #[arg(long, conflicts_with = "indirect")]
    direct: bool,

    /// Load all entries into memory before writing
    #[arg(long)]
    indirect: bool,

    /// Sort entries before writing
    #[arg(long, conflicts_with = "no_sort")]
    sort: bool,

    /// Don't sort, even if the output format prefers it
    #[arg(long)]
    no_sort: bool,

    /// Max entries held in memory per run of the streaming sort
    #[arg(long, default_value_t = glosstool::config::DEFAULT_SORT_CACHE_SIZE)]
    sort_cache_size: usize,

    /// Drop embedded resource entries (images, audio)
    #[arg(long)]
    skip_resources: bool,

    /// Keep control characters in words and definitions
    #[arg(long)]
    no_sanitize: bool,

    /// Keep the original case of words
    #[arg(long)]
    no_lowercase: bool,

    /// Format-specific read option, as key=value (repeatable)
    #[arg(long = "read-option", value_parser = parse_option)]
    read_options: Vec<(String, String)>,

    /// Format-specific write option, as key=value (repeatable)
    #[arg(long = "write-option", value_parser = parse_option)]
    write_options: Vec<(String, String)>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid option '{}', expected key=value", s))
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let registry = Registry::builtin();
    let request = ConvertRequest {
        input_format: args.read_format,
        output_format: args.write_format,
        direct: match (args.direct, args.indirect) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        sort: match (args.sort, args.no_sort) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        sort_cache_size: args.sort_cache_size,
        progress: !args.no_progress,
        filter_prefs: FilterPrefs {
            skip_resources: args.skip_resources,
            sanitize_text: !args.no_sanitize,
            lowercase: !args.no_lowercase,
        },
        read_options: args.read_options.into_iter().collect::<Options>(),
        write_options: args.write_options.into_iter().collect::<Options>(),
    };

    let written = convert(&registry, &args.input, &args.output, request)?;
    println!("{}", written.display());
    Ok(())
}

fn run_formats(args: FormatsArgs) -> Result<()> {
    let registry = Registry::builtin();
    if args.json {
        let rows: Vec<serde_json::Value> = registry
            .iter()
            .map(|desc| {
                serde_json::json!({
                    "name": desc.name,
                    "description": desc.description,
                    "extensions": desc.extensions,
                    "read": desc.can_read(),
                    "write": desc.can_write(),
                    "sortPolicy": desc.sort_policy,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<14} {:<5} {:<6} {:<16} DESCRIPTION", "NAME", "READ", "WRITE", "EXTENSIONS");
    for desc in registry.iter() {
        let extensions: Vec<String> = desc.extensions.iter().map(|e| format!(".{}", e)).collect();
        println!(
            "{:<14} {:<5} {:<6} {:<16} {}",
            desc.name,
            if desc.can_read() { "yes" } else { "-" },
            if desc.can_write() { "yes" } else { "-" },
            extensions.join(" "),
            desc.description,
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Formats(args) => run_formats(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
