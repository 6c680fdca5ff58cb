//! Cellbind CLI - Convert and validate CSV files against a field mapping
//!
//! # Commands
//!
//! ```bash
//! cellbind read input.csv -m mapping.json      # CSV to JSON records, report failures
//! cellbind write records.json -m mapping.json  # JSON records to CSV
//! cellbind chains -m mapping.json              # Show the chains built for each field
//! cellbind example-mapping                     # Print an example mapping
//! ```
//!
//! Defaults for locale, timezone and message locale come from the
//! environment (see `cellbind::config`).

use clap::{Parser, Subcommand};
use cellbind::{
    config::Settings, example_mapping, pipeline::format_delimiter, Locale, MappingConfig,
    MessageBundle, Pipeline,
};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cellbind")]
#[command(about = "Convert and validate CSV cells against a declarative field mapping", long_about = None)]
struct Cli {
    /// Locale used for failure messages (overrides CELLBIND_MESSAGE_LOCALE)
    #[arg(long, global = true)]
    message_locale: Option<String>,

    /// Extra message templates (properties file) for the message locale
    #[arg(long, global = true)]
    messages: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a CSV file into JSON records
    Read {
        /// Input CSV file
        input: PathBuf,

        /// Mapping JSON file
        #[arg(short, long)]
        mapping: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file for records (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the resolved failure messages as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Write JSON records (array of objects) as CSV
    Write {
        /// Input JSON file
        input: PathBuf,

        /// Mapping JSON file
        #[arg(short, long)]
        mapping: PathBuf,

        /// CSV delimiter (default: mapping's, else ',')
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the read and write chains built for each field
    Chains {
        /// Mapping JSON file
        #[arg(short, long)]
        mapping: PathBuf,
    },

    /// Show example mapping
    ExampleMapping,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Read {
            input,
            mapping,
            delimiter,
            output,
            report,
        } => settings(cli.message_locale.as_deref()).and_then(|settings| {
            cmd_read(
                &settings,
                cli.messages.as_deref(),
                &input,
                &mapping,
                delimiter,
                output.as_deref(),
                report.as_deref(),
            )
        }),

        Commands::Write {
            input,
            mapping,
            delimiter,
            output,
        } => settings(cli.message_locale.as_deref()).and_then(|settings| {
            cmd_write(&settings, &input, &mapping, delimiter, output.as_deref())
        }),

        Commands::Chains { mapping } => {
            settings(cli.message_locale.as_deref()).and_then(|settings| cmd_chains(&settings, &mapping))
        }

        Commands::ExampleMapping => cmd_example_mapping(),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(2);
        }
    }
}

type CmdResult = Result<bool, Box<dyn std::error::Error>>;

fn settings(message_locale: Option<&str>) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::from_env()?;
    if let Some(tag) = message_locale {
        settings.message_locale =
            Locale::parse(tag).ok_or_else(|| format!("unknown locale '{}'", tag))?;
    }
    Ok(settings)
}

fn load_mapping(path: &Path) -> Result<MappingConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(MappingConfig::from_json(&content)?)
}

fn cmd_read(
    settings: &Settings,
    messages: Option<&Path>,
    input: &Path,
    mapping: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
    report_path: Option<&Path>,
) -> CmdResult {
    eprintln!("📄 Reading: {}", input.display());

    let mut pipeline = Pipeline::new(load_mapping(mapping)?, settings);
    if let Some(path) = messages {
        let bundle = MessageBundle::from_properties(&fs::read_to_string(path)?)?;
        pipeline = pipeline.with_messages(settings.message_locale.clone(), bundle);
    }

    let report = pipeline.read_file(input, delimiter)?;

    eprintln!("   Encoding: {}", report.csv_info.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(report.csv_info.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Rows: {}", report.csv_info.row_count);

    if report.is_valid() {
        eprintln!("✅ All {} rows valid", report.valid_count);
    } else {
        eprintln!("   ✅ Valid: {}", report.valid_count);
        eprintln!("   ❌ Invalid: {}", report.invalid_count);
        for message in &report.messages {
            eprintln!("     - {}", message.message);
        }
    }

    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&report.messages)?)?;
        eprintln!("   💾 Messages saved to: {}", path.display());
    }

    let json = serde_json::to_string_pretty(&report.records)?;
    write_output(&json, output)?;

    Ok(report.is_valid())
}

fn cmd_write(
    settings: &Settings,
    input: &Path,
    mapping: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> CmdResult {
    eprintln!("📄 Writing records from: {}", input.display());

    let records: Vec<Value> = serde_json::from_str(&fs::read_to_string(input)?)?;
    let pipeline = Pipeline::new(load_mapping(mapping)?, settings);

    match output {
        Some(path) => {
            let file = fs::File::create(path)?;
            pipeline.write(&records, file, delimiter)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => {
            pipeline.write(&records, io::stdout().lock(), delimiter)?;
        }
    }
    Ok(true)
}

fn cmd_chains(settings: &Settings, mapping: &Path) -> CmdResult {
    let pipeline = Pipeline::new(load_mapping(mapping)?, settings);
    let mapper = pipeline.mapper()?;

    for (field, read, write) in mapper.chains() {
        println!("[{}] {} ({})", field.position, field.label(), field.value_type.name());
        println!("   read:  {}", read.stage_names().join(" → "));
        println!("   write: {}", write.stage_names().join(" → "));
    }
    Ok(true)
}

fn cmd_example_mapping() -> CmdResult {
    println!("{}", example_mapping().to_json()?);
    Ok(true)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
