//! CLI Tool Example
//!
//! This example demonstrates how to build a command-line tool
//! using trae-feed for converting client spreadsheets (or JSON row exports)
//! to a JSONL screening feed.
//!
//! Logging is controlled through `RUST_LOG`, e.g. `RUST_LOG=trae_feed=debug`.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;
use trae_feed::{jsonl_file_name, ConverterBuilder, RawRow, SheetSelector, TraeFeedError};

struct Options {
    input_path: String,
    output_path: Option<String>,
    sheet_selector: SheetSelector,
    json_rows: bool,
    parallel: bool,
    prefix: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.xlsx|input.json> [output.jsonl|-] [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --sheet-index <n>    Select sheet by index (0-based)");
        eprintln!("  --sheet-name <name>  Select sheet by name");
        eprintln!("  --json               Read a JSON array of row objects instead of a workbook");
        eprintln!("  --prefix <prefix>    profileId prefix (default: TRAE-)");
        eprintln!("  --parallel           Convert rows on the rayon thread pool");
        eprintln!("\nWithout an output path the feed is written to ISO_Converted_<millis>.jsonl.");
        eprintln!("\nExamples:");
        eprintln!("  {} clients.xlsx", args[0]);
        eprintln!("  {} clients.xlsx feed.jsonl --sheet-name \"Clients\"", args[0]);
        eprintln!("  {} rows.json - --json", args[0]);
        process::exit(1);
    }

    let options = parse_options(&args);

    match run(&options) {
        Ok(Some(path)) => println!("Conversion completed: {} -> {}", options.input_path, path),
        Ok(None) => {}
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn parse_options(args: &[String]) -> Options {
    let mut options = Options {
        input_path: args[1].clone(),
        output_path: None,
        sheet_selector: SheetSelector::First,
        json_rows: args[1].ends_with(".json"),
        parallel: false,
        prefix: None,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--sheet-index" => {
                let value = option_value(args, i);
                let index = value.parse::<usize>().unwrap_or_else(|_| {
                    eprintln!("Error: Invalid sheet index: {}", value);
                    process::exit(1);
                });
                options.sheet_selector = SheetSelector::Index(index);
                i += 2;
            }
            "--sheet-name" => {
                options.sheet_selector = SheetSelector::Name(option_value(args, i).to_string());
                i += 2;
            }
            "--prefix" => {
                options.prefix = Some(option_value(args, i).to_string());
                i += 2;
            }
            "--json" => {
                options.json_rows = true;
                i += 1;
            }
            "--parallel" => {
                options.parallel = true;
                i += 1;
            }
            other if !other.starts_with("--") && options.output_path.is_none() => {
                options.output_path = Some(other.to_string());
                i += 1;
            }
            other => {
                eprintln!("Error: Unknown option: {}", other);
                process::exit(1);
            }
        }
    }

    options
}

fn option_value(args: &[String], i: usize) -> &str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: {} requires a value", args[i]);
            process::exit(1);
        }
    }
}

/// 変換を実行し、書き込んだファイルのパスを返す（標準出力の場合は`None`）
fn run(options: &Options) -> Result<Option<String>, TraeFeedError> {
    let mut builder = ConverterBuilder::new()
        .with_sheet_selector(options.sheet_selector.clone())
        .parallel(options.parallel);
    if let Some(prefix) = &options.prefix {
        builder = builder.with_profile_id_prefix(prefix.clone());
    }
    let converter = builder.build()?;

    let jsonl = if options.json_rows {
        let mut text = String::new();
        File::open(&options.input_path)?.read_to_string(&mut text)?;
        let rows = RawRow::parse_json_rows(&text)?;
        converter.convert_rows_to_jsonl(&rows)?
    } else {
        converter.convert_to_string(File::open(&options.input_path)?)?
    };

    match options.output_path.as_deref() {
        Some("-") => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", jsonl)?;
            handle.flush()?;
            Ok(None)
        }
        Some(path) => {
            File::create(path)?.write_all(jsonl.as_bytes())?;
            Ok(Some(path.to_string()))
        }
        None => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as i64)
                .unwrap_or_default();
            let path = jsonl_file_name(millis);
            File::create(&path)?.write_all(jsonl.as_bytes())?;
            Ok(Some(path))
        }
    }
}

fn handle_error(error: TraeFeedError) {
    match error {
        TraeFeedError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        TraeFeedError::Parse(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The file may not be a valid workbook or may be corrupted.");
        }
        TraeFeedError::Json(json_err) => {
            eprintln!("JSON Error: {}", json_err);
            eprintln!("The input must be a JSON array of row objects.");
        }
        TraeFeedError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
            eprintln!("Please check your sheet selection and options.");
        }
        TraeFeedError::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
            eprintln!("The file violates security constraints (e.g., file size limit).");
        }
    }
}
