//! CLI Tool Example
//!
//! This example demonstrates how to build a command-line tool
//! using xlsxlate for pseudo-localizing Excel workbooks.
//!
//! Set `RUST_LOG=xlsxlate=debug` to see the pipeline stages.

use std::fs::File;
use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;
use xlsxlate::{
    write_log_json, LogStatus, PartKind, ProcessingFailure, TranslateError, Translation,
    WorkbookTranslatorBuilder, XlsxlateError,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <input.xlsx> <lang> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --out-dir <dir>      Directory for the translated workbook (default: .)");
        eprintln!("  --skip-titles        Keep sheet titles unchanged");
        eprintln!("  --skip-drawings      Keep drawing and chart text unchanged");
        eprintln!("  --fail-on <text>     Simulate an engine failure for matching text");
        eprintln!("\nExamples:");
        eprintln!("  {} report.xlsx fr", args[0]);
        eprintln!("  {} report.xlsx ja --out-dir out --skip-titles", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let language = &args[2];

    // Parse options
    let mut out_dir = ".".to_string();
    let mut skipped = Vec::new();
    let mut fail_on: Option<String> = None;
    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--out-dir" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --out-dir requires a value");
                    process::exit(1);
                }
                out_dir = args[i + 1].clone();
                i += 2;
            }
            "--fail-on" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --fail-on requires a value");
                    process::exit(1);
                }
                fail_on = Some(args[i + 1].clone());
                i += 2;
            }
            "--skip-titles" => {
                skipped.push(PartKind::SheetTitles);
                i += 1;
            }
            "--skip-drawings" => {
                skipped.push(PartKind::Drawings);
                i += 1;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    match translate_workbook(input_path, language, &out_dir, &skipped, fail_on.as_deref()) {
        Ok(output_path) => println!("Translation completed: {} -> {}", input_path, output_path),
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn translate_workbook(
    input_path: &str,
    language: &str,
    out_dir: &str,
    skipped: &[PartKind],
    fail_on: Option<&str>,
) -> Result<String, ProcessingFailure> {
    let mut builder = WorkbookTranslatorBuilder::new().with_target_language(language);
    for part in skipped {
        builder = builder.skip_part(*part);
    }
    let translator = builder.build().map_err(|error| ProcessingFailure {
        error,
        log: Vec::new(),
    })?;

    // Pseudo-localization engine: wraps text so untranslated strings stand out
    let engine = |text: &str, object_id: &str| -> Result<Translation, TranslateError> {
        if fail_on == Some(text) {
            return Err(TranslateError::new(format!("refused to translate {}", object_id)));
        }
        Ok(Translation::new(format!("[{}] {}", language, text), "pseudo"))
    };

    let result = match translator.translate_file(input_path, &engine) {
        Ok(result) => result,
        Err(failure) => {
            write_log(out_dir, &translator.output_file_name(input_path), &failure.log);
            return Err(failure);
        }
    };

    let output_path = Path::new(out_dir).join(&result.output_file_name);
    std::fs::write(&output_path, &result.output_bytes).map_err(|e| ProcessingFailure {
        error: XlsxlateError::Io(e),
        log: result.log_entries.clone(),
    })?;
    write_log(out_dir, &result.output_file_name, &result.log_entries);

    let failed = result
        .log_entries
        .iter()
        .filter(|entry| entry.status == LogStatus::Error)
        .count();
    println!(
        "{} text units translated, {} failed",
        result.log_entries.len() - failed,
        failed
    );
    for sheet in &result.sheets {
        println!("  sheet '{}' -> '{}'", sheet.original_title, sheet.safe_title);
    }

    Ok(output_path.display().to_string())
}

fn write_log(out_dir: &str, output_file_name: &str, entries: &[xlsxlate::TranslationLogEntry]) {
    let log_path = Path::new(out_dir).join(format!("{}.log.json", output_file_name));
    let written = File::create(&log_path)
        .map_err(XlsxlateError::from)
        .and_then(|file| write_log_json(entries, file));
    match written {
        Ok(()) => println!("Log written: {}", log_path.display()),
        Err(e) => eprintln!("Warning: failed to write log {}: {}", log_path.display(), e),
    }
}

fn handle_error(failure: ProcessingFailure) {
    match &failure.error {
        XlsxlateError::Io(io_err) => eprintln!("I/O Error: {}", io_err),
        XlsxlateError::MalformedPackage(msg) => eprintln!("Not a valid XLSX package: {}", msg),
        XlsxlateError::MalformedPart { part, message } => {
            eprintln!("Malformed XML in {}: {}", part, message)
        }
        XlsxlateError::StructuralInvariantViolation { part, .. } => {
            eprintln!("Refusing to write {}: node structure changed", part)
        }
        XlsxlateError::SecurityViolation(msg) => eprintln!("Security Error: {}", msg),
        XlsxlateError::Config(msg) => eprintln!("Configuration Error: {}", msg),
        e => eprintln!("Error: {}", e),
    }
    if !failure.log.is_empty() {
        eprintln!("{} entries were logged before the failure", failure.log.len());
    }
}
