//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use stepproof_core::{DeviationReport, ReportEntry};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Print the report to stdout (errors go to stderr).
pub fn print_report(report: &DeviationReport, format: OutputFormat) {
    match report {
        DeviationReport::Completed(entries) => print_entries(entries, format),
        DeviationReport::Failed(errors) => {
            for entry in errors.iter() {
                eprintln!("Error: {}", entry.error);
            }
        }
    }
}

fn print_entries(entries: &[ReportEntry], format: OutputFormat) {
    if entries.is_empty() {
        println!("No steps found in the planning log.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(vec!["Step", "Result", "Notes"]);
            for entry in entries {
                table.add_row(vec![
                    entry.step.clone(),
                    entry.result.to_string(),
                    entry.notes.clone(),
                ]);
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(entries).unwrap_or_default()
            );
        }
        OutputFormat::Plain => {
            for entry in entries {
                println!("{}: {} - {}", entry.step, entry.result, entry.notes);
            }
        }
    }
}
