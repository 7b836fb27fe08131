//! Gridbook CLI - spreadsheet conversion tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridbook::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gridbook")]
#[command(author, version, about = "Convert spreadsheets into a uniform grid workbook")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a worksheet to CSV on stdout or into a file
    #[command(alias = "csv")]
    ToCsv {
        /// Input spreadsheet (xls, xlsx, ods, csv, sylk, dif, ...)
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sheet index to convert (0-based)
        #[arg(short, long, default_value = "0")]
        sheet: usize,

        /// Field delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// Show summary information about a spreadsheet
    Info {
        /// Input spreadsheet file
        input: PathBuf,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Input spreadsheet file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ToCsv {
            input,
            output,
            sheet,
            delimiter,
        } => to_csv(&input, output.as_deref(), sheet, delimiter),
        Commands::Info { input } => show_info(&input),
        Commands::Sheets { input } => list_sheets(&input),
    }
}

fn load(input: &Path) -> Result<Workbook> {
    gridbook::parse_file(input, &ParseOptions::default())
        .with_context(|| format!("Failed to open '{}'", input.display()))
}

fn to_csv(input: &Path, output: Option<&Path>, sheet_idx: usize, delimiter: char) -> Result<()> {
    let workbook = load(input)?;

    let sheet = workbook
        .worksheets
        .get(sheet_idx)
        .with_context(|| format!("Sheet index {sheet_idx} not found"))?;

    let mut csv_output = String::new();
    for row in &sheet.data {
        let line: Vec<String> = row
            .iter()
            .map(|value| quote_field(&value.display_text(), delimiter))
            .collect();
        csv_output.push_str(&line.join(&delimiter.to_string()));
        csv_output.push('\n');
    }

    match output {
        Some(path) => {
            std::fs::write(path, csv_output)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }
        None => {
            std::io::stdout().write_all(csv_output.as_bytes())?;
        }
    }
    Ok(())
}

fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn show_info(input: &Path) -> Result<()> {
    let workbook = load(input)?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.worksheets.len());
    println!("Styles: {}", workbook.style.len());
    if !workbook.defined_names.is_empty() {
        println!("Defined names: {}", workbook.defined_names.len());
    }
    if !workbook.validations.is_empty() {
        println!("Validations: {}", workbook.validations.len());
    }
    for warning in &workbook.warnings {
        println!("Warning: {warning}");
    }
    for sheet in &workbook.worksheets {
        let (cols, rows) = sheet.min_dimensions;
        println!(
            "  {}: {} rows x {} cols, {} merges, {} comments",
            sheet.name,
            rows,
            cols,
            sheet.merge_cells.len(),
            sheet.comments.len()
        );
    }
    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let workbook = load(input)?;
    for (idx, sheet) in workbook.worksheets.iter().enumerate() {
        let state = match sheet.state {
            Some(SheetState::Hidden) => " (hidden)",
            Some(SheetState::VeryHidden) => " (very hidden)",
            _ => "",
        };
        println!("{idx}: {}{state}", sheet.name);
    }
    Ok(())
}
