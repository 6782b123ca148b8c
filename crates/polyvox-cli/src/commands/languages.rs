use comfy_table::{Cell, Color, Table};
use polyvox_core::{supported_languages, DEFAULT_LANGUAGE};
use serde::Serialize;

use crate::error::Result;
use crate::OutputFormat;

#[derive(Debug, Serialize)]
struct LanguageRow {
    code: &'static str,
    name: &'static str,
    default: bool,
}

pub fn execute(format: OutputFormat) -> Result<()> {
    let rows: Vec<LanguageRow> = supported_languages()
        .iter()
        .map(|lang| LanguageRow {
            code: lang.code,
            name: lang.name,
            default: lang.code == DEFAULT_LANGUAGE,
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.code);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["Code", "Language"]);
            for row in &rows {
                let name = if row.default {
                    format!("{} (default)", row.name)
                } else {
                    row.name.to_string()
                };
                table.add_row(vec![Cell::new(row.code).fg(Color::Cyan), Cell::new(name)]);
            }
            println!("{table}");
            println!("{} languages supported", rows.len());
        }
    }

    Ok(())
}
