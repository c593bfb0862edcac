// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use crate::cli::commands::OutputFormat;

/// A titled table of string cells produced by one inspection command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Listing {
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Result formatter for different output formats
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn format(listing: &Listing, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(listing),
            OutputFormat::Json => Self::format_json(listing),
            OutputFormat::Csv => Self::format_csv(listing),
        }
    }

    fn format_table(listing: &Listing) -> String {
        if listing.rows.is_empty() {
            return format!("{}\n{}\n", listing.title.bold(), "No results found".yellow());
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", listing.title.bold().green()));
        output.push_str(&format!("Rows: {}\n\n", listing.rows.len()));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        let header: Vec<Cell> = listing
            .columns
            .iter()
            .map(|col| Cell::new(col).fg(Color::Green))
            .collect();
        table.set_header(header);
        for row in &listing.rows {
            table.add_row(row.clone());
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_json(listing: &Listing) -> String {
        let rows: Vec<serde_json::Value> = listing
            .rows
            .iter()
            .map(|row| {
                let mut map = serde_json::Map::new();
                for (col, value) in listing.columns.iter().zip(row) {
                    map.insert(col.clone(), serde_json::Value::String(value.clone()));
                }
                serde_json::Value::Object(map)
            })
            .collect();
        let json = serde_json::json!({
            "title": listing.title,
            "columns": listing.columns,
            "rows": rows,
            "count": listing.rows.len(),
        });

        serde_json::to_string_pretty(&json).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize results to JSON\"}".to_string()
        })
    }

    fn format_csv(listing: &Listing) -> String {
        let mut output = String::new();
        output.push_str(&listing.columns.join(","));
        output.push('\n');
        for row in &listing.rows {
            let cells: Vec<String> = row.iter().map(|c| Self::csv_escape(c)).collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }
        output
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
