//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// Graphviz DOT
    Dot,
}

/// Render items as a rounded table
pub fn table<T: Tabled>(items: &[T]) -> String {
    Table::new(items).with(Style::rounded()).to_string()
}

/// Write `content` to `path`, or stdout when no path is given
pub fn emit(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Wrote {}", path.display()));
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Pretty JSON for any serializable value
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a workload phase or health reason
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "running" | "healthy" | "succeeded" => status.green().to_string(),
        "pending" | "containercreating" | "notready" => status.yellow().to_string(),
        "unknown" => status.dimmed().to_string(),
        _ => status.red().to_string(),
    }
}

/// Mark a sensitive service name
pub fn color_sensitive(name: &str, sensitive: bool) -> String {
    if sensitive {
        format!("{} {}", name.bold(), "[auth]".truecolor(255, 140, 0))
    } else {
        name.to_string()
    }
}

/// Shorten `text` to at most `max` characters
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("back-off 5m0s restarting", 10), "back-of...");
    }

    #[test]
    fn test_format_names_deserialize() {
        let f: OutputFormat = serde_json::from_str("\"dot\"").unwrap();
        assert!(matches!(f, OutputFormat::Dot));
    }
}
