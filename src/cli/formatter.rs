//! Terminal output helpers shared by the commands
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

fn rule_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(80)
        .min(60)
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!(
        "\n{} {}",
        "⚠".yellow(),
        format!("Warning: {}", message).yellow()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green().bold(), message);
}

/// Print a tip
pub fn print_tip(message: &str) {
    println!("\n{} {}", "→".cyan(), format!("Tip: {}", message).dimmed());
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{} {}", "▶".cyan(), title.bold());
    println!("{}", "─".repeat(rule_width()).dimmed());
}

/// Two-column table of labelled values
pub fn stats_table(title: &str, stats: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new(title)
            .add_attribute(Attribute::Bold)
            .fg(TableColor::Cyan),
        Cell::new("").add_attribute(Attribute::Bold),
    ]);

    for (label, value) in stats {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).fg(TableColor::Green),
        ]);
    }
    table
}

pub fn print_stats_table(title: &str, stats: Vec<(&str, String)>) {
    println!("\n{}", stats_table(title, stats));
}

/// Square identity table with sequence labels on both axes
pub fn identity_table(labels: &[String], rows: &[Vec<f64>]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("")];
    header.extend(
        labels
            .iter()
            .map(|l| Cell::new(l).add_attribute(Attribute::Bold).fg(TableColor::Cyan)),
    );
    table.set_header(header);

    for (label, row) in labels.iter().zip(rows) {
        let mut cells = vec![Cell::new(label).add_attribute(Attribute::Bold)];
        cells.extend(row.iter().map(|v| Cell::new(format!("{:.3}", v))));
        table.add_row(cells);
    }
    table
}

/// Format a count with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Check if colors should be disabled
pub fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
        && std::env::var("CLICOLOR").unwrap_or_else(|_| "1".to_string()) != "0"
}

/// Initialize the formatter (sets up colored output)
pub fn init() {
    if !colors_enabled() {
        colored::control::set_override(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        let test_cases = vec![(0, "0"), (999, "999"), (1000, "1,000"), (1234567, "1,234,567")];
        for (input, expected) in test_cases {
            assert_eq!(format_number(input), expected);
        }
    }

    #[test]
    fn test_identity_table_contains_values() {
        let labels = vec!["S1".to_string(), "S2".to_string()];
        let rows = vec![vec![1.0, 0.75], vec![0.75, 1.0]];
        let rendered = identity_table(&labels, &rows).to_string();
        assert!(rendered.contains("0.750"));
        assert!(rendered.contains("S2"));
    }
}
