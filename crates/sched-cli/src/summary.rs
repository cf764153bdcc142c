//! Console tables for command results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use sched_core::{ConversionResult, StructureReport};
use sched_model::{CacheRecord, CacheStatistics, CanonicalField};
use sched_output::ValidationReport;

pub fn print_conversion(result: &ConversionResult) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Property"), header_cell("Value")]);
    apply_table_style(&mut table);
    table.add_row(vec![Cell::new("Success"), flag_cell(result.success)]);
    table.add_row(vec![
        Cell::new("Target"),
        Cell::new(result.target_format.as_str()),
    ]);
    if let Some(error) = &result.error {
        table.add_row(vec![Cell::new("Error"), Cell::new(error).fg(Color::Red)]);
    }
    if let Some(decided_by) = result.decided_by {
        table.add_row(vec![
            Cell::new("Decided by"),
            Cell::new(decided_by)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
        ]);
    }
    table.add_row(vec![
        Cell::new("Confidence"),
        Cell::new(format!("{:.1}", result.confidence)),
    ]);
    table.add_row(vec![Cell::new("Rows"), Cell::new(result.row_count)]);
    table.add_row(vec![Cell::new("Cache hit"), flag_cell(result.cache_hit)]);
    table.add_row(vec![
        Cell::new("Arbitration"),
        flag_cell(result.arbitration_used),
    ]);
    if let Some(mode) = result.analyzer_mode {
        table.add_row(vec![Cell::new("Analyzer"), Cell::new(format!("{mode:?}"))]);
    }
    if let Some(reasoning) = &result.judge_reasoning {
        table.add_row(vec![Cell::new("Judge reasoning"), Cell::new(reasoning)]);
    }
    println!("{table}");

    if let Some(proposal) = &result.mappings_used {
        print_mappings(
            proposal
                .mappings
                .iter()
                .map(|(column, field)| (column.as_str(), *field)),
        );
    }
}

pub fn print_structure(report: &StructureReport) {
    println!("File type: {}", report.file_type);
    println!("Rows: {}", report.row_count);
    let mut table = Table::new();
    table.set_header(vec![header_cell("Column"), header_cell("Suggested field")]);
    apply_table_style(&mut table);
    for column in &report.columns {
        let field = report
            .suggested_mappings
            .get(column)
            .map_or_else(|| dim_cell("-"), |field| field_cell(*field));
        table.add_row(vec![Cell::new(column), field]);
    }
    println!("{table}");
    if !report.detected_patterns.is_empty() {
        println!();
        println!("Detected patterns:");
        for pattern in &report.detected_patterns {
            println!("- {pattern}");
        }
    }
}

pub fn print_validation(report: &ValidationReport) {
    if report.valid {
        println!("Valid");
    } else {
        println!("Invalid");
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Severity"), header_cell("Message")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in &report.issues {
        table.add_row(vec![Cell::new("ERROR").fg(Color::Red), Cell::new(issue)]);
    }
    for warning in &report.warnings {
        table.add_row(vec![Cell::new("WARN").fg(Color::Yellow), Cell::new(warning)]);
    }
    if !report.issues.is_empty() || !report.warnings.is_empty() {
        println!("{table}");
    }
}

pub fn print_records(organization: &str, records: &[CacheRecord]) {
    println!("Organization: {organization}");
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Fingerprint"),
        header_cell("Mappings"),
        header_cell("Confidence"),
        header_cell("Uses"),
        header_cell("Last used"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.fingerprint),
            Cell::new(record.proposal.mappings.len()),
            Cell::new(format!("{:.1}", record.confidence())),
            Cell::new(record.success_count),
            Cell::new(record.last_used.format("%Y-%m-%d %H:%M:%S UTC")),
        ]);
    }
    println!("{table}");
}

pub fn print_statistics(statistics: &CacheStatistics) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Statistic"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Total mappings"),
        Cell::new(statistics.total_mappings),
    ]);
    table.add_row(vec![
        Cell::new("Average confidence"),
        Cell::new(format!("{:.2}", statistics.average_confidence)),
    ]);
    table.add_row(vec![
        Cell::new("Max success count"),
        Cell::new(statistics.max_success_count),
    ]);
    println!("{table}");
}

fn print_mappings<'a>(mappings: impl Iterator<Item = (&'a str, CanonicalField)>) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Source column"), header_cell("Field")]);
    apply_table_style(&mut table);
    let mut empty = true;
    for (column, field) in mappings {
        empty = false;
        table.add_row(vec![Cell::new(column), field_cell(field)]);
    }
    if !empty {
        println!();
        println!("Mappings:");
        println!("{table}");
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn field_cell(field: CanonicalField) -> Cell {
    Cell::new(field.as_str()).fg(Color::Blue)
}

fn flag_cell(flag: bool) -> Cell {
    if flag {
        Cell::new("yes")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("no")
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}
