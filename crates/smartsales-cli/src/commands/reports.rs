//! reports command - describe the built-in reports

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use smartsales_export::ReportDefinition;

#[derive(Serialize)]
struct ColumnInfo {
    key: String,
    header: String,
    sortable: bool,
    default: bool,
}

#[derive(Serialize)]
struct ReportInfo {
    name: &'static str,
    title: String,
    endpoint: &'static str,
    ordering: Option<String>,
    filters: &'static [&'static str],
    columns: Vec<ColumnInfo>,
}

fn describe(report: &ReportDefinition) -> ReportInfo {
    let defaults = report.default_selection();
    ReportInfo {
        name: report.name,
        title: report.meta.title.clone(),
        endpoint: report.endpoint,
        ordering: report.ordering.to_token(),
        filters: report.filter_keys,
        columns: report
            .registry
            .columns()
            .iter()
            .map(|column| ColumnInfo {
                key: column.key().to_string(),
                header: column.header().to_string(),
                sortable: column.is_sortable(),
                default: defaults.contains(column.key()),
            })
            .collect(),
    }
}

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let reports: Vec<ReportInfo> = ReportDefinition::all().iter().map(describe).collect();

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("{} - {}", report.name.bold(), report.title);
        println!("  endpoint: {}", report.endpoint.cyan());
        if let Some(ordering) = &report.ordering {
            println!("  ordering: {}", ordering);
        }
        println!("  filters:  {}", report.filters.join(", "));
        println!("  columns:");
        for column in &report.columns {
            let marker = if column.default { "*" } else { " " };
            let sortable = if column.sortable {
                " (sortable)".dimmed().to_string()
            } else {
                String::new()
            };
            println!("   {} {:<20} {}{}", marker, column.key, column.header, sortable);
        }
        println!();
    }
    ctx.info(&"* selected by default".dimmed().to_string());
    Ok(())
}
