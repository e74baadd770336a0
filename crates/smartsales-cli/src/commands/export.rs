//! export command - write a built-in report to xlsx, pdf or print-ready html

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::CommandContext;
use crate::progress::{create_spinner, format_elapsed};
use crate::utils::parse_key_values;
use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use serde::Serialize;
use smartsales_export::{
    ExportCap, ExportError, ExportRunner, ExportSelection, FilePopup, ReportDefinition, SinkKind,
    SinkSet,
};

pub struct ExportArgs {
    pub report: String,
    pub format: String,
    pub limit: Option<u32>,
    pub columns: Vec<String>,
    pub search: Option<String>,
    pub filters: Vec<String>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct ExportOutput {
    report: String,
    format: String,
    rows: usize,
    path: Option<String>,
}

pub async fn execute(ctx: &CommandContext, args: ExportArgs) -> Result<()> {
    let report = ReportDefinition::by_name(&args.report).ok_or_else(|| {
        let names: Vec<&str> = ReportDefinition::all().iter().map(|r| r.name).collect();
        anyhow!(
            "Unknown report '{}'; available: {}",
            args.report,
            names.join(", ")
        )
    })?;

    let sink_kind: SinkKind = args.format.parse().map_err(|e: String| anyhow!(e))?;
    let cap = ExportCap::try_from(args.limit.unwrap_or(ctx.config.export.default_cap))?;
    let selection = resolve_selection(&report, &args.columns)?;

    let mut query = report.base_query(ctx.config.list.page_size)?;
    for (key, value) in parse_key_values(&args.filters)? {
        if !report.filter_keys.contains(&key.as_str()) {
            bail!(
                "Report '{}' has no filter '{}'; available: {}",
                report.name,
                key,
                report.filter_keys.join(", ")
            );
        }
        if !value.is_empty() {
            query.filters.insert(key, value);
        }
    }
    if let Some(search) = &args.search {
        query.search = search.trim().to_string();
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| ctx.config.export.output_dir.clone());
    ctx.debug(&format!(
        "Exporting {} as {} (cap {}) into {}",
        report.name,
        sink_kind,
        cap.value(),
        output_dir.display()
    ));

    let sinks = SinkSet::new(&output_dir, Arc::new(FilePopup::new(&output_dir)));
    let transport = ctx.transport()?;
    let runner = ExportRunner::new();

    let started = Instant::now();
    let spinner = create_spinner(
        &format!("Exportando {} (hasta {} filas)...", report.meta.title, cap.value()),
        ctx.quiet || ctx.is_json(),
    );
    let result = runner
        .run(
            &*transport,
            report.request(&query, &selection, cap),
            sinks.get(sink_kind),
        )
        .await;
    spinner.finish_and_clear();

    let artifact = result.map_err(|e: ExportError| anyhow!(e.user_message()))?;

    if ctx.is_json() {
        let output = ExportOutput {
            report: report.name.to_string(),
            format: sink_kind.to_string(),
            rows: artifact.rows,
            path: artifact.path.as_ref().map(|p| p.display().to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let location = artifact
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(print dialog)".to_string());
    ctx.info(&format!(
        "{} {} rows exported to {} in {}",
        "✓".green(),
        artifact.rows,
        location.cyan(),
        format_elapsed(started.elapsed().as_millis())
    ));
    Ok(())
}

/// Requested columns, or the report's defaults when none were given
fn resolve_selection(report: &ReportDefinition, columns: &[String]) -> Result<ExportSelection> {
    let requested: Vec<&str> = columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if requested.is_empty() {
        return Ok(report.default_selection());
    }

    let selection = ExportSelection::from_keys(requested);
    let unknown = selection.unknown_keys(&report.registry);
    if !unknown.is_empty() {
        let known: Vec<&str> = report.registry.keys().collect();
        bail!(
            "Unknown column(s) {} for report '{}'; available: {}",
            unknown.join(", "),
            report.name,
            known.join(", ")
        );
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_selection_defaults() {
        let report = ReportDefinition::products();
        let selection = resolve_selection(&report, &[]).unwrap();
        assert_eq!(selection, report.default_selection());
    }

    #[test]
    fn test_resolve_selection_explicit() {
        let report = ReportDefinition::users();
        let selection =
            resolve_selection(&report, &["email".to_string(), " rol ".to_string()]).unwrap();
        assert!(selection.contains("email"));
        assert!(selection.contains("rol"));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_resolve_selection_rejects_unknown() {
        let report = ReportDefinition::users();
        let err = resolve_selection(&report, &["salario".to_string()]).unwrap_err();
        assert!(err.to_string().contains("salario"));
    }
}
