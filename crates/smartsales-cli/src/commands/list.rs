//! list command - fetch pages of a backend list

use super::CommandContext;
use crate::progress::create_spinner;
use crate::utils::{parse_key_values, render_table};
use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use smartsales_client::{
    FetchOutcome, ListQuery, ListState, OrderingState, PagedListController, PaginationState,
};
use smartsales_core::types::validate_filter_key;
use smartsales_core::utils::NOT_AVAILABLE;

/// Widest cell printed in text mode
const MAX_CELL_WIDTH: usize = 40;

pub struct ListArgs {
    pub endpoint: String,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: u32,
    pub page_size: Option<u32>,
    pub filters: Vec<String>,
    pub fixed: Vec<String>,
    pub all: bool,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    pagination: &'a PaginationState,
    ordering: Option<String>,
    results: &'a [Value],
}

pub async fn execute(ctx: &CommandContext, args: ListArgs) -> Result<()> {
    let page_size = args.page_size.unwrap_or(ctx.config.list.page_size);
    let query = build_query(&args, page_size)?;
    ctx.debug(&format!("GET {}?{}", query.endpoint, query.query_string()));

    let controller: PagedListController<_> = PagedListController::new(ctx.transport()?, query);

    let spinner = create_spinner("Cargando...", ctx.quiet || ctx.is_json());
    let outcome = controller.refresh().await;
    spinner.finish_and_clear();
    check(outcome)?;

    let mut state = controller.state();
    print_page(ctx, &state)?;

    if args.all {
        while state.pagination.has_next() {
            let spinner = create_spinner("Cargando...", ctx.quiet || ctx.is_json());
            let outcome = controller.next_page().await;
            spinner.finish_and_clear();
            match outcome {
                Some(outcome) => check(outcome)?,
                None => break,
            }
            state = controller.state();
            print_page(ctx, &state)?;
        }
    }

    controller.close();
    Ok(())
}

/// Query for the requested page, with fixed and user filters validated
fn build_query(args: &ListArgs, page_size: u32) -> Result<ListQuery> {
    let fixed = parse_key_values(&args.fixed)?;
    let filters = parse_key_values(&args.filters)?;

    let mut query = ListQuery::new(args.endpoint.as_str(), page_size)?.with_fixed_filters(fixed)?;
    for (key, value) in filters {
        validate_filter_key(&key)?;
        if query.is_fixed(&key) {
            bail!("'{}' is already set with --fixed", key);
        }
        if !value.is_empty() {
            query.filters.insert(key, value);
        }
    }

    if let Some(search) = &args.search {
        query.search = search.trim().to_string();
    }
    if let Some(token) = &args.ordering {
        query.ordering = OrderingState::from_token(token);
    }
    query.page = args.page.max(1);
    Ok(query)
}

fn check(outcome: FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Loaded => Ok(()),
        FetchOutcome::Failed(err) => Err(anyhow!(err.user_message())),
        FetchOutcome::Stale | FetchOutcome::Closed => Err(anyhow!("Request was superseded")),
    }
}

fn print_page(ctx: &CommandContext, state: &ListState<Value>) -> Result<()> {
    if ctx.is_json() {
        let output = ListOutput {
            pagination: &state.pagination,
            ordering: state.ordering.to_token(),
            results: &state.data,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let pagination = &state.pagination;
    if state.data.is_empty() {
        ctx.info("No se encontraron resultados.");
    } else {
        let headers = column_names(&state.data);
        let rows: Vec<Vec<String>> = state
            .data
            .iter()
            .map(|row| headers.iter().map(|h| cell_text(row.get(h))).collect())
            .collect();
        println!("{}", render_table(&headers, &rows, MAX_CELL_WIDTH));
    }

    let summary = format!(
        "Página {} de {} ({} registros)",
        pagination.page, pagination.total_pages, pagination.count
    );
    ctx.info(&summary.dimmed().to_string());
    Ok(())
}

/// Top-level keys in first-seen order across the page
fn column_names(rows: &[Value]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }
    }
    names
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}
