//! predictions command - summarise predicted sales for a date range

use super::CommandContext;
use crate::progress::create_spinner;
use crate::utils::{parse_date, render_table};
use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use smartsales_client::{
    DateRange, HttpPredictionProvider, PredictionProvider, PredictionSet,
    StaticPredictionProvider,
};
use smartsales_core::types::{PredictionKpis, TopProduct};

/// Days covered by a remote query when only one bound is given
const DEFAULT_REMOTE_DAYS: i64 = 6;

#[derive(Serialize)]
struct PredictionSummary {
    range: DateRange,
    predicted_days: u32,
    kpis: Option<PredictionKpis>,
    top_products: Vec<TopProduct>,
    daily_peaks: Vec<DailyPeak>,
}

#[derive(Serialize)]
struct DailyPeak {
    date: NaiveDate,
    probability: f64,
}

pub async fn execute(
    ctx: &CommandContext,
    from: Option<String>,
    to: Option<String>,
    top: usize,
    remote: bool,
) -> Result<()> {
    let from = from.as_deref().map(parse_date).transpose()?;
    let to = to.as_deref().map(parse_date).transpose()?;

    let spinner = create_spinner("Cargando predicciones...", ctx.quiet || ctx.is_json());
    let result = if remote {
        let range = remote_range(from, to, Local::now().date_naive())?;
        let provider = HttpPredictionProvider::new(ctx.transport()?);
        provider.fetch_predictions(range).await
    } else {
        let provider = StaticPredictionProvider::bundled()?;
        let full = provider.full_range();
        let range = DateRange::new(from.unwrap_or(full.start), to.unwrap_or(full.end))?;
        provider.fetch_predictions(range).await
    };
    spinner.finish_and_clear();

    let set = result.map_err(|e| anyhow!(e.user_message()))?;
    let summary = summarise(&set, top);

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    print_summary(ctx, &summary);
    Ok(())
}

/// Range for a backend query; a missing bound sits a week from the other
fn remote_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange> {
    let week = Duration::days(DEFAULT_REMOTE_DAYS);
    let (start, end) = match (from, to) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, start + week),
        (None, Some(end)) => (end - week, end),
        (None, None) => (today, today + week),
    };
    Ok(DateRange::new(start, end)?)
}

fn summarise(set: &PredictionSet, top: usize) -> PredictionSummary {
    PredictionSummary {
        range: DateRange {
            start: set.start_date,
            end: set.end_date,
        },
        predicted_days: set.predicted_days,
        kpis: set.kpis(),
        top_products: set.top_products(top),
        daily_peaks: set
            .daily_peaks()
            .into_iter()
            .map(|(date, probability)| DailyPeak { date, probability })
            .collect(),
    }
}

fn percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

fn print_summary(ctx: &CommandContext, summary: &PredictionSummary) {
    println!(
        "{} {} - {} ({} días)",
        "Predicciones".bold(),
        summary.range.start,
        summary.range.end,
        summary.predicted_days
    );

    let Some(kpis) = &summary.kpis else {
        ctx.info("No hay predicciones para el período seleccionado.");
        return;
    };

    println!();
    println!("  Probabilidad máxima: {}", kpis.max_probability_label().green());
    println!("  Producto estrella:   #{}", kpis.star_product_id);
    println!("  Día pico:            {} ({})", kpis.peak_date, kpis.peak_weekday);

    println!();
    println!("{}", "Top productos".bold());
    let rows: Vec<Vec<String>> = summary
        .top_products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            vec![
                (i + 1).to_string(),
                format!("#{}", p.product_id),
                percent(p.peak_probability),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(
            &["#".to_string(), "Producto".to_string(), "Probabilidad".to_string()],
            &rows,
            20
        )
    );

    println!();
    println!("{}", "Tendencia diaria".bold());
    for peak in &summary.daily_peaks {
        let bar = "█".repeat((peak.probability * 40.0).round() as usize);
        println!("  {}  {:>6}  {}", peak.date, percent(peak.probability), bar.cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_remote_range_defaults() {
        let today = date("2025-11-13");
        assert_eq!(
            remote_range(None, None, today).unwrap(),
            DateRange::new(date("2025-11-13"), date("2025-11-19")).unwrap()
        );
        assert_eq!(
            remote_range(None, Some(date("2025-11-20")), today).unwrap().start,
            date("2025-11-14")
        );
        assert!(remote_range(Some(date("2025-11-20")), Some(date("2025-11-13")), today).is_err());
    }

    #[tokio::test]
    async fn test_summarise_bundled_data() {
        let provider = StaticPredictionProvider::bundled().unwrap();
        let set = provider
            .fetch_predictions(provider.full_range())
            .await
            .unwrap();
        let summary = summarise(&set, 3);

        assert_eq!(summary.top_products.len(), 3);
        assert_eq!(summary.daily_peaks.len(), set.days.len());
        assert_eq!(summary.kpis.unwrap().star_product_id, 6);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.4567), "45.7%");
    }
}
