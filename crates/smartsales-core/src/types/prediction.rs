//! Sales prediction types for the admin dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidArgument(format!(
                "date range ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Probability that a single product sells on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPrediction {
    #[serde(rename = "producto_id")]
    pub product_id: i64,
    #[serde(rename = "probabilidad_venta")]
    pub probability: f64,
    #[serde(rename = "se_vendera")]
    pub will_sell: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrediction {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "dia_semana")]
    pub weekday: String,
    #[serde(rename = "total_productos_predichos", default)]
    pub total_products: u32,
    #[serde(rename = "productos", default)]
    pub products: Vec<ProductPrediction>,
}

impl DailyPrediction {
    /// Highest probability of the day, 0 when the day has no products
    pub fn peak_probability(&self) -> f64 {
        self.products
            .iter()
            .map(|p| p.probability)
            .fold(0.0, f64::max)
    }
}

/// Prediction payload as produced by the forecasting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub status: String,
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "fecha_inicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fecha_fin")]
    pub end_date: NaiveDate,
    #[serde(rename = "dias_predichos", default)]
    pub predicted_days: u32,
    #[serde(rename = "predicciones", default)]
    pub days: Vec<DailyPrediction>,
}

/// Headline figures for the dashboard cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionKpis {
    pub max_probability: f64,
    pub star_product_id: i64,
    pub peak_date: NaiveDate,
    pub peak_weekday: String,
}

impl PredictionKpis {
    /// Probability as a whole percentage, e.g. `"46%"`
    pub fn max_probability_label(&self) -> String {
        format!("{:.0}%", self.max_probability * 100.0)
    }
}

/// A product and the highest probability it reaches in the period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub peak_probability: f64,
}

impl PredictionSet {
    /// Days falling inside `range`; period bounds are clamped to it
    pub fn within(&self, range: &DateRange) -> PredictionSet {
        let days: Vec<DailyPrediction> = self
            .days
            .iter()
            .filter(|day| range.contains(day.date))
            .cloned()
            .collect();

        PredictionSet {
            status: self.status.clone(),
            message: self.message.clone(),
            start_date: self.start_date.max(range.start),
            end_date: self.end_date.min(range.end),
            predicted_days: u32::try_from(days.len()).unwrap_or(u32::MAX),
            days,
        }
    }

    /// First product reaching the strictly highest probability
    pub fn kpis(&self) -> Option<PredictionKpis> {
        let mut best: Option<PredictionKpis> = None;

        for day in &self.days {
            for product in &day.products {
                let current = best.as_ref().map_or(0.0, |b| b.max_probability);
                if product.probability > current {
                    best = Some(PredictionKpis {
                        max_probability: product.probability,
                        star_product_id: product.product_id,
                        peak_date: day.date,
                        peak_weekday: day.weekday.clone(),
                    });
                }
            }
        }

        best
    }

    /// Products ranked by their peak probability in the period
    ///
    /// Ties keep first-seen order.
    pub fn top_products(&self, limit: usize) -> Vec<TopProduct> {
        let mut ranked: Vec<TopProduct> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();

        for product in self.days.iter().flat_map(|day| day.products.iter()) {
            match index.get(&product.product_id) {
                Some(&i) => {
                    if product.probability > ranked[i].peak_probability {
                        ranked[i].peak_probability = product.probability;
                    }
                }
                None => {
                    index.insert(product.product_id, ranked.len());
                    ranked.push(TopProduct {
                        product_id: product.product_id,
                        peak_probability: product.probability.max(0.0),
                    });
                }
            }
        }

        ranked.sort_by(|a, b| b.peak_probability.total_cmp(&a.peak_probability));
        ranked.truncate(limit);
        ranked
    }

    /// `(date, peak probability)` per day, for the trend chart
    pub fn daily_peaks(&self) -> Vec<(NaiveDate, f64)> {
        self.days
            .iter()
            .map(|day| (day.date, day.peak_probability()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> PredictionSet {
        serde_json::from_str(
            r#"{
                "status": "ok",
                "mensaje": "Predicción generada",
                "fecha_inicio": "2025-11-13",
                "fecha_fin": "2025-11-15",
                "dias_predichos": 3,
                "predicciones": [
                    {"fecha": "2025-11-13", "dia_semana": "Jueves", "total_productos_predichos": 2,
                     "productos": [
                        {"producto_id": 35, "probabilidad_venta": 0.46, "se_vendera": false},
                        {"producto_id": 10, "probabilidad_venta": 0.22, "se_vendera": false}
                     ]},
                    {"fecha": "2025-11-14", "dia_semana": "Viernes", "total_productos_predichos": 2,
                     "productos": [
                        {"producto_id": 10, "probabilidad_venta": 0.61, "se_vendera": true},
                        {"producto_id": 4, "probabilidad_venta": 0.29, "se_vendera": false}
                     ]},
                    {"fecha": "2025-11-15", "dia_semana": "Sábado", "total_productos_predichos": 0,
                     "productos": []}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_kpis() {
        let kpis = sample().kpis().unwrap();
        assert_eq!(kpis.star_product_id, 10);
        assert_eq!(kpis.peak_date, date("2025-11-14"));
        assert_eq!(kpis.peak_weekday, "Viernes");
        assert_eq!(kpis.max_probability_label(), "61%");
    }

    #[test]
    fn test_top_products_use_peak_probability() {
        let top = sample().top_products(5);
        let ids: Vec<i64> = top.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![10, 35, 4]);
        assert_eq!(top[0].peak_probability, 0.61);

        assert_eq!(sample().top_products(1).len(), 1);
    }

    #[test]
    fn test_daily_peaks() {
        let peaks = sample().daily_peaks();
        assert_eq!(peaks.len(), 3);
        assert_eq!(peaks[0], (date("2025-11-13"), 0.46));
        assert_eq!(peaks[2], (date("2025-11-15"), 0.0));
    }

    #[test]
    fn test_within_range() {
        let range = DateRange::new(date("2025-11-14"), date("2025-11-20")).unwrap();
        let filtered = sample().within(&range);
        assert_eq!(filtered.days.len(), 2);
        assert_eq!(filtered.start_date, date("2025-11-14"));
        assert_eq!(filtered.end_date, date("2025-11-15"));
        assert_eq!(filtered.predicted_days, 2);

        assert!(DateRange::new(date("2025-11-20"), date("2025-11-14")).is_err());
    }

    #[test]
    fn test_empty_set_has_no_kpis() {
        let range = DateRange::new(date("2030-01-01"), date("2030-01-02")).unwrap();
        assert!(sample().within(&range).kpis().is_none());
    }
}
