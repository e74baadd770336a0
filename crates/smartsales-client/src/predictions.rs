//! Sales prediction sources for the admin dashboard

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use smartsales_core::types::{DateRange, PredictionSet};
use smartsales_core::{Error, Result};

use crate::transport::HttpTransport;

const BUNDLED_PREDICTIONS: &str = include_str!("../fixtures/predicciones.json");

/// Anything that can answer "what will sell between these dates"
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    async fn fetch_predictions(&self, range: DateRange) -> Result<PredictionSet>;
}

/// Serves a fixed prediction payload, filtered to the requested range
///
/// The dashboard runs on this until the forecasting service is deployed.
#[derive(Debug, Clone)]
pub struct StaticPredictionProvider {
    data: PredictionSet,
}

impl StaticPredictionProvider {
    /// Provider over the payload shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_PREDICTIONS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data = serde_json::from_str(json)
            .map_err(|e| Error::Decode(format!("invalid prediction payload: {}", e)))?;
        Ok(Self { data })
    }

    /// Range covering every day in the payload
    pub fn full_range(&self) -> DateRange {
        DateRange {
            start: self.data.start_date,
            end: self.data.end_date,
        }
    }
}

#[async_trait]
impl PredictionProvider for StaticPredictionProvider {
    async fn fetch_predictions(&self, range: DateRange) -> Result<PredictionSet> {
        debug!("Serving bundled predictions for {}..{}", range.start, range.end);
        Ok(self.data.within(&range))
    }
}

/// Fetches predictions from the backend forecasting endpoint
#[derive(Debug, Clone)]
pub struct HttpPredictionProvider {
    transport: Arc<HttpTransport>,
    endpoint: String,
}

impl HttpPredictionProvider {
    pub const DEFAULT_ENDPOINT: &'static str = "/ventas/predicciones/";

    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self::with_endpoint(transport, Self::DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(transport: Arc<HttpTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PredictionProvider for HttpPredictionProvider {
    async fn fetch_predictions(&self, range: DateRange) -> Result<PredictionSet> {
        let pairs = vec![
            ("fecha_inicio".to_string(), range.start.format("%Y-%m-%d").to_string()),
            ("fecha_fin".to_string(), range.end.format("%Y-%m-%d").to_string()),
        ];
        let url = self.transport.endpoint_url(&self.endpoint, &pairs)?;

        let set: PredictionSet = self.transport.get_json(&url).await?;
        info!(
            "Received {} prediction days from {}",
            set.days.len(),
            self.endpoint
        );
        Ok(set.within(&range))
    }
}
