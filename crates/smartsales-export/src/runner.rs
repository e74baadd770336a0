//! Export state machine
//!
//! `Idle → Fetching → Projecting → Emitting → Idle`. A failure at any step
//! returns to `Idle`; a run started while another is active is rejected.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};

use smartsales_client::ListTransport;
use smartsales_core::types::ListQuery;

use crate::column::{ColumnRegistry, ExportSelection};
use crate::error::{ExportError, Result};
use crate::job::{ExportArtifact, ExportCap, ExportJob, ReportMeta};
use crate::projection::project;
use crate::sinks::{emit, ExportSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Fetching { cap: u32 },
    Projecting,
    Emitting,
}

/// Inputs of one export
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    /// List query whose filters, search and ordering the export keeps
    pub query: &'a ListQuery,
    pub registry: &'a ColumnRegistry,
    pub selection: &'a ExportSelection,
    pub meta: &'a ReportMeta,
    pub cap: ExportCap,
}

/// Project already loaded rows and emit them in one step
pub fn export_rows(
    rows: &[Value],
    registry: &ColumnRegistry,
    selection: &ExportSelection,
    meta: &ReportMeta,
    sink: &dyn ExportSink,
) -> Result<ExportArtifact> {
    let projection = project(rows, registry, selection)?;
    let job = ExportJob::new(projection, sink.kind(), meta);
    emit(&job, sink)
}

/// Runs full-dataset exports for one trigger, one at a time
#[derive(Debug, Clone)]
pub struct ExportRunner {
    phase: Arc<Mutex<ExportPhase>>,
    /// Phases entered by the most recent run, in order
    trail: Arc<Mutex<Vec<ExportPhase>>>,
}

impl Default for ExportRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportRunner {
    pub fn new() -> Self {
        Self {
            phase: Arc::new(Mutex::new(ExportPhase::Idle)),
            trail: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn phase(&self) -> ExportPhase {
        *self.phase.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != ExportPhase::Idle
    }

    /// Phases the most recent run went through before it ended
    pub fn last_run(&self) -> Vec<ExportPhase> {
        self.trail.lock().clone()
    }

    /// Fetch up to `cap` rows, project them and hand the job to `sink`
    ///
    /// The fetch is independent of any on-screen list: `request.query` is
    /// only read.
    pub async fn run<R>(
        &self,
        transport: &R,
        request: ExportRequest<'_>,
        sink: &dyn ExportSink,
    ) -> Result<ExportArtifact>
    where
        R: ListTransport + ?Sized,
    {
        let _busy = self.begin(request.cap)?;

        let query = request.query.for_export(request.cap.value());
        let page = transport.fetch_page(&query).await?;
        if page.count > page.results.len() as u64 {
            warn!(
                "Export of {} capped at {} of {} rows",
                query.endpoint,
                page.results.len(),
                page.count
            );
        }

        if page.results.is_empty() {
            return Err(ExportError::EmptyExport);
        }

        self.set_phase(ExportPhase::Projecting);
        let projection = project(&page.results, request.registry, request.selection)?;

        self.set_phase(ExportPhase::Emitting);
        let job = ExportJob::new(projection, sink.kind(), request.meta);
        let artifact = emit(&job, sink)?;

        info!("{} export finished", request.meta.filename_base);
        Ok(artifact)
    }

    fn begin(&self, cap: ExportCap) -> Result<BusyGuard> {
        let mut phase = self.phase.lock();
        if *phase != ExportPhase::Idle {
            return Err(ExportError::ExportInProgress);
        }
        *phase = ExportPhase::Fetching { cap: cap.value() };
        *self.trail.lock() = vec![*phase];
        Ok(BusyGuard {
            phase: Arc::clone(&self.phase),
        })
    }

    fn set_phase(&self, next: ExportPhase) {
        *self.phase.lock() = next;
        self.trail.lock().push(next);
    }
}

/// Returns the runner to `Idle` however the run ends
struct BusyGuard {
    phase: Arc<Mutex<ExportPhase>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        *self.phase.lock() = ExportPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SinkKind;
    use crate::popup::NoPopup;
    use crate::reports::ReportDefinition;
    use crate::sinks::SinkSet;
    use async_trait::async_trait;
    use serde_json::json;
    use smartsales_core::types::Page;
    use smartsales_core::ErrorKind;
    use std::time::Duration;

    struct FakeTransport {
        rows: Vec<Value>,
        count: u64,
        delay: Duration,
        fail: bool,
        queries: Mutex<Vec<ListQuery>>,
    }

    impl FakeTransport {
        fn with_rows(rows: Vec<Value>) -> Self {
            Self {
                count: rows.len() as u64,
                rows,
                delay: Duration::ZERO,
                fail: false,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ListTransport for FakeTransport {
        async fn fetch_page(&self, query: &ListQuery) -> smartsales_core::Result<Page<Value>> {
            self.queries.lock().push(query.clone());
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(smartsales_core::Error::server(500, r#"{"detail": "boom"}"#));
            }
            Ok(Page {
                count: self.count,
                next: None,
                previous: None,
                results: self.rows.clone(),
            })
        }
    }

    fn products() -> Vec<Value> {
        vec![
            json!({"id": 1, "nombre": "Silla", "precio": "120.50", "stock": 4, "estado": true}),
            json!({"id": 2, "nombre": "Mesa", "precio": "300", "stock": 0, "estado": false}),
        ]
    }

    #[tokio::test]
    async fn test_run_exports_with_list_filters() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = SinkSet::new(dir.path(), Arc::new(NoPopup));
        let report = ReportDefinition::products();
        let transport = FakeTransport::with_rows(products());

        let mut query = report.base_query(10).unwrap();
        query.page = 3;
        query.search = "silla".to_string();
        query.filters.insert("estado".to_string(), "true".to_string());

        let selection = report.default_selection();
        let cap = ExportCap::try_from(500).unwrap();
        let runner = ExportRunner::new();

        let artifact = runner
            .run(
                &transport,
                report.request(&query, &selection, cap),
                sinks.get(SinkKind::Xlsx),
            )
            .await
            .unwrap();

        assert_eq!(artifact.rows, 2);
        assert!(artifact.path.unwrap().exists());
        assert_eq!(runner.phase(), ExportPhase::Idle);
        assert_eq!(
            runner.last_run(),
            vec![
                ExportPhase::Fetching { cap: 500 },
                ExportPhase::Projecting,
                ExportPhase::Emitting,
            ]
        );

        let sent = transport.queries.lock()[0].query_string();
        assert_eq!(
            sent,
            "page_size=500&search=silla&ordering=nombre&estado=true"
        );
        assert_eq!(query.page, 3);
    }

    #[tokio::test]
    async fn test_second_run_while_busy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = SinkSet::new(dir.path(), Arc::new(NoPopup));
        let report = ReportDefinition::products();
        let query = report.base_query(10).unwrap();
        let selection = report.default_selection();

        let mut slow = FakeTransport::with_rows(products());
        slow.delay = Duration::from_millis(50);
        let runner = ExportRunner::new();

        let observer = runner.clone();
        let (first, second, phase_midway) = tokio::join!(
            runner.run(
                &slow,
                report.request(&query, &selection, ExportCap::default()),
                sinks.get(SinkKind::Pdf),
            ),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                runner
                    .run(
                        &slow,
                        report.request(&query, &selection, ExportCap::default()),
                        sinks.get(SinkKind::Pdf),
                    )
                    .await
            },
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                observer.phase()
            }
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(ExportError::ExportInProgress)));
        assert_eq!(phase_midway, ExportPhase::Fetching { cap: 100 });
        assert!(!runner.is_busy());
    }

    #[tokio::test]
    async fn test_failures_return_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = SinkSet::new(dir.path(), Arc::new(NoPopup));
        let report = ReportDefinition::users();
        let query = report.base_query(10).unwrap();
        let selection = report.default_selection();
        let runner = ExportRunner::new();

        let mut failing = FakeTransport::with_rows(Vec::new());
        failing.fail = true;
        let err = runner
            .run(
                &failing,
                report.request(&query, &selection, ExportCap::default()),
                sinks.get(SinkKind::Xlsx),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(runner.phase(), ExportPhase::Idle);

        let empty = FakeTransport::with_rows(Vec::new());
        let err = runner
            .run(
                &empty,
                report.request(&query, &selection, ExportCap::default()),
                sinks.get(SinkKind::Xlsx),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::EmptyExport));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(
            runner.last_run(),
            vec![ExportPhase::Fetching {
                cap: ExportCap::default().value()
            }]
        );

        let err = runner
            .run(
                &FakeTransport::with_rows(products()),
                report.request(&query, &selection, ExportCap::default()),
                sinks.get(SinkKind::HtmlPrint),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::SinkUnavailable(_)));
        assert!(!runner.is_busy());
    }

    #[test]
    fn test_export_loaded_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = SinkSet::new(dir.path(), Arc::new(NoPopup));
        let report = ReportDefinition::products();

        let artifact = export_rows(
            &products(),
            &report.registry,
            &report.default_selection(),
            &report.meta,
            sinks.get(SinkKind::Pdf),
        )
        .unwrap();
        assert_eq!(artifact.sink, SinkKind::Pdf);
    }
}
