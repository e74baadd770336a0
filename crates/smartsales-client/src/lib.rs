//! SmartSales365 Client - paginated list state and backend access
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   page / command                          │
//! │   set_search · set_page · set_ordering · set_filter ·     │
//! │   refresh                        state() snapshot         │
//! └──────────────┬──────────────────────────▲────────────────┘
//!                │                          │
//!        ┌───────▼──────────────────────────┴───────┐
//!        │           PagedListController             │
//!        │  ListQuery · PaginationState · token      │
//!        └───────────────────┬───────────────────────┘
//!                            │ fetch_page(query)
//!                  ┌─────────▼─────────┐
//!                  │   ListTransport   │  HttpTransport (reqwest)
//!                  └───────────────────┘
//! ```
//!
//! Every fetch carries a request token; only the response to the most
//! recently issued request may touch the exposed state.

mod controller;
mod predictions;
mod transport;

pub use controller::{FetchOutcome, ListState, PagedListController};
pub use predictions::{HttpPredictionProvider, PredictionProvider, StaticPredictionProvider};
pub use transport::{HttpTransport, ListTransport, TransportConfig};

// Re-export the list types callers need alongside the controller
pub use smartsales_core::types::{
    DateRange, ListQuery, OrderDirection, OrderingState, Page, PaginationState, PredictionSet,
};
