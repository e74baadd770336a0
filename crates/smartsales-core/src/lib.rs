//! SmartSales365 Core Library
//!
//! Shared types, error taxonomy, configuration and display helpers used by
//! the list controller, the export pipeline and the command-line front-end.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::SmartSalesConfig;
pub use error::{Error, ErrorKind, Result, ServerErrorBody};

/// SmartSales365 tooling version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of rows requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query parameter carrying the page size
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Query parameter carrying the page number
pub const PAGE_PARAM: &str = "page";

/// Query parameter carrying the free-text search term
pub const SEARCH_PARAM: &str = "search";

/// Query parameter carrying the ordering token
pub const ORDERING_PARAM: &str = "ordering";

/// Row caps offered for "full dataset" exports
pub const EXPORT_CAPS: [u32; 4] = [100, 500, 1000, 5000];
