//! Core types for SmartSales365

mod list;
mod prediction;

pub use list::*;
pub use prediction::*;
