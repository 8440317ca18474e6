//! Message envelope carried across the relay mesh
//!
//! A message wraps one vessel position report together with its routing
//! header (source, destination, hop budget).

mod types;

pub use types::{Message, PositionReport, ReportKind, GROUND_STATION};
