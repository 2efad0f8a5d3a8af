#[macro_use]
mod ident;

pub mod arp;
pub mod class;
pub mod driver;
pub mod flow;
pub mod report;
pub mod scenario;
pub mod stats;
pub mod topology;
pub mod traffic;
pub mod units;

mod error;

pub use driver::{analyze, setup, Setup};
pub use error::{Error, Result};
pub use flow::{FiveTuple, FlowId, FlowMonitor, FlowRecord, FlowRecordCollector, Protocol};
pub use scenario::Scenario;
pub use stats::Summary;
