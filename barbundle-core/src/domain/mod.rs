//! Domain types for bundle ingestion

pub mod adjustment;
pub mod asset;
pub mod bar;
pub mod ids;

pub use adjustment::{DividendRow, SplitRow};
pub use asset::{auto_close_date, EquityMetadata, FutureMetadata, RootSymbol};
pub use bar::{DailyBar, EquityRow, FuturesRow, MinuteBar};
pub use ids::{Sid, SidAllocator};
