pub mod aggregator;
pub mod formatter;
pub mod table;

pub use aggregator::aggregate;
pub use formatter::{format_report, FormatOptions, FormattedReport, ThreadText};
