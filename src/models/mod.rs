pub mod record;
pub mod report;
pub mod prior;

pub use record::*;
pub use report::*;
pub use prior::PriorPeriod;
