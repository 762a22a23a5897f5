pub mod prepare;
pub mod stats;
pub mod types;

pub use prepare::{prepare_all, prepare_stream, PreparedStreams};
pub use types::{RawSeries, TimeAxis, TimeSeries};
