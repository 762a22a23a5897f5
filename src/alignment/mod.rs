pub mod commands;
pub mod controller;
pub mod result;
pub mod state;
pub mod transform;

pub use commands::Command;
pub use controller::{AlignmentController, AlignmentSnapshot, Progress};
pub use result::AlignmentResult;
pub use state::{Alignment, AlignmentSession, Cursor, Hypothesis, WarningFlags};
pub use transform::Viewport;
