//! Application use cases / business logic

pub mod audit;
pub mod detect;
pub mod process;
pub mod walk;

pub use audit::{AuditReport, AuditRow, audit};
pub use detect::{changed, detect_changes};
pub use process::{
    AltTextRun, DEFAULT_DESCRIPTION_PROMPT, DescribeConfig, RunConfig, RunError,
};
pub use walk::{ImageWalker, WalkOptions, image_name};
