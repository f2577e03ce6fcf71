//! Package manager bootstrap, restore and validation.
//!
//! The sequence is always download (if missing), restore, then validate:
//! restore may fail quietly, validation is what decides whether the
//! solution has every binary it references.

mod fetch;
mod restore;
mod validate;

pub use fetch::{FetchError, ToolStatus, ensure_tool_present};
pub use restore::{RestoreOutcome, RestoreReport, RestoreWarning, restore, restore_commands};
pub use validate::{MissingBinary, MissingPackageReport, ValidateError, validate};
