//! File system helpers used by the update pipeline.
//!
//! - [`atomic`] - temp-and-rename writes for the config file
//! - [`paths`] - lexical path cleaning and containment checks for archive entries

pub mod atomic;
pub mod paths;

pub use atomic::{atomic_write, safe_write};
pub use paths::{clean_path, is_strictly_within};
