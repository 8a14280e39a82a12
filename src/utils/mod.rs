//! Cross-cutting utilities: filesystem helpers and progress display.

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, clean_path, is_strictly_within, safe_write};
pub use progress::{ProgressBar, ProgressStyle};
