//! Release negotiation and application.
//!
//! One run of the updater walks these steps in order and stops at the first
//! failure:
//!
//! ```text
//! 1. Load egts.toml
//! 2. GET bootstrap URL                 -> endpoint base URI
//! 3. GET <endpoint>/version            -> must equal the embedded version
//! 4. POST <endpoint>/releases/<name>   -> 304 up to date | 200 release descriptor
//! 5. Confirm, GET descriptor.uri       -> update.zip
//!    Extract update.zip into the install directory, remove it
//! 6. deleteCabinet? remove CabinetInfo* directories
//! 7. Rewrite egts.toml with the new version
//! ```
//!
//! # Modules
//!
//! - [`api`] - [`ReleaseApi`] seam and its `reqwest` implementation
//! - [`extract`] - zip extraction with path traversal checks
//! - [`prune`] - prefix-scoped directory deletion
//! - [`prompt`] - operator confirmation
//! - [`release`] - wire types of the release check
//! - [`settings`] - per-run constants and policies
//!
//! # Failure behaviour
//!
//! There is no rollback. A failed extraction leaves the entries written so far
//! and the downloaded archive in place; the configuration keeps the old version
//! so the next run downloads the release again.
//!
//! # Examples
//!
//! ```rust,no_run
//! use egts_updater::update::{AutoConfirm, HttpReleaseApi, RuntimeSettings, Updater};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let api = HttpReleaseApi::new()?;
//! let mut updater = Updater::new(RuntimeSettings::default(), api, AutoConfirm);
//! let outcome = updater.run().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod extract;
mod orchestrator;
pub mod prompt;
pub mod prune;
pub mod release;
pub mod settings;

pub use api::{HttpReleaseApi, ReleaseApi, endpoint_url};
pub use extract::{ExtractSummary, extract_zip};
pub use orchestrator::{PruneOutcome, UpdateOutcome, Updater};
pub use prompt::{AutoConfirm, Confirm, LinePrompt};
pub use prune::delete_directories;
pub use release::{ReleaseCheck, ReleaseDescriptor, ReleaseRequest};
pub use settings::{
    CABINET_PREFIX, DEFAULT_ARCHIVE_NAME, DEFAULT_BOOTSTRAP_URL, PruneFailurePolicy,
    RuntimeSettings, UPDATER_VERSION,
};
