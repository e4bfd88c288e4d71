//! `gridmerge-recon`: reconcile diff rows against a live target document.
//!
//! The document is reached only through the [`LiveDocument`] capability, so
//! the crate has no file-format or IO dependencies of its own.

pub mod cache;
pub mod document;
pub mod error;
pub mod locator;
pub mod session;
pub mod write_back;

pub use cache::LocatorCache;
pub use document::LiveDocument;
pub use error::ReconError;
pub use locator::{Located, LocatorLimits, TargetLocator};
pub use session::ReconcileSession;
pub use write_back::{CopyMode, CopyOutcome};
