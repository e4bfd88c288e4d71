//! Scoped ownership of a live document for one reconciliation session.

use gridmerge_engine::Row;
use log::{info, warn};

use crate::cache::LocatorCache;
use crate::document::LiveDocument;
use crate::error::ReconError;
use crate::locator::{LocatorLimits, TargetLocator};

/// Holds the locator (and through it the document and cache) until the
/// session ends. The document is closed exactly once: by [`finish`], or on
/// drop if the session is abandoned.
///
/// [`finish`]: ReconcileSession::finish
pub struct ReconcileSession<D: LiveDocument> {
    locator: Option<TargetLocator<D>>,
}

impl<D: LiveDocument> ReconcileSession<D> {
    pub fn open(document: D, cache: LocatorCache, limits: LocatorLimits) -> Self {
        info!("reconciliation session opened ({} cached keys)", cache.len());
        Self { locator: Some(TargetLocator::with_cache(document, cache, limits)) }
    }

    /// Open with a cache seeded from the target's rows, read up front.
    pub fn open_seeded(document: D, target_rows: &[Row], limits: LocatorLimits) -> Self {
        let cache = LocatorCache::seed_from_rows(target_rows, limits.blank_row_limit);
        Self::open(document, cache, limits)
    }

    pub fn locator(&mut self) -> Result<&mut TargetLocator<D>, ReconError> {
        self.locator.as_mut().ok_or(ReconError::SessionClosed)
    }

    /// Close the document and hand it back. The cache is discarded.
    pub fn finish(mut self) -> Result<D, ReconError> {
        let locator = self.locator.take().ok_or(ReconError::SessionClosed)?;
        let (mut document, _) = locator.into_parts();
        document.close()?;
        info!("reconciliation session closed");
        Ok(document)
    }
}

impl<D: LiveDocument> Drop for ReconcileSession<D> {
    fn drop(&mut self) {
        if let Some(locator) = self.locator.take() {
            let (mut document, _) = locator.into_parts();
            if let Err(e) = document.close() {
                warn!("closing target document failed: {}", e);
            }
        }
    }
}
