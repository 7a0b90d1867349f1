//! Process-wide cache of the series catalog
//!
//! Building the catalog partitions and summarizes every observation, so the
//! result is kept behind a lock and reused while the underlying table is
//! unchanged. Tables are compared by their content fingerprint.

use crate::data::RecordStore;
use crate::error::Result;
use crate::series::{SeriesBuilder, SeriesCatalog};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

static CATALOG: OnceLock<RwLock<Option<Arc<SeriesCatalog>>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Arc<SeriesCatalog>>> {
    CATALOG.get_or_init(|| RwLock::new(None))
}

/// Catalog for `store`, built on a miss or when the table changed
pub fn catalog_for(store: &RecordStore) -> Result<Arc<SeriesCatalog>> {
    let fingerprint = store.fingerprint();
    {
        let cached = slot().read().unwrap_or_else(PoisonError::into_inner);
        if let Some(catalog) = cached.as_ref() {
            if catalog.fingerprint() == fingerprint {
                debug!(fingerprint, "catalog cache hit");
                return Ok(Arc::clone(catalog));
            }
        }
    }

    let mut cached = slot().write().unwrap_or_else(PoisonError::into_inner);
    // Another caller may have filled the slot while we waited
    if let Some(catalog) = cached.as_ref() {
        if catalog.fingerprint() == fingerprint {
            return Ok(Arc::clone(catalog));
        }
    }

    debug!(fingerprint, "catalog cache miss");
    let catalog = Arc::new(SeriesBuilder::build(store)?);
    *cached = Some(Arc::clone(&catalog));
    Ok(catalog)
}

/// Drop the cached catalog so the next lookup rebuilds it
pub fn invalidate() {
    let mut cached = slot().write().unwrap_or_else(PoisonError::into_inner);
    if cached.take().is_some() {
        debug!("catalog cache cleared");
    }
}

/// Fingerprint of the cached catalog, if any
pub fn cached_fingerprint() -> Option<u64> {
    slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(|catalog| catalog.fingerprint())
}
