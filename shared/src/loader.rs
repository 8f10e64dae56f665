//! Fetch topology documents and decode them into boundary features.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::feature::GeoFeature;
use crate::topology::Topology;

/// Object-name hint for the national state outlines.
pub const STATE_HINT: &str = "state";
/// Object-name hint for the national county outlines.
pub const COUNTY_HINT: &str = "count";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid topology at {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("topology at {url} has no objects")]
    NoObjects { url: String },
}

/// Transport used by the loader. The browser client and the server each
/// provide one.
pub trait BoundaryFetch {
    /// Body of the document at `url`. Non-success statuses map to [`LoadError::Status`].
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, LoadError>>;
}

/// One decoded object of a topology document.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedLayer {
    pub object_name: String,
    pub features: Arc<[GeoFeature]>,
}

/// Session-scoped cache of decoded layers keyed by `(url, hint)`.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct BoundaryCache {
    layers: Arc<Mutex<HashMap<(String, String), LoadedLayer>>>,
}

impl BoundaryCache {
    pub fn get(&self, url: &str, hint: &str) -> Option<LoadedLayer> {
        let layers = self.layers.lock().unwrap_or_else(PoisonError::into_inner);
        layers.get(&(url.to_string(), hint.to_string())).cloned()
    }

    pub fn insert(&self, url: &str, hint: &str, layer: LoadedLayer) {
        let mut layers = self.layers.lock().unwrap_or_else(PoisonError::into_inner);
        layers.insert((url.to_string(), hint.to_string()), layer);
    }

    pub fn len(&self) -> usize {
        self.layers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.layers.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// State and county layers loaded together.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundaries {
    pub states: LoadedLayer,
    pub counties: LoadedLayer,
}

pub struct GeoFeatureLoader<F> {
    fetch: F,
    cache: Option<BoundaryCache>,
}

impl<F: BoundaryFetch> GeoFeatureLoader<F> {
    /// A loader that fetches on every call.
    pub fn new(fetch: F) -> Self {
        Self { fetch, cache: None }
    }

    pub fn with_cache(fetch: F, cache: BoundaryCache) -> Self {
        Self {
            fetch,
            cache: Some(cache),
        }
    }

    pub fn cache(&self) -> Option<&BoundaryCache> {
        self.cache.as_ref()
    }

    pub async fn load(&self, url: &str, hint: &str) -> Result<Arc<[GeoFeature]>, LoadError> {
        self.load_layer(url, hint).await.map(|layer| layer.features)
    }

    /// Fetch `url` and decode the object whose name contains `hint`, or the
    /// first object when none does.
    pub async fn load_layer(&self, url: &str, hint: &str) -> Result<LoadedLayer, LoadError> {
        if let Some(layer) = self.cache.as_ref().and_then(|cache| cache.get(url, hint)) {
            return Ok(layer);
        }

        let text = self.fetch.fetch_text(url).await?;
        let topology = Topology::from_json(&text).map_err(|source| LoadError::Parse {
            url: url.to_string(),
            source,
        })?;
        let object_name = topology
            .select_object(hint)
            .ok_or_else(|| LoadError::NoObjects {
                url: url.to_string(),
            })?
            .to_string();
        let features = topology
            .features(&object_name)
            .map_err(|source| LoadError::Parse {
                url: url.to_string(),
                source,
            })?;

        tracing::debug!(url, object = %object_name, features = features.len(), "decoded boundary layer");
        let layer = LoadedLayer {
            object_name,
            features: features.into(),
        };
        if let Some(cache) = &self.cache {
            cache.insert(url, hint, layer.clone());
        }
        Ok(layer)
    }

    /// Load the state and county documents concurrently. Either failure fails both.
    pub async fn load_boundaries(
        &self,
        states_url: &str,
        counties_url: &str,
    ) -> Result<Boundaries, LoadError> {
        let (states, counties) = futures::join!(
            self.load_layer(states_url, STATE_HINT),
            self.load_layer(counties_url, COUNTY_HINT),
        );
        Ok(Boundaries {
            states: states?,
            counties: counties?,
        })
    }
}
