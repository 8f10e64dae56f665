use velox_shared::{BoundaryFetch, LoadError, TerritoryCatalog};

/// Browser transport for boundary documents.
#[derive(Clone, Copy, Default)]
pub(crate) struct GlooFetch;

impl BoundaryFetch for GlooFetch {
    async fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
        let resp = gloo_net::http::Request::get(url)
            .send()
            .await
            .map_err(|e| LoadError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !resp.ok() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        resp.text().await.map_err(|e| LoadError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Fetch a catalog document in the same shape as the embedded one.
pub(crate) async fn fetch_catalog(url: &str) -> Result<TerritoryCatalog, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let text = resp.text().await.map_err(|e| format!("read error: {e}"))?;
    TerritoryCatalog::from_json(&text).map_err(|e| format!("parse error: {e}"))
}

/// Catalog from `url` when one is configured, else the embedded catalog.
/// A failed fetch is logged and falls back as well.
pub(crate) async fn load_catalog(url: Option<&str>) -> TerritoryCatalog {
    let Some(url) = url else {
        return TerritoryCatalog::embedded();
    };
    match fetch_catalog(url).await {
        Ok(catalog) => catalog,
        Err(e) => {
            web_sys::console::warn_1(
                &format!("Catalog fetch from {url} failed ({e}); using embedded catalog").into(),
            );
            TerritoryCatalog::embedded()
        }
    }
}
