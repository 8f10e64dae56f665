use std::cell::RefCell;
use std::sync::Arc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use velox_shared::loader::COUNTY_HINT;
use velox_shared::{
    BoundaryCache, CatalogWarning, DetailRequest, GeoFeatureLoader, MapConfig, MapLayout, MapMode,
    MapViewModel, TerritoryCatalog, TerritoryIndex,
};

use crate::canvas::MapCanvas;
use crate::embed::EmbedConfig;
use crate::loader::{GlooFetch, load_catalog};
use crate::panel::{DetailPanel, Legend, StatusOverlay, Tooltip};

pub(crate) fn window_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1000.0, 600.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1000.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(600.0);
    (w, h)
}

struct WindowBinding {
    window: web_sys::Window,
    event: &'static str,
    handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::Event)>,
}

impl WindowBinding {
    fn attach(event: &'static str, handler: impl Fn(web_sys::Event) + 'static) -> Option<Self> {
        let window = web_sys::window()?;
        let handler = wasm_bindgen::closure::Closure::<dyn Fn(web_sys::Event)>::new(handler);
        window
            .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            window,
            event,
            handler,
        })
    }
}

impl Drop for WindowBinding {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback(self.event, self.handler.as_ref().unchecked_ref());
    }
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<WindowBinding>> = const { RefCell::new(None) };
    static RESIZE_BINDING: RefCell<Option<WindowBinding>> = const { RefCell::new(None) };
}

#[derive(Clone, Copy)]
pub(crate) struct WindowSize(pub RwSignal<(f64, f64)>);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Projected layouts for both views plus what is needed to build a detail
/// layout on demand.
#[derive(Clone, Copy)]
pub(crate) struct Layouts {
    view_model: RwSignal<MapViewModel>,
    overview: RwSignal<Option<Arc<MapLayout>>>,
    detail: RwSignal<Option<(String, Arc<MapLayout>)>>,
    status: RwSignal<LoadStatus>,
    embed: StoredValue<EmbedConfig>,
    cache: StoredValue<BoundaryCache>,
}

impl Layouts {
    pub(crate) fn track(&self) {
        self.overview.track();
        self.detail.track();
    }

    pub(crate) fn status(&self) -> RwSignal<LoadStatus> {
        self.status
    }

    /// Run `f` on the layout for the current mode. `None` while that layout
    /// is not available yet.
    pub(crate) fn with_active<R>(
        &self,
        view_model: &MapViewModel,
        f: impl FnOnce(&MapConfig, &MapLayout) -> R,
    ) -> Option<R> {
        match view_model.mode() {
            MapMode::Overview => {
                let layout = self.overview.get_untracked()?;
                Some(self.embed.with_value(|embed| f(&embed.overview, &layout)))
            }
            MapMode::Detail(state) => {
                let (loaded_state, layout) = self.detail.get_untracked()?;
                if loaded_state != state {
                    return None;
                }
                Some(self.embed.with_value(|embed| f(&embed.detail, &layout)))
            }
        }
    }

    /// Build the detail layout for `request` from the cached county set.
    /// Results for a superseded selection are dropped.
    pub(crate) fn load_detail(self, request: DetailRequest) {
        spawn_local(async move {
            let loader = GeoFeatureLoader::with_cache(GlooFetch, self.cache.get_value());
            let url = self.embed.with_value(|embed| embed.counties_url.clone());
            let counties = match loader.load(&url, COUNTY_HINT).await {
                Ok(counties) => counties,
                Err(e) => {
                    web_sys::console::warn_1(&format!("County outlines unavailable: {e}").into());
                    return;
                }
            };
            let config = self.embed.with_value(|embed| embed.detail.clone());
            let layout = self.view_model.with_untracked(|vm| {
                vm.accept_detail(&request)
                    .then(|| MapLayout::detail(&config, &request.state, &counties, vm.index()))
            });
            if let Some(layout) = layout {
                self.detail.set(Some((request.state, Arc::new(layout))));
            }
        });
    }
}

fn log_catalog_warnings(index: &TerritoryIndex) {
    for warning in index.warnings() {
        let message = match warning {
            CatalogWarning::DuplicateCounty {
                state,
                county,
                previous,
                replacement,
            } => format!("Catalog: {state} county {county} moved from {previous} to {replacement}"),
            CatalogWarning::UnknownState { state } => {
                format!("Catalog: unknown state code {state}")
            }
        };
        web_sys::console::warn_1(&message.into());
    }
}

#[component]
pub fn App(embed: EmbedConfig) -> impl IntoView {
    let view_model: RwSignal<MapViewModel> = RwSignal::new(MapViewModel::new(Arc::new(
        TerritoryIndex::build(TerritoryCatalog::default()),
    )));
    let window_size: RwSignal<(f64, f64)> = RwSignal::new(window_dimensions());
    let layouts = Layouts {
        view_model,
        overview: RwSignal::new(None),
        detail: RwSignal::new(None),
        status: RwSignal::new(LoadStatus::Loading),
        embed: StoredValue::new(embed),
        cache: StoredValue::new(BoundaryCache::default()),
    };

    provide_context(view_model);
    provide_context(WindowSize(window_size));
    provide_context(layouts);

    // Catalog first, then both boundary documents together.
    Effect::new(move || {
        spawn_local(async move {
            let catalog_url = layouts.embed.with_value(|embed| embed.catalog_url.clone());
            let catalog = load_catalog(catalog_url.as_deref()).await;
            let index = Arc::new(TerritoryIndex::build(catalog));
            log_catalog_warnings(&index);
            view_model.set(MapViewModel::new(Arc::clone(&index)));

            let (states_url, counties_url, config) = layouts.embed.with_value(|embed| {
                (
                    embed.states_url.clone(),
                    embed.counties_url.clone(),
                    embed.overview.clone(),
                )
            });
            let loader = GeoFeatureLoader::with_cache(GlooFetch, layouts.cache.get_value());
            match loader.load_boundaries(&states_url, &counties_url).await {
                Ok(boundaries) => {
                    let layout = MapLayout::overview(
                        &config,
                        &boundaries.states.features,
                        &boundaries.counties.features,
                        &index,
                    );
                    web_sys::console::info_1(
                        &format!(
                            "Loaded {} states and {} counties ({} territory counties drawn)",
                            boundaries.states.features.len(),
                            boundaries.counties.features.len(),
                            layout.counties.len()
                        )
                        .into(),
                    );
                    layouts.overview.set(Some(Arc::new(layout)));
                    layouts.status.set(LoadStatus::Ready);
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("Boundary load failed: {e}").into());
                    layouts.status.set(LoadStatus::Failed(e.to_string()));
                }
            }
        });
    });

    // Escape leaves the detail view.
    Effect::new(move || {
        KEYDOWN_BINDING.with(|slot| {
            slot.borrow_mut().take();
            *slot.borrow_mut() = WindowBinding::attach("keydown", move |e: web_sys::Event| {
                let Some(e) = e.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                if e.key() == "Escape" && view_model.try_update(|vm| vm.escape()) == Some(true) {
                    e.prevent_default();
                }
            });
        });
        RESIZE_BINDING.with(|slot| {
            slot.borrow_mut().take();
            *slot.borrow_mut() = WindowBinding::attach("resize", move |_| {
                window_size.set(window_dimensions());
            });
        });
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #f8fafc; font-family: 'Inter', system-ui, sans-serif;">
            <MapCanvas />
            <StatusOverlay />
            <Legend />
            <DetailPanel />
        </div>
        <Tooltip />
    }
}
