pub mod audit;
pub mod catalog;
pub mod colors;
pub mod feature;
pub mod hit;
pub mod identity;
pub mod index;
pub mod loader;
pub mod projection;
pub mod scene;
pub mod topology;
pub mod view_model;

pub use audit::{CatalogAudit, audit_catalog};
pub use catalog::{Classification, Territory, TerritoryCatalog};
pub use feature::GeoFeature;
pub use hit::HitGrid;
pub use index::{CatalogWarning, TerritoryIndex};
pub use loader::{
    Boundaries, BoundaryCache, BoundaryFetch, GeoFeatureLoader, LoadError, LoadedLayer,
};
pub use projection::{ProjectedLayer, ProjectedRegion, ProjectionKind, Projector};
pub use scene::{MapConfig, MapLayout, Scene, build_scene};
pub use topology::Topology;
pub use view_model::{Activation, DetailRequest, Hit, MapMode, MapViewModel, Tooltip, ViewState};
