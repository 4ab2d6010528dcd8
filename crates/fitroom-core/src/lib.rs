//! fitroom-core: persistence and derived-view layer of the avatar fitting room.
//!
//! Avatar session, user-created accessories and clothing, the product catalog and the
//! composition seam, all over an injected key-value store.

mod catalog;
mod composition;
mod config;
mod error;
mod flight;
mod generation;
mod ids;
mod models;
mod registry;
mod session;
mod studio;

pub mod notify;
pub mod storage;

pub use catalog::{Catalog, CatalogCategory, CatalogFilter, CatalogItem, NewCatalogItem, PriceBand};
pub use composition::{CompositionService, StubCompositor};
pub use config::{LatencyProfile, StudioConfig};
pub use error::{StorageError, StudioError, StudioResult};
pub use flight::{FlightPermit, SingleFlight};
pub use generation::{
    AssetClass, AssetRequest, GenerationRequest, GenerationResponse, ModelGenerator,
    StubModelGenerator,
};
pub use ids::{IdGenerator, UuidGenerator};
pub use models::{
    Accessory, AccessoryKind, AccessoryType, Asset, AssetKind, BodyType, Clothing, ClothingKind,
    ClothingType, ExportFormat, Gender, ImageRef, Measurements,
};
pub use notify::{ChannelNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use registry::{AccessoryRegistry, AssetRegistry, ClothingRegistry, RegistryKind};
pub use session::{AvatarSession, SessionPhase};
pub use storage::{KeyValueStore, MemoryStore, SledStore, StorageKeys};
pub use studio::{Studio, StudioParts};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
