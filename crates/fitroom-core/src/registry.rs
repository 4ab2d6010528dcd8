//! Asset registry: append-only collections of user-created accessories and clothing,
//! persisted as one JSON array per kind.

use crate::error::{StudioError, StudioResult};
use crate::generation::{AssetClass, AssetRequest, ModelGenerator};
use crate::ids::IdGenerator;
use crate::models::{AccessoryKind, Asset, AssetKind, ClothingKind, ImageRef};
use crate::notify::{Notification, Notifier};
use crate::storage::{load_json, store_json, KeyValueStore};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Fresh ids drawn before giving up on a generator that keeps colliding.
const MAX_ID_ATTEMPTS: usize = 8;

/// Per-kind wiring: where the collection lives and how reconstruction is requested.
pub trait RegistryKind: AssetKind {
    const CLASS: AssetClass;
}

impl RegistryKind for AccessoryKind {
    const CLASS: AssetClass = AssetClass::Accessory;
}

impl RegistryKind for ClothingKind {
    const CLASS: AssetClass = AssetClass::Clothing;
}

pub type AccessoryRegistry = AssetRegistry<AccessoryKind>;
pub type ClothingRegistry = AssetRegistry<ClothingKind>;

/// Collection of one asset kind under a single storage key.
pub struct AssetRegistry<K: RegistryKind> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    ids: Arc<dyn IdGenerator>,
    generator: Arc<dyn ModelGenerator>,
    notifier: Arc<dyn Notifier>,
    /// Serializes read-append-write so concurrent creates never drop an entry.
    write_lock: Mutex<()>,
    _kind: PhantomData<K>,
}

impl<K: RegistryKind> AssetRegistry<K> {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        ids: Arc<dyn IdGenerator>,
        generator: Arc<dyn ModelGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            ids,
            generator,
            notifier,
            write_lock: Mutex::new(()),
            _kind: PhantomData,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// All assets in insertion order. Unreadable or corrupt data reads as empty;
    /// writes refuse to build on such data.
    pub fn list_all(&self) -> Vec<Asset<K>> {
        match self.load() {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    target: "fitroom::registry",
                    key = %self.key,
                    error = %e,
                    "{} collection unreadable; treating as empty",
                    K::NOUN
                );
                Vec::new()
            }
        }
    }

    /// The stored collection, failing on unreadable or undecodable data.
    fn load(&self) -> StudioResult<Vec<Asset<K>>> {
        Ok(load_json::<Vec<Asset<K>>>(self.store.as_ref(), &self.key)?.unwrap_or_default())
    }

    pub fn get(&self, id: &str) -> Option<Asset<K>> {
        self.list_all().into_iter().find(|a| a.id == id)
    }

    /// Like [`AssetRegistry::create`], parsing the type from its label first.
    pub async fn create_from_label(
        &self,
        source: ImageRef,
        name: &str,
        type_label: &str,
    ) -> StudioResult<Asset<K>> {
        let category = match type_label.parse::<K::Category>() {
            Ok(c) => c,
            Err(e) => return Err(self.fail(e)),
        };
        self.create(source, name, category).await
    }

    /// Generates a new asset from `source`, appends it and persists the collection.
    pub async fn create(
        &self,
        source: ImageRef,
        name: &str,
        category: K::Category,
    ) -> StudioResult<Asset<K>> {
        if source.is_blank() {
            return Err(self.fail(StudioError::validation("Please upload an image first")));
        }
        if name.trim().is_empty() {
            return Err(self.fail(StudioError::validation(format!(
                "Please enter a name for the {}",
                K::NOUN
            ))));
        }

        self.notifier
            .notify(Notification::info(format!("Generating 3D {}...", K::NOUN)));

        match self.generate_and_append(source, name, category).await {
            Ok(asset) => {
                tracing::info!(
                    target: "fitroom::registry",
                    id = %asset.id,
                    name = %asset.name,
                    category = %asset.category,
                    "{} created",
                    K::NOUN
                );
                self.notifier.notify(Notification::success(format!(
                    "3D {} created successfully!",
                    K::NOUN
                )));
                Ok(asset)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn generate_and_append(
        &self,
        source: ImageRef,
        name: &str,
        category: K::Category,
    ) -> StudioResult<Asset<K>> {
        let response = self
            .generator
            .reconstruct_asset(&AssetRequest {
                image: source.clone(),
                name: name.to_string(),
                class: K::CLASS,
            })
            .await?;

        let _guard = self.write_lock.lock().await;
        let mut items = self.load()?;
        let id = self.fresh_id(&items)?;
        let asset = Asset {
            id,
            name: name.to_string(),
            category,
            image: source,
            model: Some(response.model_url),
        };
        items.push(asset.clone());
        store_json(self.store.as_ref(), &self.key, &items)?;
        Ok(asset)
    }

    fn fresh_id(&self, existing: &[Asset<K>]) -> StudioResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if !existing.iter().any(|a| a.id == id) {
                return Ok(id);
            }
            tracing::warn!(target: "fitroom::registry", id = %id, "id collision; drawing another");
        }
        Err(StudioError::validation(format!(
            "could not allocate a unique {} id",
            K::NOUN
        )))
    }

    fn fail(&self, err: StudioError) -> StudioError {
        let message = match &err {
            StudioError::Validation(msg) => msg.clone(),
            _ => format!("Failed to generate 3D {}. Please try again.", K::NOUN),
        };
        tracing::warn!(target: "fitroom::registry", error = %err, "{} creation failed", K::NOUN);
        self.notifier.notify(Notification::error(message));
        err
    }
}
