//! Studio: wires store, session, registries, catalog and compositor together and
//! acts as the operation boundary for composition (single-flight, notifications,
//! last-known-good image on failure).

use crate::catalog::{Catalog, CatalogItem};
use crate::composition::{CompositionService, StubCompositor};
use crate::config::{LatencyProfile, StudioConfig};
use crate::error::{StudioError, StudioResult};
use crate::generation::{ModelGenerator, StubModelGenerator};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::models::{Accessory, Clothing, ExportFormat, ImageRef};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::registry::{AccessoryRegistry, ClothingRegistry};
use crate::session::AvatarSession;
use crate::storage::{KeyValueStore, SledStore, StorageKeys};
use std::sync::Arc;

/// Injected collaborators. [`StudioParts::new`] fills in the stub/default ones.
pub struct StudioParts {
    pub store: Arc<dyn KeyValueStore>,
    pub keys: StorageKeys,
    pub notifier: Arc<dyn Notifier>,
    pub ids: Arc<dyn IdGenerator>,
    pub generator: Arc<dyn ModelGenerator>,
    pub compositor: Arc<dyn CompositionService>,
    pub latency: LatencyProfile,
}

impl StudioParts {
    /// Default wiring over `store`: tracing notifications, UUID ids, stub generator and compositor.
    pub fn new(store: Arc<dyn KeyValueStore>, latency: LatencyProfile) -> Self {
        Self {
            store,
            keys: StorageKeys::default(),
            notifier: Arc::new(TracingNotifier),
            ids: Arc::new(UuidGenerator),
            generator: Arc::new(StubModelGenerator::new(latency)),
            compositor: Arc::new(StubCompositor::new(latency)),
            latency,
        }
    }

    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ModelGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_compositor(mut self, compositor: Arc<dyn CompositionService>) -> Self {
        self.compositor = compositor;
        self
    }
}

pub struct Studio {
    notifier: Arc<dyn Notifier>,
    compositor: Arc<dyn CompositionService>,
    session: AvatarSession,
    accessories: AccessoryRegistry,
    clothing: ClothingRegistry,
    catalog: Catalog,
}

impl Studio {
    /// Opens the sled store described by `config` and wires the default collaborators.
    pub fn open(config: &StudioConfig) -> StudioResult<Self> {
        let store = SledStore::open_path(&config.data_dir, &config.namespace)?
            .with_quota(config.storage_quota_bytes)
            .with_flush_on_write(config.flush_on_write);
        tracing::info!(
            target: "fitroom::studio",
            data_dir = %config.data_dir.display(),
            namespace = %config.namespace,
            "studio store opened"
        );
        let parts = StudioParts::new(Arc::new(store), config.latency)
            .with_keys(StorageKeys::for_namespace(&config.namespace));
        Ok(Self::from_parts(parts))
    }

    pub fn from_parts(parts: StudioParts) -> Self {
        let StudioParts {
            store,
            keys,
            notifier,
            ids,
            generator,
            compositor,
            latency,
        } = parts;

        let session = AvatarSession::new(
            store.clone(),
            &keys,
            generator.clone(),
            notifier.clone(),
            latency,
        );
        let accessories = AccessoryRegistry::new(
            store.clone(),
            keys.accessories.clone(),
            ids.clone(),
            generator.clone(),
            notifier.clone(),
        );
        let clothing = ClothingRegistry::new(
            store,
            keys.clothing.clone(),
            ids.clone(),
            generator,
            notifier.clone(),
        );

        Self {
            notifier,
            compositor,
            session,
            accessories,
            clothing,
            catalog: Catalog::new(ids),
        }
    }

    pub fn session(&self) -> &AvatarSession {
        &self.session
    }

    pub fn accessories(&self) -> &AccessoryRegistry {
        &self.accessories
    }

    pub fn clothing(&self) -> &ClothingRegistry {
        &self.clothing
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shows `avatar` wearing the garment in `clothing_image`.
    pub async fn try_on_clothing(
        &self,
        avatar: &ImageRef,
        clothing_image: &ImageRef,
    ) -> StudioResult<ImageRef> {
        let _permit = self.begin("try on clothing")?;
        let result = self.compositor.try_on_clothing(avatar, clothing_image).await;
        self.settle(result, "Failed to try on clothing", None)
    }

    pub async fn try_on_catalog_item(
        &self,
        avatar: &ImageRef,
        item: &CatalogItem,
    ) -> StudioResult<ImageRef> {
        self.try_on_clothing(avatar, &item.image).await
    }

    pub async fn apply_accessory(
        &self,
        avatar: &ImageRef,
        accessory: &Accessory,
    ) -> StudioResult<ImageRef> {
        let _permit = self.begin("apply accessory")?;
        let result = self.compositor.apply_accessory(avatar, accessory).await;
        self.settle(
            result,
            "Failed to apply accessory",
            Some(format!("{} applied to avatar", accessory.name)),
        )
    }

    pub async fn apply_clothing(&self, avatar: &ImageRef, clothing: &Clothing) -> StudioResult<ImageRef> {
        let _permit = self.begin("apply clothing")?;
        let result = self.compositor.apply_clothing(avatar, clothing).await;
        self.settle(
            result,
            "Failed to apply clothing",
            Some(format!("{} applied to avatar", clothing.name)),
        )
    }

    /// Exports `avatar` in `format`. Does not change the displayed image.
    pub async fn export_avatar(&self, avatar: &ImageRef, format: ExportFormat) -> StudioResult<ImageRef> {
        let _permit = self.begin("export avatar")?;
        match self.compositor.export_avatar(avatar, format).await {
            Ok(handle) => {
                let upper = format.label().to_uppercase();
                tracing::info!(target: "fitroom::studio", format = %upper, "avatar exported");
                self.notifier
                    .notify(Notification::success(format!("Avatar exported in {} format", upper)));
                Ok(handle)
            }
            Err(e) => Err(self.fail(e, "Failed to export avatar")),
        }
    }

    /// Applies to the session's current avatar; fails with [`StudioError::NoAvatar`] when there is none.
    pub async fn apply_accessory_to_current(&self, accessory: &Accessory) -> StudioResult<ImageRef> {
        let avatar = self.current_avatar()?;
        self.apply_accessory(&avatar, accessory).await
    }

    pub async fn apply_clothing_to_current(&self, clothing: &Clothing) -> StudioResult<ImageRef> {
        let avatar = self.current_avatar()?;
        self.apply_clothing(&avatar, clothing).await
    }

    fn current_avatar(&self) -> StudioResult<ImageRef> {
        self.session.avatar_image().ok_or_else(|| {
            self.notifier.notify(Notification::error("Please create an avatar first"));
            StudioError::NoAvatar
        })
    }

    fn begin(&self, operation: &str) -> StudioResult<crate::flight::FlightPermit<'_>> {
        self.session
            .flight()
            .try_begin(operation)
            .map_err(|e| self.fail(e, "Please wait for the current operation to finish"))
    }

    /// Records a successful composition as the displayed image; on failure the
    /// displayed image stays as it was.
    fn settle(
        &self,
        result: StudioResult<ImageRef>,
        failure: &str,
        success: Option<String>,
    ) -> StudioResult<ImageRef> {
        match result {
            Ok(image) => {
                self.session.set_displayed(Some(image.clone()));
                if let Some(msg) = success {
                    self.notifier.notify(Notification::success(msg));
                }
                Ok(image)
            }
            Err(e) => Err(self.fail(e, failure)),
        }
    }

    fn fail(&self, err: StudioError, message: &str) -> StudioError {
        tracing::warn!(target: "fitroom::studio", error = %err, "{}", message);
        self.notifier.notify(Notification::error(message));
        err
    }
}
