//! Avatar session: the single active avatar's image and measurement profile.
//!
//! Image and measurements are two independent keys. A reader that finds only one
//! of them treats the session as incomplete.

use crate::config::{simulate, LatencyProfile};
use crate::error::{StudioError, StudioResult};
use crate::flight::SingleFlight;
use crate::generation::{GenerationRequest, ModelGenerator};
use crate::models::{ImageRef, Measurements};
use crate::notify::{Notification, Notifier};
use crate::storage::{load_json, store_json, KeyValueStore, StorageKeys};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Avatar creation flow: `NoAvatar -> Creating -> Ready`, `Ready -> Editing -> Creating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NoAvatar = 0,
    Creating = 1,
    Ready = 2,
    Editing = 3,
}

impl SessionPhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Creating,
            2 => Self::Ready,
            3 => Self::Editing,
            _ => Self::NoAvatar,
        }
    }
}

pub struct AvatarSession {
    store: Arc<dyn KeyValueStore>,
    image_key: String,
    measurements_key: String,
    generator: Arc<dyn ModelGenerator>,
    notifier: Arc<dyn Notifier>,
    latency: LatencyProfile,
    flight: SingleFlight,
    phase: AtomicU8,
    /// Latest composed look in this process; `None` shows the persisted image.
    displayed: RwLock<Option<ImageRef>>,
}

impl AvatarSession {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        keys: &StorageKeys,
        generator: Arc<dyn ModelGenerator>,
        notifier: Arc<dyn Notifier>,
        latency: LatencyProfile,
    ) -> Self {
        let session = Self {
            store,
            image_key: keys.avatar_image.clone(),
            measurements_key: keys.measurements.clone(),
            generator,
            notifier,
            latency,
            flight: SingleFlight::new(),
            phase: AtomicU8::new(SessionPhase::NoAvatar as u8),
            displayed: RwLock::new(None),
        };
        if session.is_complete() {
            session.set_phase(SessionPhase::Ready);
        }
        session
    }

    /// The persisted avatar image, if any. Read failures are logged and read as absent.
    pub fn avatar_image(&self) -> Option<ImageRef> {
        self.read(&self.image_key)
    }

    /// The persisted measurement profile, if any.
    pub fn measurements(&self) -> Option<Measurements> {
        self.read(&self.measurements_key)
    }

    /// True when both the image and the measurements are stored.
    pub fn is_complete(&self) -> bool {
        self.avatar_image().is_some() && self.measurements().is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Gate shared by every mutating operation on this session.
    pub fn flight(&self) -> &SingleFlight {
        &self.flight
    }

    /// The image to show: the last composed result, else the persisted avatar.
    pub fn displayed_image(&self) -> Option<ImageRef> {
        let composed = self
            .displayed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        composed.or_else(|| self.avatar_image())
    }

    pub(crate) fn set_displayed(&self, image: Option<ImageRef>) {
        *self.displayed.write().unwrap_or_else(PoisonError::into_inner) = image;
    }

    /// `Ready -> Editing`: the user reopened the measurement form.
    pub fn begin_edit(&self) -> StudioResult<()> {
        self.transition(SessionPhase::Ready, SessionPhase::Editing)
    }

    /// `Editing -> Ready` without resubmitting.
    pub fn cancel_edit(&self) -> StudioResult<()> {
        self.transition(SessionPhase::Editing, SessionPhase::Ready)
    }

    /// Validates `measurements`, generates the avatar from `source` and persists both,
    /// replacing any previous avatar. Returns the avatar image reference.
    pub async fn create_or_replace(
        &self,
        source: ImageRef,
        measurements: Measurements,
    ) -> StudioResult<ImageRef> {
        if source.is_blank() {
            return Err(self.fail(StudioError::validation("Please upload a photo first")));
        }
        if let Err(e) = measurements.validate() {
            return Err(self.fail(e));
        }
        let _permit = self.flight.try_begin("create avatar").map_err(|e| self.fail(e))?;

        let started_from = self.phase();
        self.set_phase(SessionPhase::Creating);
        self.notifier.notify(Notification::info("Creating your 3D avatar..."));

        match self.generate_and_persist(source, &measurements).await {
            Ok(image) => {
                self.set_displayed(None);
                self.set_phase(SessionPhase::Ready);
                tracing::info!(
                    target: "fitroom::session",
                    image = %image,
                    body_type = %measurements.body_type,
                    "avatar created"
                );
                self.notifier
                    .notify(Notification::success("Your 3D avatar has been created!"));
                Ok(image)
            }
            Err(e) => {
                self.set_phase(started_from);
                Err(self.fail(e))
            }
        }
    }

    /// Persists `image` as the avatar's displayed image, leaving measurements untouched.
    pub async fn save(&self, image: ImageRef) -> StudioResult<()> {
        let _permit = self.flight.try_begin("save avatar").map_err(|e| self.fail(e))?;
        simulate(self.latency.save()).await;

        store_json(self.store.as_ref(), &self.image_key, &image)
            .map_err(|e| self.fail(e.into()))?;
        self.set_displayed(None);
        if self.phase() == SessionPhase::NoAvatar && self.measurements().is_some() {
            self.set_phase(SessionPhase::Ready);
        }
        tracing::info!(target: "fitroom::session", image = %image, "avatar image saved");
        self.notifier.notify(Notification::success("Avatar saved to your profile"));
        Ok(())
    }

    async fn generate_and_persist(
        &self,
        source: ImageRef,
        measurements: &Measurements,
    ) -> StudioResult<ImageRef> {
        let request = GenerationRequest::new(source, measurements);
        let image = self.generator.generate_avatar(&request).await?.model_url;

        let previous = self.store.get(&self.measurements_key)?;
        store_json(self.store.as_ref(), &self.measurements_key, measurements)?;
        if let Err(e) = store_json(self.store.as_ref(), &self.image_key, &image) {
            self.restore(&self.measurements_key, previous);
            return Err(e.into());
        }
        Ok(image)
    }

    /// Puts `key` back to `previous` after a failed paired write. Best effort.
    fn restore(&self, key: &str, previous: Option<String>) {
        let res = match previous {
            Some(v) => self.store.set(key, &v),
            None => self.store.remove(key),
        };
        if let Err(e) = res {
            tracing::error!(target: "fitroom::session", key = key, error = %e, "rollback failed");
        }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match load_json(self.store.as_ref(), key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "fitroom::session", key = key, error = %e, "unreadable session value");
                None
            }
        }
    }

    fn transition(&self, from: SessionPhase, to: SessionPhase) -> StudioResult<()> {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|raw| {
                StudioError::InvalidTransition(format!(
                    "cannot move to {:?} from {:?}",
                    to,
                    SessionPhase::from_u8(raw)
                ))
            })
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn fail(&self, err: StudioError) -> StudioError {
        let message = match &err {
            StudioError::Validation(msg) => msg.clone(),
            StudioError::Busy(_) => "Please wait for the current avatar operation to finish".to_string(),
            StudioError::Storage(e) => format!("Could not save your avatar: {}", e),
            other => format!("Avatar operation failed: {}", other),
        };
        tracing::warn!(target: "fitroom::session", error = %err, "avatar operation failed");
        self.notifier.notify(Notification::error(message));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::StubModelGenerator;
    use crate::notify::TracingNotifier;
    use crate::storage::MemoryStore;

    fn session(store: Arc<MemoryStore>) -> AvatarSession {
        AvatarSession::new(
            store,
            &StorageKeys::default(),
            Arc::new(StubModelGenerator::new(LatencyProfile::instant())),
            Arc::new(TracingNotifier),
            LatencyProfile::instant(),
        )
    }

    #[tokio::test]
    async fn phase_follows_creation_and_edit() {
        let store = Arc::new(MemoryStore::new());
        let s = session(store.clone());
        assert_eq!(s.phase(), SessionPhase::NoAvatar);
        assert!(matches!(s.begin_edit(), Err(StudioError::InvalidTransition(_))));

        s.create_or_replace("img1".into(), Measurements::default()).await.unwrap();
        assert_eq!(s.phase(), SessionPhase::Ready);

        s.begin_edit().unwrap();
        assert_eq!(s.phase(), SessionPhase::Editing);
        s.create_or_replace("img2".into(), Measurements::default()).await.unwrap();
        assert_eq!(s.phase(), SessionPhase::Ready);

        // A fresh session over the same store starts out Ready.
        assert_eq!(session(store).phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn invalid_measurements_leave_phase_untouched() {
        let s = session(Arc::new(MemoryStore::new()));
        let bad = Measurements { height: -1.0, ..Measurements::default() };
        assert!(s.create_or_replace("img".into(), bad).await.is_err());
        assert_eq!(s.phase(), SessionPhase::NoAvatar);
        assert!(s.avatar_image().is_none());
        assert!(!s.flight().is_busy());
    }

    #[tokio::test]
    async fn image_only_session_is_incomplete() {
        let store = Arc::new(MemoryStore::new());
        let s = session(store.clone());
        s.save("composed".into()).await.unwrap();
        assert_eq!(s.avatar_image(), Some(ImageRef::from("composed")));
        assert!(!s.is_complete());
        assert_eq!(s.phase(), SessionPhase::NoAvatar);
    }
}
