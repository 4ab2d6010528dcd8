//! Composition seam: combine an avatar image with an asset and yield a displayable image.
//!
//! [`StubCompositor`] performs no compositing; it returns the avatar unchanged after
//! the configured latency. A rendering backend plugs in by implementing
//! [`CompositionService`] and handing it to [`crate::Studio`].

use crate::config::{simulate, LatencyProfile};
use crate::error::StudioResult;
use crate::models::{Accessory, Clothing, ExportFormat, ImageRef};
use async_trait::async_trait;

#[async_trait]
pub trait CompositionService: Send + Sync {
    /// Dresses the avatar in a garment given only by its image.
    async fn try_on_clothing(
        &self,
        avatar: &ImageRef,
        clothing_image: &ImageRef,
    ) -> StudioResult<ImageRef>;

    async fn apply_accessory(&self, avatar: &ImageRef, accessory: &Accessory)
        -> StudioResult<ImageRef>;

    async fn apply_clothing(&self, avatar: &ImageRef, clothing: &Clothing) -> StudioResult<ImageRef>;

    /// Converts the avatar to `format` and returns a download handle.
    async fn export_avatar(&self, avatar: &ImageRef, format: ExportFormat) -> StudioResult<ImageRef>;
}

/// Identity compositor with simulated processing time.
#[derive(Debug, Clone, Default)]
pub struct StubCompositor {
    latency: LatencyProfile,
}

impl StubCompositor {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl CompositionService for StubCompositor {
    async fn try_on_clothing(
        &self,
        avatar: &ImageRef,
        clothing_image: &ImageRef,
    ) -> StudioResult<ImageRef> {
        tracing::debug!(target: "fitroom::composition", avatar = %avatar, clothing = %clothing_image, "try-on");
        simulate(self.latency.try_on()).await;
        Ok(avatar.clone())
    }

    async fn apply_accessory(
        &self,
        avatar: &ImageRef,
        accessory: &Accessory,
    ) -> StudioResult<ImageRef> {
        tracing::debug!(target: "fitroom::composition", accessory = %accessory.id, "apply accessory");
        simulate(self.latency.apply_accessory()).await;
        Ok(avatar.clone())
    }

    async fn apply_clothing(&self, avatar: &ImageRef, clothing: &Clothing) -> StudioResult<ImageRef> {
        tracing::debug!(target: "fitroom::composition", clothing = %clothing.id, "apply clothing");
        simulate(self.latency.apply_clothing()).await;
        Ok(avatar.clone())
    }

    async fn export_avatar(&self, avatar: &ImageRef, format: ExportFormat) -> StudioResult<ImageRef> {
        tracing::debug!(target: "fitroom::composition", format = %format, "export");
        simulate(self.latency.export()).await;
        Ok(avatar.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn stub_waits_then_returns_avatar() {
        let stub = StubCompositor::new(LatencyProfile::default());
        let start = tokio::time::Instant::now();
        let out = stub
            .try_on_clothing(&ImageRef::from("avatarImg"), &ImageRef::from("clothingImg"))
            .await
            .unwrap();
        assert_eq!(out, ImageRef::from("avatarImg"));
        assert!(start.elapsed() >= Duration::from_millis(1000));

        let start = tokio::time::Instant::now();
        stub.export_avatar(&out, ExportFormat::Obj).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
