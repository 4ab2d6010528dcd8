//! 3D model generation seam.
//!
//! A real backend would upload the photo plus the measurement fields to a
//! reconstruction service and answer with a model URL. Only the stub exists here:
//! it waits out the configured latency and hands back the source image.

use crate::config::{simulate, LatencyProfile};
use crate::error::StudioResult;
use crate::models::{BodyType, Gender, ImageRef, Measurements};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Avatar reconstruction request: the photo plus the flattened measurement form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub image: ImageRef,
    pub height: f64,
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub inseam: f64,
    pub body_type: BodyType,
    pub gender: Gender,
}

impl GenerationRequest {
    pub fn new(image: ImageRef, m: &Measurements) -> Self {
        Self {
            image,
            height: m.height,
            weight: m.weight,
            chest: m.chest,
            waist: m.waist,
            hips: m.hips,
            inseam: m.inseam,
            body_type: m.body_type,
            gender: m.gender,
        }
    }
}

/// Which asset collection a reconstruction is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Accessory,
    Clothing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub image: ImageRef,
    pub name: String,
    pub class: AssetClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub model_url: ImageRef,
}

/// Produces 3D models for avatars and assets.
#[async_trait]
pub trait ModelGenerator: Send + Sync {
    async fn generate_avatar(&self, request: &GenerationRequest) -> StudioResult<GenerationResponse>;

    async fn reconstruct_asset(&self, request: &AssetRequest) -> StudioResult<GenerationResponse>;
}

/// Placeholder generator: identity output after a simulated delay.
#[derive(Debug, Clone, Default)]
pub struct StubModelGenerator {
    latency: LatencyProfile,
}

impl StubModelGenerator {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl ModelGenerator for StubModelGenerator {
    async fn generate_avatar(&self, request: &GenerationRequest) -> StudioResult<GenerationResponse> {
        tracing::debug!(
            target: "fitroom::generation",
            height = request.height,
            weight = request.weight,
            body_type = %request.body_type,
            "generating avatar model"
        );
        simulate(self.latency.avatar_generation()).await;
        Ok(GenerationResponse { model_url: request.image.clone() })
    }

    async fn reconstruct_asset(&self, request: &AssetRequest) -> StudioResult<GenerationResponse> {
        let delay = match request.class {
            AssetClass::Accessory => self.latency.accessory_generation(),
            AssetClass::Clothing => self.latency.clothing_generation(),
        };
        simulate(delay).await;
        Ok(GenerationResponse { model_url: request.image.clone() })
    }
}
