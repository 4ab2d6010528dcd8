//! Persisted record shapes: image handles, measurement profiles and user-created assets.
//!
//! JSON field names match the layout already stored by existing clients
//! (`bodyType`, `imageUrl`, `model3dUrl`), so stored data stays readable.

use crate::error::{StudioError, StudioResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque handle to image bytes (object URL, file path, ...). Never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// True for an empty or whitespace-only handle, i.e. nothing was uploaded.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Declares a closed, lowercase-labelled enum with `label()`, `all()`, `Display` and `FromStr`.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            pub fn all() -> &'static [Self] {
                &[$(Self::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = StudioError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::all()
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| StudioError::validation(format!("unknown {} '{}'", $what, wanted)))
            }
        }
    };
}

labelled_enum!(Gender, "gender" {
    Male => "male",
    Female => "female",
    Other => "other",
});

labelled_enum!(
    /// Body shape label chosen on the measurement form.
    BodyType, "body type" {
        Slim => "slim",
        Athletic => "athletic",
        Average => "average",
        Curvy => "curvy",
        Plus => "plus",
    }
);

labelled_enum!(AccessoryType, "accessory type" {
    Cap => "cap",
    Glasses => "glasses",
    Other => "other",
});

labelled_enum!(ClothingType, "clothing type" {
    Shirt => "shirt",
    Pants => "pants",
    Dress => "dress",
    Jacket => "jacket",
    Other => "other",
});

labelled_enum!(
    /// Target format of an avatar export. GLB when unspecified.
    ExportFormat, "export format" {
        Glb => "glb",
        Obj => "obj",
        Fbx => "fbx",
    }
);

impl Default for ExportFormat {
    fn default() -> Self {
        Self::Glb
    }
}

/// Body measurement profile. Lengths in centimetres, weight in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    pub height: f64,
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub inseam: f64,
    pub gender: Gender,
    pub body_type: BodyType,
}

impl Default for Measurements {
    /// Starting values of the measurement form.
    fn default() -> Self {
        Self {
            height: 170.0,
            weight: 70.0,
            chest: 90.0,
            waist: 80.0,
            hips: 95.0,
            inseam: 80.0,
            gender: Gender::Male,
            body_type: BodyType::Average,
        }
    }
}

impl Measurements {
    /// Every numeric field must be finite and strictly positive.
    pub fn validate(&self) -> StudioResult<()> {
        for (field, value) in self.numeric_fields() {
            if !value.is_finite() || value <= 0.0 {
                return Err(StudioError::validation(format!(
                    "{} must be a positive number, got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }

    fn numeric_fields(&self) -> [(&'static str, f64); 6] {
        [
            ("height", self.height),
            ("weight", self.weight),
            ("chest", self.chest),
            ("waist", self.waist),
            ("hips", self.hips),
            ("inseam", self.inseam),
        ]
    }
}

/// One kind of user-created asset: fixes its type labels, storage key and wording.
pub trait AssetKind: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    type Category: Copy
        + Eq
        + fmt::Debug
        + fmt::Display
        + FromStr<Err = StudioError>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync;

    /// Noun used in log lines and notifications ("accessory", "clothing").
    const NOUN: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessoryKind;

impl AssetKind for AccessoryKind {
    type Category = AccessoryType;
    const NOUN: &'static str = "accessory";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClothingKind;

impl AssetKind for ClothingKind {
    type Category = ClothingType;
    const NOUN: &'static str = "clothing";
}

/// A user-created accessory or clothing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K::Category: Serialize",
    deserialize = "K::Category: DeserializeOwned"
))]
pub struct Asset<K: AssetKind> {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: K::Category,
    #[serde(rename = "imageUrl")]
    pub image: ImageRef,
    /// Generated 3D model; `None` while reconstruction has not produced one.
    /// The stub generator returns the source image here.
    #[serde(rename = "model3dUrl", default)]
    pub model: Option<ImageRef>,
}

pub type Accessory = Asset<AccessoryKind>;
pub type Clothing = Asset<ClothingKind>;
