//! Clothing-type classes used for layering decisions.

use serde::{Deserialize, Serialize};

/// Coarse clothing class of a content-store category.
///
/// The content store keeps these as small integers on each category entry;
/// unrecognised values (and categories that never set one) decode to
/// [`ClothingType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "u8", into = "u8")]
pub enum ClothingType {
    Top,
    Bottom,
    OnePiece,
    #[default]
    Unknown,
    Jacket,
}

impl ClothingType {
    /// Whether this garment covers the upper body.
    #[must_use]
    pub const fn covers_top(self) -> bool {
        matches!(self, Self::Top | Self::OnePiece)
    }

    /// Whether this garment covers the lower body.
    #[must_use]
    pub const fn covers_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::OnePiece)
    }
}

impl From<u8> for ClothingType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Top,
            2 => Self::Bottom,
            3 => Self::OnePiece,
            5 => Self::Jacket,
            _ => Self::Unknown,
        }
    }
}

impl From<ClothingType> for u8 {
    fn from(value: ClothingType) -> Self {
        match value {
            ClothingType::Top => 1,
            ClothingType::Bottom => 2,
            ClothingType::OnePiece => 3,
            ClothingType::Unknown => 4,
            ClothingType::Jacket => 5,
        }
    }
}

impl std::fmt::Display for ClothingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Bottom => write!(f, "bottom"),
            Self::OnePiece => write!(f, "one_piece"),
            Self::Unknown => write!(f, "unknown"),
            Self::Jacket => write!(f, "jacket"),
        }
    }
}
