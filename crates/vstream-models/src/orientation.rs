//! Stream geometry and coarse orientation bucketing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pixel dimensions of the primary video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Geometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Orientation bucket used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Exactly 16:9 after flooring
    Landscape,
    /// Exactly 9:16 after flooring
    Portrait,
    /// Everything else, including square and degenerate streams
    Other,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown orientation: {0}")]
pub struct OrientationParseError(pub String);

impl FromStr for Orientation {
    type Err = OrientationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            "other" => Ok(Orientation::Other),
            _ => Err(OrientationParseError(s.to_string())),
        }
    }
}

/// Bucket a geometry into landscape, portrait or other.
///
/// A coarse check against the 16:9 reference ratio, not a
/// general aspect-ratio classifier: `landscape` when
/// `width == floor(16 * height / 9)`, `portrait` when
/// `height == floor(16 * width / 9)`, `other` for everything else. Zero-sized
/// streams are always `other`.
pub fn classify(geometry: Geometry) -> Orientation {
    let Geometry { width, height } = geometry;
    if width == 0 || height == 0 {
        return Orientation::Other;
    }

    let width = u64::from(width);
    let height = u64::from(height);

    if width == 16 * height / 9 {
        Orientation::Landscape
    } else if height == 16 * width / 9 {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}
