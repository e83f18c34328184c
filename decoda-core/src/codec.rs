//! Codec identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Codec exercised by a test suite.
///
/// The serialized form is the canonical name stored in suite files
/// (e.g. `"H.264"`), which is also what `FromStr`/`Display` use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    /// H.264 / AVC
    #[serde(rename = "H.264")]
    H264,
    /// H.265 / HEVC
    #[serde(rename = "H.265")]
    H265,
    /// VP8
    #[serde(rename = "VP8")]
    Vp8,
    /// VP9
    #[serde(rename = "VP9")]
    Vp9,
    /// AV1
    #[serde(rename = "AV1")]
    Av1,
    /// AAC audio
    #[serde(rename = "AAC")]
    Aac,
}

impl Codec {
    /// Canonical name as stored in suite files.
    pub fn as_str(self) -> &'static str {
        match self {
            Codec::H264 => "H.264",
            Codec::H265 => "H.265",
            Codec::Vp8 => "VP8",
            Codec::Vp9 => "VP9",
            Codec::Av1 => "AV1",
            Codec::Aac => "AAC",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a codec name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown codec '{0}'")]
pub struct UnknownCodec(pub String);

impl FromStr for Codec {
    type Err = UnknownCodec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the canonical form and the common undotted spelling.
        match s.to_ascii_uppercase().as_str() {
            "H.264" | "H264" | "AVC" => Ok(Codec::H264),
            "H.265" | "H265" | "HEVC" => Ok(Codec::H265),
            "VP8" => Ok(Codec::Vp8),
            "VP9" => Ok(Codec::Vp9),
            "AV1" => Ok(Codec::Av1),
            "AAC" => Ok(Codec::Aac),
            _ => Err(UnknownCodec(s.to_string())),
        }
    }
}
