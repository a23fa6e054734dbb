//! Generative-AI vendors and the media they produce.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Third-party generation API that runs async jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Wavespeed (Seedance video models)
    Wavespeed,
    /// FAL queue API (audio, DiffRhythm)
    Fal,
    /// Runway Gen-4 video
    Runway,
    /// OpenAI Sora video
    Sora,
    /// Suno music
    Suno,
    /// GoAPI unified tasks (Udio music)
    GoApi,
}

impl Vendor {
    pub const ALL: [Vendor; 6] = [
        Vendor::Wavespeed,
        Vendor::Fal,
        Vendor::Runway,
        Vendor::Sora,
        Vendor::Suno,
        Vendor::GoApi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Wavespeed => "wavespeed",
            Vendor::Fal => "fal",
            Vendor::Runway => "runway",
            Vendor::Sora => "sora",
            Vendor::Suno => "suno",
            Vendor::GoApi => "goapi",
        }
    }

    /// Prefix for this vendor's environment variables (`RUNWAY_API_KEY`, ...).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Vendor::Wavespeed => "WAVESPEED",
            Vendor::Fal => "FAL",
            Vendor::Runway => "RUNWAY",
            Vendor::Sora => "OPENAI",
            Vendor::Suno => "SUNO",
            Vendor::GoApi => "GOAPI",
        }
    }

    /// What the vendor is used for.
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Vendor::Wavespeed | Vendor::Runway | Vendor::Sora => MediaKind::Video,
            Vendor::Fal => MediaKind::Audio,
            Vendor::Suno | Vendor::GoApi => MediaKind::Music,
        }
    }

    /// Concurrent in-flight jobs the vendor tolerates before rate limiting.
    pub fn default_max_in_flight(&self) -> usize {
        match self {
            Vendor::Wavespeed => 3,
            Vendor::Fal => 2,
            Vendor::Runway => 2,
            Vendor::Sora => 1,
            Vendor::Suno => 2,
            Vendor::GoApi => 5,
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown vendor: {0}")]
pub struct UnknownVendor(pub String);

impl FromStr for Vendor {
    type Err = UnknownVendor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "wavespeed" | "seedance" => Ok(Vendor::Wavespeed),
            "fal" | "diffrhythm" => Ok(Vendor::Fal),
            "runway" => Ok(Vendor::Runway),
            "sora" | "openai" => Ok(Vendor::Sora),
            "suno" => Ok(Vendor::Suno),
            "goapi" | "udio" => Ok(Vendor::GoApi),
            _ => Err(UnknownVendor(s.to_string())),
        }
    }
}

/// Kind of asset a generation job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Music,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Music => "music",
        }
    }
}
