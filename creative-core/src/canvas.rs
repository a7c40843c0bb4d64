//! Canvas Formats - Fixed Output Sizes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown canvas format: {0} (expected feed or story)")]
pub struct UnknownFormat(pub String);

/// Named output format. Each maps to one immutable pixel size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasFormat {
    #[default]
    Feed,
    Story,
}

impl CanvasFormat {
    pub const ALL: [CanvasFormat; 2] = [CanvasFormat::Feed, CanvasFormat::Story];

    pub fn name(&self) -> &'static str {
        match self {
            CanvasFormat::Feed => "feed",
            CanvasFormat::Story => "story",
        }
    }

    pub fn spec(&self) -> CanvasSpec {
        match self {
            CanvasFormat::Feed => CanvasSpec::new(1200, 1200),
            CanvasFormat::Story => CanvasSpec::new(1080, 1920),
        }
    }
}

impl fmt::Display for CanvasFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CanvasFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feed" => Ok(CanvasFormat::Feed),
            "story" => Ok(CanvasFormat::Story),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Canvas pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
}

impl CanvasSpec {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
