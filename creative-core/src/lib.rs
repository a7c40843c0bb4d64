//! Creative Core - Retail Creative Builder
//!
//! # The Pipeline
//! 1. Decode the packshot (fatal on failure) and optional logo (dropped on failure)
//! 2. Compose onto a fixed canvas: packshot at 45% of the area, logo top-left, headline near the bottom
//! 3. Evaluate the layout against the retailer's rule set
//! 4. Persist the PNG under a fresh identifier and return it with the report

pub mod assets;
pub mod canvas;
pub mod catalog;
pub mod compliance;
pub mod config;
pub mod hashing;
pub mod layout;
pub mod pipeline;
pub mod raster;
pub mod storage;
pub mod text;

pub use assets::{decode, AssetError, ImageAsset};
pub use canvas::{CanvasFormat, CanvasSpec};
pub use catalog::{RetailerRule, RuleCatalog};
pub use compliance::{evaluate, ComplianceEvaluator, ComplianceReport, ComplianceStatus, SafeZonePx};
pub use config::EngineConfig;
pub use layout::{ComposedCreative, Composition, LayoutEngine, PlacementResult};
pub use pipeline::{CreativePipeline, Degradation, GenerateRequest, GeneratedCreative, PipelineError};
pub use storage::{CreativeId, CreativeStore, FsStore, MemoryStore, StorageError};
pub use text::HeadlineFont;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
