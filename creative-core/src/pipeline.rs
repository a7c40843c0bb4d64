//! Creative Pipeline - Single Entry Point
//!
//! decode -> compose -> evaluate -> persist. Nothing is written unless every
//! earlier step succeeded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::assets::{self, AssetError};
use crate::canvas::{CanvasFormat, CanvasSpec, UnknownFormat};
use crate::catalog::{CatalogError, RuleCatalog, DEFAULT_RETAILER};
use crate::compliance::{ComplianceEvaluator, ComplianceReport};
use crate::config::{ConfigError, EngineConfig};
use crate::hashing::{compute_job_hash, sha256_hex};
use crate::layout::{LayoutEngine, PlacementResult};
use crate::storage::{CreativeId, CreativeStore, FsStore, StorageError};
use crate::text::HeadlineFont;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid packshot: {0}")]
    InvalidPackshot(#[source] AssetError),

    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormat),

    #[error("Creative not found: {0}")]
    NotFound(String),

    #[error("Encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    #[error("Rule catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for PipelineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(id) => PipelineError::NotFound(id),
            other => PipelineError::Storage(other),
        }
    }
}

impl PipelineError {
    /// HTTP-equivalent status for transport layers.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidPackshot(_) | PipelineError::UnknownFormat(_) => 400,
            PipelineError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

/// Non-fatal fallbacks taken while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Logo bytes did not decode; composed without a logo.
    LogoUndecodable { reason: String },
    /// Bold font missing; headline drawn with bitmap glyphs.
    FontUnavailable,
    /// Retailer key unknown; evaluated with `default`.
    UnknownRetailer { requested: String },
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub packshot: Vec<u8>,
    pub logo: Option<Vec<u8>>,
    pub headline: String,
    pub retailer: String,
    pub format: CanvasFormat,
}

impl GenerateRequest {
    pub fn new(packshot: Vec<u8>) -> Self {
        Self {
            packshot,
            logo: None,
            headline: String::new(),
            retailer: DEFAULT_RETAILER.to_string(),
            format: CanvasFormat::default(),
        }
    }

    pub fn with_logo(mut self, logo: Vec<u8>) -> Self {
        self.logo = Some(logo);
        self
    }

    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = headline.into();
        self
    }

    pub fn with_retailer(mut self, retailer: impl Into<String>) -> Self {
        self.retailer = retailer.into();
        self
    }

    pub fn with_format(mut self, format: CanvasFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCreative {
    pub id: CreativeId,
    pub format: CanvasFormat,
    pub canvas: CanvasSpec,
    pub placement: PlacementResult,
    pub retailer: String,
    pub compliance: ComplianceReport,
    pub degradations: Vec<Degradation>,
    pub image_sha256: String,
    pub job_hash: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct JobInputs<'a> {
    headline: &'a str,
    packshot_sha256: String,
    logo_sha256: Option<String>,
}

pub struct CreativePipeline {
    evaluator: ComplianceEvaluator,
    engine: LayoutEngine,
    store: Arc<dyn CreativeStore>,
}

impl CreativePipeline {
    pub fn new(catalog: RuleCatalog, engine: LayoutEngine, store: Arc<dyn CreativeStore>) -> Self {
        Self {
            evaluator: ComplianceEvaluator::new(Arc::new(catalog)),
            engine,
            store,
        }
    }

    /// Filesystem store, catalog and font as the config describes.
    pub fn from_config(config: &EngineConfig) -> Result<Self, PipelineError> {
        let catalog = match &config.rules_path {
            Some(path) => RuleCatalog::load(path)?,
            None => RuleCatalog::builtin(),
        };
        let font = HeadlineFont::locate_or_fallback(config.font_path.as_deref());
        let store = Arc::new(FsStore::new(&config.output_dir));
        Ok(Self::new(catalog, LayoutEngine::new(font), store))
    }

    pub fn evaluator(&self) -> &ComplianceEvaluator {
        &self.evaluator
    }

    pub fn catalog(&self) -> &RuleCatalog {
        self.evaluator.catalog()
    }

    /// Compose, score and store a creative.
    #[tracing::instrument(skip_all, fields(retailer = %request.retailer, format = %request.format))]
    pub fn generate(&self, request: &GenerateRequest) -> Result<GeneratedCreative, PipelineError> {
        let packshot = assets::decode(&request.packshot).map_err(PipelineError::InvalidPackshot)?;

        let mut degradations = vec![];
        let logo = match &request.logo {
            Some(bytes) => match assets::decode(bytes) {
                Ok(logo) => Some(logo),
                Err(e) => {
                    warn!(error = %e, "logo ignored");
                    degradations.push(Degradation::LogoUndecodable { reason: e.to_string() });
                    None
                }
            },
            None => None,
        };
        if self.engine.font().is_fallback() {
            degradations.push(Degradation::FontUnavailable);
        }

        let canvas = request.format.spec();
        let composition = self.engine.compose(canvas, packshot, logo, &request.headline);

        let evaluation = self.evaluator.evaluate(
            canvas,
            composition.placement,
            &request.headline,
            &request.retailer,
        );
        if evaluation.fell_back {
            warn!(requested = %request.retailer, "unknown retailer, using default rules");
            degradations.push(Degradation::UnknownRetailer {
                requested: request.retailer.clone(),
            });
        }

        let png = composition.creative.encode_png()?;
        let job_hash = compute_job_hash(
            &evaluation.retailer,
            request.format.name(),
            &JobInputs {
                headline: &request.headline,
                packshot_sha256: sha256_hex(&request.packshot),
                logo_sha256: request.logo.as_deref().map(sha256_hex),
            },
            ENGINE_VERSION,
        )?;

        let id = composition.creative.id;
        self.store.put(&id, &png)?;

        info!(
            id = %id,
            status = ?evaluation.report.status,
            packshot_pct = evaluation.report.packshot_pct,
            degraded = degradations.len(),
            "creative generated"
        );

        Ok(GeneratedCreative {
            id,
            format: request.format,
            canvas,
            placement: composition.placement,
            retailer: evaluation.retailer,
            compliance: evaluation.report,
            degradations,
            image_sha256: sha256_hex(&png),
            job_hash,
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
        })
    }

    /// PNG bytes of a stored creative.
    #[tracing::instrument(skip(self))]
    pub fn fetch(&self, id: &str) -> Result<Vec<u8>, PipelineError> {
        Ok(self.store.get_raw(id)?)
    }
}
