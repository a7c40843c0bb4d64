//! Compliance Evaluator
//!
//! Scores a composed layout against a retailer rule. Pure: same inputs, same report.
//!
//! Prohibited words match as substrings of the lowercased headline, so "free"
//! also flags "freedom". Safe-zone margins are reported for downstream QA and
//! do not gate the status.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{RetailerRule, RuleCatalog};
use crate::canvas::CanvasSpec;
use crate::layout::PlacementResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeZonePx {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Packshot share of canvas area, rounded to 3 decimals. Display only.
    pub packshot_pct: f64,
    pub packshot_ok: bool,
    /// Matches in catalog order.
    pub prohibited_words_found: Vec<String>,
    pub headline_ok: bool,
    pub safe_zone_px: SafeZonePx,
    pub status: ComplianceStatus,
}

impl ComplianceReport {
    pub fn passed(&self) -> bool {
        self.status == ComplianceStatus::Pass
    }
}

/// Unrounded packshot share of the canvas; 0.0 for an empty canvas.
pub fn packshot_share(canvas: CanvasSpec, packshot: PlacementResult) -> f64 {
    let canvas_area = canvas.area();
    if canvas_area == 0 {
        return 0.0;
    }
    packshot.area() as f64 / canvas_area as f64
}

pub fn safe_zone(canvas: CanvasSpec, rule: &RetailerRule) -> SafeZonePx {
    let horizontal = (canvas.width as f64 * rule.safe_zone_pct).floor() as u32;
    let vertical = (canvas.height as f64 * rule.safe_zone_pct).floor() as u32;
    SafeZonePx {
        left: horizontal,
        right: horizontal,
        top: vertical,
        bottom: vertical,
    }
}

pub fn prohibited_matches(headline: &str, rule: &RetailerRule) -> Vec<String> {
    let lowered = headline.to_lowercase();
    rule.prohibited_words
        .iter()
        .filter(|w| lowered.contains(w.as_str()))
        .cloned()
        .collect()
}

/// Evaluate against an already-resolved rule.
pub fn evaluate(
    canvas: CanvasSpec,
    packshot: PlacementResult,
    headline: &str,
    rule: &RetailerRule,
) -> ComplianceReport {
    let share = packshot_share(canvas, packshot);
    let packshot_ok = share <= rule.max_packshot_pct;

    let prohibited_words_found = prohibited_matches(headline, rule);
    let headline_ok = prohibited_words_found.is_empty();

    let status = if packshot_ok && headline_ok {
        ComplianceStatus::Pass
    } else {
        ComplianceStatus::Fail
    };

    ComplianceReport {
        packshot_pct: (share * 1000.0).round() / 1000.0,
        packshot_ok,
        prohibited_words_found,
        headline_ok,
        safe_zone_px: safe_zone(canvas, rule),
        status,
    }
}

/// Report plus which catalog entry produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub retailer: String,
    pub fell_back: bool,
    pub report: ComplianceReport,
}

/// Evaluator bound to an immutable catalog, shareable across threads.
#[derive(Debug, Clone)]
pub struct ComplianceEvaluator {
    catalog: Arc<RuleCatalog>,
}

impl ComplianceEvaluator {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Unknown retailer keys are evaluated with the `default` rule.
    pub fn evaluate(
        &self,
        canvas: CanvasSpec,
        packshot: PlacementResult,
        headline: &str,
        retailer: &str,
    ) -> Evaluation {
        let resolved = self.catalog.resolve(retailer);
        Evaluation {
            retailer: resolved.retailer.to_string(),
            fell_back: resolved.fell_back,
            report: evaluate(canvas, packshot, headline, resolved.rule),
        }
    }
}

impl Default for ComplianceEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(RuleCatalog::builtin()))
    }
}
