//! Prediction context: a loaded model bound to its label resolution

use crate::catalog::InfoCatalog;
use crate::classifier::{Classifier, ClassifierHandle};
use crate::labels::{LabelResolver, Resolution};
use crate::ranking::{rank_top_k, RankedEntry};
use agrisens_core::{ClassLabel, Result};
use std::sync::Arc;
use tracing::warn;

/// A classifier, its detected capabilities and its label resolver.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct PredictionContext {
    handle: ClassifierHandle,
    resolver: LabelResolver,
}

impl PredictionContext {
    pub fn new(classifier: Arc<dyn Classifier>, resolver: LabelResolver) -> Self {
        let context = Self {
            handle: ClassifierHandle::new(classifier),
            resolver,
        };
        context.check_encoding_assumption();
        context
    }

    /// Warn when integer predictions will be decoded by the unverified
    /// alphabetical fallback.
    fn check_encoding_assumption(&self) {
        if self.resolver.has_decoder() {
            return;
        }

        let name = self.handle.classifier().name();
        let fallback = self.resolver.fallback();
        match self.handle.probabilistic() {
            Some(proba) => {
                let encoded = proba
                    .class_order()
                    .iter()
                    .filter(|c| c.as_index().is_some())
                    .count();
                if encoded == 0 {
                    return;
                }
                warn!(
                    model = name,
                    classes = fallback.len(),
                    "No label decoder: integer classes are decoded assuming alphabetical training encoding"
                );
                if encoded != fallback.len() {
                    warn!(
                        model = name,
                        model_classes = encoded,
                        fallback_classes = fallback.len(),
                        "Model class count differs from the alphabetical fallback; labels may be wrong"
                    );
                }
            }
            None => {
                warn!(
                    model = name,
                    classes = fallback.len(),
                    "No label decoder and no class ordering: integer predictions are decoded assuming alphabetical training encoding"
                );
            }
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.handle.classifier()
    }

    pub fn resolver(&self) -> &LabelResolver {
        &self.resolver
    }

    pub fn supports_ranking(&self) -> bool {
        self.handle.supports_ranking()
    }

    /// True when integer labels can only be decoded by the alphabetical fallback
    pub fn uses_alphabetical_fallback(&self) -> bool {
        !self.resolver.has_decoder()
    }

    /// Raw model output for one row
    pub fn predict_raw(&self, features: &[f64]) -> Result<ClassLabel> {
        self.handle.classifier().predict(features)
    }

    /// Predict and resolve the label for one row
    pub fn predict_label(&self, features: &[f64]) -> Result<Resolution> {
        let raw = self.predict_raw(features)?;
        Ok(self.resolver.resolve_with_source(&raw))
    }

    /// Top-k ranked classes, or `None` when the model has no probability
    /// capability
    pub fn rank(
        &self,
        features: &[f64],
        k: usize,
        catalog: &InfoCatalog,
    ) -> Result<Option<Vec<RankedEntry>>> {
        let Some(proba) = self.handle.probabilistic() else {
            return Ok(None);
        };
        let probabilities = proba.predict_proba(features)?;
        Ok(Some(rank_top_k(
            &probabilities,
            proba.class_order(),
            k,
            &self.resolver,
            catalog,
        )))
    }

    /// Highest class probability, or `None` without a probability capability
    pub fn max_probability(&self, features: &[f64]) -> Result<Option<f64>> {
        let Some(proba) = self.handle.probabilistic() else {
            return Ok(None);
        };
        let probabilities = proba.predict_proba(features)?;
        Ok(probabilities
            .into_iter()
            .filter(|p| !p.is_nan())
            .reduce(f64::max))
    }
}
