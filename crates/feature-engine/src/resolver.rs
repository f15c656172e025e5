//! Parameter Resolver
//!
//! Turns a feature selection plus user overrides into a [`ResolvedPlan`]:
//! the ordered list of functions to run, each with its final parameters and
//! its output width. All input validation happens here, before extraction.

use crate::error::{ExtractionError, Result};
use crate::params::{FuncParams, Params, PARAM_SEPARATOR};
use crate::registry::{FeatureContext, FeatureDef, FeatureRegistry};
use crate::validate::{validate_freq_bands, validate_sfreq};
use std::collections::HashSet;
use tracing::debug;

/// One selected feature function with its final parameters
#[derive(Debug, Clone)]
pub struct ResolvedFeature {
    def: FeatureDef,
    params: Params,
    width: usize,
}

impl ResolvedFeature {
    pub fn alias(&self) -> &str {
        self.def.alias()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Values contributed per channel
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn def(&self) -> &FeatureDef {
        &self.def
    }

    /// Column suffixes: `alias` for scalar features, `alias_k` otherwise
    pub fn labels(&self) -> Vec<String> {
        if self.def.arity().is_scalar() {
            vec![self.alias().to_string()]
        } else {
            (0..self.width)
                .map(|k| format!("{}_{}", self.alias(), k))
                .collect()
        }
    }
}

/// Ordered feature functions to run on every channel
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    features: Vec<ResolvedFeature>,
    width: usize,
}

impl ResolvedPlan {
    pub fn features(&self) -> &[ResolvedFeature] {
        &self.features
    }

    /// Values produced per channel
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parameters resolved for `alias`
    pub fn params(&self, alias: &str) -> Option<&Params> {
        self.features
            .iter()
            .find(|f| f.alias() == alias)
            .map(ResolvedFeature::params)
    }

    /// Labels of one channel's values, in output order
    pub fn feature_labels(&self) -> Vec<String> {
        self.features.iter().flat_map(ResolvedFeature::labels).collect()
    }

    /// `"{channel}_{feature}"` labels for every column, channel-major
    pub fn column_labels<S: AsRef<str>>(&self, channels: &[S]) -> Vec<String> {
        let features = self.feature_labels();
        channels
            .iter()
            .flat_map(|ch| features.iter().map(move |f| format!("{}_{}", ch.as_ref(), f)))
            .collect()
    }
}

/// Resolves feature selections against a registry
pub struct ParameterResolver<'r> {
    registry: &'r FeatureRegistry,
}

impl<'r> ParameterResolver<'r> {
    pub fn new(registry: &'r FeatureRegistry) -> Self {
        Self { registry }
    }

    /// Validate the selection and overrides, merge overrides into defaults
    /// and fix every function's output width.
    pub fn resolve<S: AsRef<str>>(
        &self,
        selected_funcs: &[S],
        overrides: Option<&FuncParams>,
        ctx: &FeatureContext<'_>,
    ) -> Result<ResolvedPlan> {
        validate_sfreq(ctx.sfreq)?;
        if selected_funcs.is_empty() {
            return Err(ExtractionError::EmptyFeatureSpec);
        }

        let mut seen = HashSet::new();
        let mut defs = Vec::with_capacity(selected_funcs.len());
        for alias in selected_funcs {
            let alias = alias.as_ref();
            let def = self.registry.lookup(alias)?;
            if !seen.insert(alias) {
                return Err(ExtractionError::DuplicateAlias(alias.to_string()));
            }
            defs.push(def);
        }

        if let Some(overrides) = overrides {
            if let Some(alias) = overrides.aliases().find(|a| !seen.contains(a)) {
                return Err(ExtractionError::invalid_param(
                    alias,
                    format!("'{}' is not among the selected feature functions", alias),
                ));
            }
        }

        let uses_bands = defs.iter().any(|d| d.uses_freq_bands());
        validate_freq_bands(ctx.freq_bands, ctx.sfreq, uses_bands)?;

        let mut features = Vec::with_capacity(defs.len());
        for def in defs {
            let params = merge(def, overrides.and_then(|o| o.get(def.alias())))?;
            def.check(&params, ctx)
                .map_err(|e| ExtractionError::invalid_param(def.alias(), e.to_string()))?;

            let width = def.arity().width(&params, ctx);
            if width == 0 {
                return Err(ExtractionError::invalid_param(
                    def.alias(),
                    "parameters leave the function with no output values",
                ));
            }
            debug!("Resolved {} -> {} value(s), params {:?}", def.alias(), width, params);

            features.push(ResolvedFeature {
                def: def.clone(),
                params,
                width,
            });
        }

        let width = features.iter().map(ResolvedFeature::width).sum();
        Ok(ResolvedPlan { features, width })
    }
}

/// Overlay user overrides on a function's defaults
fn merge(def: &FeatureDef, overrides: Option<&Params>) -> Result<Params> {
    let mut params = def.defaults().clone();
    let Some(overrides) = overrides else {
        return Ok(params);
    };

    for (name, value) in overrides.iter() {
        let key = format!("{}{}{}", def.alias(), PARAM_SEPARATOR, name);
        let default = def.defaults().get(name).ok_or_else(|| {
            ExtractionError::invalid_param(&key, format!("'{}' takes no parameter '{}'", def.alias(), name))
        })?;
        if !default.accepts(value) {
            return Err(ExtractionError::invalid_param(
                &key,
                format!("expected a {} value, got {}", default.kind(), value),
            ));
        }
        params.set(name, value.clone());
    }
    Ok(params)
}
