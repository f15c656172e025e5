//! Feature Registry
//!
//! Maps aliases to feature functions, their default parameters and their
//! declared output arity. The built-in registry is created once per process
//! and never mutated afterwards; custom registries are assembled with
//! [`RegistryBuilder`] before extraction starts.

use crate::builtins;
use crate::error::{ExtractionError, Result};
use crate::params::{ParamValue, Params};
use feature_funcs::FuncError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Shared, read-only inputs every feature function may consult
#[derive(Debug, Clone, Copy)]
pub struct FeatureContext<'a> {
    /// Sampling frequency (Hz)
    pub sfreq: f64,
    /// Band edges (Hz), N edges → N-1 bands
    pub freq_bands: &'a [f64],
}

impl FeatureContext<'_> {
    /// Number of bands defined by the edges
    pub fn n_bands(&self) -> usize {
        self.freq_bands.len().saturating_sub(1)
    }
}

/// Output of a feature function on one channel
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl FeatureValue {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            FeatureValue::Scalar(v) => std::slice::from_ref(v),
            FeatureValue::Vector(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Scalar(v)
    }
}

impl From<Vec<f64>> for FeatureValue {
    fn from(v: Vec<f64>) -> Self {
        FeatureValue::Vector(v)
    }
}

impl<const N: usize> From<[f64; N]> for FeatureValue {
    fn from(v: [f64; N]) -> Self {
        FeatureValue::Vector(v.to_vec())
    }
}

/// Plug-in signature of a feature function
pub type FeatureFn =
    Arc<dyn Fn(&[f64], &Params, &FeatureContext<'_>) -> std::result::Result<FeatureValue, FuncError> + Send + Sync>;

/// Parameter check run once at resolution time, before any data is touched
pub type ParamCheck = fn(&Params, &FeatureContext<'_>) -> std::result::Result<(), FuncError>;

/// Declared number of values a feature contributes per channel
#[derive(Debug, Clone, Copy)]
pub enum Arity {
    /// One unlabeled value
    Scalar,
    /// Always `n` values
    Fixed(usize),
    /// One value per frequency band
    PerBand,
    /// One value per element of the named list parameter
    PerListParam(&'static str),
    /// Computed from the resolved parameters and context
    Custom(fn(&Params, &FeatureContext<'_>) -> usize),
}

impl Arity {
    /// Resolve the width without running the function
    pub fn width(&self, params: &Params, ctx: &FeatureContext<'_>) -> usize {
        match self {
            Arity::Scalar => 1,
            Arity::Fixed(n) => *n,
            Arity::PerBand => ctx.n_bands(),
            Arity::PerListParam(name) => params.get_list(name).map_or(1, |l| l.len()),
            Arity::Custom(f) => f(params, ctx),
        }
    }

    /// Scalar features get no sub-index in column labels
    pub fn is_scalar(&self) -> bool {
        matches!(self, Arity::Scalar)
    }
}

/// Registry entry: alias, callable, defaults and arity
#[derive(Clone)]
pub struct FeatureDef {
    alias: String,
    arity: Arity,
    defaults: Params,
    uses_freq_bands: bool,
    check: Option<ParamCheck>,
    compute: FeatureFn,
}

impl FeatureDef {
    /// Create an entry with no default parameters
    pub fn new<F>(alias: impl Into<String>, arity: Arity, compute: F) -> Self
    where
        F: Fn(&[f64], &Params, &FeatureContext<'_>) -> std::result::Result<FeatureValue, FuncError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            alias: alias.into(),
            arity,
            defaults: Params::new(),
            uses_freq_bands: false,
            check: None,
            compute: Arc::new(compute),
        }
    }

    /// Declare a parameter and its default; only declared parameters can be overridden
    pub fn with_default(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.defaults.set(name, value);
        self
    }

    /// Mark the function as reading the frequency bands
    pub fn with_freq_bands(mut self) -> Self {
        self.uses_freq_bands = true;
        self
    }

    /// Attach a parameter check run during resolution
    pub fn with_check(mut self, check: ParamCheck) -> Self {
        self.check = Some(check);
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    pub fn uses_freq_bands(&self) -> bool {
        self.uses_freq_bands
    }

    pub(crate) fn check(&self, params: &Params, ctx: &FeatureContext<'_>) -> std::result::Result<(), FuncError> {
        match self.check {
            Some(check) => check(params, ctx),
            None => Ok(()),
        }
    }

    /// Run the function on one channel
    pub fn compute(
        &self,
        samples: &[f64],
        params: &Params,
        ctx: &FeatureContext<'_>,
    ) -> std::result::Result<FeatureValue, FuncError> {
        (self.compute)(samples, params, ctx)
    }
}

impl fmt::Debug for FeatureDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureDef")
            .field("alias", &self.alias)
            .field("arity", &self.arity)
            .field("defaults", &self.defaults)
            .field("uses_freq_bands", &self.uses_freq_bands)
            .finish_non_exhaustive()
    }
}

/// Alias → feature function table
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    defs: HashMap<String, FeatureDef>,
}

static BUILTIN: OnceLock<Arc<FeatureRegistry>> = OnceLock::new();

impl FeatureRegistry {
    /// Process-wide registry holding the built-in feature functions
    pub fn builtin() -> Arc<FeatureRegistry> {
        BUILTIN
            .get_or_init(|| Arc::new(RegistryBuilder::new().with_builtins().build()))
            .clone()
    }

    /// Start a custom registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up an alias
    pub fn lookup(&self, alias: &str) -> Result<&FeatureDef> {
        self.defs
            .get(alias)
            .ok_or_else(|| ExtractionError::UnknownAlias(alias.to_string()))
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.defs.contains_key(alias)
    }

    /// Registered aliases, sorted
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Assembles a [`FeatureRegistry`]; registration is only possible before `build`
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: HashMap<String, FeatureDef>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every built-in feature function
    pub fn with_builtins(mut self) -> Self {
        for def in builtins::builtin_defs() {
            self.defs.insert(def.alias.clone(), def);
        }
        self
    }

    /// Add a feature function; fails if the alias is taken or malformed
    pub fn register(mut self, def: FeatureDef) -> Result<Self> {
        if def.alias.is_empty() || def.alias.contains(crate::params::PARAM_SEPARATOR) {
            return Err(ExtractionError::invalid_param(
                def.alias,
                "alias must be non-empty and must not contain '__'",
            ));
        }
        if self.defs.contains_key(&def.alias) {
            return Err(ExtractionError::DuplicateAlias(def.alias));
        }
        self.defs.insert(def.alias.clone(), def);
        Ok(self)
    }

    pub fn build(self) -> FeatureRegistry {
        FeatureRegistry { defs: self.defs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(bands: &[f64]) -> FeatureContext<'_> {
        FeatureContext {
            sfreq: 256.0,
            freq_bands: bands,
        }
    }

    #[test]
    fn test_builtin_lookup() {
        let registry = FeatureRegistry::builtin();
        for alias in ["mean", "variance", "kurtosis", "pow_freq_bands", "spect_edge_freq", "higuchi_fd"] {
            assert!(registry.lookup(alias).is_ok(), "missing {}", alias);
        }
        assert!(matches!(
            registry.lookup("powfreqbands"),
            Err(ExtractionError::UnknownAlias(a)) if a == "powfreqbands"
        ));
    }

    #[test]
    fn test_builtin_is_shared() {
        assert!(Arc::ptr_eq(&FeatureRegistry::builtin(), &FeatureRegistry::builtin()));
    }

    #[test]
    fn test_aliases_sorted() {
        let registry = FeatureRegistry::builtin();
        let aliases = registry.aliases();
        let mut sorted = aliases.clone();
        sorted.sort();
        assert_eq!(aliases, sorted);
        assert_eq!(aliases.len(), registry.len());
    }

    #[test]
    fn test_arity_resolution() {
        let bands = [0.1, 4.0, 8.0, 12.0, 30.0, 70.0];
        let c = ctx(&bands);
        let params = Params::new().with("edge", vec![0.5, 0.95]);

        assert_eq!(Arity::Scalar.width(&params, &c), 1);
        assert_eq!(Arity::Fixed(4).width(&params, &c), 4);
        assert_eq!(Arity::PerBand.width(&params, &c), 5);
        assert_eq!(Arity::PerListParam("edge").width(&params, &c), 2);
        assert_eq!(Arity::Custom(|_, c| 2 * c.n_bands()).width(&params, &c), 10);
    }

    #[test]
    fn test_register_custom_function() {
        let def = FeatureDef::new("energy", Arity::Scalar, |x, _, _| {
            Ok(x.iter().map(|v| v * v).sum::<f64>().into())
        });
        let registry = FeatureRegistry::builder()
            .with_builtins()
            .register(def)
            .unwrap()
            .build();

        let energy = registry.lookup("energy").unwrap();
        let value = energy.compute(&[1.0, 2.0], &Params::new(), &ctx(&[1.0, 2.0])).unwrap();
        assert_eq!(value, FeatureValue::Scalar(5.0));
    }

    #[test]
    fn test_register_rejects_duplicates_and_separator() {
        let dup = FeatureDef::new("mean", Arity::Scalar, |_, _, _| Ok(0.0.into()));
        assert!(matches!(
            FeatureRegistry::builder().with_builtins().register(dup),
            Err(ExtractionError::DuplicateAlias(_))
        ));

        let bad = FeatureDef::new("my__feature", Arity::Scalar, |_, _, _| Ok(0.0.into()));
        assert!(FeatureRegistry::builder().register(bad).is_err());
    }
}
