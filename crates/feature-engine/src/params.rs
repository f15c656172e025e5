//! Feature Function Parameters
//!
//! Parameters are stored per feature alias as a name → [`ParamValue`] map.
//! User overrides arrive either in the structured form ([`FuncParams`]) or
//! as flat `"alias__param"` keys, which are split on the first `__`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Separator between alias and parameter name in flat override keys
pub const PARAM_SEPARATOR: &str = "__";

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Unset; the function derives its own default
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<f64>),
    Text(String),
}

impl ParamValue {
    /// Numeric value, accepting integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Non-negative integral value
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            ParamValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// List value; a bare number is promoted to a one-element list
    pub fn as_list(&self) -> Option<Vec<f64>> {
        match self {
            ParamValue::List(v) => Some(v.clone()),
            ParamValue::Float(_) | ParamValue::Int(_) => self.as_f64().map(|v| vec![v]),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Short name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::List(_) => "list",
            ParamValue::Text(_) => "text",
        }
    }

    /// Whether `other` may replace a default of this kind
    ///
    /// Integer defaults only accept integral values; only null defaults accept null.
    pub fn accepts(&self, other: &ParamValue) -> bool {
        use ParamValue::*;
        matches!(
            (self, other),
            (Null, _)
                | (Bool(_), Bool(_))
                | (Int(_), Int(_))
                | (Float(_), Int(_) | Float(_))
                | (List(_), List(_) | Int(_) | Float(_))
                | (Text(_), Text(_))
        ) || matches!((self, other), (Int(_), Float(v)) if v.fract() == 0.0)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "null"),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::List(v) => write!(f, "{:?}", v),
            ParamValue::Text(v) => write!(f, "'{}'", v),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::List(v)
    }
}

impl From<&[f64]> for ParamValue {
    fn from(v: &[f64]) -> Self {
        ParamValue::List(v.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for ParamValue {
    fn from(v: [f64; N]) -> Self {
        ParamValue::List(v.to_vec())
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// Parameter set of one feature function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric parameter; `None` when absent, null or not numeric
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_f64)
    }

    pub fn get_usize(&self, name: &str) -> Option<usize> {
        self.get(name).and_then(ParamValue::as_usize)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn get_list(&self, name: &str) -> Option<Vec<f64>> {
        self.get(name).and_then(ParamValue::as_list)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Per-alias parameter overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuncParams(BTreeMap<String, Params>);

impl FuncParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of one override
    pub fn with(mut self, alias: &str, param: &str, value: impl Into<ParamValue>) -> Self {
        self.set(alias, param, value);
        self
    }

    pub fn set(&mut self, alias: &str, param: &str, value: impl Into<ParamValue>) {
        self.0
            .entry(alias.to_string())
            .or_default()
            .set(param, value);
    }

    /// Insert an override given as `"alias__param"`
    ///
    /// Returns the key back when it has no separator or an empty side.
    pub fn set_flat(&mut self, key: &str, value: impl Into<ParamValue>) -> Result<(), String> {
        match split_flat_key(key) {
            Some((alias, param)) => {
                self.set(alias, param, value);
                Ok(())
            }
            None => Err(key.to_string()),
        }
    }

    /// Build from flat `"alias__param"` keys
    pub fn from_flat<K, V, I>(entries: I) -> Result<Self, String>
    where
        K: AsRef<str>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = Self::new();
        for (key, value) in entries {
            params.set_flat(key.as_ref(), value)?;
        }
        Ok(params)
    }

    pub fn get(&self, alias: &str) -> Option<&Params> {
        self.0.get(alias)
    }

    /// Aliases with an override entry, possibly empty
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Params)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split `"alias__param"` on the first separator
pub fn split_flat_key(key: &str) -> Option<(&str, &str)> {
    let (alias, param) = key.split_once(PARAM_SEPARATOR)?;
    if alias.is_empty() || param.is_empty() {
        return None;
    }
    Some((alias, param))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_flat_key() {
        assert_eq!(
            split_flat_key("spect_edge_freq__edge"),
            Some(("spect_edge_freq", "edge"))
        );
        assert_eq!(
            split_flat_key("pow_freq_bands__psd_method"),
            Some(("pow_freq_bands", "psd_method"))
        );
        assert_eq!(split_flat_key("higuchi_fd"), None);
        assert_eq!(split_flat_key("__kmax"), None);
    }

    #[test]
    fn test_from_flat_groups_by_alias() {
        let params = FuncParams::from_flat([
            ("svd_fisher_info__tau", ParamValue::from(5)),
            ("svd_fisher_info__emb", ParamValue::from(8)),
            ("higuchi_fd__kmax", ParamValue::from(5)),
        ])
        .unwrap();

        let svd = params.get("svd_fisher_info").unwrap();
        assert_eq!(svd.get_usize("tau"), Some(5));
        assert_eq!(svd.get_usize("emb"), Some(8));
        assert_eq!(params.aliases().collect::<Vec<_>>(), vec!["higuchi_fd", "svd_fisher_info"]);
    }

    #[test]
    fn test_from_flat_rejects_bare_alias() {
        assert_eq!(
            FuncParams::from_flat([("kmax", 3)]),
            Err("kmax".to_string())
        );
    }

    #[test]
    fn test_value_coercions() {
        assert_eq!(ParamValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::Float(4.0).as_usize(), Some(4));
        assert_eq!(ParamValue::Float(4.5).as_usize(), None);
        assert_eq!(ParamValue::Float(0.6).as_list(), Some(vec![0.6]));
        assert_eq!(ParamValue::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn test_kind_compatibility() {
        let list = ParamValue::List(vec![0.5]);
        assert!(list.accepts(&ParamValue::Float(0.9)));
        assert!(ParamValue::Int(2).accepts(&ParamValue::Float(2.0)));
        assert!(ParamValue::Null.accepts(&ParamValue::Float(30.0)));
        assert!(!ParamValue::Int(2).accepts(&ParamValue::Text("two".into())));
        assert!(!ParamValue::Bool(true).accepts(&ParamValue::Int(1)));
        assert!(!ParamValue::Int(10).accepts(&ParamValue::Float(2.5)));
        assert!(ParamValue::Null.accepts(&ParamValue::Null));
        assert!(!ParamValue::Bool(true).accepts(&ParamValue::Null));
        assert!(!ParamValue::Float(0.1).accepts(&ParamValue::Null));
    }

    #[test]
    fn test_alias_without_params_is_not_empty() {
        let params: FuncParams = serde_json::from_str(r#"{"higuch_fd": {}}"#).unwrap();
        assert!(!params.is_empty());
        assert_eq!(params.aliases().collect::<Vec<_>>(), vec!["higuch_fd"]);
    }

    #[test]
    fn test_untagged_deserialization() {
        let params: Params = serde_json::from_str(r#"{"edge": [0.5, 0.95], "tau": 5, "ref_freq": null, "log": true}"#).unwrap();
        assert_eq!(params.get("edge"), Some(&ParamValue::List(vec![0.5, 0.95])));
        assert_eq!(params.get("tau"), Some(&ParamValue::Int(5)));
        assert_eq!(params.get("ref_freq"), Some(&ParamValue::Null));
        assert_eq!(params.get_bool("log"), Some(true));
    }
}
