//! Variant specification for cart lines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The set of product options (e.g., type/size) that distinguishes
/// otherwise-identical cart lines for the same product id.
///
/// Backed by a `BTreeMap` so equality and serialization are independent of
/// insertion order: two specs with the same option pairs are structurally
/// equal, which is exactly the identity the cart merge policy needs.
///
/// ```
/// use blue_papaya_core::VariantSpec;
///
/// let a = VariantSpec::new().with("size", "M").with("color", "teal");
/// let b = VariantSpec::new().with("color", "teal").with("size", "M");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct VariantSpec(BTreeMap<String, String>);

impl VariantSpec {
    /// An empty variant spec (product has no options).
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style option insertion.
    #[must_use]
    pub fn with(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(option.into(), value.into());
        self
    }

    /// Set an option value in place.
    pub fn set(&mut self, option: impl Into<String>, value: impl Into<String>) {
        self.0.insert(option.into(), value.into());
    }

    /// Look up an option value.
    #[must_use]
    pub fn get(&self, option: &str) -> Option<&str> {
        self.0.get(option).map(String::as_str)
    }

    /// Whether the spec carries no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(option, value)` pairs in option order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl core::fmt::Display for VariantSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (option, value) in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{option}: {value}")?;
            first = false;
        }
        Ok(())
    }
}
