#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::TwinResult;
use crate::json::{ReaderLimits, MAX_NESTING_DEPTH};
use crate::properties::ComponentRegistry;

/// Client-setup configuration for the property codec.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PropertiesOptions {
    /// Component names, in the order they were registered.
    pub components: Vec<String>,
    pub max_nesting_depth: usize,
}

impl Default for PropertiesOptions {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl PropertiesOptions {
    pub fn with_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn registry(&self) -> TwinResult<ComponentRegistry> {
        ComponentRegistry::new(self.components.iter().cloned())
    }

    pub fn reader_limits(&self) -> TwinResult<ReaderLimits> {
        ReaderLimits::with_max_depth(self.max_nesting_depth)
    }
}
