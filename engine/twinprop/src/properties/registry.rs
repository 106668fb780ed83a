use crate::error::{TwinError, TwinResult};
use crate::json::JsonReader;

/// Ordered set of component names configured at client setup.
///
/// Lookup is a linear scan, which suits the handful of components a device
/// typically exposes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentRegistry {
    names: Vec<String>,
}

impl ComponentRegistry {
    /// Builds a registry, rejecting empty and duplicate names.
    pub fn new<I, S>(names: I) -> TwinResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for name in names {
            registry.push(name.into())?;
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|entry| entry == name)
    }

    /// Name of the component matching the reader's current token, if any.
    pub(crate) fn lookup(&self, reader: &JsonReader<'_>) -> Option<&str> {
        self.names
            .iter()
            .find(|name| reader.text_equals(name))
            .map(String::as_str)
    }

    fn push(&mut self, name: String) -> TwinResult<()> {
        if name.is_empty() {
            return Err(TwinError::InvalidArgument("component name is empty"));
        }
        if self.contains(&name) {
            return Err(TwinError::InvalidArgument("duplicate component name"));
        }
        self.names.push(name);
        Ok(())
    }
}
