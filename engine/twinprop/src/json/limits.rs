use crate::error::{TwinError, TwinResult};

/// Deepest nesting the fixed container stack can track.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Bounds applied by a [`JsonReader`](super::JsonReader) while it walks a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReaderLimits {
    max_depth: usize,
}

impl ReaderLimits {
    pub const fn standard() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }

    /// Limits with a custom nesting bound, which must lie in `1..=64`.
    pub fn with_max_depth(max_depth: usize) -> TwinResult<Self> {
        if max_depth == 0 || max_depth > MAX_NESTING_DEPTH {
            return Err(TwinError::InvalidArgument(
                "max nesting depth must be between 1 and 64",
            ));
        }
        Ok(Self { max_depth })
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self::standard()
    }
}
