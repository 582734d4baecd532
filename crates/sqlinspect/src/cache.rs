//! Lazily loaded values.

/// A value loaded at most once per session.
#[derive(Debug, Clone, PartialEq)]
pub enum Cached<T> {
    /// Not requested yet.
    Unloaded,
    /// Loaded successfully.
    Loaded(T),
    /// Loading failed for a reason retrying will not fix.
    Errored(String),
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::Unloaded
    }
}

impl<T> Cached<T> {
    /// Returns true if no load was attempted.
    #[must_use]
    pub const fn is_unloaded(&self) -> bool {
        matches!(self, Self::Unloaded)
    }

    /// Returns the loaded value.
    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the cached failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Errored(reason) => Some(reason),
            _ => None,
        }
    }

    /// Caches the outcome of a load.
    pub fn store<E: ToString>(&mut self, outcome: std::result::Result<T, E>) {
        *self = match outcome {
            Ok(value) => Self::Loaded(value),
            Err(error) => Self::Errored(error.to_string()),
        };
    }
}
