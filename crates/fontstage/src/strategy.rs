//! Picking how misses get built
//!
//! Decided once, when a resolver is constructed, and never revisited.

use std::fmt;

use fontstage_core::traits::TypefaceFactory;

/// How a cache miss on a font-family resource is turned into a typeface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Family metadata goes straight to the factory, no temp files
    Direct,
    /// The best matching file is staged to disk and built from its path
    Staged,
}

impl Strategy {
    /// Asks `factory` whether it can skip staging
    ///
    /// A failed probe falls back to [`Strategy::Staged`].
    pub fn detect<F>(factory: &F) -> Self
    where
        F: TypefaceFactory + ?Sized,
    {
        match factory.probe_direct_support() {
            Ok(true) => Strategy::Direct,
            Ok(false) => Strategy::Staged,
            Err(e) => {
                log::warn!(
                    "{}: {}. Falling back to staged typeface loading.",
                    factory.name(),
                    e
                );
                Strategy::Staged
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Direct => f.write_str("direct"),
            Strategy::Staged => f.write_str("staged"),
        }
    }
}
