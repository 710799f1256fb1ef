//! The collaborators a resolve leans on
//!
//! Nothing here touches a disk or parses a font. Each trait is a seam where
//! the platform (or a test) plugs in:
//!
//! - [`CacheDirProvider`] - where temp files may be created
//! - [`Resources`] - package names and raw bytes by resource id
//! - [`TypefaceFactory`] - turns files or bytes into typeface handles
//! - [`FontProvider`] - fetches provider-backed families

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{ProbeError, ResourceError, Result, TypefaceError};
use crate::types::{FontFamilyFiles, FontInfo, ProviderEntry, ResourceId, Style};

/// Supplies a writable directory for staged files
pub trait CacheDirProvider {
    fn cache_dir(&self) -> &Path;
}

impl CacheDirProvider for Path {
    fn cache_dir(&self) -> &Path {
        self
    }
}

impl CacheDirProvider for PathBuf {
    fn cache_dir(&self) -> &Path {
        self.as_path()
    }
}

/// A package's resource set
///
/// ```ignore
/// struct Bundled(HashMap<ResourceId, Vec<u8>>);
///
/// impl Resources for Bundled {
///     fn package_name(&self, id: ResourceId) -> Result<String, ResourceError> {
///         self.0.contains_key(&id)
///             .then(|| "com.example".to_string())
///             .ok_or(ResourceError::NotFound(id))
///     }
///
///     fn open_raw(&self, id: ResourceId) -> Result<Box<dyn Read + Send + '_>, ResourceError> {
///         let bytes = self.0.get(&id).ok_or(ResourceError::NotFound(id))?;
///         Ok(Box::new(bytes.as_slice()))
///     }
/// }
/// ```
pub trait Resources: Send + Sync {
    /// Name of the package that owns `id`
    fn package_name(&self, id: ResourceId) -> std::result::Result<String, ResourceError>;

    /// Raw byte stream of `id`
    fn open_raw(&self, id: ResourceId)
        -> std::result::Result<Box<dyn Read + Send + '_>, ResourceError>;
}

/// The platform's font constructor
///
/// Files are the lowest common denominator: every factory must build from a
/// path. Building straight from family metadata or in-memory buffers is
/// optional and advertised through [`probe_direct_support`].
///
/// [`probe_direct_support`]: TypefaceFactory::probe_direct_support
pub trait TypefaceFactory: Send + Sync {
    /// Opaque handle to a parsed, renderable font
    type Typeface: Clone + Send + Sync;

    /// Used for logging
    fn name(&self) -> &'static str;

    /// Can this factory skip staging?
    ///
    /// Called once when a resolver is built. An error counts as "no".
    fn probe_direct_support(&self) -> std::result::Result<bool, ProbeError> {
        Ok(false)
    }

    /// Builds a typeface from a font file on disk
    fn create_from_file(&self, path: &Path) -> Result<Self::Typeface>;

    /// Builds a typeface from family metadata without staging
    fn create_from_family(
        &self,
        _family: &FontFamilyFiles,
        _resources: &dyn Resources,
        _style: Style,
    ) -> Result<Self::Typeface> {
        Err(TypefaceError::Unsupported(format!(
            "{} cannot build from family metadata",
            self.name()
        )))
    }

    /// Builds a typeface from provider results held in memory
    fn create_from_buffers(
        &self,
        _fonts: &[FontInfo],
        _buffers: &HashMap<String, Vec<u8>>,
    ) -> Result<Self::Typeface> {
        Err(TypefaceError::Unsupported(format!(
            "{} cannot build from in-memory buffers",
            self.name()
        )))
    }
}

/// Fetches a family from a remote provider
///
/// Owns its retry and timeout policy; the resolver only passes the entry on.
pub trait FontProvider<T>: Send + Sync {
    fn fetch_sync(&self, entry: &ProviderEntry, style: Style) -> Result<T>;
}
