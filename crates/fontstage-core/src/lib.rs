//! Fontstage Core: the vocabulary shared by staging and caching
//!
//! A font lives in a package's resource set under an integer id. Turning it
//! into a typeface handle takes three collaborators and two moves:
//!
//! 1. **Lookup** - a [`types::ResourceKey`] built from (package, id, style)
//!    finds a handle that was already built
//! 2. **Resolve** - on a miss, the bytes are read through [`traits::Resources`]
//!    and handed to a [`traits::TypefaceFactory`], either directly or through a
//!    temp file in the directory named by [`traits::CacheDirProvider`]
//!
//! This crate holds only the types and contracts. Staging lives in
//! `fontstage-staging`, the cache and the resolve logic in `fontstage`.

pub mod config;
pub mod error;
pub mod traits;

pub use config::{CacheConfig, CompatConfig, StagingConfig};
pub use error::{ProbeError, ResourceError, Result, StagingError, TypefaceError};
pub use traits::{CacheDirProvider, FontProvider, Resources, TypefaceFactory};
pub use types::{ResourceId, ResourceKey, Style};

/// The data structures passed between the resolve stages
pub mod types {
    use std::fmt;
    use std::time::Duration;

    /// Integer id of a resource inside a package's resource set
    pub type ResourceId = u32;

    /// Requested weight/slant variant of a typeface
    ///
    /// Wraps the raw integer so `-1` ("no style requested") survives the trip
    /// through the cache key unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Style(pub i32);

    impl Style {
        pub const NORMAL: Style = Style(0);
        pub const BOLD: Style = Style(1);
        pub const ITALIC: Style = Style(2);
        pub const BOLD_ITALIC: Style = Style(3);
        /// Style not available for this request
        pub const UNSPECIFIED: Style = Style(-1);

        pub fn is_bold(self) -> bool {
            self.0 >= 0 && self.0 & Self::BOLD.0 != 0
        }

        pub fn is_italic(self) -> bool {
            self.0 >= 0 && self.0 & Self::ITALIC.0 != 0
        }

        /// Weight this style asks for when matching family entries
        pub fn weight(self) -> u16 {
            if self.is_bold() {
                700
            } else {
                400
            }
        }
    }

    impl Default for Style {
        fn default() -> Self {
            Style::NORMAL
        }
    }

    impl fmt::Display for Style {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    /// Identifies a cached typeface by where it came from and how it was asked for
    ///
    /// Kept as a tuple of fields rather than a concatenated string, so a package
    /// name that happens to contain `-` can never alias another key.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct ResourceKey {
        pub package: String,
        pub id: ResourceId,
        pub style: Style,
    }

    impl ResourceKey {
        pub fn new(package: impl Into<String>, id: ResourceId, style: Style) -> Self {
            Self {
                package: package.into(),
                id,
                style,
            }
        }
    }

    /// Renders the `package-id-style` uid form, handy in logs
    impl fmt::Display for ResourceKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}-{}-{}", self.package, self.id, self.style)
        }
    }

    /// One font file listed in a font-family resource
    #[derive(Debug, Clone, PartialEq)]
    pub struct FontFileEntry {
        /// Resource holding the font bytes
        pub file_id: ResourceId,
        pub weight: u16,
        pub italic: bool,
        /// Face index inside a collection (0 for single fonts)
        pub ttc_index: u32,
        /// Raw `font-variation-settings` string, if any
        pub variation_settings: Option<String>,
    }

    /// A font-family resource that lists its files explicitly
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct FontFamilyFiles {
        pub entries: Vec<FontFileEntry>,
    }

    /// How eagerly a provider-backed font should be fetched
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum FetchStrategy {
        /// Block the caller until the fetch completes or times out
        #[default]
        Blocking,
        /// Return immediately, let the provider finish in its own time
        Async,
    }

    /// Query sent to a remote font provider
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FontRequest {
        pub authority: String,
        pub package: String,
        pub query: String,
    }

    /// A font-family resource that points at a remote provider
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ProviderEntry {
        pub request: FontRequest,
        pub strategy: FetchStrategy,
        /// `None` waits forever
        pub timeout: Option<Duration>,
    }

    /// Parsed root of a font-family resource
    #[derive(Debug, Clone, PartialEq)]
    pub enum FamilyResourceEntry {
        Files(FontFamilyFiles),
        Provider(ProviderEntry),
    }

    /// Result code a provider reports per font
    pub const RESULT_CODE_OK: i32 = 0;

    /// A font the provider has fetched, matched to bytes by `uri`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FontInfo {
        pub uri: String,
        pub ttc_index: u32,
        pub weight: u16,
        pub italic: bool,
        pub result_code: i32,
    }

    /// Anything that can be scored against a requested style
    pub trait StyleCandidate {
        fn weight(&self) -> u16;
        fn italic(&self) -> bool;
    }

    impl StyleCandidate for FontFileEntry {
        fn weight(&self) -> u16 {
            self.weight
        }

        fn italic(&self) -> bool {
            self.italic
        }
    }

    impl StyleCandidate for FontInfo {
        fn weight(&self) -> u16 {
            self.weight
        }

        fn italic(&self) -> bool {
            self.italic
        }
    }

    /// Picks the candidate closest to `style`
    ///
    /// Score is twice the weight distance plus one for a slant mismatch; the
    /// first candidate wins ties. Returns `None` only for an empty slice.
    pub fn find_best_match<C: StyleCandidate>(candidates: &[C], style: Style) -> Option<&C> {
        let target_weight = i32::from(style.weight());
        let target_italic = style.is_italic();

        candidates.iter().min_by_key(|c| {
            let weight_gap = (i32::from(c.weight()) - target_weight).abs() * 2;
            weight_gap + i32::from(c.italic() != target_italic)
        })
    }
}
