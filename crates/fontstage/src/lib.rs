//! Fontstage: font resources in, typeface handles out
//!
//! Building a typeface from a resource costs disk I/O and a font parse. This
//! crate does it once per (package, resource id, style) and remembers the
//! result in a small LRU cache.
//!
//! ## Resolving
//!
//! ```rust,no_run
//! use fontstage::{FontDataFactory, TypefaceCompat};
//! use fontstage_core::{Resources, Style};
//! # use fontstage_core::ResourceError;
//! # use std::io::Read;
//! # struct Bundle;
//! # impl Resources for Bundle {
//! #     fn package_name(&self, _: u32) -> Result<String, ResourceError> { unimplemented!() }
//! #     fn open_raw(&self, _: u32) -> Result<Box<dyn Read + Send + '_>, ResourceError> { unimplemented!() }
//! # }
//! # let resources = Bundle;
//! # let cache_dir = std::env::temp_dir();
//!
//! let compat = TypefaceCompat::new(FontDataFactory);
//!
//! let typeface = match compat.find_from_cache(&resources, 0x7f08_0000, Style::BOLD) {
//!     Some(hit) => hit,
//!     None => compat.create_from_resources_font_file(
//!         &cache_dir,
//!         &resources,
//!         0x7f08_0000,
//!         Style::BOLD,
//!     )?,
//! };
//! # let _ = typeface;
//! # Ok::<(), fontstage_core::TypefaceError>(())
//! ```
//!
//! ## Strategies
//!
//! When a resolver is built it asks its [`TypefaceFactory`] once whether it
//! can build straight from family metadata. If so, font-family resources
//! skip the disk ([`Strategy::Direct`]); otherwise the best matching file is
//! staged through `fontstage-staging` ([`Strategy::Staged`]). Single font-file
//! resources are always staged.
//!
//! [`TypefaceFactory`]: fontstage_core::TypefaceFactory

pub mod cache;
pub mod compat;
pub mod font_data;
pub mod strategy;

pub use cache::{CacheStats, TypefaceCache};
pub use compat::TypefaceCompat;
pub use font_data::{FontData, FontDataFactory};
pub use strategy::Strategy;

pub use fontstage_core::{error, types, CompatConfig, Result, TypefaceError};
