//! Resource to typeface, reusing earlier work
//!
//! [`TypefaceCompat`] owns the cache, the factory and the strategy picked for
//! it. Every public entry point follows the same shape: derive the key, build
//! on a miss, cache only successes, leave no temp file behind.

use std::collections::HashMap;
use std::sync::Arc;

use fontstage_core::{
    config::CompatConfig,
    error::{Result, StagingError, TypefaceError},
    traits::{CacheDirProvider, FontProvider, Resources, TypefaceFactory},
    types::{
        find_best_match, FamilyResourceEntry, FontFamilyFiles, FontInfo, ResourceId,
        ResourceKey, Style, RESULT_CODE_OK,
    },
};
use fontstage_staging::Stager;

use crate::cache::TypefaceCache;
use crate::strategy::Strategy;

/// Resolves font resources into cached typeface handles
pub struct TypefaceCompat<F: TypefaceFactory> {
    factory: F,
    strategy: Strategy,
    stager: Stager,
    cache: TypefaceCache<F::Typeface>,
    provider: Option<Arc<dyn FontProvider<F::Typeface>>>,
}

impl<F: TypefaceFactory> TypefaceCompat<F> {
    /// Builds a resolver with default configuration
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, CompatConfig::default())
    }

    /// Builds a resolver, probing `factory` once to pick the strategy
    pub fn with_config(factory: F, config: CompatConfig) -> Self {
        let strategy = Strategy::detect(&factory);
        log::debug!(
            "Typeface resolver using {} strategy for {} (cache capacity {})",
            strategy,
            factory.name(),
            config.cache.capacity
        );
        Self::with_strategy(factory, strategy, config)
    }

    /// Builds a resolver with a strategy chosen by the caller
    pub fn with_strategy(factory: F, strategy: Strategy, config: CompatConfig) -> Self {
        Self {
            factory,
            strategy,
            stager: Stager::new(config.staging),
            cache: TypefaceCache::new(config.cache.capacity),
            provider: None,
        }
    }

    /// Attaches the collaborator used for provider-backed families
    pub fn with_provider(mut self, provider: Arc<dyn FontProvider<F::Typeface>>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replaces the stager, e.g. to pin the naming identity
    pub fn with_stager(mut self, stager: Stager) -> Self {
        self.stager = stager;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn cache(&self) -> &TypefaceCache<F::Typeface> {
        &self.cache
    }

    /// Cache key for `id` in `resources` with `style`
    pub fn resource_key(
        resources: &dyn Resources,
        id: ResourceId,
        style: Style,
    ) -> Result<ResourceKey> {
        let package = resources.package_name(id)?;
        Ok(ResourceKey::new(package, id, style))
    }

    /// Finds a typeface built earlier for the same resource and style
    ///
    /// Never reads resource bytes. An id whose package cannot be resolved is
    /// simply not found.
    pub fn find_from_cache(
        &self,
        resources: &dyn Resources,
        id: ResourceId,
        style: Style,
    ) -> Option<F::Typeface> {
        let key = Self::resource_key(resources, id, style).ok()?;
        let found = self.cache.get(&key);
        if found.is_some() {
            log::trace!("Typeface cache hit for {}", key);
        }
        found
    }

    /// Builds a typeface from a parsed font-family resource
    ///
    /// Provider entries are fetched through the attached [`FontProvider`].
    /// File lists go through the resolver's [`Strategy`]. The result is
    /// cached under (package of `id`, `id`, `style`).
    pub fn create_from_resources_family<C>(
        &self,
        context: &C,
        entry: &FamilyResourceEntry,
        resources: &dyn Resources,
        id: ResourceId,
        style: Style,
    ) -> Result<F::Typeface>
    where
        C: CacheDirProvider + ?Sized,
    {
        let key = Self::resource_key(resources, id, style)?;

        let typeface = match entry {
            FamilyResourceEntry::Provider(provider_entry) => {
                let provider = self.provider.as_ref().ok_or_else(|| {
                    TypefaceError::Provider("no font provider attached".to_string())
                })?;
                provider.fetch_sync(provider_entry, style)?
            }
            FamilyResourceEntry::Files(files) => match self.strategy {
                Strategy::Direct => self.factory.create_from_family(files, resources, style)?,
                Strategy::Staged => self.create_from_family_staged(context, files, resources, style)?,
            },
        };

        log::debug!("Caching typeface for {}", key);
        self.cache.insert(key, typeface.clone());
        Ok(typeface)
    }

    /// Builds a typeface from a single font-file resource
    ///
    /// Always stages, whatever the strategy. The temp file is gone when this
    /// returns, on success and failure alike.
    pub fn create_from_resources_font_file<C>(
        &self,
        context: &C,
        resources: &dyn Resources,
        id: ResourceId,
        style: Style,
    ) -> Result<F::Typeface>
    where
        C: CacheDirProvider + ?Sized,
    {
        let key = Self::resource_key(resources, id, style)?;
        let typeface = self.build_staged(context, resources, id)?;

        log::debug!("Caching typeface for {}", key);
        self.cache.insert(key, typeface.clone());
        Ok(typeface)
    }

    /// Builds a typeface from fonts a provider already fetched
    ///
    /// `buffers` maps each [`FontInfo::uri`] to its bytes. Not cached: the
    /// result has no resource id to be keyed by.
    pub fn create_typeface<C>(
        &self,
        context: &C,
        fonts: &[FontInfo],
        buffers: &HashMap<String, Vec<u8>>,
    ) -> Result<F::Typeface>
    where
        C: CacheDirProvider + ?Sized,
    {
        if fonts.is_empty() {
            return Err(TypefaceError::NoMatchingFont);
        }

        match self.strategy {
            Strategy::Direct => self.factory.create_from_buffers(fonts, buffers),
            Strategy::Staged => {
                let usable: Vec<FontInfo> = fonts
                    .iter()
                    .filter(|font| {
                        font.result_code == RESULT_CODE_OK && buffers.contains_key(&font.uri)
                    })
                    .cloned()
                    .collect();
                let best =
                    find_best_match(&usable, Style::NORMAL).ok_or(TypefaceError::NoMatchingFont)?;
                let bytes = buffers.get(&best.uri).ok_or_else(|| {
                    TypefaceError::Provider(format!("no buffer fetched for {}", best.uri))
                })?;

                let staged = self
                    .stager
                    .acquire_temp_file(context)
                    .map_err(staging_failure)?;
                self.stager
                    .copy_buffer_to_file(staged.path(), bytes)
                    .map_err(staging_failure)?;
                self.factory
                    .create_from_file(staged.path())
                    .map_err(construction_fault)
            }
        }
    }

    fn create_from_family_staged<C>(
        &self,
        context: &C,
        files: &FontFamilyFiles,
        resources: &dyn Resources,
        style: Style,
    ) -> Result<F::Typeface>
    where
        C: CacheDirProvider + ?Sized,
    {
        let best = find_best_match(&files.entries, style).ok_or(TypefaceError::NoMatchingFont)?;
        self.build_staged(context, resources, best.file_id)
    }

    fn build_staged<C>(
        &self,
        context: &C,
        resources: &dyn Resources,
        file_id: ResourceId,
    ) -> Result<F::Typeface>
    where
        C: CacheDirProvider + ?Sized,
    {
        let staged = self
            .stager
            .acquire_temp_file(context)
            .map_err(staging_failure)?;
        self.stager
            .copy_resource_to_file(staged.path(), resources, file_id)
            .map_err(staging_failure)?;

        self.factory.create_from_file(staged.path()).map_err(|e| {
            log::debug!("{} rejected resource {:#x}: {}", self.factory.name(), file_id, e);
            construction_fault(e)
        })
    }
}

/// Any fault while building from a staged file means the bytes were unusable
fn construction_fault(err: TypefaceError) -> TypefaceError {
    match err {
        malformed @ TypefaceError::MalformedFont { .. } => malformed,
        other => TypefaceError::malformed(other.to_string()),
    }
}

/// Surfaces a missing resource as such instead of as a staging fault
fn staging_failure(err: StagingError) -> TypefaceError {
    match err {
        StagingError::Resource(resource) => resource.into(),
        other => TypefaceError::Staging(other),
    }
}
