//! A factory that needs no platform: parse the bytes ourselves
//!
//! [`FontDataFactory`] validates font bytes with `read-fonts` and hands out
//! [`FontData`] handles that own those bytes. It can build from files, from
//! family metadata and from in-memory buffers, so it probes as direct-capable.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use read_fonts::{FontRef as ReadFontRef, TableProvider};

use fontstage_core::{
    error::{ProbeError, Result, TypefaceError},
    traits::{Resources, TypefaceFactory},
    types::{find_best_match, FontFamilyFiles, FontInfo, Style, RESULT_CODE_OK},
};

/// Font bytes that parsed cleanly, plus the face they select
///
/// The bytes are copied out of any staged file, so the handle outlives it.
#[derive(Debug)]
pub struct FontData {
    data: Vec<u8>,
    face_index: u32,
    units_per_em: u16,
}

impl FontData {
    /// Validates `data` and keeps it (face 0)
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_index(data, 0)
    }

    /// Validates face `face_index` of `data` and keeps it
    pub fn from_data_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let font_ref = ReadFontRef::from_index(&data, face_index)
            .map_err(|e| TypefaceError::malformed(format!("face {}: {}", face_index, e)))?;

        let units_per_em = font_ref
            .head()
            .map(|head| head.units_per_em())
            .unwrap_or(1000);

        Ok(Self {
            data,
            face_index,
            units_per_em,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn glyph_count(&self) -> Option<u32> {
        ReadFontRef::from_index(&self.data, self.face_index)
            .ok()?
            .maxp()
            .ok()
            .map(|maxp| u32::from(maxp.num_glyphs()))
    }
}

/// Builds [`FontData`] handles straight from bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct FontDataFactory;

impl TypefaceFactory for FontDataFactory {
    type Typeface = Arc<FontData>;

    fn name(&self) -> &'static str {
        "font-data"
    }

    fn probe_direct_support(&self) -> std::result::Result<bool, ProbeError> {
        Ok(true)
    }

    fn create_from_file(&self, path: &Path) -> Result<Self::Typeface> {
        let data = fs::read(path)?;
        Ok(Arc::new(FontData::from_data(data)?))
    }

    fn create_from_family(
        &self,
        family: &FontFamilyFiles,
        resources: &dyn Resources,
        style: Style,
    ) -> Result<Self::Typeface> {
        let best = find_best_match(&family.entries, style).ok_or(TypefaceError::NoMatchingFont)?;

        let mut data = Vec::new();
        resources.open_raw(best.file_id)?.read_to_end(&mut data)?;
        Ok(Arc::new(FontData::from_data_index(data, best.ttc_index)?))
    }

    fn create_from_buffers(
        &self,
        fonts: &[FontInfo],
        buffers: &HashMap<String, Vec<u8>>,
    ) -> Result<Self::Typeface> {
        let candidates: Vec<FontInfo> = fonts
            .iter()
            .filter(|font| font.result_code == RESULT_CODE_OK && buffers.contains_key(&font.uri))
            .cloned()
            .collect();
        let best = find_best_match(&candidates, Style::NORMAL).ok_or(TypefaceError::NoMatchingFont)?;

        let data = buffers
            .get(&best.uri)
            .cloned()
            .ok_or(TypefaceError::NoMatchingFont)?;
        Ok(Arc::new(FontData::from_data_index(data, best.ttc_index)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_from_garbage_is_malformed() {
        let result = FontData::from_data(vec![0; 100]);
        assert!(matches!(result, Err(TypefaceError::MalformedFont { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = FontDataFactory.create_from_file(&dir.path().join("absent.ttf"));
        assert!(matches!(result, Err(TypefaceError::Io(_))));
    }

    #[test]
    fn test_buffers_without_usable_font() {
        let fonts = vec![FontInfo {
            uri: "content://fonts/1".to_string(),
            ttc_index: 0,
            weight: 400,
            italic: false,
            result_code: 1,
        }];
        let buffers = HashMap::from([("content://fonts/1".to_string(), vec![0u8; 8])]);
        let result = FontDataFactory.create_from_buffers(&fonts, &buffers);
        assert!(matches!(result, Err(TypefaceError::NoMatchingFont)));
    }

    #[test]
    fn test_probes_as_direct_capable() {
        assert!(matches!(FontDataFactory.probe_direct_support(), Ok(true)));
    }
}
