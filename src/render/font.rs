//! Subtitle font resolution: a configured font file, falling back to a named system
//! font, falling back to whichever default sans-serif is present.

use ab_glyph::FontRef;

use crate::error::{PipelineError, Result};

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
];

/// Loads `configured_path` if given and readable; otherwise walks
/// [`SYSTEM_FONT_CANDIDATES`] in order. The returned reference is `'static` because
/// the font bytes are leaked for the process lifetime, matching the teacher's
/// "load once, reuse" model-caching idiom applied to a font instead of a speech model.
pub fn load_font(configured_path: Option<&str>) -> Result<FontRef<'static>> {
    let candidates = configured_path.into_iter().chain(SYSTEM_FONT_CANDIDATES.iter().copied());

    for path in candidates {
        if let Ok(bytes) = std::fs::read(path) {
            let leaked: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if let Ok(font) = FontRef::try_from_slice(leaked) {
                return Ok(font);
            }
        }
    }

    Err(PipelineError::ClipRenderFailed(
        "no usable subtitle font found (configured path and all system fallbacks missing)".into(),
    ))
}
