//! Glyph Pass
//!
//! Templates only emit icon placeholders (`<i data-feather="clock"></i>`).
//! A glyph pass fills them in after every render, across the whole document.

const PLACEHOLDER: &str = "<i data-feather=\"";
const CLOSE: &str = "</i>";

/// Icon substitution run after each render
pub trait GlyphPass: Send + Sync {
    /// Return `markup` with icon placeholders filled in.
    ///
    /// Must be idempotent: the pass runs over content it has already seen.
    fn apply(&self, markup: &str) -> String;
}

/// Leaves placeholders untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGlyphs;

impl GlyphPass for NoGlyphs {
    fn apply(&self, markup: &str) -> String {
        markup.to_string()
    }
}

/// Fills feather placeholders with a unicode glyph
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatherGlyphs;

impl FeatherGlyphs {
    fn glyph(name: &str) -> &'static str {
        match name {
            "clock" => "⏱",
            "message-circle" => "💬",
            "message-square" => "🗨",
            "users" => "👥",
            "hash" => "#",
            "alert-triangle" => "⚠",
            _ => "•",
        }
    }
}

impl GlyphPass for FeatherGlyphs {
    fn apply(&self, markup: &str) -> String {
        let mut out = String::with_capacity(markup.len());
        let mut rest = markup;

        while let Some(start) = rest.find(PLACEHOLDER) {
            let after_attr = &rest[start + PLACEHOLDER.len()..];
            let Some(name_end) = after_attr.find('"') else {
                break;
            };
            let Some(tag_end) = after_attr.find('>') else {
                break;
            };

            let open_len = start + PLACEHOLDER.len() + tag_end + 1;
            out.push_str(&rest[..open_len]);
            rest = &rest[open_len..];

            // Only empty placeholders get a glyph; filled ones are left alone
            if rest.starts_with(CLOSE) {
                out.push_str(Self::glyph(&after_attr[..name_end]));
            }
        }

        out.push_str(rest);
        out
    }
}
