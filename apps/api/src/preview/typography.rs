//! Type scale and spacing of the rendered page, in reference-width pixels.
//! Shared by the section renderers (CSS) and the pagination estimate (heights).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size_px: f32,
    pub line_height_px: f32,
    pub weight: u16,
}

impl TextStyle {
    pub const fn new(font_size_px: f32, line_height_px: f32, weight: u16) -> Self {
        Self {
            font_size_px,
            line_height_px,
            weight,
        }
    }

    pub fn css(&self) -> String {
        format!(
            "font-size: {}px; line-height: {}px; font-weight: {};",
            self.font_size_px, self.line_height_px, self.weight
        )
    }
}

pub const NAME: TextStyle = TextStyle::new(30.0, 36.0, 700);
pub const JOB_TITLE: TextStyle = TextStyle::new(16.0, 24.0, 500);
pub const CONTACT: TextStyle = TextStyle::new(12.0, 16.0, 400);
pub const SECTION_TITLE: TextStyle = TextStyle::new(18.0, 28.0, 600);
pub const ENTRY_TITLE: TextStyle = TextStyle::new(14.0, 20.0, 600);
pub const ENTRY_SUBTITLE: TextStyle = TextStyle::new(12.0, 16.0, 600);
pub const SUMMARY_TEXT: TextStyle = TextStyle::new(14.0, 20.0, 400);
pub const ENTRY_TEXT: TextStyle = TextStyle::new(12.0, 16.0, 400);
pub const BADGE: TextStyle = TextStyle::new(12.0, 16.0, 600);

/// Padding around the whole page content.
pub const PAGE_PADDING_PX: f32 = 24.0;
/// Vertical gap between top-level blocks (header, dividers, sections).
pub const BLOCK_GAP_PX: f32 = 24.0;
/// Gap between a section title and its items, and between items.
pub const SECTION_GAP_PX: f32 = 12.0;
/// Gap between the lines of one entry.
pub const ENTRY_GAP_PX: f32 = 4.0;
pub const DIVIDER_PX: f32 = 4.0;
pub const PHOTO_SIZE_PX: f32 = 100.0;
pub const HEADER_GAP_PX: f32 = 24.0;
pub const BADGE_PADDING_X_PX: f32 = 10.0;
pub const BADGE_PADDING_Y_PX: f32 = 2.0;
pub const BADGE_GAP_PX: f32 = 8.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_lists_size_line_height_and_weight() {
        assert_eq!(
            ENTRY_TITLE.css(),
            "font-size: 14px; line-height: 20px; font-weight: 600;"
        );
    }
}
