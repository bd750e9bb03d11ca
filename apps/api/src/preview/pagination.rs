//! Print pagination estimate.
//!
//! Estimates how tall each rendered block is at the reference width and lays
//! the blocks onto A4 pages. Sections are keep-together: one that does not fit
//! the rest of a page moves to the next page. A section taller than a whole
//! page starts a fresh page and is reported as overflowing.
//!
//! Character widths are a coarse em-unit approximation; they only need to be
//! good enough to tell a one-page resume from a two-page one.

use serde::Serialize;

use crate::preview::scaler::{A4_REFERENCE_HEIGHT_PX, A4_REFERENCE_WIDTH_PX};
use crate::preview::sections::{contact_line, date_range, full_name, SectionKind};
use crate::preview::typography::{
    self, TextStyle, BADGE_GAP_PX, BADGE_PADDING_X_PX, BADGE_PADDING_Y_PX, BLOCK_GAP_PX,
    DIVIDER_PX, ENTRY_GAP_PX, HEADER_GAP_PX, PAGE_PADDING_PX, PHOTO_SIZE_PX, SECTION_GAP_PX,
};
use crate::resume::model::{present, ResumeValues};

const CONTENT_WIDTH_PX: f32 = A4_REFERENCE_WIDTH_PX as f32 - 2.0 * PAGE_PADDING_PX;
const PAGE_CONTENT_HEIGHT_PX: f32 = A4_REFERENCE_HEIGHT_PX as f32 - 2.0 * PAGE_PADDING_PX;
/// Bold glyphs run slightly wider than regular ones.
const BOLD_WIDTH_FACTOR: f32 = 1.06;

// ────────────────────────────────────────────────────────────────────────────
// Text measurement
// ────────────────────────────────────────────────────────────────────────────

/// Approximate advance width of one character, in em.
fn char_width_em(c: char) -> f32 {
    match c {
        ' ' => 0.28,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.26,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '-' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' => 0.86,
        '0'..='9' => 0.56,
        'A'..='Z' => 0.68,
        'a'..='z' => 0.53,
        _ => 0.58,
    }
}

/// Rendered width of `text` in pixels.
pub fn measure_px(text: &str, style: &TextStyle) -> f32 {
    let em: f32 = text.chars().map(char_width_em).sum();
    let factor = if style.weight >= 600 { BOLD_WIDTH_FACTOR } else { 1.0 };
    em * style.font_size_px * factor
}

/// Lines `text` occupies when greedily word-wrapped at `max_width_px`.
/// Explicit line breaks always start a new line; blank input takes no lines.
pub fn estimated_lines(text: &str, style: &TextStyle, max_width_px: f32) -> u32 {
    if text.trim().is_empty() {
        return 0;
    }
    let space = measure_px(" ", style);
    text.lines()
        .map(|paragraph| {
            let mut lines = 1u32;
            let mut current = 0.0_f32;
            for word in paragraph.split_whitespace() {
                let width = measure_px(word, style);
                if current == 0.0 {
                    current = width;
                } else if current + space + width <= max_width_px {
                    current += space + width;
                } else {
                    lines += 1;
                    current = width;
                }
                // A single word wider than the line wraps on its own.
                while current > max_width_px {
                    lines += 1;
                    current -= max_width_px;
                }
            }
            lines
        })
        .sum()
}

fn text_height(text: &str, style: &TextStyle, max_width_px: f32) -> f32 {
    estimated_lines(text, style, max_width_px) as f32 * style.line_height_px
}

// ────────────────────────────────────────────────────────────────────────────
// Block heights
// ────────────────────────────────────────────────────────────────────────────

/// Height of a section's block, divider included. `None` when the section is not rendered.
pub fn section_height(kind: SectionKind, values: &ResumeValues, has_photo: bool) -> Option<f32> {
    let body = match kind {
        SectionKind::Header => return Some(header_height(values, has_photo)),
        SectionKind::Summary => {
            let summary = present(&values.summary)?;
            vec![text_height(summary, &typography::SUMMARY_TEXT, CONTENT_WIDTH_PX)]
        }
        SectionKind::WorkExperience => values
            .filled_work_experiences()
            .map(|exp| {
                let range = date_range(exp.start_date, exp.end_date);
                let mut parts = vec![title_row_height(present(&exp.position), range.as_deref())];
                if let Some(company) = present(&exp.company) {
                    parts.push(text_height(company, &typography::ENTRY_SUBTITLE, CONTENT_WIDTH_PX));
                }
                if let Some(description) = present(&exp.description) {
                    parts.push(text_height(description, &typography::ENTRY_TEXT, CONTENT_WIDTH_PX));
                }
                stack(&parts, ENTRY_GAP_PX)
            })
            .collect(),
        SectionKind::Education => values
            .filled_educations()
            .map(|edu| {
                let range = date_range(edu.start_date, edu.end_date);
                let mut parts = vec![title_row_height(present(&edu.degree), range.as_deref())];
                if let Some(school) = present(&edu.school) {
                    parts.push(text_height(school, &typography::ENTRY_SUBTITLE, CONTENT_WIDTH_PX));
                }
                stack(&parts, ENTRY_GAP_PX)
            })
            .collect(),
        SectionKind::Skills => {
            let skills: Vec<&str> = values.filled_skills().collect();
            if skills.is_empty() {
                return None;
            }
            vec![badge_rows_height(&skills)]
        }
    };
    if body.is_empty() {
        return None;
    }

    let mut parts = vec![typography::SECTION_TITLE.line_height_px];
    parts.extend(body);
    Some(DIVIDER_PX + BLOCK_GAP_PX + stack(&parts, SECTION_GAP_PX))
}

fn header_height(values: &ResumeValues, has_photo: bool) -> f32 {
    let text_width = if has_photo {
        CONTENT_WIDTH_PX - PHOTO_SIZE_PX - HEADER_GAP_PX
    } else {
        CONTENT_WIDTH_PX
    };
    let mut parts = Vec::new();
    let name = full_name(values);
    if !name.is_empty() {
        parts.push(text_height(&name, &typography::NAME, text_width));
    }
    if let Some(job_title) = present(&values.job_title) {
        parts.push(text_height(job_title, &typography::JOB_TITLE, text_width));
    }
    let contact = contact_line(
        present(&values.city),
        present(&values.country),
        present(&values.phone),
        present(&values.email),
    );
    if !contact.is_empty() {
        parts.push(text_height(&contact, &typography::CONTACT, text_width));
    }
    let text = stack(&parts, 10.0);
    if has_photo {
        text.max(PHOTO_SIZE_PX)
    } else {
        text
    }
}

fn title_row_height(title: Option<&str>, range: Option<&str>) -> f32 {
    let style = &typography::ENTRY_TITLE;
    let range_width = range.map(|r| measure_px(r, style) + 16.0).unwrap_or(0.0);
    let lines = title
        .map(|t| estimated_lines(t, style, CONTENT_WIDTH_PX - range_width))
        .unwrap_or(0)
        .max(1);
    lines as f32 * style.line_height_px
}

/// Height of skill badges flowing left to right, wrapping at the content width.
fn badge_rows_height(skills: &[&str]) -> f32 {
    let style = &typography::BADGE;
    let row_height = style.line_height_px + 2.0 * BADGE_PADDING_Y_PX;
    let mut rows = 1u32;
    let mut current = 0.0_f32;
    for skill in skills {
        let width = (measure_px(skill, style) + 2.0 * BADGE_PADDING_X_PX).min(CONTENT_WIDTH_PX);
        if current == 0.0 {
            current = width;
        } else if current + BADGE_GAP_PX + width <= CONTENT_WIDTH_PX {
            current += BADGE_GAP_PX + width;
        } else {
            rows += 1;
            current = width;
        }
    }
    rows as f32 * row_height + (rows - 1) as f32 * BADGE_GAP_PX
}

/// Sum of heights with `gap` between consecutive non-empty parts.
fn stack(parts: &[f32], gap: f32) -> f32 {
    let visible: Vec<f32> = parts.iter().copied().filter(|h| *h > 0.0).collect();
    if visible.is_empty() {
        return 0.0;
    }
    visible.iter().sum::<f32>() + gap * (visible.len() - 1) as f32
}

// ────────────────────────────────────────────────────────────────────────────
// Page layout
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlacement {
    pub section: SectionKind,
    /// 1-based page the section starts on.
    pub page: usize,
    pub height_px: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlan {
    pub page_count: usize,
    pub placements: Vec<PagePlacement>,
    /// Sections taller than one page; these necessarily break across pages.
    pub overflowing: Vec<SectionKind>,
}

/// Lays the rendered sections onto A4 pages in their fixed order.
pub fn plan_pages(values: &ResumeValues, has_photo: bool) -> PagePlan {
    let mut page = 1usize;
    let mut cursor = 0.0_f32;
    let mut placements = Vec::new();
    let mut overflowing = Vec::new();

    for kind in SectionKind::ORDER {
        let Some(height) = section_height(kind, values, has_photo) else {
            continue;
        };
        let gap = if cursor > 0.0 { BLOCK_GAP_PX } else { 0.0 };

        if cursor + gap + height <= PAGE_CONTENT_HEIGHT_PX {
            placements.push(PagePlacement {
                section: kind,
                page,
                height_px: height,
            });
            cursor += gap + height;
            continue;
        }

        // Doesn't fit: start a fresh page unless this one is still empty.
        if cursor > 0.0 {
            page += 1;
        }

        placements.push(PagePlacement {
            section: kind,
            page,
            height_px: height,
        });

        if height > PAGE_CONTENT_HEIGHT_PX {
            overflowing.push(kind);
            let spanned = (height / PAGE_CONTENT_HEIGHT_PX).ceil() as usize;
            page += spanned - 1;
            cursor = height - (spanned - 1) as f32 * PAGE_CONTENT_HEIGHT_PX;
        } else {
            cursor = height;
        }
    }

    PagePlan {
        page_count: page,
        placements,
        overflowing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::model::Education;

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("Line {i}")).collect::<Vec<_>>().join("\n")
    }

    fn page_of(plan: &PagePlan, section: SectionKind) -> Option<usize> {
        plan.placements
            .iter()
            .find(|p| p.section == section)
            .map(|p| p.page)
    }

    #[test]
    fn test_blank_text_takes_no_lines() {
        assert_eq!(estimated_lines("", &typography::SUMMARY_TEXT, 500.0), 0);
        assert_eq!(estimated_lines("   ", &typography::SUMMARY_TEXT, 500.0), 0);
    }

    #[test]
    fn test_short_text_is_one_line_and_long_text_wraps() {
        let style = &typography::SUMMARY_TEXT;
        assert_eq!(estimated_lines("Rust", style, CONTENT_WIDTH_PX), 1);
        let long = "Architected a distributed caching layer using consistent hashing ".repeat(6);
        assert!(estimated_lines(&long, style, CONTENT_WIDTH_PX) >= 3);
    }

    #[test]
    fn test_line_breaks_count_as_lines() {
        let style = &typography::ENTRY_TEXT;
        assert_eq!(estimated_lines("a\nb\nc", style, CONTENT_WIDTH_PX), 3);
    }

    #[test]
    fn test_bold_measures_wider() {
        assert!(
            measure_px("Engineer", &typography::ENTRY_TITLE)
                > measure_px("Engineer", &typography::SUMMARY_TEXT)
        );
    }

    #[test]
    fn test_empty_resume_is_one_page_with_header_only() {
        let plan = plan_pages(&ResumeValues::default(), false);
        assert_eq!(plan.page_count, 1);
        assert_eq!(plan.placements.len(), 1);
        assert_eq!(plan.placements[0].section, SectionKind::Header);
        assert!(plan.overflowing.is_empty());
    }

    #[test]
    fn test_header_is_at_least_photo_height() {
        let height = section_height(SectionKind::Header, &ResumeValues::default(), true).unwrap();
        assert_eq!(height, PHOTO_SIZE_PX);
    }

    #[test]
    fn test_absent_sections_have_no_height() {
        let values = ResumeValues::default();
        assert!(section_height(SectionKind::Summary, &values, false).is_none());
        assert!(section_height(SectionKind::Skills, &values, false).is_none());
        assert!(section_height(SectionKind::WorkExperience, &values, false).is_none());
    }

    #[test]
    fn test_section_that_does_not_fit_moves_whole_to_next_page() {
        let values = ResumeValues {
            first_name: Some("Ada".into()),
            summary: Some(numbered_lines(40)),
            educations: (0..3)
                .map(|i| Education {
                    degree: Some(format!("Degree {i}")),
                    school: Some("University".into()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        let plan = plan_pages(&values, false);
        assert_eq!(page_of(&plan, SectionKind::Summary), Some(1));
        assert_eq!(page_of(&plan, SectionKind::Education), Some(2));
        assert_eq!(plan.page_count, 2);
        assert!(plan.overflowing.is_empty());
    }

    #[test]
    fn test_oversized_section_is_reported() {
        let values = ResumeValues {
            first_name: Some("Ada".into()),
            summary: Some(numbered_lines(80)),
            skills: vec!["Rust".into()],
            ..Default::default()
        };
        let plan = plan_pages(&values, false);
        assert_eq!(plan.overflowing, vec![SectionKind::Summary]);
        assert_eq!(page_of(&plan, SectionKind::Summary), Some(2));
        assert!(plan.page_count >= 3);
        assert_eq!(page_of(&plan, SectionKind::Skills), Some(plan.page_count));
    }
}
