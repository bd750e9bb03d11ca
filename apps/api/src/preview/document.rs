//! Assembles the section fragments into the preview document.

use serde::Serialize;

use crate::preview::pagination::{plan_pages, PagePlan};
use crate::preview::scaler::ScaleState;
use crate::preview::sections::{escape_html, render_section, SectionKind};
use crate::preview::typography::{BLOCK_GAP_PX, PAGE_PADDING_PX};
use crate::resume::model::{present, ResumeValues};

/// Stable id of the content element; clients capture it for printing and PDF export.
pub const CONTENT_ELEMENT_ID: &str = "resumePreviewContent";

#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub element_id: &'static str,
    pub html: String,
    pub zoom: f64,
    pub visible: bool,
    pub sections: Vec<SectionKind>,
    pub pages: PagePlan,
}

/// Renders the full preview fragment for one scale observation.
///
/// The outer box keeps the A4 aspect ratio; the inner content block carries
/// the single zoom factor so every child scales together. Until the container
/// is measured the content is laid out but hidden.
pub fn render_document(values: &ResumeValues, scale: ScaleState, photo_src: Option<&str>) -> RenderedDocument {
    let mut sections = Vec::new();
    let mut body = String::new();
    for kind in SectionKind::ORDER {
        if let Some(fragment) = render_section(kind, values, photo_src) {
            sections.push(kind);
            body.push_str(&fragment);
        }
    }

    let visibility = if scale.visible { "visible" } else { "hidden" };
    let html = format!(
        "<div class=\"resume-preview\" style=\"aspect-ratio: 210 / 297; width: 100%; height: fit-content; background: #ffffff; color: #000000;\">\n\
         <div id=\"{CONTENT_ELEMENT_ID}\" class=\"resume-content\" style=\"zoom: {zoom}; visibility: {visibility}; padding: {PAGE_PADDING_PX}px; display: flex; flex-direction: column; gap: {BLOCK_GAP_PX}px;\">\n\
         {body}</div>\n</div>\n",
        zoom = scale.zoom,
    );

    let has_photo = photo_src.is_some_and(|s| !s.is_empty());
    RenderedDocument {
        element_id: CONTENT_ELEMENT_ID,
        html,
        zoom: scale.zoom,
        visible: scale.visible,
        sections,
        pages: plan_pages(values, has_photo),
    }
}

/// Wraps a rendered document into a standalone page ready for the browser's print dialog.
pub fn render_print_page(values: &ResumeValues, document: &RenderedDocument) -> String {
    let title = present(&values.title).unwrap_or("Resume");
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n\
         @page {{ size: A4; margin: 0; }}\n\
         body {{ margin: 0; font-family: Inter, ui-sans-serif, system-ui, sans-serif; }}\n\
         #{CONTENT_ELEMENT_ID} {{ zoom: 1 !important; visibility: visible !important; }}\n\
         .resume-section, .resume-entry {{ break-inside: avoid; page-break-inside: avoid; }}\n\
         </style>\n</head>\n<body>\n{html}</body>\n</html>\n",
        title = escape_html(title),
        html = document.html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::scaler::{compute_scale, A4_REFERENCE_WIDTH_PX};
    use crate::resume::model::{Education, WorkExperience};
    use chrono::NaiveDate;

    fn sample() -> ResumeValues {
        ResumeValues {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            job_title: Some("Engineer".into()),
            city: Some("London".into()),
            summary: Some("Writes programs.".into()),
            work_experiences: vec![WorkExperience {
                position: Some("Analyst".into()),
                company: Some("Engines Ltd".into()),
                start_date: NaiveDate::from_ymd_opt(1842, 1, 1),
                ..Default::default()
            }],
            educations: vec![Education {
                degree: Some("Mathematics".into()),
                ..Default::default()
            }],
            skills: vec!["Go".into(), "Rust".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_sections_render_in_fixed_order() {
        let doc = render_document(&sample(), compute_scale(Some(794.0), A4_REFERENCE_WIDTH_PX), None);
        assert_eq!(doc.sections, SectionKind::ORDER.to_vec());

        let positions: Vec<usize> = SectionKind::ORDER
            .iter()
            .map(|k| doc.html.find(k.css_class()).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_values_render_header_only() {
        let doc = render_document(&ResumeValues::default(), ScaleState::UNMEASURED, None);
        assert_eq!(doc.sections, vec![SectionKind::Header]);
        assert!(!doc.html.contains("resume-divider"));
    }

    #[test]
    fn test_unmeasured_document_is_hidden() {
        let doc = render_document(&sample(), ScaleState::UNMEASURED, None);
        assert!(!doc.visible);
        assert!(doc.html.contains("visibility: hidden"));
    }

    #[test]
    fn test_zoom_is_applied_to_content_block() {
        let doc = render_document(&sample(), compute_scale(Some(397.0), A4_REFERENCE_WIDTH_PX), None);
        assert!(doc.visible);
        assert_eq!(doc.zoom, 0.5);
        assert!(doc.html.contains(&format!("id=\"{CONTENT_ELEMENT_ID}\"")));
        assert!(doc.html.contains("zoom: 0.5;"));
    }

    #[test]
    fn test_print_page_wraps_document() {
        let values = sample();
        let doc = render_document(&values, compute_scale(Some(794.0), A4_REFERENCE_WIDTH_PX), None);
        let page = render_print_page(&values, &doc);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("@page { size: A4; margin: 0; }"));
        assert!(page.contains(&doc.html));
    }
}
