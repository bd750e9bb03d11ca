//! Section renderers. Each one is a pure function of the resume values and
//! returns an HTML fragment; every section except the header returns `None`
//! when it has nothing to show.

use chrono::NaiveDate;
use serde::Serialize;

use crate::preview::typography::{
    self, TextStyle, BADGE_GAP_PX, BADGE_PADDING_X_PX, BADGE_PADDING_Y_PX, DIVIDER_PX,
    ENTRY_GAP_PX, HEADER_GAP_PX, PHOTO_SIZE_PX, SECTION_GAP_PX,
};
use crate::resume::model::{present, BorderStyle, Education, ResumeValues, WorkExperience};

const CONTACT_COLOR: &str = "#6b7280";
const SEPARATOR: &str = " • ";

/// The fixed order sections appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Summary,
    WorkExperience,
    Education,
    Skills,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 5] = [
        SectionKind::Header,
        SectionKind::Summary,
        SectionKind::WorkExperience,
        SectionKind::Education,
        SectionKind::Skills,
    ];

    pub fn css_class(&self) -> &'static str {
        match self {
            SectionKind::Header => "resume-header",
            SectionKind::Summary => "resume-summary",
            SectionKind::WorkExperience => "resume-work-experience",
            SectionKind::Education => "resume-education",
            SectionKind::Skills => "resume-skills",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Header => "",
            SectionKind::Summary => "About Me",
            SectionKind::WorkExperience => "Work Experience",
            SectionKind::Education => "Education",
            SectionKind::Skills => "Skills",
        }
    }
}

/// Dispatches to the renderer for `kind`.
pub fn render_section(kind: SectionKind, values: &ResumeValues, photo_src: Option<&str>) -> Option<String> {
    match kind {
        SectionKind::Header => Some(render_header(values, photo_src)),
        SectionKind::Summary => render_summary(values),
        SectionKind::WorkExperience => render_work_experience(values),
        SectionKind::Education => render_education(values),
        SectionKind::Skills => render_skills(values),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text helpers
// ────────────────────────────────────────────────────────────────────────────

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text and keeps its line breaks as `<br>`.
pub fn multiline(text: &str) -> String {
    text.lines().map(escape_html).collect::<Vec<_>>().join("<br>")
}

/// `MM/YYYY`.
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%m/%Y").to_string()
}

/// `"start - end"`, with `Present` for a missing end. No start means no range at all.
pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    let start = start?;
    let end = end
        .map(format_month_year)
        .unwrap_or_else(|| "Present".to_string());
    Some(format!("{} - {}", format_month_year(start), end))
}

/// Location and reach-out details on one line, without stray separators.
pub fn contact_line(
    city: Option<&str>,
    country: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
) -> String {
    fn non_blank(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|s| !s.is_empty())
    }

    let location = [non_blank(city), non_blank(country)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
    let reach = [non_blank(phone), non_blank(email)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    [location, reach]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

pub fn full_name(values: &ResumeValues) -> String {
    [present(&values.first_name), present(&values.last_name)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn photo_radius(style: BorderStyle) -> &'static str {
    match style {
        BorderStyle::Square => "0px",
        BorderStyle::Circle => "9999px",
        BorderStyle::Rounded => "10%",
    }
}

pub fn badge_radius(style: BorderStyle) -> &'static str {
    match style {
        BorderStyle::Square => "0px",
        BorderStyle::Circle => "9999px",
        BorderStyle::Rounded => "8px",
    }
}

fn styled(tag: &str, class: &str, style: &TextStyle, extra_css: &str, inner: &str) -> String {
    format!(
        "<{tag} class=\"{class}\" style=\"margin: 0; {}{extra_css}\">{inner}</{tag}>",
        style.css()
    )
}

/// Divider plus a keep-together section container with a title.
fn section(kind: SectionKind, accent: &str, body: &str) -> String {
    format!(
        "<hr class=\"resume-divider\" style=\"margin: 0; border: 0; border-top: {DIVIDER_PX}px solid {accent};\">\n\
         <section class=\"resume-section {class}\" style=\"break-inside: avoid; page-break-inside: avoid; display: flex; flex-direction: column; gap: {SECTION_GAP_PX}px;\">\n\
         {title}\n{body}</section>\n",
        class = kind.css_class(),
        title = styled(
            "h2",
            "resume-section-title",
            &typography::SECTION_TITLE,
            &format!(" color: {accent};"),
            kind.title()
        ),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Renderers
// ────────────────────────────────────────────────────────────────────────────

/// Photo, name, job title and contact line. Always rendered; absent parts are left out.
pub fn render_header(values: &ResumeValues, photo_src: Option<&str>) -> String {
    let accent = values.accent_color();
    let mut html = format!(
        "<header class=\"{}\" style=\"display: flex; align-items: center; gap: {HEADER_GAP_PX}px;\">\n",
        SectionKind::Header.css_class()
    );

    if let Some(src) = photo_src.filter(|s| !s.is_empty()) {
        html.push_str(&format!(
            "<img class=\"resume-photo\" src=\"{}\" width=\"{PHOTO_SIZE_PX}\" height=\"{PHOTO_SIZE_PX}\" alt=\"Author photo\" \
             style=\"aspect-ratio: 1 / 1; object-fit: cover; border-radius: {};\">\n",
            escape_html(src),
            photo_radius(values.border_style())
        ));
    }

    html.push_str("<div style=\"display: flex; flex-direction: column; gap: 10px;\">\n");
    let name = full_name(values);
    if !name.is_empty() {
        html.push_str(&styled(
            "p",
            "resume-name",
            &typography::NAME,
            &format!(" color: {accent};"),
            &escape_html(&name),
        ));
        html.push('\n');
    }
    if let Some(job_title) = present(&values.job_title) {
        html.push_str(&styled(
            "p",
            "resume-job-title",
            &typography::JOB_TITLE,
            &format!(" color: {accent};"),
            &escape_html(job_title),
        ));
        html.push('\n');
    }
    let contact = contact_line(
        present(&values.city),
        present(&values.country),
        present(&values.phone),
        present(&values.email),
    );
    if !contact.is_empty() {
        html.push_str(&styled(
            "p",
            "resume-contact",
            &typography::CONTACT,
            &format!(" color: {CONTACT_COLOR};"),
            &escape_html(&contact),
        ));
        html.push('\n');
    }
    html.push_str("</div>\n</header>\n");
    html
}

pub fn render_summary(values: &ResumeValues) -> Option<String> {
    let summary = present(&values.summary)?;
    let body = styled(
        "div",
        "resume-summary-text",
        &typography::SUMMARY_TEXT,
        "",
        &multiline(summary),
    );
    Some(section(SectionKind::Summary, values.accent_color(), &format!("{body}\n")))
}

pub fn render_work_experience(values: &ResumeValues) -> Option<String> {
    let accent = values.accent_color();
    let entries: Vec<String> = values
        .filled_work_experiences()
        .map(|exp| render_work_entry(exp, accent))
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(section(SectionKind::WorkExperience, accent, &entries.concat()))
}

fn render_work_entry(exp: &WorkExperience, accent: &str) -> String {
    let mut html = entry_open();
    html.push_str(&entry_title_row(
        present(&exp.position),
        date_range(exp.start_date, exp.end_date),
        accent,
    ));
    if let Some(company) = present(&exp.company) {
        html.push_str(&styled(
            "p",
            "resume-entry-subtitle",
            &typography::ENTRY_SUBTITLE,
            "",
            &escape_html(company),
        ));
        html.push('\n');
    }
    if let Some(description) = present(&exp.description) {
        html.push_str(&styled(
            "div",
            "resume-entry-text",
            &typography::ENTRY_TEXT,
            "",
            &multiline(description),
        ));
        html.push('\n');
    }
    html.push_str("</div>\n");
    html
}

pub fn render_education(values: &ResumeValues) -> Option<String> {
    let accent = values.accent_color();
    let entries: Vec<String> = values
        .filled_educations()
        .map(|edu| render_education_entry(edu, accent))
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(section(SectionKind::Education, accent, &entries.concat()))
}

fn render_education_entry(edu: &Education, accent: &str) -> String {
    let mut html = entry_open();
    html.push_str(&entry_title_row(
        present(&edu.degree),
        date_range(edu.start_date, edu.end_date),
        accent,
    ));
    if let Some(school) = present(&edu.school) {
        html.push_str(&styled(
            "p",
            "resume-entry-subtitle",
            &typography::ENTRY_SUBTITLE,
            "",
            &escape_html(school),
        ));
        html.push('\n');
    }
    html.push_str("</div>\n");
    html
}

fn entry_open() -> String {
    format!(
        "<div class=\"resume-entry\" style=\"break-inside: avoid; page-break-inside: avoid; display: flex; flex-direction: column; gap: {ENTRY_GAP_PX}px;\">\n"
    )
}

fn entry_title_row(title: Option<&str>, range: Option<String>, accent: &str) -> String {
    let mut row = format!(
        "<div class=\"resume-entry-title\" style=\"display: flex; align-items: center; justify-content: space-between; {} color: {accent};\">",
        typography::ENTRY_TITLE.css()
    );
    row.push_str(&format!("<span>{}</span>", escape_html(title.unwrap_or(""))));
    if let Some(range) = range {
        row.push_str(&format!("<span class=\"resume-date-range\">{range}</span>"));
    }
    row.push_str("</div>\n");
    row
}

pub fn render_skills(values: &ResumeValues) -> Option<String> {
    let accent = values.accent_color();
    let radius = badge_radius(values.border_style());
    let badges: Vec<String> = values
        .filled_skills()
        .map(|skill| {
            format!(
                "<span class=\"skill-badge\" style=\"background-color: {accent}; color: #ffffff; border-radius: {radius}; \
                 padding: {BADGE_PADDING_Y_PX}px {BADGE_PADDING_X_PX}px; {}\">{}</span>",
                typography::BADGE.css(),
                escape_html(skill)
            )
        })
        .collect();
    if badges.is_empty() {
        return None;
    }
    let body = format!(
        "<div class=\"resume-skill-list\" style=\"display: flex; flex-wrap: wrap; gap: {BADGE_GAP_PX}px; break-inside: avoid;\">\n{}\n</div>\n",
        badges.join("\n")
    );
    Some(section(SectionKind::Skills, accent, &body))
}
