//! The resume value object edited step by step and fed to the preview pipeline.
//!
//! Every field is optional so a half-finished draft is still a valid value.
//! Presence is always explicit (`Option`, `PhotoValue`); renderers go through
//! [`present`] so that blank strings and missing fields behave the same.

use std::fmt;

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Accent colour used when none is set or the stored one is malformed.
pub const DEFAULT_COLOR_HEX: &str = "#000000";

// ────────────────────────────────────────────────────────────────────────────
// Root value object
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeValues {
    /// Persisted identifier; `None` for a draft that was never saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "PhotoValue::skips_serialization",
        with = "photo_serde"
    )]
    pub photo: PhotoValue,

    pub summary: Option<String>,
    #[serde(default)]
    pub work_experiences: Vec<WorkExperience>,
    #[serde(default)]
    pub educations: Vec<Education>,
    /// Display order is significant and preserved.
    #[serde(default)]
    pub skills: Vec<String>,

    pub color_hex: Option<String>,
    pub border_style: Option<BorderStyle>,
}

impl ResumeValues {
    /// The accent colour to render with. Malformed colours fall back to the default.
    pub fn accent_color(&self) -> &str {
        present(&self.color_hex)
            .filter(|c| is_valid_color_hex(c))
            .unwrap_or(DEFAULT_COLOR_HEX)
    }

    pub fn border_style(&self) -> BorderStyle {
        self.border_style.unwrap_or_default()
    }

    /// Work experience entries with at least one non-blank field, in editing order.
    pub fn filled_work_experiences(&self) -> impl Iterator<Item = &WorkExperience> {
        self.work_experiences.iter().filter(|e| !e.is_empty())
    }

    /// Education entries with at least one non-blank field, in editing order.
    pub fn filled_educations(&self) -> impl Iterator<Item = &Education> {
        self.educations.iter().filter(|e| !e.is_empty())
    }

    /// Non-blank skills, trimmed, in input order.
    pub fn filled_skills(&self) -> impl Iterator<Item = &str> {
        self.skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Returns the trimmed value of an optional text field, or `None` when it is absent or blank.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn is_valid_color_hex(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

// ────────────────────────────────────────────────────────────────────────────
// Collections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub position: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Free text; embedded line breaks render as separate lines.
    pub description: Option<String>,
}

impl WorkExperience {
    /// True when no field carries a value. Blank strings count as absent.
    pub fn is_empty(&self) -> bool {
        present(&self.position).is_none()
            && present(&self.company).is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && present(&self.description).is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: Option<String>,
    pub school: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Education {
    /// True when no field carries a value. Blank strings count as absent.
    pub fn is_empty(&self) -> bool {
        present(&self.degree).is_none()
            && present(&self.school).is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Customization
// ────────────────────────────────────────────────────────────────────────────

/// Corner treatment for the photo and skill badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    Square,
    Circle,
    #[default]
    #[serde(alias = "squircle")]
    Rounded,
}

impl BorderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::Square => "square",
            BorderStyle::Circle => "circle",
            BorderStyle::Rounded => "rounded",
        }
    }

    /// Parses the persisted column value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "square" => Some(BorderStyle::Square),
            "circle" => Some(BorderStyle::Circle),
            "rounded" | "squircle" => Some(BorderStyle::Rounded),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Photo
// ────────────────────────────────────────────────────────────────────────────

/// The four mutually exclusive photo states.
///
/// JSON: a missing `photo` key is `Absent`, `null` is `Removed`, a string is
/// `Persisted`. `Pending` only arrives through a multipart upload and is never
/// serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PhotoValue {
    #[default]
    Absent,
    /// Explicit request to remove the stored photo.
    Removed,
    /// Selected by the user but not uploaded to photo storage yet.
    Pending(PendingPhoto),
    Persisted(String),
}

impl PhotoValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, PhotoValue::Absent)
    }

    /// The stored photo URL, if this is one.
    pub fn persisted_url(&self) -> Option<&str> {
        match self {
            PhotoValue::Persisted(url) => Some(url.as_str()),
            _ => None,
        }
    }

    fn skips_serialization(&self) -> bool {
        matches!(self, PhotoValue::Absent | PhotoValue::Pending(_))
    }
}

/// An image held in memory until the resume is saved.
#[derive(Clone, PartialEq)]
pub struct PendingPhoto {
    pub id: Uuid,
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl PendingPhoto {
    pub fn new(bytes: Bytes, content_type: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes,
            content_type: content_type.into(),
            file_name,
        }
    }

    /// File extension derived from the MIME type, used for storage keys.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "jpg",
        }
    }
}

impl fmt::Debug for PendingPhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPhoto")
            .field("id", &self.id)
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

mod photo_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::PhotoValue;

    pub fn serialize<S: Serializer>(photo: &PhotoValue, serializer: S) -> Result<S::Ok, S::Error> {
        match photo {
            PhotoValue::Persisted(url) => serializer.serialize_str(url),
            _ => serializer.serialize_none(),
        }
    }

    // Only called when the key is present; a missing key takes `Default` (Absent).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PhotoValue, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => PhotoValue::Removed,
            Some(url) if url.trim().is_empty() => PhotoValue::Absent,
            Some(url) => PhotoValue::Persisted(url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_photo_json_states() {
        let absent: ResumeValues = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.photo, PhotoValue::Absent);

        let removed: ResumeValues = serde_json::from_value(json!({ "photo": null })).unwrap();
        assert_eq!(removed.photo, PhotoValue::Removed);

        let persisted: ResumeValues =
            serde_json::from_value(json!({ "photo": "https://cdn.test/p.jpg" })).unwrap();
        assert_eq!(
            persisted.photo,
            PhotoValue::Persisted("https://cdn.test/p.jpg".to_string())
        );
    }

    #[test]
    fn test_pending_photo_is_not_serialized() {
        let values = ResumeValues {
            photo: PhotoValue::Pending(PendingPhoto::new(
                Bytes::from_static(b"img"),
                "image/png",
                None,
            )),
            ..Default::default()
        };
        let json = serde_json::to_value(&values).unwrap();
        assert!(json.get("photo").is_none());
    }

    #[test]
    fn test_removed_photo_serializes_as_null() {
        let values = ResumeValues {
            photo: PhotoValue::Removed,
            ..Default::default()
        };
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json.get("photo"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_entry_with_blank_strings_is_empty() {
        let blank = WorkExperience {
            position: Some("   ".to_string()),
            company: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        assert!(WorkExperience::default().is_empty());
    }

    #[test]
    fn test_entry_with_only_a_date_is_present() {
        let dated = Education {
            start_date: NaiveDate::from_ymd_opt(2020, 9, 1),
            ..Default::default()
        };
        assert!(!dated.is_empty());
    }

    #[test]
    fn test_accent_color_falls_back_when_malformed() {
        let mut values = ResumeValues::default();
        assert_eq!(values.accent_color(), DEFAULT_COLOR_HEX);
        values.color_hex = Some("#1d4ed8".to_string());
        assert_eq!(values.accent_color(), "#1d4ed8");
        values.color_hex = Some("red;background:url(x)".to_string());
        assert_eq!(values.accent_color(), DEFAULT_COLOR_HEX);
    }

    #[test]
    fn test_border_style_accepts_squircle_alias() {
        let values: ResumeValues =
            serde_json::from_value(json!({ "border_style": "squircle" })).unwrap();
        assert_eq!(values.border_style(), BorderStyle::Rounded);
        assert_eq!(ResumeValues::default().border_style(), BorderStyle::Rounded);
        assert_eq!(BorderStyle::parse("circle"), Some(BorderStyle::Circle));
        assert_eq!(BorderStyle::parse("oval"), None);
    }

    #[test]
    fn test_filled_skills_preserve_order_and_drop_blanks() {
        let values = ResumeValues {
            skills: vec!["Go".into(), " ".into(), " Rust ".into()],
            ..Default::default()
        };
        assert_eq!(values.filled_skills().collect::<Vec<_>>(), vec!["Go", "Rust"]);
    }
}
