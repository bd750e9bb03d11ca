//! Schema boundary applied before a resume is persisted.
//!
//! `normalize` canonicalises free text (trim, blank → `None`) so that blank
//! strings and missing fields are indistinguishable downstream; `validate`
//! rejects values that must never be stored.

use crate::errors::AppError;
use crate::resume::model::{
    is_valid_color_hex, Education, PendingPhoto, PhotoValue, ResumeValues, WorkExperience,
};

pub const MAX_SHORT_FIELD_LEN: usize = 100;
pub const MAX_LONG_FIELD_LEN: usize = 5000;
pub const MAX_SKILLS: usize = 50;
pub const MAX_ENTRIES: usize = 20;
pub const MAX_PHOTO_BYTES: usize = 4 * 1024 * 1024;

/// Trims every text field, turns blank strings into `None`, and drops blank skills.
pub fn normalize(mut values: ResumeValues) -> ResumeValues {
    for field in [
        &mut values.title,
        &mut values.description,
        &mut values.first_name,
        &mut values.last_name,
        &mut values.job_title,
        &mut values.city,
        &mut values.country,
        &mut values.phone,
        &mut values.email,
        &mut values.summary,
        &mut values.color_hex,
    ] {
        normalize_field(field);
    }

    for exp in &mut values.work_experiences {
        normalize_field(&mut exp.position);
        normalize_field(&mut exp.company);
        normalize_field(&mut exp.description);
    }
    for edu in &mut values.educations {
        normalize_field(&mut edu.degree);
        normalize_field(&mut edu.school);
    }

    values.skills = values
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if let PhotoValue::Persisted(url) = &values.photo {
        if url.trim().is_empty() {
            values.photo = PhotoValue::Absent;
        }
    }

    values
}

fn normalize_field(field: &mut Option<String>) {
    *field = field
        .take()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
}

/// Validates normalized values. Returns every problem found, joined into one message.
pub fn validate(values: &ResumeValues) -> Result<(), AppError> {
    let mut problems: Vec<String> = Vec::new();

    for (name, field) in [
        ("title", &values.title),
        ("first_name", &values.first_name),
        ("last_name", &values.last_name),
        ("job_title", &values.job_title),
        ("city", &values.city),
        ("country", &values.country),
        ("phone", &values.phone),
        ("email", &values.email),
    ] {
        check_len(&mut problems, name, field, MAX_SHORT_FIELD_LEN);
    }
    check_len(&mut problems, "description", &values.description, MAX_LONG_FIELD_LEN);
    check_len(&mut problems, "summary", &values.summary, MAX_LONG_FIELD_LEN);

    if let Some(email) = values.email.as_deref() {
        if !looks_like_email(email) {
            problems.push(format!("email '{email}' is not a valid address"));
        }
    }

    if let Some(color) = values.color_hex.as_deref() {
        if !is_valid_color_hex(color) {
            problems.push(format!("color_hex '{color}' must look like #rrggbb"));
        }
    }

    if values.skills.len() > MAX_SKILLS {
        problems.push(format!("at most {MAX_SKILLS} skills are allowed"));
    }
    for skill in &values.skills {
        if skill.chars().count() > MAX_SHORT_FIELD_LEN {
            problems.push(format!("skill '{skill}' exceeds {MAX_SHORT_FIELD_LEN} characters"));
        }
    }

    if values.work_experiences.len() > MAX_ENTRIES {
        problems.push(format!("at most {MAX_ENTRIES} work experiences are allowed"));
    }
    for (i, exp) in values.work_experiences.iter().enumerate() {
        validate_work_experience(&mut problems, i, exp);
    }

    if values.educations.len() > MAX_ENTRIES {
        problems.push(format!("at most {MAX_ENTRIES} educations are allowed"));
    }
    for (i, edu) in values.educations.iter().enumerate() {
        validate_education(&mut problems, i, edu);
    }

    if let PhotoValue::Pending(photo) = &values.photo {
        photo_problems(&mut problems, photo);
    }

    into_result(problems)
}

/// Checks an uploaded photo on its own, as soon as it arrives.
pub fn validate_photo(photo: &PendingPhoto) -> Result<(), AppError> {
    let mut problems = Vec::new();
    photo_problems(&mut problems, photo);
    into_result(problems)
}

fn photo_problems(problems: &mut Vec<String>, photo: &PendingPhoto) {
    if !photo.content_type.starts_with("image/") {
        problems.push(format!("photo must be an image, got '{}'", photo.content_type));
    }
    if photo.bytes.is_empty() {
        problems.push("photo is empty".to_string());
    }
    if photo.bytes.len() > MAX_PHOTO_BYTES {
        problems.push("photo must be at most 4 MB".to_string());
    }
}

fn into_result(problems: Vec<String>) -> Result<(), AppError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join("; ")))
    }
}

fn validate_work_experience(problems: &mut Vec<String>, index: usize, exp: &WorkExperience) {
    check_len(problems, &format!("work_experiences[{index}].position"), &exp.position, MAX_SHORT_FIELD_LEN);
    check_len(problems, &format!("work_experiences[{index}].company"), &exp.company, MAX_SHORT_FIELD_LEN);
    check_len(problems, &format!("work_experiences[{index}].description"), &exp.description, MAX_LONG_FIELD_LEN);
    if let (Some(start), Some(end)) = (exp.start_date, exp.end_date) {
        if end < start {
            problems.push(format!("work_experiences[{index}] ends before it starts"));
        }
    }
}

fn validate_education(problems: &mut Vec<String>, index: usize, edu: &Education) {
    check_len(problems, &format!("educations[{index}].degree"), &edu.degree, MAX_SHORT_FIELD_LEN);
    check_len(problems, &format!("educations[{index}].school"), &edu.school, MAX_SHORT_FIELD_LEN);
    if let (Some(start), Some(end)) = (edu.start_date, edu.end_date) {
        if end < start {
            problems.push(format!("educations[{index}] ends before it starts"));
        }
    }
}

fn check_len(problems: &mut Vec<String>, name: &str, field: &Option<String>, max: usize) {
    if let Some(value) = field {
        if value.chars().count() > max {
            problems.push(format!("{name} exceeds {max} characters"));
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        _ => false,
    }
}
