//! Saving and loading resumes.
//!
//! A resume row owns its work experience and education rows. Saving replaces
//! the children wholesale: existing child rows are deleted and recreated
//! inside the same transaction as the parent update, never diffed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{EducationRow, ResumeRow, WorkExperienceRow};
use crate::resume::model::{BorderStyle, Education, PhotoValue, ResumeValues, WorkExperience};
use crate::resume::validation::{normalize, validate};
use crate::storage::PhotoStore;

/// A resume row together with the child rows it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeRecord {
    pub resume: ResumeRow,
    pub work_experiences: Vec<WorkExperienceRow>,
    pub educations: Vec<EducationRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Row conversions
// ────────────────────────────────────────────────────────────────────────────

/// Identity and bookkeeping columns that do not come from the editor.
pub struct RecordMeta<'a> {
    pub id: Uuid,
    pub user_id: &'a str,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Maps editor values onto rows. Entry order becomes `sort_order`.
pub fn to_record(values: &ResumeValues, meta: RecordMeta<'_>) -> ResumeRecord {
    let resume = ResumeRow {
        id: meta.id,
        user_id: meta.user_id.to_string(),
        title: values.title.clone(),
        description: values.description.clone(),
        photo_url: meta.photo_url,
        color_hex: values.accent_color().to_string(),
        border_style: values.border_style().as_str().to_string(),
        summary: values.summary.clone(),
        first_name: values.first_name.clone(),
        last_name: values.last_name.clone(),
        job_title: values.job_title.clone(),
        city: values.city.clone(),
        country: values.country.clone(),
        phone: values.phone.clone(),
        email: values.email.clone(),
        skills: values.skills.clone(),
        created_at: meta.created_at,
        updated_at: meta.updated_at,
    };

    let work_experiences = values
        .work_experiences
        .iter()
        .enumerate()
        .map(|(i, exp)| WorkExperienceRow {
            id: Uuid::new_v4(),
            resume_id: meta.id,
            sort_order: i as i32,
            position: exp.position.clone(),
            company: exp.company.clone(),
            start_date: exp.start_date,
            end_date: exp.end_date,
            description: exp.description.clone(),
        })
        .collect();

    let educations = values
        .educations
        .iter()
        .enumerate()
        .map(|(i, edu)| EducationRow {
            id: Uuid::new_v4(),
            resume_id: meta.id,
            sort_order: i as i32,
            degree: edu.degree.clone(),
            school: edu.school.clone(),
            start_date: edu.start_date,
            end_date: edu.end_date,
        })
        .collect();

    ResumeRecord {
        resume,
        work_experiences,
        educations,
    }
}

/// Rebuilds editor values from rows. Children are ordered by `sort_order`.
pub fn from_record(record: ResumeRecord) -> ResumeValues {
    let ResumeRecord {
        resume,
        mut work_experiences,
        mut educations,
    } = record;
    work_experiences.sort_by_key(|r| r.sort_order);
    educations.sort_by_key(|r| r.sort_order);

    ResumeValues {
        id: Some(resume.id),
        title: resume.title,
        description: resume.description,
        first_name: resume.first_name,
        last_name: resume.last_name,
        job_title: resume.job_title,
        city: resume.city,
        country: resume.country,
        phone: resume.phone,
        email: resume.email,
        photo: resume
            .photo_url
            .map(PhotoValue::Persisted)
            .unwrap_or(PhotoValue::Absent),
        summary: resume.summary,
        work_experiences: work_experiences
            .into_iter()
            .map(|r| WorkExperience {
                position: r.position,
                company: r.company,
                start_date: r.start_date,
                end_date: r.end_date,
                description: r.description,
            })
            .collect(),
        educations: educations
            .into_iter()
            .map(|r| Education {
                degree: r.degree,
                school: r.school,
                start_date: r.start_date,
                end_date: r.end_date,
            })
            .collect(),
        skills: resume.skills,
        color_hex: Some(resume.color_hex),
        border_style: Some(BorderStyle::parse(&resume.border_style).unwrap_or_default()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

async fn fetch_owned_row(pool: &PgPool, user_id: &str, id: Uuid) -> Result<ResumeRow, AppError> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

async fn fetch_children(
    pool: &PgPool,
    resume_ids: &[Uuid],
) -> Result<(Vec<WorkExperienceRow>, Vec<EducationRow>), AppError> {
    let work_experiences = sqlx::query_as::<_, WorkExperienceRow>(
        "SELECT * FROM work_experiences WHERE resume_id = ANY($1) ORDER BY resume_id, sort_order",
    )
    .bind(resume_ids)
    .fetch_all(pool)
    .await?;
    let educations = sqlx::query_as::<_, EducationRow>(
        "SELECT * FROM educations WHERE resume_id = ANY($1) ORDER BY resume_id, sort_order",
    )
    .bind(resume_ids)
    .fetch_all(pool)
    .await?;
    Ok((work_experiences, educations))
}

/// Loads one resume owned by `user_id`.
pub async fn load_resume(pool: &PgPool, user_id: &str, id: Uuid) -> Result<ResumeValues, AppError> {
    let resume = fetch_owned_row(pool, user_id, id).await?;
    let (work_experiences, educations) = fetch_children(pool, &[id]).await?;
    Ok(from_record(ResumeRecord {
        resume,
        work_experiences,
        educations,
    }))
}

/// All resumes of a user, most recently updated first.
pub async fn list_resumes(pool: &PgPool, user_id: &str) -> Result<Vec<ResumeValues>, AppError> {
    let rows = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let (work_experiences, educations) = fetch_children(pool, &ids).await?;

    let mut work_by_resume: HashMap<Uuid, Vec<WorkExperienceRow>> = HashMap::new();
    for row in work_experiences {
        work_by_resume.entry(row.resume_id).or_default().push(row);
    }
    let mut edu_by_resume: HashMap<Uuid, Vec<EducationRow>> = HashMap::new();
    for row in educations {
        edu_by_resume.entry(row.resume_id).or_default().push(row);
    }

    Ok(rows
        .into_iter()
        .map(|resume| {
            let id = resume.id;
            from_record(ResumeRecord {
                resume,
                work_experiences: work_by_resume.remove(&id).unwrap_or_default(),
                educations: edu_by_resume.remove(&id).unwrap_or_default(),
            })
        })
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Photo step
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of the photo step of a save. Stored files only disappear once the
/// row write has settled: [`PhotoPlan::commit`] drops the superseded file,
/// [`PhotoPlan::rollback`] drops the one uploaded for a failed write.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPlan {
    /// Value for the `photo_url` column.
    pub photo_url: Option<String>,
    uploaded: Option<String>,
    superseded: Option<String>,
}

/// Applies the photo rules against the currently stored URL.
///
/// A pending photo is uploaded (failure aborts the save); an explicit removal
/// clears the URL; otherwise the stored photo is left untouched. Nothing is
/// deleted here.
pub async fn stage_photo(
    photos: &dyn PhotoStore,
    existing: Option<&str>,
    photo: &PhotoValue,
) -> Result<PhotoPlan, AppError> {
    let existing = existing.map(str::to_string);
    match photo {
        PhotoValue::Pending(pending) => {
            let url = photos.upload(pending).await.map_err(|e| {
                warn!("Photo upload failed: {e}");
                AppError::Storage("Failed to upload photo".to_string())
            })?;
            Ok(PhotoPlan {
                photo_url: Some(url.clone()),
                uploaded: Some(url),
                superseded: existing,
            })
        }
        PhotoValue::Removed => Ok(PhotoPlan {
            photo_url: None,
            uploaded: None,
            superseded: existing,
        }),
        PhotoValue::Absent | PhotoValue::Persisted(_) => Ok(PhotoPlan {
            photo_url: existing,
            uploaded: None,
            superseded: None,
        }),
    }
}

impl PhotoPlan {
    /// The row now points at `photo_url`; the previous file can go.
    pub async fn commit(self, photos: &dyn PhotoStore) {
        if let Some(old) = &self.superseded {
            delete_photo_best_effort(photos, old).await;
        }
    }

    /// The row write failed; the row still points at the previous file.
    pub async fn rollback(self, photos: &dyn PhotoStore) {
        if let Some(new) = &self.uploaded {
            delete_photo_best_effort(photos, new).await;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Writes
// ────────────────────────────────────────────────────────────────────────────

/// Validates and persists `values` for `user_id`.
///
/// The new photo is uploaded before the row is written and the old one is
/// deleted (best effort) only after the transaction commits. If the write
/// fails, the freshly uploaded photo is deleted instead.
pub async fn save_resume(
    pool: &PgPool,
    photos: &dyn PhotoStore,
    user_id: &str,
    values: ResumeValues,
) -> Result<ResumeValues, AppError> {
    let values = normalize(values);
    validate(&values)?;

    let existing = match values.id {
        Some(id) => Some(fetch_owned_row(pool, user_id, id).await?),
        None => None,
    };
    let existing_photo = existing.as_ref().and_then(|r| r.photo_url.as_deref());
    let plan = stage_photo(photos, existing_photo, &values.photo).await?;

    let now = Utc::now();
    let record = to_record(
        &values,
        RecordMeta {
            id: values.id.unwrap_or_else(Uuid::new_v4),
            user_id,
            photo_url: plan.photo_url.clone(),
            created_at: existing.as_ref().map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        },
    );

    if let Err(e) = write_record(pool, &record, existing.is_some()).await {
        plan.rollback(photos).await;
        return Err(e);
    }
    plan.commit(photos).await;

    info!(
        "Saved resume {} for user {user_id} ({} work experiences, {} educations)",
        record.resume.id,
        record.work_experiences.len(),
        record.educations.len()
    );

    Ok(from_record(record))
}

/// Writes the row and replaces its children in one transaction.
async fn write_record(pool: &PgPool, record: &ResumeRecord, is_update: bool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    if is_update {
        update_resume_row(&mut tx, &record.resume).await?;
        sqlx::query("DELETE FROM work_experiences WHERE resume_id = $1")
            .bind(record.resume.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM educations WHERE resume_id = $1")
            .bind(record.resume.id)
            .execute(&mut *tx)
            .await?;
    } else {
        insert_resume_row(&mut tx, &record.resume).await?;
    }
    insert_children(&mut tx, record).await?;
    tx.commit().await?;
    Ok(())
}

/// Deletes a resume (children cascade) and its stored photo.
pub async fn delete_resume(
    pool: &PgPool,
    photos: &dyn PhotoStore,
    user_id: &str,
    id: Uuid,
) -> Result<(), AppError> {
    let row = fetch_owned_row(pool, user_id, id).await?;
    sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if let Some(url) = &row.photo_url {
        delete_photo_best_effort(photos, url).await;
    }
    info!("Deleted resume {id} for user {user_id}");
    Ok(())
}

async fn delete_photo_best_effort(photos: &dyn PhotoStore, url: &str) {
    if let Err(e) = photos.delete(url).await {
        warn!("Error deleting stored photo {url}: {e}");
    }
}

async fn insert_resume_row(tx: &mut Transaction<'_, Postgres>, row: &ResumeRow) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO resumes
            (id, user_id, title, description, photo_url, color_hex, border_style, summary,
             first_name, last_name, job_title, city, country, phone, email, skills,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        "#,
    )
    .bind(row.id)
    .bind(&row.user_id)
    .bind(&row.title)
    .bind(&row.description)
    .bind(&row.photo_url)
    .bind(&row.color_hex)
    .bind(&row.border_style)
    .bind(&row.summary)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.job_title)
    .bind(&row.city)
    .bind(&row.country)
    .bind(&row.phone)
    .bind(&row.email)
    .bind(&row.skills)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_resume_row(tx: &mut Transaction<'_, Postgres>, row: &ResumeRow) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE resumes SET
            title = $3, description = $4, photo_url = $5, color_hex = $6, border_style = $7,
            summary = $8, first_name = $9, last_name = $10, job_title = $11, city = $12,
            country = $13, phone = $14, email = $15, skills = $16, updated_at = $17
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(row.id)
    .bind(&row.user_id)
    .bind(&row.title)
    .bind(&row.description)
    .bind(&row.photo_url)
    .bind(&row.color_hex)
    .bind(&row.border_style)
    .bind(&row.summary)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.job_title)
    .bind(&row.city)
    .bind(&row.country)
    .bind(&row.phone)
    .bind(&row.email)
    .bind(&row.skills)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_children(tx: &mut Transaction<'_, Postgres>, record: &ResumeRecord) -> Result<(), AppError> {
    for row in &record.work_experiences {
        sqlx::query(
            r#"
            INSERT INTO work_experiences
                (id, resume_id, sort_order, position, company, start_date, end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(row.id)
        .bind(row.resume_id)
        .bind(row.sort_order)
        .bind(&row.position)
        .bind(&row.company)
        .bind(row.start_date)
        .bind(row.end_date)
        .bind(&row.description)
        .execute(&mut **tx)
        .await?;
    }
    for row in &record.educations {
        sqlx::query(
            r#"
            INSERT INTO educations
                (id, resume_id, sort_order, degree, school, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.id)
        .bind(row.resume_id)
        .bind(row.sort_order)
        .bind(&row.degree)
        .bind(&row.school)
        .bind(row.start_date)
        .bind(row.end_date)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
