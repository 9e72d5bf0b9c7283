use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::entity::application::{self, ApplicationStatus, ClassYear, Referral, ShirtSize};
use crate::entity::user;
use crate::error::{AppError, FieldErrors};
use crate::utils::filename::validate_flat_filename;

/// Maximum length of each long-form answer, in characters.
pub const LONG_ANSWER_MAX: usize = 2000;

/// Graduation years accepted on an application.
pub const GRAD_YEARS: &[i32] = &[2017, 2018, 2019, 2020, 2021, 2022, 2023, 2024, 2025];

/// A resume file received as a multipart part.
#[derive(Debug)]
pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Raw multipart form fields as received. Everything is optional at this
/// stage; empty text inputs are treated as absent (browsers submit blank
/// inputs as empty strings). Submit and update share this shape —
/// requiredness is decided by the validator, not the carrier.
#[derive(Default)]
pub struct ApplicationForm {
    pub class_year: Option<String>,
    pub grad_year: Option<String>,
    pub major: Option<String>,
    pub referral: Option<String>,
    pub hackathon_count: Option<String>,
    pub shirt_size: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub website: Option<String>,
    pub longanswer_1: Option<String>,
    pub longanswer_2: Option<String>,
    pub resume: Option<ResumeUpload>,
}

/// Fully validated payload for a first submission.
#[derive(Debug)]
pub struct NewApplication {
    pub class_year: ClassYear,
    pub grad_year: i32,
    pub major: String,
    pub referral: Referral,
    pub hackathon_count: i32,
    pub shirt_size: ShirtSize,
    pub dietary_restrictions: Option<String>,
    pub website: Option<String>,
    pub longanswer_1: String,
    pub longanswer_2: String,
    pub resume: Option<ResumeUpload>,
}

/// Validated partial update; `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct ApplicationPatch {
    pub class_year: Option<ClassYear>,
    pub grad_year: Option<i32>,
    pub major: Option<String>,
    pub referral: Option<Referral>,
    pub hackathon_count: Option<i32>,
    pub shirt_size: Option<ShirtSize>,
    pub dietary_restrictions: Option<String>,
    pub website: Option<String>,
    pub longanswer_1: Option<String>,
    pub longanswer_2: Option<String>,
    pub resume: Option<ResumeUpload>,
}

/// Submitted-field enums parsed from multipart text values.
trait FormEnum: Sized {
    const VALUES: &'static [&'static str];
    fn parse_value(s: &str) -> Option<Self>;
}

impl FormEnum for ClassYear {
    const VALUES: &'static [&'static str] = ClassYear::VALUES;
    fn parse_value(s: &str) -> Option<Self> {
        ClassYear::parse(s)
    }
}

impl FormEnum for Referral {
    const VALUES: &'static [&'static str] = Referral::VALUES;
    fn parse_value(s: &str) -> Option<Self> {
        Referral::parse(s)
    }
}

impl FormEnum for ShirtSize {
    const VALUES: &'static [&'static str] = ShirtSize::VALUES;
    fn parse_value(s: &str) -> Option<Self> {
        ShirtSize::parse(s)
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Record "is required" for absent fields; pass the value through either way.
fn require<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    if value.is_none() {
        push_error(errors, field, "is required");
    }
    value
}

fn check_enum<T: FormEnum>(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<T> {
    match T::parse_value(raw.trim()) {
        Some(v) => Some(v),
        None => {
            push_error(
                errors,
                field,
                format!("must be one of: {}", T::VALUES.join(", ")),
            );
            None
        }
    }
}

fn check_grad_year(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<i32> {
    match raw.trim().parse::<i32>() {
        Ok(year) if GRAD_YEARS.contains(&year) => Some(year),
        _ => {
            let years: Vec<String> = GRAD_YEARS.iter().map(|y| y.to_string()).collect();
            push_error(errors, field, format!("must be one of: {}", years.join(", ")));
            None
        }
    }
}

fn check_count(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<i32> {
    match raw.trim().parse::<i32>() {
        Ok(n) if n >= 0 => Some(n),
        Ok(_) => {
            push_error(errors, field, "must be zero or greater");
            None
        }
        Err(_) => {
            push_error(errors, field, "must be an integer");
            None
        }
    }
}

fn check_long_answer(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<String> {
    if raw.chars().count() > LONG_ANSWER_MAX {
        push_error(
            errors,
            field,
            format!("must be at most {LONG_ANSWER_MAX} characters"),
        );
        None
    } else {
        Some(raw.to_string())
    }
}

fn check_website(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(trimmed.to_string()),
        _ => {
            push_error(errors, field, "must be a valid http(s) URL");
            None
        }
    }
}

fn check_resume(
    errors: &mut FieldErrors,
    resume: ResumeUpload,
    max_size: u64,
) -> Option<ResumeUpload> {
    let filename = match validate_flat_filename(&resume.filename) {
        Ok(name) => name.to_string(),
        Err(e) => {
            push_error(errors, "resume", e.message());
            return None;
        }
    };
    if resume.bytes.len() as u64 > max_size {
        push_error(
            errors,
            "resume",
            format!("must be at most {max_size} bytes"),
        );
        return None;
    }
    Some(ResumeUpload {
        filename,
        bytes: resume.bytes,
    })
}

/// Validate a first submission: every field required unless optional by
/// the data model. Collects per-field errors rather than failing on the
/// first bad field.
pub fn validate_submit(
    form: ApplicationForm,
    max_resume_size: u64,
) -> Result<NewApplication, AppError> {
    let mut errors = FieldErrors::new();

    let class_year = require(&mut errors, "class_year", form.class_year.as_deref())
        .and_then(|s| check_enum::<ClassYear>(&mut errors, "class_year", s));
    let grad_year = require(&mut errors, "grad_year", form.grad_year.as_deref())
        .and_then(|s| check_grad_year(&mut errors, "grad_year", s));
    let major = require(&mut errors, "major", form.major.as_deref()).map(|s| s.trim().to_string());
    let referral = require(&mut errors, "referral", form.referral.as_deref())
        .and_then(|s| check_enum::<Referral>(&mut errors, "referral", s));
    let hackathon_count = require(&mut errors, "hackathon_count", form.hackathon_count.as_deref())
        .and_then(|s| check_count(&mut errors, "hackathon_count", s));
    let shirt_size = require(&mut errors, "shirt_size", form.shirt_size.as_deref())
        .and_then(|s| check_enum::<ShirtSize>(&mut errors, "shirt_size", s));
    let longanswer_1 = require(&mut errors, "longanswer_1", form.longanswer_1.as_deref())
        .and_then(|s| check_long_answer(&mut errors, "longanswer_1", s));
    let longanswer_2 = require(&mut errors, "longanswer_2", form.longanswer_2.as_deref())
        .and_then(|s| check_long_answer(&mut errors, "longanswer_2", s));
    let website = form
        .website
        .as_deref()
        .and_then(|s| check_website(&mut errors, "website", s));
    let resume = form
        .resume
        .and_then(|r| check_resume(&mut errors, r, max_resume_size));

    if !errors.is_empty() {
        return Err(AppError::FieldValidation(errors));
    }

    // Every required field is Some once the error map is empty.
    let (
        Some(class_year),
        Some(grad_year),
        Some(major),
        Some(referral),
        Some(hackathon_count),
        Some(shirt_size),
        Some(longanswer_1),
        Some(longanswer_2),
    ) = (
        class_year,
        grad_year,
        major,
        referral,
        hackathon_count,
        shirt_size,
        longanswer_1,
        longanswer_2,
    )
    else {
        return Err(AppError::Internal(
            "submit validation produced no errors but left fields unset".into(),
        ));
    };

    Ok(NewApplication {
        class_year,
        grad_year,
        major,
        referral,
        hackathon_count,
        shirt_size,
        dietary_restrictions: form.dietary_restrictions,
        website,
        longanswer_1,
        longanswer_2,
        resume,
    })
}

/// Validate a partial update: same per-field rules as submit, nothing
/// required. Only supplied fields end up in the patch.
pub fn validate_update(
    form: ApplicationForm,
    max_resume_size: u64,
) -> Result<ApplicationPatch, AppError> {
    let mut errors = FieldErrors::new();

    let class_year = form
        .class_year
        .as_deref()
        .and_then(|s| check_enum::<ClassYear>(&mut errors, "class_year", s));
    let grad_year = form
        .grad_year
        .as_deref()
        .and_then(|s| check_grad_year(&mut errors, "grad_year", s));
    let referral = form
        .referral
        .as_deref()
        .and_then(|s| check_enum::<Referral>(&mut errors, "referral", s));
    let hackathon_count = form
        .hackathon_count
        .as_deref()
        .and_then(|s| check_count(&mut errors, "hackathon_count", s));
    let shirt_size = form
        .shirt_size
        .as_deref()
        .and_then(|s| check_enum::<ShirtSize>(&mut errors, "shirt_size", s));
    let longanswer_1 = form
        .longanswer_1
        .as_deref()
        .and_then(|s| check_long_answer(&mut errors, "longanswer_1", s));
    let longanswer_2 = form
        .longanswer_2
        .as_deref()
        .and_then(|s| check_long_answer(&mut errors, "longanswer_2", s));
    let website = form
        .website
        .as_deref()
        .and_then(|s| check_website(&mut errors, "website", s));
    let resume = form
        .resume
        .and_then(|r| check_resume(&mut errors, r, max_resume_size));

    if !errors.is_empty() {
        return Err(AppError::FieldValidation(errors));
    }

    Ok(ApplicationPatch {
        class_year,
        grad_year,
        major: form.major.map(|s| s.trim().to_string()),
        referral,
        hackathon_count,
        shirt_size,
        dietary_restrictions: form.dietary_restrictions,
        website,
        longanswer_1,
        longanswer_2,
        resume,
    })
}

/// Applicant-facing projection. Admin-only columns (`status_internal`,
/// `last_email_status`) are absent by construction; `status` reflects
/// `status_public`, never the internal decision.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApplicationSelfView {
    /// Externally-exposed application identifier.
    pub id: Uuid,
    pub class_year: ClassYear,
    pub grad_year: i32,
    pub major: String,
    pub referral: Referral,
    pub hackathon_count: i32,
    pub shirt_size: ShirtSize,
    pub dietary_restrictions: Option<String>,
    pub website: Option<String>,
    pub longanswer_1: String,
    pub longanswer_2: String,
    /// The applicant-visible status.
    pub status: ApplicationStatus,
    pub resume_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<application::Model> for ApplicationSelfView {
    fn from(m: application::Model) -> Self {
        Self {
            id: m.uuid,
            class_year: m.class_year,
            grad_year: m.grad_year,
            major: m.major,
            referral: m.referral,
            hackathon_count: m.hackathon_count,
            shirt_size: m.shirt_size,
            dietary_restrictions: m.dietary_restrictions,
            website: m.website,
            longanswer_1: m.longanswer_1,
            longanswer_2: m.longanswer_2,
            status: m.status_public,
            resume_filename: m.resume_filename,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Owner summary embedded in admin views. Deliberately a projection:
/// the password hash never leaves the entity layer.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            firstname: u.firstname,
            lastname: u.lastname,
            email: u.email,
        }
    }
}

/// Full record for admins, internal workflow state included.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApplicationAdminView {
    pub id: i32,
    pub uuid: Uuid,
    pub user_id: i32,
    pub class_year: ClassYear,
    pub grad_year: i32,
    pub major: String,
    pub referral: Referral,
    pub hackathon_count: i32,
    pub shirt_size: ShirtSize,
    pub dietary_restrictions: Option<String>,
    pub website: Option<String>,
    pub longanswer_1: String,
    pub longanswer_2: String,
    pub status_internal: ApplicationStatus,
    pub status_public: ApplicationStatus,
    pub last_email_status: String,
    pub resume_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
}

impl ApplicationAdminView {
    pub fn from_parts(m: application::Model, owner: user::Model) -> Self {
        Self {
            id: m.id,
            uuid: m.uuid,
            user_id: m.user_id,
            class_year: m.class_year,
            grad_year: m.grad_year,
            major: m.major,
            referral: m.referral,
            hackathon_count: m.hackathon_count,
            shirt_size: m.shirt_size,
            dietary_restrictions: m.dietary_restrictions,
            website: m.website,
            longanswer_1: m.longanswer_1,
            longanswer_2: m.longanswer_2,
            status_internal: m.status_internal,
            status_public: m.status_public,
            last_email_status: m.last_email_status,
            resume_filename: m.resume_filename,
            created_at: m.created_at,
            updated_at: m.updated_at,
            user: UserSummary::from(owner),
        }
    }
}

/// Acknowledgment returned by a successful submit.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmitApplicationResponse {
    /// Externally-exposed identifier of the new application.
    pub id: Uuid,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationAdminView>,
    pub total: u64,
}

/// Request body for the admin status endpoint. The status arrives as a
/// plain string and is checked against the decision set in the handler.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetStatusRequest {
    #[schema(example = "accepted")]
    pub status: String,
}

/// Time-limited resume download grant.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ResumeUrlResponse {
    pub url: String,
    pub expires_in_secs: u64,
}
