use std::time::Duration;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::response::IntoResponse;
use chrono::Utc;
use common::mail::MailMessage;
use sea_orm::*;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::entity::application::{self, ApplicationStatus, EMAIL_STATUS_NONE};
use crate::entity::user;
use crate::error::{AppError, ErrorBody, FieldErrors};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::application::{
    ApplicationAdminView, ApplicationForm, ApplicationListResponse, ApplicationSelfView,
    ResumeUrlResponse, ResumeUpload, SetStatusRequest, SubmitApplicationResponse, validate_submit,
    validate_update,
};
use crate::state::AppState;

/// Body limit for the multipart submit/update routes: the configured
/// resume ceiling plus headroom for the text fields.
pub fn resume_upload_body_limit(max_resume_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_resume_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(16 * 1024))
}

/// Drain a multipart request into an [`ApplicationForm`].
///
/// Fields are mapped one by one; anything not named here is dropped on the
/// floor so unexpected keys can never reach persistence. Blank text inputs
/// count as absent, matching what browsers send for untouched fields.
async fn collect_form(multipart: &mut Multipart) -> Result<ApplicationForm, AppError> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };

        if name == "resume" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
            if filename.trim().is_empty() && bytes.is_empty() {
                continue; // Untouched file input.
            }
            form.resume = Some(ResumeUpload {
                filename,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
        let value = (!text.trim().is_empty()).then_some(text);

        match name.as_str() {
            "class_year" => form.class_year = value,
            "grad_year" => form.grad_year = value,
            "major" => form.major = value,
            "referral" => form.referral = value,
            "hackathon_count" => form.hackathon_count = value,
            "shirt_size" => form.shirt_size = value,
            "dietary_restrictions" => form.dietary_restrictions = value,
            "website" => form.website = value,
            "longanswer_1" => form.longanswer_1 = value,
            "longanswer_2" => form.longanswer_2 = value,
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(form)
}

/// Find an application with its owner or return 404.
async fn find_application_with_owner<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<(application::Model, user::Model), AppError> {
    let (app, owner) = application::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".into()))?;

    let owner = owner.ok_or_else(|| AppError::Internal("Application owner not found".into()))?;
    Ok((app, owner))
}

/// Find the caller's own application, if any.
async fn find_own_application<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<application::Model>, AppError> {
    Ok(application::Entity::find()
        .filter(application::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Dispatch the submission confirmation email.
///
/// Fire-and-forget: the task is spawned after commit, failures are logged,
/// and nothing here feeds back into `last_email_status` - that column
/// belongs to an out-of-band mail worker.
fn send_confirmation(state: &AppState, user_id: i32) {
    let db = state.db.clone();
    let mailer = state.mailer.clone();

    tokio::spawn(async move {
        let user = match user::Entity::find_by_id(user_id).one(&db).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(user_id, "Confirmation email skipped: user not found");
                return;
            }
            Err(e) => {
                warn!(user_id, error = %e, "Confirmation email skipped: DB error");
                return;
            }
        };

        let message = MailMessage {
            to: user.email.clone(),
            subject: "We received your application".into(),
            body: format!(
                "Hi {},\n\nYour hackathon application has been received. \
                 We'll be in touch once decisions go out.\n",
                user.firstname
            ),
        };

        if let Err(e) = mailer.send(message).await {
            warn!(user_id, error = %e, "Failed to send application confirmation");
        }
    });
}

/// Get the caller's own application.
#[utoipa::path(
    get,
    path = "/api/v1/application/self",
    tag = "Applications",
    operation_id = "getOwnApplication",
    summary = "Get the caller's application",
    description = "Returns the caller's application projected onto the public view: \
        `status` reflects the applicant-visible status and internal review columns \
        are never included.",
    responses(
        (status = 200, description = "The caller's application", body = ApplicationSelfView),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No application on file (NO_APPLICATION)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_self_application(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApplicationSelfView>, AppError> {
    let app = find_own_application(&state.db, auth_user.user_id)
        .await?
        .ok_or(AppError::NoApplication)?;

    Ok(Json(ApplicationSelfView::from(app)))
}

/// Get a single application by ID (admin).
#[utoipa::path(
    get,
    path = "/api/v1/application/{id}",
    tag = "Applications",
    operation_id = "getApplication",
    summary = "Get any application, internal state included",
    params(("id" = i32, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Full application record", body = ApplicationAdminView),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Application not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_application(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApplicationAdminView>, AppError> {
    auth_user.require_permission("application:view_all")?;

    let (app, owner) = find_application_with_owner(&state.db, id).await?;
    Ok(Json(ApplicationAdminView::from_parts(app, owner)))
}

/// List all applications (admin).
#[utoipa::path(
    get,
    path = "/api/v1/applications",
    tag = "Applications",
    operation_id = "listApplications",
    summary = "List every application with its owner",
    responses(
        (status = 200, description = "All applications", body = ApplicationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_applications(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    auth_user.require_permission("application:view_all")?;

    let rows = application::Entity::find()
        .find_also_related(user::Entity)
        .order_by_asc(application::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut applications = Vec::with_capacity(rows.len());
    for (app, owner) in rows {
        let owner =
            owner.ok_or_else(|| AppError::Internal("Application owner not found".into()))?;
        applications.push(ApplicationAdminView::from_parts(app, owner));
    }

    let total = applications.len() as u64;
    Ok(Json(ApplicationListResponse {
        applications,
        total,
    }))
}

/// Submit a new application.
#[utoipa::path(
    post,
    path = "/api/v1/application",
    tag = "Applications",
    operation_id = "submitApplication",
    summary = "Submit an application",
    description = "Creates the caller's application from a multipart form. All required \
        fields must validate; an optional `resume` file part is stored in the blob \
        store before the record is committed, so a failed upload persists nothing. \
        A confirmation email is dispatched after commit without blocking the response.",
    request_body(content_type = "multipart/form-data", description = "Application fields plus optional `resume` file"),
    responses(
        (status = 200, description = "Application created", body = SubmitApplicationResponse),
        (status = 400, description = "Validation failure or duplicate application \
            (VALIDATION_ERROR, APPLICATION_EXISTS)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 500, description = "Resume upload failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_application(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("application:submit")?;

    let form = collect_form(&mut multipart).await?;
    let new_app = validate_submit(form, state.config.storage.max_resume_size)?;

    let txn = state.db.begin().await?;

    let now = Utc::now();
    let model = application::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        user_id: Set(auth_user.user_id),
        class_year: Set(new_app.class_year),
        grad_year: Set(new_app.grad_year),
        major: Set(new_app.major),
        referral: Set(new_app.referral),
        hackathon_count: Set(new_app.hackathon_count),
        shirt_size: Set(new_app.shirt_size),
        dietary_restrictions: Set(new_app.dietary_restrictions),
        website: Set(new_app.website),
        longanswer_1: Set(new_app.longanswer_1),
        longanswer_2: Set(new_app.longanswer_2),
        status_internal: Set(ApplicationStatus::Pending),
        status_public: Set(ApplicationStatus::Pending),
        last_email_status: Set(EMAIL_STATUS_NONE.to_string()),
        resume_filename: Set(new_app.resume.as_ref().map(|r| r.filename.clone())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // The unique user_id column closes the submit/submit race: the loser
    // of a concurrent insert sees a constraint violation, not a second row.
    let inserted = model.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyApplied,
        _ => AppError::from(e),
    })?;

    // Upload before commit: a storage failure drops the transaction and
    // leaves no application behind.
    if let Some(ref resume) = new_app.resume {
        state
            .blob_store
            .put(&inserted.resume_key(), &resume.bytes)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
    }

    txn.commit().await?;

    send_confirmation(&state, auth_user.user_id);

    Ok(Json(SubmitApplicationResponse { id: inserted.uuid }))
}

/// Update the caller's application.
#[utoipa::path(
    put,
    path = "/api/v1/application",
    tag = "Applications",
    operation_id = "updateApplication",
    summary = "Partially update the caller's application",
    description = "Applies the supplied multipart fields to the existing application. \
        Absent fields are untouched. A supplied `resume` replaces the stored file; \
        if that upload fails the entire update is aborted and every previously \
        stored field keeps its value.",
    request_body(content_type = "multipart/form-data", description = "Any subset of application fields plus optional `resume` file"),
    responses(
        (status = 200, description = "Updated application", body = ApplicationSelfView),
        (status = 400, description = "Validation failure or nothing to update \
            (VALIDATION_ERROR, NO_APPLICATION)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Resume upload failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn update_application(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApplicationSelfView>, AppError> {
    let form = collect_form(&mut multipart).await?;
    let patch = validate_update(form, state.config.storage.max_resume_size)?;

    let txn = state.db.begin().await?;

    let existing = find_own_application(&txn, auth_user.user_id)
        .await?
        .ok_or(AppError::NoApplicationToUpdate)?;

    // Replace the stored resume before touching any column, so an upload
    // failure aborts the whole update with prior fields intact.
    if let Some(ref resume) = patch.resume {
        state
            .blob_store
            .put(&existing.resume_key(), &resume.bytes)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
    }

    let resume_filename = patch.resume.as_ref().map(|r| r.filename.clone());

    let mut active: application::ActiveModel = existing.into();
    if let Some(v) = patch.class_year {
        active.class_year = Set(v);
    }
    if let Some(v) = patch.grad_year {
        active.grad_year = Set(v);
    }
    if let Some(v) = patch.major {
        active.major = Set(v);
    }
    if let Some(v) = patch.referral {
        active.referral = Set(v);
    }
    if let Some(v) = patch.hackathon_count {
        active.hackathon_count = Set(v);
    }
    if let Some(v) = patch.shirt_size {
        active.shirt_size = Set(v);
    }
    if let Some(v) = patch.dietary_restrictions {
        active.dietary_restrictions = Set(Some(v));
    }
    if let Some(v) = patch.website {
        active.website = Set(Some(v));
    }
    if let Some(v) = patch.longanswer_1 {
        active.longanswer_1 = Set(v);
    }
    if let Some(v) = patch.longanswer_2 {
        active.longanswer_2 = Set(v);
    }
    if let Some(name) = resume_filename {
        active.resume_filename = Set(Some(name));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(ApplicationSelfView::from(updated)))
}

/// Set an application's internal review status (admin).
#[utoipa::path(
    post,
    path = "/api/v1/application/{id}/status",
    tag = "Applications",
    operation_id = "setApplicationStatus",
    summary = "Record an internal review decision",
    description = "Sets `status_internal` to the given decision. The applicant-visible \
        `status_public` is deliberately untouched: revealing decisions is a separate \
        concern handled outside this service.",
    params(("id" = i32, Path, description = "Application ID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Updated application with owner", body = ApplicationAdminView),
        (status = 400, description = "Invalid status (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Application not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn set_application_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetStatusRequest>,
) -> Result<Json<ApplicationAdminView>, AppError> {
    auth_user.require_permission("application:set_status")?;

    let status = match ApplicationStatus::parse(payload.status.trim()) {
        Some(s) if s != ApplicationStatus::Pending => s,
        _ => {
            let mut errors = FieldErrors::new();
            errors.insert(
                "status".into(),
                vec![format!(
                    "must be one of: {}",
                    ApplicationStatus::DECISIONS.join(", ")
                )],
            );
            return Err(AppError::FieldValidation(errors));
        }
    };

    let (app, owner) = find_application_with_owner(&state.db, id).await?;

    let mut active: application::ActiveModel = app.into();
    active.status_internal = Set(status);
    // status_public stays as-is.
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    Ok(Json(ApplicationAdminView::from_parts(updated, owner)))
}

/// Presigned download URL for the caller's resume.
#[utoipa::path(
    get,
    path = "/api/v1/application/self/resume",
    tag = "Applications",
    operation_id = "getOwnResumeUrl",
    summary = "Get a download link for the caller's resume",
    description = "Returns a time-limited URL the blob store will honor for a direct \
        GET; the file is never streamed through this service.",
    responses(
        (status = 200, description = "Presigned URL", body = ResumeUrlResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No application or no resume on file \
            (NO_APPLICATION, NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_self_resume_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ResumeUrlResponse>, AppError> {
    let app = find_own_application(&state.db, auth_user.user_id)
        .await?
        .ok_or(AppError::NoApplication)?;

    presign_resume(&state, &app).await
}

/// Presigned download URL for any application's resume (admin).
#[utoipa::path(
    get,
    path = "/api/v1/application/{id}/resume",
    tag = "Applications",
    operation_id = "getResumeUrl",
    summary = "Get a download link for an application's resume",
    params(("id" = i32, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Presigned URL", body = ResumeUrlResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Application or resume not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_resume_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ResumeUrlResponse>, AppError> {
    auth_user.require_permission("application:view_all")?;

    let (app, _) = find_application_with_owner(&state.db, id).await?;
    presign_resume(&state, &app).await
}

/// Produce the presigned URL for an application's resume.
///
/// The key is derived from the application's identity alone, so repeated
/// requests always target the same (current) object.
async fn presign_resume(
    state: &AppState,
    app: &application::Model,
) -> Result<Json<ResumeUrlResponse>, AppError> {
    if app.resume_filename.is_none() {
        return Err(AppError::NotFound("No resume on file".into()));
    }

    let ttl = state.config.storage.presign_ttl_secs;
    let url = state
        .blob_store
        .presign_get(&app.resume_key(), Duration::from_secs(ttl))
        .await?;

    Ok(Json(ResumeUrlResponse {
        url,
        expires_in_secs: ttl,
    }))
}
