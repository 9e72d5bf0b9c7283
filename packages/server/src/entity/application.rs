use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Initial value of `last_email_status`. The column is owned by an
/// out-of-band mail worker; no operation here ever advances it.
pub const EMAIL_STATUS_NONE: &str = "none";

/// Review workflow state. `status_internal` holds the admin decision;
/// `status_public` holds what the applicant is allowed to see. The two are
/// separately-settable copies: decisioning and the public reveal are
/// decoupled, and nothing in this service propagates one to the other.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sea_orm::DeriveActiveEnum,
    sea_orm::EnumIter,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "waitlisted")]
    Waitlisted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ApplicationStatus {
    /// Values an admin may set via the status endpoint. `pending` is the
    /// birth state only; no operation moves an application back to it.
    pub const DECISIONS: &'static [&'static str] = &["accepted", "waitlisted", "rejected"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "waitlisted" => Some(Self::Waitlisted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Waitlisted => "waitlisted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sea_orm::DeriveActiveEnum,
    sea_orm::EnumIter,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ClassYear {
    #[sea_orm(string_value = "freshman")]
    Freshman,
    #[sea_orm(string_value = "sophomore")]
    Sophomore,
    #[sea_orm(string_value = "junior")]
    Junior,
    #[sea_orm(string_value = "senior")]
    Senior,
}

impl ClassYear {
    pub const VALUES: &'static [&'static str] = &["freshman", "sophomore", "junior", "senior"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "freshman" => Some(Self::Freshman),
            "sophomore" => Some(Self::Sophomore),
            "junior" => Some(Self::Junior),
            "senior" => Some(Self::Senior),
            _ => None,
        }
    }
}

/// How the applicant heard about the event.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sea_orm::DeriveActiveEnum,
    sea_orm::EnumIter,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Referral {
    #[sea_orm(string_value = "social_media")]
    SocialMedia,
    #[sea_orm(string_value = "website")]
    Website,
    #[sea_orm(string_value = "flyers")]
    Flyers,
    #[sea_orm(string_value = "class")]
    Class,
    #[sea_orm(string_value = "friend")]
    Friend,
    #[sea_orm(string_value = "none")]
    None,
}

impl Referral {
    pub const VALUES: &'static [&'static str] =
        &["social_media", "website", "flyers", "class", "friend", "none"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "social_media" => Some(Self::SocialMedia),
            "website" => Some(Self::Website),
            "flyers" => Some(Self::Flyers),
            "class" => Some(Self::Class),
            "friend" => Some(Self::Friend),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sea_orm::DeriveActiveEnum,
    sea_orm::EnumIter,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ShirtSize {
    #[sea_orm(string_value = "s")]
    S,
    #[sea_orm(string_value = "m")]
    M,
    #[sea_orm(string_value = "l")]
    L,
    #[sea_orm(string_value = "xl")]
    Xl,
    #[sea_orm(string_value = "xxl")]
    Xxl,
}

impl ShirtSize {
    pub const VALUES: &'static [&'static str] = &["s", "m", "l", "xl", "xxl"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "s" => Some(Self::S),
            "m" => Some(Self::M),
            "l" => Some(Self::L),
            "xl" => Some(Self::Xl),
            "xxl" => Some(Self::Xxl),
            _ => None,
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "application")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Externally-exposed identifier, decoupled from the serial key.
    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Unique: at most one application per user, enforced by the database
    /// so concurrent submits cannot produce two rows.
    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

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

    /// Admin-only workflow state.
    pub status_internal: ApplicationStatus,
    /// Applicant-visible state; only ever written at submit time here.
    pub status_public: ApplicationStatus,
    pub last_email_status: String,

    /// Original filename of the uploaded resume; presence marks that a
    /// blob exists under `resume_key()`.
    pub resume_filename: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Blob store key for this application's resume. Derived from the
    /// external identifier alone, so re-uploads overwrite in place and
    /// presigned URLs always target the current object.
    pub fn resume_key(&self) -> String {
        resume_key(&self.uuid)
    }
}

/// See [`Model::resume_key`].
pub fn resume_key(uuid: &Uuid) -> String {
    format!("resumes/{uuid}")
}

impl ActiveModelBehavior for ActiveModel {}
