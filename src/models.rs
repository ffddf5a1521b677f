use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::validation;

// --- Enumerations ---

/// Role
///
/// The kind of party an identity token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Student,
    Company,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
        }
    }
}

/// Returned when a stored or submitted value is outside an enumeration.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InternshipType {
    #[default]
    Remote,
    Wfh,
    Wfo,
}

impl InternshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternshipType::Remote => "remote",
            InternshipType::Wfh => "wfh",
            InternshipType::Wfo => "wfo",
        }
    }
}

impl FromStr for InternshipType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(InternshipType::Remote),
            "wfh" => Ok(InternshipType::Wfh),
            "wfo" => Ok(InternshipType::Wfo),
            other => Err(UnknownVariant {
                kind: "internshipType",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InternshipStatus {
    #[default]
    Active,
    Closed,
}

impl InternshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternshipStatus::Active => "active",
            InternshipStatus::Closed => "closed",
        }
    }
}

impl FromStr for InternshipStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(InternshipStatus::Active),
            "closed" => Ok(InternshipStatus::Closed),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

// --- Value Types ---

/// Location
///
/// Country/state/city triple used for internship locations and student addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Location {
    pub country: String,
    pub state: String,
    pub city: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Invalid stipend format")]
pub struct InvalidStipend;

/// Stipend
///
/// A stipend range made of two numeric tokens. It is stored and rendered as `"min-max"`,
/// keeping each token exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Stipend {
    min: String,
    max: String,
}

impl Stipend {
    pub fn min(&self) -> &str {
        &self.min
    }

    pub fn max(&self) -> &str {
        &self.max
    }
}

impl FromStr for Stipend {
    type Err = InvalidStipend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !validation::is_valid_range_string(s) {
            return Err(InvalidStipend);
        }
        // The range pattern allows a lone number, but a stipend needs both bounds.
        let (min, max) = s.split_once('-').ok_or(InvalidStipend)?;
        Ok(Stipend {
            min: min.to_string(),
            max: max.to_string(),
        })
    }
}

impl fmt::Display for Stipend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl TryFrom<String> for Stipend {
    type Error = InvalidStipend;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Stipend> for String {
    fn from(value: Stipend) -> Self {
        value.to_string()
    }
}

/// NumericInput
///
/// Numeric request fields accept either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum NumericInput {
    Number(i64),
    Text(String),
}

impl NumericInput {
    pub fn value(&self) -> Option<i64> {
        match self {
            NumericInput::Number(n) => Some(*n),
            NumericInput::Text(raw) => validation::parse_numeric(raw),
        }
    }
}

// --- Stored Entities ---

/// Company
///
/// A registered company account. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Company {
    pub id: Uuid,
    pub company_name: String,
    pub company_email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password: String,
    pub contact_number: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Student
///
/// A registered student. The profile extension fields stay empty until the student
/// completes their profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password: String,
    pub mobile_number: String,
    #[serde(rename = "DOB")]
    #[ts(type = "string | null")]
    pub dob: Option<NaiveDate>,
    pub college_name: Option<String>,
    pub year_of_passout: Option<i32>,
    pub area_of_interest: Option<String>,
    pub address: Option<Location>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Internship
///
/// A posting owned by exactly one company.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Internship {
    pub id: Uuid,
    pub company_id: Uuid,
    pub category: String,
    pub position: String,
    pub internship_type: InternshipType,
    pub skills_required: Vec<String>,
    pub eligibility: String,
    pub duration: String,
    pub location: Location,
    #[ts(type = "string")]
    pub application_deadline: NaiveDate,
    pub number_of_openings: i32,
    #[ts(type = "string")]
    #[schema(value_type = String, example = "5000-10000")]
    pub stipend: Stipend,
    pub status: InternshipStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// InternshipListing
///
/// Listing item: the internship plus the owning company's display name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InternshipListing {
    pub company_name: String,
    #[serde(flatten)]
    pub internship: Internship,
}

/// InternshipDetails
///
/// Single-internship view joined with the owner's public contact fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InternshipDetails {
    pub company_name: String,
    pub company_email: String,
    pub contact_number: String,
    #[serde(flatten)]
    pub internship: Internship,
}

/// Application
///
/// Links a student to an internship together with the uploaded resume's object key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub internship_id: Uuid,
    pub resume_key: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Applicant
///
/// An application as reviewed by the posting company, joined with the student's public
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Applicant {
    pub application_id: Uuid,
    pub resume_key: String,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
    pub student: Student,
}

// --- Request Payloads (Input Schemas) ---
//
// Every field is optional so that a missing field surfaces as a precise validation message
// from the resource validators rather than a generic deserialization error.

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompanyRequest {
    pub company_name: Option<String>,
    pub company_email: Option<String>,
    pub password: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompanyLoginRequest {
    pub company_email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudentLoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LocationInput {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest {
    #[serde(rename = "DOB")]
    pub dob: Option<String>,
    pub college_name: Option<String>,
    pub year_of_passout: Option<NumericInput>,
    pub area_of_interest: Option<String>,
    pub address: Option<LocationInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternshipRequest {
    pub category: Option<String>,
    pub position: Option<String>,
    pub internship_type: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub eligibility: Option<String>,
    pub duration: Option<String>,
    pub location: Option<LocationInput>,
    pub application_deadline: Option<String>,
    pub number_of_openings: Option<NumericInput>,
    pub stipend: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternshipRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internship_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_required: Option<Vec<String>>,
}

/// InternshipQuery
///
/// Query parameters of the internship listing. Location filters accept both the dotted
/// (`location.city`) and the flat (`city`) spelling.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InternshipQuery {
    pub category: Option<String>,
    pub position: Option<String>,
    pub internship_type: Option<String>,
    #[serde(rename = "location.country", alias = "country")]
    pub country: Option<String>,
    #[serde(rename = "location.state", alias = "state")]
    pub state: Option<String>,
    #[serde(rename = "location.city", alias = "city")]
    pub city: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub internship_id: Option<String>,
    pub resume_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUploadRequest {
    #[schema(example = "resume.pdf")]
    pub filename: Option<String>,
    #[schema(example = "application/pdf")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionDraftRequest {
    pub category: Option<String>,
    pub position: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub duration: Option<String>,
}

// --- Response Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResumeUploadResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to submit as `resumeKey` when applying.
    pub resource_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DescriptionDraft {
    pub description: String,
}

// --- Admitted Inputs (validator output, repository input) ---

#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    pub company_name: String,
    pub company_email: String,
    pub password_hash: String,
    pub contact_number: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile_number: String,
}

/// Credentials that passed registration admission; the password is still plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub dob: NaiveDate,
    pub college_name: String,
    pub year_of_passout: i32,
    pub area_of_interest: String,
    pub address: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInternship {
    pub company_id: Uuid,
    pub category: String,
    pub position: String,
    pub internship_type: InternshipType,
    pub skills_required: Vec<String>,
    pub eligibility: String,
    pub duration: String,
    pub location: Location,
    pub application_deadline: NaiveDate,
    pub number_of_openings: i32,
    pub stipend: Stipend,
    pub status: InternshipStatus,
}

/// Partial update; `None` leaves the stored value untouched. `skills_required` holds the
/// incoming skills only and is unioned with the stored set by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InternshipPatch {
    pub status: Option<InternshipStatus>,
    pub internship_type: Option<InternshipType>,
    pub duration: Option<String>,
    pub skills_required: Option<Vec<String>>,
}

/// Equality filters of the listing; `status = active` is always applied by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InternshipFilter {
    pub category: Option<String>,
    pub position: Option<String>,
    pub internship_type: Option<InternshipType>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn skip(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Admitted input of the description assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionBrief {
    pub category: String,
    pub position: String,
    pub skills: Vec<String>,
    pub duration: Option<String>,
}

/// An admitted resume upload: where the artifact goes and what it is.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeUpload {
    pub key: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub student_id: Uuid,
    pub internship_id: Uuid,
    pub resume_key: String,
}
