use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Rules, path_id, text};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::JsonBody,
    models::{
        ApplyRequest, InternshipStatus, NewApplication, ResumeUpload, ResumeUploadRequest, Role,
    },
    policy,
    repository::Repository,
    validation,
};

/// Resume formats accepted for upload, with the object key extension used for each.
pub const RESUME_CONTENT_TYPES: [(&str, &str); 3] = [
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
];

/// Apply to an internship on behalf of a student.
///
/// Student path id → student exists → caller is that student → body → internship id →
/// internship exists → still active → deadline not passed → resume key present and shaped
/// like an issued upload key → not applied yet.
pub async fn admit_application(
    repo: &dyn Repository,
    user: &AuthUser,
    student_id: &str,
    body: &JsonBody<ApplyRequest>,
    now: DateTime<Utc>,
) -> ApiResult<NewApplication> {
    let student_id = path_id(student_id, "studentId", "Invalid studentId")?;

    let student = repo
        .get_student(student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".into()))?;

    policy::ensure_owner(
        user,
        Role::Student,
        &student.id,
        "Unauthorized to apply on behalf of this student",
    )?;

    let req = &body.value;
    Rules::new()
        .check("body", "Provide details to apply", || !body.is_empty())
        .require("internshipId", "InternshipId is required", req.internship_id.as_deref())
        .finish()?;

    let internship_id = path_id(
        text(&req.internship_id),
        "internshipId",
        "Invalid internshipId",
    )?;

    let internship = repo
        .get_internship(internship_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Internship not found".into()))?;

    Rules::new()
        .ensure(
            || internship.status == InternshipStatus::Active,
            || ApiError::Policy("Internship is closed".into()),
        )
        .ensure(
            || validation::deadline_open(internship.application_deadline, now),
            || ApiError::Policy("Application deadline has passed".into()),
        )
        .require("resumeKey", "ResumeKey is required", req.resume_key.as_deref())
        .check("resumeKey", "Invalid resumeKey", || {
            is_resume_key(text(&req.resume_key).trim())
        })
        .finish()?;

    if repo
        .find_application(student.id, internship.id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(
            "internshipId",
            "You have already applied to this internship",
        ));
    }

    Ok(NewApplication {
        student_id: student.id,
        internship_id: internship.id,
        resume_key: text(&req.resume_key).trim().to_string(),
    })
}

/// Resume upload URL request. Students only; the object key is generated server-side.
pub fn admit_resume_upload(
    user: &AuthUser,
    body: &JsonBody<ResumeUploadRequest>,
) -> ApiResult<ResumeUpload> {
    policy::ensure_role(user, Role::Student, "Only students can upload resumes")?;

    let req = &body.value;
    Rules::new()
        .check("body", "Provide file details for upload", || !body.is_empty())
        .require("filename", "Filename is required", req.filename.as_deref())
        .require("fileType", "FileType is required", req.file_type.as_deref())
        .finish()?;

    let content_type = text(&req.file_type);
    let extension = RESUME_CONTENT_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| {
            ApiError::validation("fileType", "Resume must be a PDF or Word document")
        })?;

    // A bare name without an extension is accepted; the key extension comes from fileType.
    let filename = text(&req.filename).trim();
    if filename
        .rsplit_once('.')
        .is_some_and(|(_, named)| !named.eq_ignore_ascii_case(extension))
    {
        return Err(ApiError::validation(
            "filename",
            "Filename extension does not match fileType",
        ));
    }

    Ok(ResumeUpload {
        key: format!("resumes/{}.{}", Uuid::new_v4(), extension),
        content_type: content_type.to_string(),
    })
}

/// `resumes/<uuid>.<ext>` with a lowercase hyphenated uuid and a resume extension, which
/// is exactly the shape [`admit_resume_upload`] hands out.
fn is_resume_key(key: &str) -> bool {
    key.strip_prefix("resumes/")
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(stem, ext)| {
            Uuid::try_parse(stem).is_ok_and(|id| id.hyphenated().to_string() == stem)
                && RESUME_CONTENT_TYPES.iter().any(|(_, known)| *known == ext)
        })
}

/// Applicant review: only the company that owns the internship may list its applicants.
pub async fn admit_applicant_review(
    repo: &dyn Repository,
    user: &AuthUser,
    internship_id: &str,
) -> ApiResult<Uuid> {
    let internship = super::internship::owned_internship(
        repo,
        user,
        internship_id,
        "Unauthorized to view applications for this internship",
    )
    .await?;
    Ok(internship.id)
}
