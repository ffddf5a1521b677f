use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    AppState,
    auth::{AuthUser, password},
    error::{ApiError, ApiResult},
    extract::{JsonBody, QueryParams},
    models::{
        Applicant, Application, ApplyRequest, Company, CompanyLoginRequest,
        CreateInternshipRequest, DescriptionDraft, DescriptionDraftRequest, EditProfileRequest,
        Internship, InternshipDetails, InternshipListing, InternshipQuery, LoginResponse,
        NewCompany, NewStudent, RegisterCompanyRequest, RegisterStudentRequest,
        ResumeUploadRequest, ResumeUploadResponse, Role, Student, StudentLoginRequest,
        UpdateInternshipRequest,
    },
    response::ApiResponse,
    textgen,
    validators::{application, company, internship, student},
};

// --- Companies ---

/// register_company
///
/// [Public Route] Creates a company account. The stored password is an Argon2 hash and is
/// never part of the response.
#[utoipa::path(
    post,
    path = "/companies/register",
    request_body = RegisterCompanyRequest,
    responses(
        (status = 201, description = "Company registered", body = Company),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Email or contact number already registered")
    )
)]
pub async fn register_company(
    State(state): State<AppState>,
    body: JsonBody<RegisterCompanyRequest>,
) -> ApiResult<ApiResponse<Company>> {
    let registration = company::admit_registration(state.repo.as_ref(), &body).await?;
    let password_hash = password::hash_password(&registration.password)?;

    let created = state
        .repo
        .create_company(NewCompany {
            company_name: registration.name,
            company_email: registration.email,
            password_hash,
            contact_number: registration.contact,
        })
        .await?;

    tracing::info!(company_id = %created.id, "company registered");
    Ok(ApiResponse::created("Company Registered Successfully", created))
}

/// login_company
///
/// [Public Route] Exchanges company credentials for an identity token. The token is
/// returned in `data.token` and in the `Authorization` response header.
#[utoipa::path(
    post,
    path = "/companies/login",
    request_body = CompanyLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "Email not found")
    )
)]
pub async fn login_company(
    State(state): State<AppState>,
    body: JsonBody<CompanyLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let login = company::admit_login(&body)?;

    let account = state
        .repo
        .find_company_by_email(&login.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email not found".into()))?;

    if !password::verify_password(&login.password, &account.password)? {
        return Err(ApiError::IncorrectPassword);
    }

    let token = state.tokens.issue(account.id, Role::Company)?;
    tracing::info!(company_id = %account.id, "company logged in");
    Ok(login_response("Company Login Successfully", token))
}

// --- Students ---

/// register_student
///
/// [Public Route] Creates a student account with the mandatory identity fields only; the
/// profile is completed later through `edit_student_profile`.
#[utoipa::path(
    post,
    path = "/students/register",
    request_body = RegisterStudentRequest,
    responses(
        (status = 201, description = "Student registered", body = Student),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Email or mobile number already registered")
    )
)]
pub async fn register_student(
    State(state): State<AppState>,
    body: JsonBody<RegisterStudentRequest>,
) -> ApiResult<ApiResponse<Student>> {
    let registration = student::admit_registration(state.repo.as_ref(), &body).await?;
    let password_hash = password::hash_password(&registration.password)?;

    let created = state
        .repo
        .create_student(NewStudent {
            name: registration.name,
            email: registration.email,
            password_hash,
            mobile_number: registration.contact,
        })
        .await?;

    tracing::info!(student_id = %created.id, "student registered");
    Ok(ApiResponse::created("Student registered successfully", created))
}

#[utoipa::path(
    post,
    path = "/students/login",
    request_body = StudentLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "Email not found")
    )
)]
pub async fn login_student(
    State(state): State<AppState>,
    body: JsonBody<StudentLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let login = student::admit_login(&body)?;

    let account = state
        .repo
        .find_student_by_email(&login.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email not found".into()))?;

    if !password::verify_password(&login.password, &account.password)? {
        return Err(ApiError::IncorrectPassword);
    }

    let token = state.tokens.issue(account.id, Role::Student)?;
    tracing::info!(student_id = %account.id, "student logged in");
    Ok(login_response("Student login successfully", token))
}

/// edit_student_profile
///
/// [Authenticated Route] Completes or overwrites the caller's own profile.
#[utoipa::path(
    put,
    path = "/students/{studentId}/profile",
    request_body = EditProfileRequest,
    params(("studentId" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Profile updated", body = Student),
        (status = 403, description = "Not the owning student"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn edit_student_profile(
    user: AuthUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    body: JsonBody<EditProfileRequest>,
) -> ApiResult<ApiResponse<Student>> {
    let today = Utc::now().date_naive();
    let (id, profile) =
        student::admit_profile_edit(state.repo.as_ref(), &user, &student_id, &body, today).await?;

    let updated = state
        .repo
        .update_student_profile(id, profile)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".into()))?;

    Ok(ApiResponse::ok("Student details updated successfully", updated))
}

// --- Internships ---

/// post_internship
///
/// [Authenticated Route] Publishes an internship for the company named in the path, which
/// must be the caller.
#[utoipa::path(
    post,
    path = "/internships/company/{companyId}",
    request_body = CreateInternshipRequest,
    params(("companyId" = String, Path, description = "Company ID")),
    responses(
        (status = 201, description = "Internship posted", body = Internship),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Not the owning company"),
        (status = 404, description = "Company not found"),
        (status = 409, description = "Position already posted by this company")
    )
)]
pub async fn post_internship(
    user: AuthUser,
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    body: JsonBody<CreateInternshipRequest>,
) -> ApiResult<ApiResponse<Internship>> {
    let admitted = internship::admit_new_internship(
        state.repo.as_ref(),
        &user,
        &company_id,
        &body,
        Utc::now(),
    )
    .await?;

    let created = state.repo.create_internship(admitted).await?;
    tracing::info!(
        internship_id = %created.id,
        company_id = %created.company_id,
        "internship posted"
    );
    Ok(ApiResponse::created("Internship successfully posted", created))
}

/// update_internship
///
/// [Authenticated Route] Partial update by the owning company. Skills are merged into the
/// stored set rather than replacing it.
#[utoipa::path(
    put,
    path = "/internships/{internshipId}",
    request_body = UpdateInternshipRequest,
    params(("internshipId" = String, Path, description = "Internship ID")),
    responses(
        (status = 200, description = "Updated", body = Internship),
        (status = 403, description = "Not the owning company"),
        (status = 404, description = "Internship not found")
    )
)]
pub async fn update_internship(
    user: AuthUser,
    State(state): State<AppState>,
    Path(internship_id): Path<String>,
    body: JsonBody<UpdateInternshipRequest>,
) -> ApiResult<ApiResponse<Internship>> {
    let (id, patch) =
        internship::admit_internship_patch(state.repo.as_ref(), &user, &internship_id, &body)
            .await?;

    let updated = state
        .repo
        .update_internship(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Internship not found".into()))?;

    Ok(ApiResponse::ok("Updated Successfully", updated))
}

/// list_internships
///
/// [Authenticated Route] Active internships only, with optional equality filters and
/// page/limit pagination.
#[utoipa::path(
    get,
    path = "/internships",
    params(
        ("category" = Option<String>, Query, description = "Exact category"),
        ("position" = Option<String>, Query, description = "Exact position"),
        ("internshipType" = Option<String>, Query, description = "remote | wfh | wfo"),
        ("location.country" = Option<String>, Query, description = "Country"),
        ("location.state" = Option<String>, Query, description = "State"),
        ("location.city" = Option<String>, Query, description = "City"),
        ("page" = Option<u32>, Query, description = "Page number, from 1"),
        ("limit" = Option<u32>, Query, description = "Page size, 1 to 100")
    ),
    responses(
        (status = 200, description = "Active internships", body = [InternshipListing]),
        (status = 400, description = "Invalid filter or paging value")
    )
)]
pub async fn list_internships(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<InternshipQuery>,
) -> ApiResult<ApiResponse<Vec<InternshipListing>>> {
    let (filter, page) = internship::admit_listing_query(&query)?;

    let listings = state
        .repo
        .list_internships(&filter, page.skip(), i64::from(page.limit))
        .await?;

    Ok(ApiResponse::ok("Successfully fetched internships", listings))
}

/// get_internship
///
/// [Authenticated Route] One active internship with its company's public contact fields.
#[utoipa::path(
    get,
    path = "/internships/{internshipId}",
    params(("internshipId" = String, Path, description = "Internship ID")),
    responses(
        (status = 200, description = "Found", body = InternshipDetails),
        (status = 403, description = "Internship is closed"),
        (status = 404, description = "Internship not found")
    )
)]
pub async fn get_internship(
    State(state): State<AppState>,
    Path(internship_id): Path<String>,
) -> ApiResult<ApiResponse<InternshipDetails>> {
    let details = internship::admit_lookup(state.repo.as_ref(), &internship_id).await?;
    Ok(ApiResponse::ok("Successfully fetched", details))
}

/// draft_description
///
/// [Authenticated Route] Asks the text-generation provider for a description draft. The
/// draft is returned to the company and never stored.
#[utoipa::path(
    post,
    path = "/internships/description-draft",
    request_body = DescriptionDraftRequest,
    responses(
        (status = 200, description = "Draft", body = DescriptionDraft),
        (status = 403, description = "Caller is not a company"),
        (status = 500, description = "Provider failure")
    )
)]
pub async fn draft_description(
    user: AuthUser,
    State(state): State<AppState>,
    body: JsonBody<DescriptionDraftRequest>,
) -> ApiResult<ApiResponse<DescriptionDraft>> {
    let brief = internship::admit_description_draft(&user, &body)?;
    let description = state.textgen.complete(&textgen::build_prompt(&brief)).await?;
    Ok(ApiResponse::ok(
        "Description drafted successfully",
        DescriptionDraft { description },
    ))
}

/// list_applicants
///
/// [Authenticated Route] Applications received for an internship, visible to its owner.
#[utoipa::path(
    get,
    path = "/internships/{internshipId}/applications",
    params(("internshipId" = String, Path, description = "Internship ID")),
    responses(
        (status = 200, description = "Applicants", body = [Applicant]),
        (status = 403, description = "Not the owning company"),
        (status = 404, description = "Internship not found")
    )
)]
pub async fn list_applicants(
    user: AuthUser,
    State(state): State<AppState>,
    Path(internship_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<Applicant>>> {
    let id =
        application::admit_applicant_review(state.repo.as_ref(), &user, &internship_id).await?;
    let applicants = state.repo.list_applicants(id).await?;
    Ok(ApiResponse::ok("Successfully fetched applicants", applicants))
}

// --- Applications ---

/// resume_upload_url
///
/// [Authenticated Route] Issues a 10-minute presigned PUT URL for a resume. The returned
/// `resourceKey` is what the student submits as `resumeKey` when applying.
#[utoipa::path(
    post,
    path = "/applications/resume-upload",
    request_body = ResumeUploadRequest,
    responses(
        (status = 200, description = "Upload URL", body = ResumeUploadResponse),
        (status = 400, description = "Unsupported file type"),
        (status = 403, description = "Caller is not a student")
    )
)]
pub async fn resume_upload_url(
    user: AuthUser,
    State(state): State<AppState>,
    body: JsonBody<ResumeUploadRequest>,
) -> ApiResult<ApiResponse<ResumeUploadResponse>> {
    let upload = application::admit_resume_upload(&user, &body)?;
    let upload_url = state
        .storage
        .presign_upload(&upload.key, &upload.content_type)
        .await?;

    Ok(ApiResponse::ok(
        "Upload URL generated",
        ResumeUploadResponse {
            upload_url,
            resource_key: upload.key,
        },
    ))
}

/// apply_to_internship
///
/// [Authenticated Route] Records an application of the student named in the path, who
/// must be the caller.
#[utoipa::path(
    post,
    path = "/applications/{studentId}",
    request_body = ApplyRequest,
    params(("studentId" = String, Path, description = "Student ID")),
    responses(
        (status = 201, description = "Applied", body = Application),
        (status = 403, description = "Not the owning student, or internship closed"),
        (status = 404, description = "Student or internship not found"),
        (status = 409, description = "Already applied")
    )
)]
pub async fn apply_to_internship(
    user: AuthUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    body: JsonBody<ApplyRequest>,
) -> ApiResult<ApiResponse<Application>> {
    let admitted = application::admit_application(
        state.repo.as_ref(),
        &user,
        &student_id,
        &body,
        Utc::now(),
    )
    .await?;

    let created = state.repo.create_application(admitted).await?;
    tracing::info!(
        application_id = %created.id,
        internship_id = %created.internship_id,
        "application submitted"
    );
    Ok(ApiResponse::created("Applied successfully", created))
}

fn login_response(message: &'static str, token: String) -> impl IntoResponse {
    let bearer = format!("Bearer {token}");
    (
        [(header::AUTHORIZATION, bearer)],
        ApiResponse::ok(message, LoginResponse { token }),
    )
}
