use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` route layer, so handlers always
/// receive a verified `AuthUser`. Listing and lookup are open to any authenticated party;
/// the remaining endpoints are role-gated and owner-only inside their validators.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Students ---
        // PUT /students/{studentId}/profile
        // The owning student completes or re-submits their profile.
        .route(
            "/students/{studentId}/profile",
            put(handlers::edit_student_profile),
        )
        // --- Internships ---
        // GET /internships?category=&position=&internshipType=&location.city=&page=&limit=
        // Active internships only; `status=active` is applied unconditionally by the store.
        .route("/internships", get(handlers::list_internships))
        // POST /internships/company/{companyId}
        // The owning company posts a new internship.
        .route(
            "/internships/company/{companyId}",
            post(handlers::post_internship),
        )
        // POST /internships/description-draft
        // Company-only writing assistant backed by the text-generation provider.
        .route(
            "/internships/description-draft",
            post(handlers::draft_description),
        )
        // GET/PUT /internships/{internshipId}
        // Lookup (closed internships are refused) and owner-only partial update.
        .route(
            "/internships/{internshipId}",
            get(handlers::get_internship).put(handlers::update_internship),
        )
        // GET /internships/{internshipId}/applications
        // The owning company reviews who applied.
        .route(
            "/internships/{internshipId}/applications",
            get(handlers::list_applicants),
        )
        // --- Applications ---
        // POST /applications/resume-upload
        // Short-lived (10-minute) presigned PUT URL; the client uploads straight to storage.
        .route(
            "/applications/resume-upload",
            post(handlers::resume_upload_url),
        )
        // POST /applications/{studentId}
        // The owning student applies with an uploaded resume key.
        .route("/applications/{studentId}", post(handlers::apply_to_internship))
}
