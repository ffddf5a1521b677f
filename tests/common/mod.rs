#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::{Duration, NaiveDate, Utc};
use internship_portal::{
    AppConfig, AppState, MockStorageService, TokenService, create_router,
    models::{
        Applicant, Application, Company, Internship, InternshipDetails, InternshipFilter,
        InternshipListing, InternshipPatch, InternshipStatus, InternshipType, Location,
        NewApplication, NewCompany, NewInternship, NewStudent, Role, Student, StudentProfile,
    },
    repository::{Repository, StoreError, StoreResult},
    textgen::MockTextGenerator,
    validation,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

// --- In-memory repository ---

#[derive(Default)]
struct Tables {
    companies: Vec<Company>,
    students: Vec<Student>,
    internships: Vec<Internship>,
    applications: Vec<Application>,
}

/// In-memory `Repository` enforcing the same unique constraints (and constraint names) as
/// the Postgres schema, so conflict mapping is exercised without a database.
#[derive(Default)]
pub struct InMemoryRepo {
    tables: Mutex<Tables>,
    /// When set, every call fails as if the database were unreachable.
    pub offline: bool,
    /// When set, uniqueness lookups see nothing, as when a concurrent insert lands between
    /// the check and the write. Inserts still enforce the constraints.
    pub blind_lookups: bool,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn racing() -> Self {
        Self {
            blind_lookups: true,
            ..Self::default()
        }
    }

    fn lookup_tables(&self) -> StoreResult<Option<std::sync::MutexGuard<'_, Tables>>> {
        let t = self.tables()?;
        Ok((!self.blind_lookups).then_some(t))
    }

    fn tables(&self) -> StoreResult<std::sync::MutexGuard<'_, Tables>> {
        if self.offline {
            return Err(StoreError::Backend("connection refused".into()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("poisoned".into()))
    }

    pub fn company_count(&self) -> usize {
        self.tables.lock().map(|t| t.companies.len()).unwrap_or(0)
    }

    pub fn stored_company(&self, email: &str) -> Option<Company> {
        self.tables
            .lock()
            .ok()?
            .companies
            .iter()
            .find(|c| c.company_email == email)
            .cloned()
    }

    pub fn stored_internship(&self, id: Uuid) -> Option<Internship> {
        self.tables
            .lock()
            .ok()?
            .internships
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    pub fn application_count(&self) -> usize {
        self.tables.lock().map(|t| t.applications.len()).unwrap_or(0)
    }

    // --- Seeding helpers (bypass validation and hashing) ---

    pub fn seed_company(&self, name: &str, email: &str, contact: &str) -> Company {
        let company = Company {
            id: Uuid::new_v4(),
            company_name: name.to_string(),
            company_email: email.to_string(),
            password: "not-a-real-hash".to_string(),
            contact_number: contact.to_string(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().companies.push(company.clone());
        company
    }

    pub fn seed_student(&self, name: &str, email: &str, mobile: &str) -> Student {
        let student = Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: "not-a-real-hash".to_string(),
            mobile_number: mobile.to_string(),
            dob: None,
            college_name: None,
            year_of_passout: None,
            area_of_interest: None,
            address: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().students.push(student.clone());
        student
    }

    pub fn seed_internship(
        &self,
        company_id: Uuid,
        position: &str,
        status: InternshipStatus,
        deadline: NaiveDate,
    ) -> Internship {
        let now = Utc::now();
        let internship = Internship {
            id: Uuid::new_v4(),
            company_id,
            category: "Engineering".to_string(),
            position: position.to_string(),
            internship_type: InternshipType::Remote,
            skills_required: vec!["Rust".to_string()],
            eligibility: "Final year".to_string(),
            duration: "3 months".to_string(),
            location: Location {
                country: "India".to_string(),
                state: "Karnataka".to_string(),
                city: "Bengaluru".to_string(),
            },
            application_deadline: deadline,
            number_of_openings: 2,
            stipend: "5000-10000".parse().unwrap(),
            status,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .unwrap()
            .internships
            .push(internship.clone());
        internship
    }
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn matches(filter: &Option<String>, value: &str) -> bool {
    filter.as_deref().is_none_or(|f| f == value)
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn find_company_by_email(&self, email: &str) -> StoreResult<Option<Company>> {
        let Some(t) = self.lookup_tables()? else {
            return Ok(None);
        };
        Ok(t.companies.iter().find(|c| c.company_email == email).cloned())
    }

    async fn find_company_by_contact(&self, contact_number: &str) -> StoreResult<Option<Company>> {
        let Some(t) = self.lookup_tables()? else {
            return Ok(None);
        };
        Ok(t.companies
            .iter()
            .find(|c| c.contact_number == contact_number)
            .cloned())
    }

    async fn get_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let t = self.tables()?;
        Ok(t.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn create_company(&self, company: NewCompany) -> StoreResult<Company> {
        let mut t = self.tables()?;
        if t.companies.iter().any(|c| c.company_email == company.company_email) {
            return Err(unique("companies_company_email_key"));
        }
        if t.companies.iter().any(|c| c.contact_number == company.contact_number) {
            return Err(unique("companies_contact_number_key"));
        }
        let created = Company {
            id: Uuid::new_v4(),
            company_name: company.company_name,
            company_email: company.company_email,
            password: company.password_hash,
            contact_number: company.contact_number,
            created_at: Utc::now(),
        };
        t.companies.push(created.clone());
        Ok(created)
    }

    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>> {
        let Some(t) = self.lookup_tables()? else {
            return Ok(None);
        };
        Ok(t.students.iter().find(|s| s.email == email).cloned())
    }

    async fn find_student_by_mobile(&self, mobile_number: &str) -> StoreResult<Option<Student>> {
        let Some(t) = self.lookup_tables()? else {
            return Ok(None);
        };
        Ok(t.students
            .iter()
            .find(|s| s.mobile_number == mobile_number)
            .cloned())
    }

    async fn get_student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        let t = self.tables()?;
        Ok(t.students.iter().find(|s| s.id == id).cloned())
    }

    async fn create_student(&self, student: NewStudent) -> StoreResult<Student> {
        let mut t = self.tables()?;
        if t.students.iter().any(|s| s.email == student.email) {
            return Err(unique("students_email_key"));
        }
        if t.students.iter().any(|s| s.mobile_number == student.mobile_number) {
            return Err(unique("students_mobile_number_key"));
        }
        let created = Student {
            id: Uuid::new_v4(),
            name: student.name,
            email: student.email,
            password: student.password_hash,
            mobile_number: student.mobile_number,
            dob: None,
            college_name: None,
            year_of_passout: None,
            area_of_interest: None,
            address: None,
            created_at: Utc::now(),
        };
        t.students.push(created.clone());
        Ok(created)
    }

    async fn update_student_profile(
        &self,
        id: Uuid,
        profile: StudentProfile,
    ) -> StoreResult<Option<Student>> {
        let mut t = self.tables()?;
        let Some(student) = t.students.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        student.dob = Some(profile.dob);
        student.college_name = Some(profile.college_name);
        student.year_of_passout = Some(profile.year_of_passout);
        student.area_of_interest = Some(profile.area_of_interest);
        student.address = Some(profile.address);
        Ok(Some(student.clone()))
    }

    async fn find_internship_by_position(
        &self,
        company_id: Uuid,
        position: &str,
    ) -> StoreResult<Option<Internship>> {
        let Some(t) = self.lookup_tables()? else {
            return Ok(None);
        };
        Ok(t.internships
            .iter()
            .find(|i| i.company_id == company_id && i.position == position)
            .cloned())
    }

    async fn get_internship(&self, id: Uuid) -> StoreResult<Option<Internship>> {
        let t = self.tables()?;
        Ok(t.internships.iter().find(|i| i.id == id).cloned())
    }

    async fn get_internship_details(&self, id: Uuid) -> StoreResult<Option<InternshipDetails>> {
        let t = self.tables()?;
        let Some(internship) = t.internships.iter().find(|i| i.id == id) else {
            return Ok(None);
        };
        let company = t
            .companies
            .iter()
            .find(|c| c.id == internship.company_id)
            .ok_or_else(|| StoreError::Decode("dangling company reference".into()))?;
        Ok(Some(InternshipDetails {
            company_name: company.company_name.clone(),
            company_email: company.company_email.clone(),
            contact_number: company.contact_number.clone(),
            internship: internship.clone(),
        }))
    }

    async fn list_internships(
        &self,
        filter: &InternshipFilter,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<InternshipListing>> {
        let t = self.tables()?;
        Ok(t.internships
            .iter()
            .filter(|i| i.status == InternshipStatus::Active)
            .filter(|i| matches(&filter.category, &i.category))
            .filter(|i| matches(&filter.position, &i.position))
            .filter(|i| filter.internship_type.is_none_or(|ty| ty == i.internship_type))
            .filter(|i| matches(&filter.country, &i.location.country))
            .filter(|i| matches(&filter.state, &i.location.state))
            .filter(|i| matches(&filter.city, &i.location.city))
            .skip(skip as usize)
            .take(limit as usize)
            .map(|i| InternshipListing {
                company_name: t
                    .companies
                    .iter()
                    .find(|c| c.id == i.company_id)
                    .map(|c| c.company_name.clone())
                    .unwrap_or_default(),
                internship: i.clone(),
            })
            .collect())
    }

    async fn create_internship(&self, internship: NewInternship) -> StoreResult<Internship> {
        let mut t = self.tables()?;
        if t.internships
            .iter()
            .any(|i| i.company_id == internship.company_id && i.position == internship.position)
        {
            return Err(unique("internships_company_id_position_key"));
        }
        let now = Utc::now();
        let created = Internship {
            id: Uuid::new_v4(),
            company_id: internship.company_id,
            category: internship.category,
            position: internship.position,
            internship_type: internship.internship_type,
            skills_required: internship.skills_required,
            eligibility: internship.eligibility,
            duration: internship.duration,
            location: internship.location,
            application_deadline: internship.application_deadline,
            number_of_openings: internship.number_of_openings,
            stipend: internship.stipend,
            status: internship.status,
            created_at: now,
            updated_at: now,
        };
        t.internships.push(created.clone());
        Ok(created)
    }

    async fn update_internship(
        &self,
        id: Uuid,
        patch: InternshipPatch,
    ) -> StoreResult<Option<Internship>> {
        let mut t = self.tables()?;
        let Some(internship) = t.internships.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(status) = patch.status {
            internship.status = status;
        }
        if let Some(internship_type) = patch.internship_type {
            internship.internship_type = internship_type;
        }
        if let Some(duration) = patch.duration {
            internship.duration = duration;
        }
        if let Some(skills) = patch.skills_required {
            internship.skills_required =
                validation::union_skills(&internship.skills_required, &skills);
        }
        internship.updated_at = Utc::now();
        Ok(Some(internship.clone()))
    }

    async fn find_application(
        &self,
        student_id: Uuid,
        internship_id: Uuid,
    ) -> StoreResult<Option<Application>> {
        let Some(t) = self.lookup_tables()? else {
            return Ok(None);
        };
        Ok(t.applications
            .iter()
            .find(|a| a.student_id == student_id && a.internship_id == internship_id)
            .cloned())
    }

    async fn create_application(&self, application: NewApplication) -> StoreResult<Application> {
        let mut t = self.tables()?;
        if t.applications.iter().any(|a| {
            a.student_id == application.student_id && a.internship_id == application.internship_id
        }) {
            return Err(unique("applications_student_id_internship_id_key"));
        }
        let created = Application {
            id: Uuid::new_v4(),
            student_id: application.student_id,
            internship_id: application.internship_id,
            resume_key: application.resume_key,
            created_at: Utc::now(),
        };
        t.applications.push(created.clone());
        Ok(created)
    }

    async fn list_applicants(&self, internship_id: Uuid) -> StoreResult<Vec<Applicant>> {
        let t = self.tables()?;
        Ok(t.applications
            .iter()
            .filter(|a| a.internship_id == internship_id)
            .filter_map(|a| {
                let student = t.students.iter().find(|s| s.id == a.student_id)?;
                Some(Applicant {
                    application_id: a.id,
                    resume_key: a.resume_key.clone(),
                    applied_at: a.created_at,
                    student: student.clone(),
                })
            })
            .collect())
    }
}

// --- App assembly ---

pub struct TestApp {
    pub repo: Arc<InMemoryRepo>,
    pub textgen: Arc<MockTextGenerator>,
    pub tokens: TokenService,
    pub router: Router,
}

pub fn test_app() -> TestApp {
    test_app_with(
        InMemoryRepo::new(),
        MockStorageService::new(),
        MockTextGenerator::replying("A hands-on backend internship."),
    )
}

pub fn test_app_with(
    repo: InMemoryRepo,
    storage: MockStorageService,
    textgen: MockTextGenerator,
) -> TestApp {
    let repo = Arc::new(repo);
    let textgen = Arc::new(textgen);
    let config = AppConfig::default();
    let state = AppState::new(repo.clone(), Arc::new(storage), textgen.clone(), config);
    TestApp {
        repo,
        textgen,
        tokens: state.tokens.clone(),
        router: create_router(state),
    }
}

impl TestApp {
    pub fn token_for(&self, id: Uuid, role: Role) -> String {
        self.tokens.issue(id, role).unwrap()
    }

    /// Drives one request through the full router and returns status, headers and JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).to_string(),
            ))
        };
        (status, headers, json)
    }
}

/// A well-formed object key as handed out by the resume upload endpoint.
pub fn resume_key() -> String {
    format!("resumes/{}.pdf", Uuid::new_v4())
}

// --- Dates ---

pub fn days_from_today(days: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days)).date_naive()
}

pub fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
