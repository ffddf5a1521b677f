use crate::models::{
    Applicant, Application, Company, Internship, InternshipDetails, InternshipFilter,
    InternshipListing, InternshipPatch, Location, NewApplication, NewCompany, NewInternship,
    NewStudent, Student, StudentProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// StoreError
///
/// Failures surfaced by the persistence layer. A unique-index violation is kept apart from
/// other failures because it is the authoritative "already exists" signal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("store error: {0}")]
    Backend(String),

    #[error("stored row could not be decoded: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers never know which store
/// backs them (Postgres in production, an in-memory double in tests).
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum's
/// asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Companies ---
    async fn find_company_by_email(&self, email: &str) -> StoreResult<Option<Company>>;
    async fn find_company_by_contact(&self, contact_number: &str) -> StoreResult<Option<Company>>;
    async fn get_company(&self, id: Uuid) -> StoreResult<Option<Company>>;
    // Fails with `UniqueViolation` on a duplicate email or contact number.
    async fn create_company(&self, company: NewCompany) -> StoreResult<Company>;

    // --- Students ---
    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>>;
    async fn find_student_by_mobile(&self, mobile_number: &str) -> StoreResult<Option<Student>>;
    async fn get_student(&self, id: Uuid) -> StoreResult<Option<Student>>;
    async fn create_student(&self, student: NewStudent) -> StoreResult<Student>;
    // Overwrites the profile extension; re-submitting the same profile is idempotent.
    async fn update_student_profile(
        &self,
        id: Uuid,
        profile: StudentProfile,
    ) -> StoreResult<Option<Student>>;

    // --- Internships ---
    async fn find_internship_by_position(
        &self,
        company_id: Uuid,
        position: &str,
    ) -> StoreResult<Option<Internship>>;
    async fn get_internship(&self, id: Uuid) -> StoreResult<Option<Internship>>;
    // Read-side join with the owning company's public fields.
    async fn get_internship_details(&self, id: Uuid) -> StoreResult<Option<InternshipDetails>>;
    // Only `status = active` rows, in insertion order.
    async fn list_internships(
        &self,
        filter: &InternshipFilter,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<InternshipListing>>;
    // Fails with `UniqueViolation` when the company already has the position.
    async fn create_internship(&self, internship: NewInternship) -> StoreResult<Internship>;
    // Skills in the patch are added to the stored set in the same write.
    async fn update_internship(
        &self,
        id: Uuid,
        patch: InternshipPatch,
    ) -> StoreResult<Option<Internship>>;

    // --- Applications ---
    async fn find_application(
        &self,
        student_id: Uuid,
        internship_id: Uuid,
    ) -> StoreResult<Option<Application>>;
    // Fails with `UniqueViolation` when the student already applied.
    async fn create_application(&self, application: NewApplication) -> StoreResult<Application>;
    async fn list_applicants(&self, internship_id: Uuid) -> StoreResult<Vec<Applicant>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Row Mapping ---

#[derive(Debug, FromRow)]
struct StudentRow {
    id: Uuid,
    name: String,
    email: String,
    password: String,
    mobile_number: String,
    dob: Option<NaiveDate>,
    college_name: Option<String>,
    year_of_passout: Option<i32>,
    area_of_interest: Option<String>,
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        let address = match (row.country, row.state, row.city) {
            (Some(country), Some(state), Some(city)) => Some(Location {
                country,
                state,
                city,
            }),
            _ => None,
        };
        Student {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            mobile_number: row.mobile_number,
            dob: row.dob,
            college_name: row.college_name,
            year_of_passout: row.year_of_passout,
            area_of_interest: row.area_of_interest,
            address,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InternshipRow {
    id: Uuid,
    company_id: Uuid,
    category: String,
    position: String,
    internship_type: String,
    skills_required: Vec<String>,
    eligibility: String,
    duration: String,
    country: String,
    state: String,
    city: String,
    application_deadline: NaiveDate,
    number_of_openings: i32,
    stipend: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InternshipRow> for Internship {
    type Error = StoreError;

    fn try_from(row: InternshipRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let decode =
            |e: &dyn std::fmt::Display| StoreError::Decode(format!("internship {id}: {e}"));
        Ok(Internship {
            id: row.id,
            company_id: row.company_id,
            internship_type: row.internship_type.parse().map_err(|e| decode(&e))?,
            status: row.status.parse().map_err(|e| decode(&e))?,
            stipend: row.stipend.parse().map_err(|e| decode(&e))?,
            category: row.category,
            position: row.position,
            skills_required: row.skills_required,
            eligibility: row.eligibility,
            duration: row.duration,
            location: Location {
                country: row.country,
                state: row.state,
                city: row.city,
            },
            application_deadline: row.application_deadline,
            number_of_openings: row.number_of_openings,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InternshipListingRow {
    company_name: String,
    #[sqlx(flatten)]
    internship: InternshipRow,
}

#[derive(Debug, FromRow)]
struct InternshipDetailsRow {
    company_name: String,
    company_email: String,
    contact_number: String,
    #[sqlx(flatten)]
    internship: InternshipRow,
}

#[derive(Debug, FromRow)]
struct ApplicantRow {
    application_id: Uuid,
    resume_key: String,
    applied_at: DateTime<Utc>,
    #[sqlx(flatten)]
    student: StudentRow,
}

const COMPANY_COLUMNS: &str =
    "id, company_name, company_email, password, contact_number, created_at";

const STUDENT_COLUMNS: &str = "id, name, email, password, mobile_number, dob, college_name, \
     year_of_passout, area_of_interest, country, state, city, created_at";

const INTERNSHIP_COLUMNS: &str = "i.id, i.company_id, i.category, i.position, i.internship_type, \
     i.skills_required, i.eligibility, i.duration, i.country, i.state, i.city, \
     i.application_deadline, i.number_of_openings, i.stipend, i.status, i.created_at, i.updated_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL. Uniqueness
/// is enforced by the schema's unique indexes (see `migrations/`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_company_where(&self, column: &str, value: &str) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE {column} = $1");
        sqlx::query_as::<_, Company>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("find_company", e))
    }

    async fn find_student_where(&self, column: &str, value: &str) -> StoreResult<Option<Student>> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE {column} = $1");
        let row = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("find_student", e))?;
        Ok(row.map(Student::from))
    }
}

/// Translates and logs a driver error. Unique violations are expected outcomes and are only
/// logged at debug level.
fn log_store_error(operation: &str, err: sqlx::Error) -> StoreError {
    let err = StoreError::from(err);
    match &err {
        StoreError::UniqueViolation { constraint } => {
            tracing::debug!(constraint = %constraint, "{} hit unique constraint", operation)
        }
        other => tracing::error!("{} error: {:?}", operation, other),
    }
    err
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_company_by_email(&self, email: &str) -> StoreResult<Option<Company>> {
        self.find_company_where("company_email", email).await
    }

    async fn find_company_by_contact(&self, contact_number: &str) -> StoreResult<Option<Company>> {
        self.find_company_where("contact_number", contact_number).await
    }

    async fn get_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1");
        sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("get_company", e))
    }

    async fn create_company(&self, company: NewCompany) -> StoreResult<Company> {
        let sql = format!(
            "INSERT INTO companies \
             (id, company_name, company_email, password, contact_number, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {COMPANY_COLUMNS}"
        );
        sqlx::query_as::<_, Company>(&sql)
            .bind(Uuid::new_v4())
            .bind(company.company_name)
            .bind(company.company_email)
            .bind(company.password_hash)
            .bind(company.contact_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_store_error("create_company", e))
    }

    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>> {
        self.find_student_where("email", email).await
    }

    async fn find_student_by_mobile(&self, mobile_number: &str) -> StoreResult<Option<Student>> {
        self.find_student_where("mobile_number", mobile_number).await
    }

    async fn get_student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1");
        let row = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("get_student", e))?;
        Ok(row.map(Student::from))
    }

    async fn create_student(&self, student: NewStudent) -> StoreResult<Student> {
        let sql = format!(
            "INSERT INTO students (id, name, email, password, mobile_number, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {STUDENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(student.name)
            .bind(student.email)
            .bind(student.password_hash)
            .bind(student.mobile_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_store_error("create_student", e))?;
        Ok(row.into())
    }

    async fn update_student_profile(
        &self,
        id: Uuid,
        profile: StudentProfile,
    ) -> StoreResult<Option<Student>> {
        let sql = format!(
            "UPDATE students SET dob = $2, college_name = $3, year_of_passout = $4, \
             area_of_interest = $5, country = $6, state = $7, city = $8 \
             WHERE id = $1 RETURNING {STUDENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(id)
            .bind(profile.dob)
            .bind(profile.college_name)
            .bind(profile.year_of_passout)
            .bind(profile.area_of_interest)
            .bind(profile.address.country)
            .bind(profile.address.state)
            .bind(profile.address.city)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("update_student_profile", e))?;
        Ok(row.map(Student::from))
    }

    async fn find_internship_by_position(
        &self,
        company_id: Uuid,
        position: &str,
    ) -> StoreResult<Option<Internship>> {
        let sql = format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships i \
             WHERE i.company_id = $1 AND i.position = $2"
        );
        sqlx::query_as::<_, InternshipRow>(&sql)
            .bind(company_id)
            .bind(position)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("find_internship_by_position", e))?
            .map(Internship::try_from)
            .transpose()
    }

    async fn get_internship(&self, id: Uuid) -> StoreResult<Option<Internship>> {
        let sql = format!("SELECT {INTERNSHIP_COLUMNS} FROM internships i WHERE i.id = $1");
        sqlx::query_as::<_, InternshipRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("get_internship", e))?
            .map(Internship::try_from)
            .transpose()
    }

    async fn get_internship_details(&self, id: Uuid) -> StoreResult<Option<InternshipDetails>> {
        let sql = format!(
            "SELECT {INTERNSHIP_COLUMNS}, c.company_name, c.company_email, c.contact_number \
             FROM internships i JOIN companies c ON c.id = i.company_id WHERE i.id = $1"
        );
        let row = sqlx::query_as::<_, InternshipDetailsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("get_internship_details", e))?;

        row.map(|row| {
            Ok(InternshipDetails {
                company_name: row.company_name,
                company_email: row.company_email,
                contact_number: row.contact_number,
                internship: row.internship.try_into()?,
            })
        })
        .transpose()
    }

    /// list_internships
    ///
    /// Builds the optional equality filters with QueryBuilder for safe parameterization.
    /// `status = 'active'` is part of the base query and cannot be overridden.
    async fn list_internships(
        &self,
        filter: &InternshipFilter,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<InternshipListing>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {INTERNSHIP_COLUMNS}, c.company_name \
             FROM internships i JOIN companies c ON c.id = i.company_id \
             WHERE i.status = 'active'"
        ));

        let equality_filters = [
            ("i.category", filter.category.as_deref()),
            ("i.position", filter.position.as_deref()),
            ("i.internship_type", filter.internship_type.as_ref().map(|t| t.as_str())),
            ("i.country", filter.country.as_deref()),
            ("i.state", filter.state.as_deref()),
            ("i.city", filter.city.as_deref()),
        ];
        for (column, value) in equality_filters {
            if let Some(value) = value {
                builder.push(format!(" AND {column} = "));
                builder.push_bind(value.to_string());
            }
        }

        builder.push(" ORDER BY i.created_at ASC, i.id ASC OFFSET ");
        builder.push_bind(skip);
        builder.push(" LIMIT ");
        builder.push_bind(limit);

        let rows = builder
            .build_query_as::<InternshipListingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_store_error("list_internships", e))?;

        rows.into_iter()
            .map(|row| {
                Ok(InternshipListing {
                    company_name: row.company_name,
                    internship: row.internship.try_into()?,
                })
            })
            .collect()
    }

    async fn create_internship(&self, internship: NewInternship) -> StoreResult<Internship> {
        let sql = format!(
            "INSERT INTO internships AS i (id, company_id, category, position, internship_type, \
             skills_required, eligibility, duration, country, state, city, application_deadline, \
             number_of_openings, stipend, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
             NOW(), NOW()) \
             RETURNING {INTERNSHIP_COLUMNS}"
        );
        sqlx::query_as::<_, InternshipRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(internship.company_id)
            .bind(internship.category)
            .bind(internship.position)
            .bind(internship.internship_type.as_str())
            .bind(internship.skills_required)
            .bind(internship.eligibility)
            .bind(internship.duration)
            .bind(internship.location.country)
            .bind(internship.location.state)
            .bind(internship.location.city)
            .bind(internship.application_deadline)
            .bind(internship.number_of_openings)
            .bind(internship.stipend.to_string())
            .bind(internship.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_store_error("create_internship", e))?
            .try_into()
    }

    /// update_internship
    ///
    /// Uses `COALESCE` so only the fields present in the patch are written. Incoming skills
    /// are unioned with the stored array inside the statement, keeping first-seen order, so
    /// concurrent patches of the same internship each add their skills.
    async fn update_internship(
        &self,
        id: Uuid,
        patch: InternshipPatch,
    ) -> StoreResult<Option<Internship>> {
        let sql = format!(
            "UPDATE internships AS i SET \
                status = COALESCE($2, i.status), \
                internship_type = COALESCE($3, i.internship_type), \
                duration = COALESCE($4, i.duration), \
                skills_required = CASE WHEN $5::text[] IS NULL THEN i.skills_required \
                    ELSE ARRAY( \
                        SELECT s FROM unnest(i.skills_required || $5::text[]) \
                            WITH ORDINALITY AS t(s, o) \
                        GROUP BY s ORDER BY min(o)) \
                    END, \
                updated_at = NOW() \
             WHERE i.id = $1 RETURNING {INTERNSHIP_COLUMNS}"
        );
        sqlx::query_as::<_, InternshipRow>(&sql)
            .bind(id)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.internship_type.map(|t| t.as_str()))
            .bind(patch.duration)
            .bind(patch.skills_required)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_store_error("update_internship", e))?
            .map(Internship::try_from)
            .transpose()
    }

    async fn find_application(
        &self,
        student_id: Uuid,
        internship_id: Uuid,
    ) -> StoreResult<Option<Application>> {
        sqlx::query_as::<_, Application>(
            "SELECT id, student_id, internship_id, resume_key, created_at \
             FROM applications WHERE student_id = $1 AND internship_id = $2",
        )
        .bind(student_id)
        .bind(internship_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| log_store_error("find_application", e))
    }

    async fn create_application(&self, application: NewApplication) -> StoreResult<Application> {
        sqlx::query_as::<_, Application>(
            "INSERT INTO applications (id, student_id, internship_id, resume_key, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING id, student_id, internship_id, resume_key, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(application.student_id)
        .bind(application.internship_id)
        .bind(application.resume_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| log_store_error("create_application", e))
    }

    /// list_applicants
    ///
    /// Joins each application with the applying student's row. The password column is read
    /// but never serialized.
    async fn list_applicants(&self, internship_id: Uuid) -> StoreResult<Vec<Applicant>> {
        let rows = sqlx::query_as::<_, ApplicantRow>(
            "SELECT a.id AS application_id, a.resume_key, a.created_at AS applied_at, \
                    s.id, s.name, s.email, s.password, s.mobile_number, s.dob, s.college_name, \
                    s.year_of_passout, s.area_of_interest, s.country, s.state, s.city, \
                    s.created_at \
             FROM applications a JOIN students s ON s.id = a.student_id \
             WHERE a.internship_id = $1 \
             ORDER BY a.created_at ASC",
        )
        .bind(internship_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| log_store_error("list_applicants", e))?;

        Ok(rows
            .into_iter()
            .map(|row| Applicant {
                application_id: row.application_id,
                resume_key: row.resume_key,
                applied_at: row.applied_at,
                student: row.student.into(),
            })
            .collect())
    }
}
