use chrono::NaiveDate;
use uuid::Uuid;

use super::{Rules, path_id, text};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::JsonBody,
    models::{
        EditProfileRequest, Location, Login, RegisterStudentRequest, Registration, Role,
        StudentLoginRequest, StudentProfile,
    },
    policy,
    repository::Repository,
    validation::{self, DateRejection},
};

pub const MIN_PASSOUT_YEAR: i64 = 1900;
pub const MAX_PASSOUT_YEAR: i64 = 2100;

/// Student registration mirrors the company chain, with a letters-and-spaces name rule.
pub async fn admit_registration(
    repo: &dyn Repository,
    body: &JsonBody<RegisterStudentRequest>,
) -> ApiResult<Registration> {
    let req = &body.value;

    Rules::new()
        .check("body", "Provide details for registration", || !body.is_empty())
        .require("name", "StudentName is required", req.name.as_deref())
        .check("name", "Invalid name", || validation::is_valid_name(text(&req.name)))
        .require("email", "Email is required", req.email.as_deref())
        .check("email", "Invalid email", || {
            validation::is_valid_email(text(&req.email))
        })
        .finish()?;

    let email = text(&req.email);
    if repo.find_student_by_email(email).await?.is_some() {
        return Err(ApiError::conflict("email", "The provided email already exists"));
    }

    Rules::new()
        .require("password", "Password is required", req.password.as_deref())
        .check("password", "Invalid password", || {
            validation::is_valid_password(text(&req.password))
        })
        .require("mobileNumber", "MobileNumber is required", req.mobile_number.as_deref())
        .finish()?;

    let mobile = text(&req.mobile_number);
    if repo.find_student_by_mobile(mobile).await?.is_some() {
        return Err(ApiError::conflict(
            "mobileNumber",
            "Provided mobile number already exists",
        ));
    }

    Ok(Registration {
        name: text(&req.name).to_string(),
        email: email.to_string(),
        password: text(&req.password).to_string(),
        contact: mobile.to_string(),
    })
}

pub fn admit_login(body: &JsonBody<StudentLoginRequest>) -> ApiResult<Login> {
    let req = &body.value;

    Rules::new()
        .check("body", "Provide details for login", || !body.is_empty())
        .require("email", "Provide email for login", req.email.as_deref())
        .check("email", "Invalid email", || {
            validation::is_valid_email(text(&req.email))
        })
        .require("password", "Provide password for login", req.password.as_deref())
        .check("password", "Invalid password", || {
            validation::is_valid_password(text(&req.password))
        })
        .finish()?;

    Ok(Login {
        email: text(&req.email).to_string(),
        password: text(&req.password).to_string(),
    })
}

/// Profile edit: path id, existence, ownership, then the profile fields in order.
///
/// `today` is the caller's current UTC date; the date of birth must lie strictly before it.
pub async fn admit_profile_edit(
    repo: &dyn Repository,
    user: &AuthUser,
    student_id: &str,
    body: &JsonBody<EditProfileRequest>,
    today: NaiveDate,
) -> ApiResult<(Uuid, StudentProfile)> {
    let id = path_id(student_id, "studentId", "Invalid studentId")?;

    let student = repo
        .get_student(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".into()))?;

    policy::ensure_owner(
        user,
        Role::Student,
        &student.id,
        "Unauthorized to update student details",
    )?;

    let req = &body.value;
    Rules::new()
        .check("body", "Provide data to edit/update student details", || {
            !body.is_empty()
        })
        .require("DOB", "DOB is required", req.dob.as_deref())
        .finish()?;

    let dob = validation::parse_date_of_birth(text(&req.dob), today).map_err(|rejection| {
        match rejection {
            DateRejection::NotPast => ApiError::validation("DOB", "DOB must be in the past"),
            _ => ApiError::validation("DOB", "Invalid date format"),
        }
    })?;

    let year = req.year_of_passout.as_ref().map(|y| y.value());
    let address = req.address.as_ref();

    Rules::new()
        .require("collegeName", "CollegeName is required", req.college_name.as_deref())
        .check("yearOfPassout", "YearOfPassout is required", || year.is_some())
        .check("yearOfPassout", "YearOfPassout must be a number", || {
            year.flatten().is_some()
        })
        .check(
            "yearOfPassout",
            "YearOfPassout must be between 1900 and 2100",
            || year.flatten().is_some_and(|y| (MIN_PASSOUT_YEAR..=MAX_PASSOUT_YEAR).contains(&y)),
        )
        .require("areaOfInterest", "AreaOfInterest is required", req.area_of_interest.as_deref())
        .check("address", "Address is required and must be an object", || {
            address.is_some()
        })
        .require(
            "address.country",
            "Country is required",
            address.and_then(|a| a.country.as_deref()),
        )
        .require(
            "address.state",
            "State is required",
            address.and_then(|a| a.state.as_deref()),
        )
        .require(
            "address.city",
            "City is required",
            address.and_then(|a| a.city.as_deref()),
        )
        .finish()?;

    let address = address.cloned().unwrap_or_default();
    let year_of_passout = year
        .flatten()
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| ApiError::validation("yearOfPassout", "YearOfPassout must be a number"))?;

    Ok((
        id,
        StudentProfile {
            dob,
            college_name: text(&req.college_name).to_string(),
            year_of_passout,
            area_of_interest: text(&req.area_of_interest).to_string(),
            address: Location {
                country: text(&address.country).to_string(),
                state: text(&address.state).to_string(),
                city: text(&address.city).to_string(),
            },
        },
    ))
}
