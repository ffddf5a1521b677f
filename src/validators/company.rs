use super::{Rules, text};
use crate::{
    error::{ApiError, ApiResult},
    extract::JsonBody,
    models::{CompanyLoginRequest, Login, RegisterCompanyRequest, Registration},
    repository::Repository,
    validation,
};

/// Company registration: body, name, email (shape, then uniqueness), password strength,
/// contact number (presence, then uniqueness).
///
/// The uniqueness lookups only produce the early, field-specific message; the unique
/// indexes still decide when two registrations race.
pub async fn admit_registration(
    repo: &dyn Repository,
    body: &JsonBody<RegisterCompanyRequest>,
) -> ApiResult<Registration> {
    let req = &body.value;

    Rules::new()
        .check("body", "Provide details for registration", || !body.is_empty())
        .require("companyName", "CompanyName is required", req.company_name.as_deref())
        .require("companyEmail", "Email is required", req.company_email.as_deref())
        .check("companyEmail", "Invalid email", || {
            validation::is_valid_email(text(&req.company_email))
        })
        .finish()?;

    let email = text(&req.company_email);
    if repo.find_company_by_email(email).await?.is_some() {
        return Err(ApiError::conflict(
            "companyEmail",
            "The provided email already exists",
        ));
    }

    Rules::new()
        .require("password", "Password is required", req.password.as_deref())
        .check("password", "Invalid password", || {
            validation::is_valid_password(text(&req.password))
        })
        .require("contactNumber", "Contact number is required", req.contact_number.as_deref())
        .finish()?;

    let contact = text(&req.contact_number);
    if repo.find_company_by_contact(contact).await?.is_some() {
        return Err(ApiError::conflict(
            "contactNumber",
            "Provided contact number already exists",
        ));
    }

    Ok(Registration {
        name: text(&req.company_name).to_string(),
        email: email.to_string(),
        password: text(&req.password).to_string(),
        contact: contact.to_string(),
    })
}

/// Company login: credentials must be present and well-formed before any lookup happens.
pub fn admit_login(body: &JsonBody<CompanyLoginRequest>) -> ApiResult<Login> {
    let req = &body.value;

    Rules::new()
        .check("body", "Provide details for login", || !body.is_empty())
        .require("companyEmail", "Provide email for login", req.company_email.as_deref())
        .check("companyEmail", "Invalid email", || {
            validation::is_valid_email(text(&req.company_email))
        })
        .require("password", "Provide password for login", req.password.as_deref())
        .check("password", "Invalid password", || {
            validation::is_valid_password(text(&req.password))
        })
        .finish()?;

    Ok(Login {
        email: text(&req.company_email).to_string(),
        password: text(&req.password).to_string(),
    })
}
