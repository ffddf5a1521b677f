use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Rules, path_id, text};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::JsonBody,
    models::{
        CreateInternshipRequest, DescriptionBrief, DescriptionDraftRequest, Internship,
        InternshipDetails, InternshipFilter, InternshipPatch, InternshipQuery, InternshipStatus,
        InternshipType, Location, NewInternship, Page, Role, Stipend, UpdateInternshipRequest,
    },
    policy,
    repository::Repository,
    validation::{self, DateRejection},
};

/// Internship creation.
///
/// Path id → company exists → caller is that company → body → mandatory text fields →
/// position free within the company → skills → location → deadline → openings →
/// stipend → optional enums. `now` is the validation timestamp the deadline is compared
/// against.
pub async fn admit_new_internship(
    repo: &dyn Repository,
    user: &AuthUser,
    company_id: &str,
    body: &JsonBody<CreateInternshipRequest>,
    now: DateTime<Utc>,
) -> ApiResult<NewInternship> {
    let company_id = path_id(company_id, "companyId", "Invalid companyId")?;

    let company = repo
        .get_company(company_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".into()))?;

    policy::ensure_owner(
        user,
        Role::Company,
        &company.id,
        "Unauthorized to post internship details",
    )?;

    let req = &body.value;
    Rules::new()
        .check("body", "Provide data to post internship", || !body.is_empty())
        .require("category", "Category is required", req.category.as_deref())
        .require("position", "Position is required", req.position.as_deref())
        .require("eligibility", "Eligibility is required", req.eligibility.as_deref())
        .require("duration", "Duration is required", req.duration.as_deref())
        .finish()?;

    let position = text(&req.position);
    if repo
        .find_internship_by_position(company.id, position)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(
            "position",
            "An internship with the same position already exists for this company",
        ));
    }

    let skills = validation::normalize_skills(req.skills_required.iter().flatten());
    let location = req.location.as_ref();

    Rules::new()
        .check("skillsRequired", "SkillsRequired is required", || !skills.is_empty())
        .check("location", "Location is required", || location.is_some())
        .require(
            "location.country",
            "Country is required",
            location.and_then(|l| l.country.as_deref()),
        )
        .require(
            "location.state",
            "State is required",
            location.and_then(|l| l.state.as_deref()),
        )
        .require(
            "location.city",
            "City is required",
            location.and_then(|l| l.city.as_deref()),
        )
        .require(
            "applicationDeadline",
            "ApplicationDeadline is required",
            req.application_deadline.as_deref(),
        )
        .finish()?;

    let application_deadline = validation::parse_deadline(text(&req.application_deadline), now)
        .map_err(|rejection| match rejection {
            DateRejection::NotFuture => ApiError::validation(
                "applicationDeadline",
                "Application deadline must be in the future.",
            ),
            _ => ApiError::validation("applicationDeadline", "Invalid date format"),
        })?;

    let number_of_openings = match &req.number_of_openings {
        None => {
            return Err(ApiError::validation(
                "numberOfOpenings",
                "NumberOfOpenings is required",
            ));
        }
        Some(raw) => raw
            .value()
            .filter(|n| *n >= 1)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| ApiError::validation("numberOfOpenings", "Invalid numberOfOpenings"))?,
    };

    Rules::new()
        .require("stipend", "Stipend is required", req.stipend.as_deref())
        .finish()?;
    let stipend: Stipend = text(&req.stipend)
        .parse()
        .map_err(|_| ApiError::validation("stipend", "Invalid stipend format"))?;

    let status = parse_optional_status(req.status.as_deref())?.unwrap_or_default();
    let internship_type =
        parse_optional_internship_type(req.internship_type.as_deref())?.unwrap_or_default();

    let location = location.cloned().unwrap_or_default();
    Ok(NewInternship {
        company_id: company.id,
        category: text(&req.category).to_string(),
        position: position.to_string(),
        internship_type,
        skills_required: skills,
        eligibility: text(&req.eligibility).to_string(),
        duration: text(&req.duration).to_string(),
        location: Location {
            country: text(&location.country).to_string(),
            state: text(&location.state).to_string(),
            city: text(&location.city).to_string(),
        },
        application_deadline,
        number_of_openings,
        stipend,
        status,
    })
}

/// Internship update.
///
/// Returns the internship id together with a patch. `skills_required`, when supplied,
/// holds only the normalized incoming skills; the store unions them with the current
/// set in the same write.
pub async fn admit_internship_patch(
    repo: &dyn Repository,
    user: &AuthUser,
    internship_id: &str,
    body: &JsonBody<UpdateInternshipRequest>,
) -> ApiResult<(Uuid, InternshipPatch)> {
    let existing = owned_internship(
        repo,
        user,
        internship_id,
        "Unauthorized to update internship details",
    )
    .await?;

    let req = &body.value;
    let has_known_field = req.status.is_some()
        || req.internship_type.is_some()
        || req.duration.is_some()
        || req.skills_required.is_some();

    Rules::new()
        .check("body", "No fields provided for update", || {
            !body.is_empty() && has_known_field
        })
        .finish()?;

    let status = parse_optional_status(req.status.as_deref())?;
    let internship_type = parse_optional_internship_type(req.internship_type.as_deref())?;

    if req.duration.is_some() {
        Rules::new()
            .require("duration", "Duration must not be empty", req.duration.as_deref())
            .finish()?;
    }

    let skills_required = match &req.skills_required {
        None => None,
        Some(incoming) => {
            let incoming = validation::normalize_skills(incoming);
            if incoming.is_empty() {
                return Err(ApiError::validation(
                    "skillsRequired",
                    "SkillsRequired must contain at least one skill",
                ));
            }
            Some(incoming)
        }
    };

    Ok((
        existing.id,
        InternshipPatch {
            status,
            internship_type,
            duration: req.duration.clone(),
            skills_required,
        },
    ))
}

/// Listing query: equality filters (blank values are ignored) and paging.
pub fn admit_listing_query(query: &InternshipQuery) -> ApiResult<(InternshipFilter, Page)> {
    let non_blank = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let internship_type = parse_optional_internship_type(
        query.internship_type.as_deref().filter(|v| !v.trim().is_empty()),
    )?;

    let page = match query.page.as_deref() {
        None => 1,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ApiError::validation("page", "Page must be a positive integer"))?,
    };

    let limit = match query.limit.as_deref() {
        None => Page::DEFAULT_LIMIT,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|l| (1..=Page::MAX_LIMIT).contains(l))
            .ok_or_else(|| ApiError::validation("limit", "Limit must be between 1 and 100"))?,
    };

    Ok((
        InternshipFilter {
            category: non_blank(&query.category),
            position: non_blank(&query.position),
            internship_type,
            country: non_blank(&query.country),
            state: non_blank(&query.state),
            city: non_blank(&query.city),
        },
        Page { page, limit },
    ))
}

/// Lookup by id. A closed internship is refused by policy, not reported as missing.
pub async fn admit_lookup(
    repo: &dyn Repository,
    internship_id: &str,
) -> ApiResult<InternshipDetails> {
    let id = path_id(internship_id, "internshipId", "Invalid internshipId")?;

    let details = repo
        .get_internship_details(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Internship not found".into()))?;

    Rules::new()
        .ensure(
            || details.internship.status == InternshipStatus::Active,
            || ApiError::Policy("Internship is closed".into()),
        )
        .finish()?;

    Ok(details)
}

/// Description drafting is a company tool; category and position anchor the prompt.
pub fn admit_description_draft(
    user: &AuthUser,
    body: &JsonBody<DescriptionDraftRequest>,
) -> ApiResult<DescriptionBrief> {
    policy::ensure_role(
        user,
        Role::Company,
        "Only companies can draft internship descriptions",
    )?;

    let req = &body.value;
    Rules::new()
        .check("body", "Provide details for the description", || !body.is_empty())
        .require("category", "Category is required", req.category.as_deref())
        .require("position", "Position is required", req.position.as_deref())
        .finish()?;

    Ok(DescriptionBrief {
        category: text(&req.category).trim().to_string(),
        position: text(&req.position).trim().to_string(),
        skills: validation::normalize_skills(req.skills_required.iter().flatten()),
        duration: req
            .duration
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    })
}

/// Path id → internship exists → caller is the owning company.
pub(crate) async fn owned_internship(
    repo: &dyn Repository,
    user: &AuthUser,
    internship_id: &str,
    forbidden: &str,
) -> ApiResult<Internship> {
    let id = path_id(internship_id, "internshipId", "Invalid internshipId")?;

    let internship = repo
        .get_internship(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Internship not found".into()))?;

    policy::ensure_owner(user, Role::Company, &internship.company_id, forbidden)?;
    Ok(internship)
}

fn parse_optional_status(raw: Option<&str>) -> ApiResult<Option<InternshipStatus>> {
    raw.map(|s| s.parse::<InternshipStatus>())
        .transpose()
        .map_err(|_| ApiError::validation("status", "Invalid status value"))
}

fn parse_optional_internship_type(raw: Option<&str>) -> ApiResult<Option<InternshipType>> {
    raw.map(|s| s.parse::<InternshipType>())
        .transpose()
        .map_err(|_| ApiError::validation("internshipType", "Invalid internshipType value"))
}
