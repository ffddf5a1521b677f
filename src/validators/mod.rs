//! Per-endpoint admission rules.
//!
//! Each resource validator runs an ordered, fail-fast chain of checks over a request and
//! returns either the admitted input (typed, ready for the store) or the first rejection.
//! Synchronous predicates are expressed with [`Rules`]; checks that need the store
//! (existence, uniqueness) sit between two rule blocks in the validator itself.

pub mod application;
pub mod company;
pub mod internship;
pub mod student;

use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    validation,
};

/// Rules
///
/// Ordered list of predicate + rejection pairs. The first failing rule wins; rules after
/// it are never evaluated, so a rule may assume every earlier rule passed.
#[derive(Debug, Default)]
#[must_use = "a rule chain does nothing until `finish` is called"]
pub struct Rules {
    rejected: Option<ApiError>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule that passes when `passes` returns true.
    pub fn check(
        mut self,
        field: &'static str,
        message: &'static str,
        passes: impl FnOnce() -> bool,
    ) -> Self {
        if self.rejected.is_none() && !passes() {
            self.rejected = Some(ApiError::validation(field, message));
        }
        self
    }

    /// Adds a presence rule: the value must be supplied and non-empty.
    pub fn require(self, field: &'static str, message: &'static str, value: Option<&str>) -> Self {
        self.check(field, message, || validation::is_non_empty_string(value))
    }

    /// Adds a rule whose failure is an arbitrary rejection rather than a validation error.
    pub fn ensure(
        mut self,
        passes: impl FnOnce() -> bool,
        rejection: impl FnOnce() -> ApiError,
    ) -> Self {
        if self.rejected.is_none() && !passes() {
            self.rejected = Some(rejection());
        }
        self
    }

    pub fn finish(self) -> ApiResult<()> {
        match self.rejected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Value of a field that an earlier `require` rule has already admitted.
pub(crate) fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Parses a path identifier, rejecting with `message` under `field` when malformed.
pub(crate) fn path_id(raw: &str, field: &'static str, message: &'static str) -> ApiResult<Uuid> {
    validation::parse_identifier(raw).ok_or_else(|| ApiError::validation(field, message))
}
