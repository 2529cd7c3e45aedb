//! Declarative per-form field rules.
//!
//! Each form lists its fields with a slice of [`Rule`]s. Rules for a field
//! run in order and stop at the first failure; every field is checked, so a
//! form reports all of its bad fields at once.

use std::fmt;
use std::sync::LazyLock;

use feedback_types::api::{
    CreateFeedbackRequest, FieldError, LoginRequest, RegisterRequest, UpdateFeedbackRequest,
};
use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty once surrounding whitespace is trimmed.
    Required,
    /// Character count (not bytes) within the inclusive bounds.
    Length { min: Option<usize>, max: Option<usize> },
    Email,
}

pub const USERNAME: &[Rule] = &[Rule::Required, Rule::Length { min: Some(5), max: Some(16) }];
pub const PASSWORD: &[Rule] = &[Rule::Required, Rule::Length { min: Some(6), max: Some(20) }];
pub const EMAIL: &[Rule] = &[Rule::Required, Rule::Email, Rule::Length { min: None, max: Some(100) }];
pub const NAME: &[Rule] = &[Rule::Required, Rule::Length { min: None, max: Some(40) }];
pub const TITLE: &[Rule] = &[Rule::Required, Rule::Length { min: None, max: Some(200) }];
pub const CONTENT: &[Rule] = &[Rule::Required];

impl Rule {
    fn check(&self, value: &str) -> Option<String> {
        match *self {
            Rule::Required => value
                .trim()
                .is_empty()
                .then(|| "This field is required.".to_string()),
            Rule::Length { min, max } => {
                let len = value.chars().count();
                let too_short = min.is_some_and(|m| len < m);
                let too_long = max.is_some_and(|m| len > m);
                if !too_short && !too_long {
                    return None;
                }
                Some(match (min, max) {
                    (Some(lo), Some(hi)) => format!("Field must be between {lo} and {hi} characters long."),
                    (Some(lo), None) => format!("Field must be at least {lo} characters long."),
                    (None, Some(hi)) => format!("Field cannot be longer than {hi} characters."),
                    (None, None) => unreachable!("length rule without bounds never fails"),
                })
            }
            Rule::Email => (!EMAIL_RE.is_match(value)).then(|| "Invalid email address.".to_string()),
        }
    }
}

/// All field errors collected from one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.0
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn check(&mut self, field: &str, value: &str, rules: &[Rule]) {
        if let Some(message) = rules.iter().find_map(|rule| rule.check(value)) {
            self.0.push(FieldError {
                field: field.to_string(),
                message,
            });
        }
    }

    fn finish(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|e| e.field.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check("username", &self.username, USERNAME);
        errors.check("password", &self.password, PASSWORD);
        errors.check("email", &self.email, EMAIL);
        errors.check("first_name", &self.first_name, NAME);
        errors.check("last_name", &self.last_name, NAME);
        errors.finish()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check("username", &self.username, USERNAME);
        errors.check("password", &self.password, PASSWORD);
        errors.finish()
    }
}

impl Validate for CreateFeedbackRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check("title", &self.title, TITLE);
        errors.check("content", &self.content, CONTENT);
        errors.finish()
    }
}

impl Validate for UpdateFeedbackRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(title) = &self.title {
            errors.check("title", title, TITLE);
        }
        if let Some(content) = &self.content {
            errors.check("content", content, CONTENT);
        }
        errors.finish()
    }
}
