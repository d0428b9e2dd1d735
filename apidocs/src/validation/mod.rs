use crate::model::EndpointRecord;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Maximum length of description and example text fields.
pub const MAX_TEXT_LENGTH: usize = 500;

static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/[A-Za-z0-9_\-/]+$").expect("endpoint path pattern is valid")
});

/// The rule a candidate record broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// A required text field is empty after trimming
    MissingField(&'static str),
    /// Path does not start with '/' or contains characters outside `[A-Za-z0-9_-/]`
    InvalidPath(String),
    /// Parameter at this position has an empty name
    UnnamedParameter(usize),
    TextTooLong { field: &'static str, length: usize },
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleViolation::MissingField(field) => write!(f, "field '{field}' is required"),
            RuleViolation::InvalidPath(path) => write!(f, "invalid endpoint path '{path}'"),
            RuleViolation::UnnamedParameter(index) => {
                write!(f, "parameter #{index} has an empty name")
            }
            RuleViolation::TextTooLong { field, length } => write!(
                f,
                "field '{field}' is {length} characters long (max {MAX_TEXT_LENGTH})"
            ),
        }
    }
}

/// Gate applied to every record before it is written.
///
/// HTTP method and parameter type are enums on [`EndpointRecord`], so records
/// with unknown verbs or types are already rejected when they are parsed.
pub trait Validator {
    /// Return the first rule the candidate violates, if any.
    fn check(&self, candidate: &EndpointRecord) -> Result<(), RuleViolation>;

    /// `true` when every rule passes. Logs the first failing rule.
    fn validate(&self, candidate: &EndpointRecord) -> bool {
        match self.check(candidate) {
            Ok(()) => true,
            Err(violation) => {
                log::warn!(
                    "Endpoint validation failed for {} {}: {violation}",
                    candidate.method,
                    candidate.path
                );
                false
            }
        }
    }
}

/// The default rule set for endpoint records.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointValidator;

impl Validator for EndpointValidator {
    fn check(&self, candidate: &EndpointRecord) -> Result<(), RuleViolation> {
        check_required_fields(candidate)?;
        check_path_format(&candidate.path)?;
        check_parameters(candidate)?;
        check_text_lengths(candidate)
    }
}

fn check_required_fields(candidate: &EndpointRecord) -> Result<(), RuleViolation> {
    if candidate.path.trim().is_empty() {
        return Err(RuleViolation::MissingField("path"));
    }
    if candidate.description.trim().is_empty() {
        return Err(RuleViolation::MissingField("description"));
    }
    Ok(())
}

fn check_path_format(path: &str) -> Result<(), RuleViolation> {
    if PATH_PATTERN.is_match(path) {
        Ok(())
    } else {
        Err(RuleViolation::InvalidPath(path.to_string()))
    }
}

fn check_parameters(candidate: &EndpointRecord) -> Result<(), RuleViolation> {
    match candidate
        .parameters
        .iter()
        .position(|param| param.name.trim().is_empty())
    {
        Some(index) => Err(RuleViolation::UnnamedParameter(index)),
        None => Ok(()),
    }
}

fn check_text_lengths(candidate: &EndpointRecord) -> Result<(), RuleViolation> {
    let fields = [
        ("description", Some(candidate.description.as_str())),
        ("exampleRequest", candidate.example_request.as_deref()),
        ("exampleResponse", candidate.example_response.as_deref()),
    ];

    for (field, value) in fields {
        let length = value.map_or(0, |text| text.chars().count());
        if length > MAX_TEXT_LENGTH {
            return Err(RuleViolation::TextTooLong { field, length });
        }
    }
    Ok(())
}
