//! Member record validation and national-number canonicalization.
//!
//! Every form that collects member data goes through [`validate`] (create)
//! or [`validate_patch`] (edit). Each field is checked independently and all
//! violations are reported together, so a form can annotate every invalid
//! field in one pass.

use serde::Serialize;
use thiserror::Error;

use super::types::{
    FamilySituation, FormValue, Gender, MemberDraft, MemberFields, MemberPatch, SalaryType,
};

/// Literal prefix of every national number.
pub const NATIONAL_NUMBER_PREFIX: &str = "MOR";

/// Number of digits following the prefix.
pub const NATIONAL_NUMBER_DIGITS: usize = 4;

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (e.g. `"children_count"`).
    pub field: &'static str,
    /// Human-readable message for display next to the field.
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The complete set of violations found in one candidate.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {}", join_messages(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Returns the violations in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns the violation for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Returns the names of all offending fields.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the set and returns the violations.
    #[must_use]
    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

/// Normalizes national-number keystrokes into `MOR` plus up to four digits.
///
/// The input is uppercased. If it starts with `MOR` the prefix is kept aside,
/// then only ASCII digits of the remainder survive and at most the first four
/// are kept. The result is idempotent, and fewer than four digits is allowed
/// mid-typing even though it does not validate yet.
///
/// # Examples
///
/// ```
/// use roster_core::member::canonicalize_national_number;
///
/// assert_eq!(canonicalize_national_number("mor12ab34cd"), "MOR1234");
/// assert_eq!(canonicalize_national_number("12"), "MOR12");
/// assert_eq!(canonicalize_national_number("MOR123456"), "MOR1234");
/// ```
#[must_use]
pub fn canonicalize_national_number(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let rest = upper.strip_prefix(NATIONAL_NUMBER_PREFIX).unwrap_or(&upper);

    let mut canonical = String::with_capacity(NATIONAL_NUMBER_PREFIX.len() + NATIONAL_NUMBER_DIGITS);
    canonical.push_str(NATIONAL_NUMBER_PREFIX);
    canonical.extend(
        rest.chars()
            .filter(char::is_ascii_digit)
            .take(NATIONAL_NUMBER_DIGITS),
    );
    canonical
}

/// Returns `true` if `value` is exactly `MOR` followed by four ASCII digits.
///
/// # Examples
///
/// ```
/// use roster_core::member::is_valid_national_number;
///
/// assert!(is_valid_national_number("MOR0123"));
/// assert!(!is_valid_national_number("MOR12"));
/// assert!(!is_valid_national_number("mor0123"));
/// ```
#[must_use]
pub fn is_valid_national_number(value: &str) -> bool {
    value
        .strip_prefix(NATIONAL_NUMBER_PREFIX)
        .is_some_and(|digits| {
            digits.len() == NATIONAL_NUMBER_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Validates a complete candidate record.
///
/// Every field is required.
///
/// # Errors
///
/// Returns every violation found, in field order.
pub fn validate(draft: &MemberDraft) -> Result<MemberFields, ValidationErrors> {
    let patch = check(draft, Presence::Required)?;
    // Required mode reports every absent field, so a clean patch is complete.
    patch.into_fields().ok_or_else(|| {
        ValidationErrors(vec![FieldError::new("record", "Member record is incomplete")])
    })
}

/// Validates a partial update.
///
/// Absent fields are skipped; present fields follow the same rules as
/// [`validate`].
///
/// # Errors
///
/// Returns every violation found among the present fields.
pub fn validate_patch(draft: &MemberDraft) -> Result<MemberPatch, ValidationErrors> {
    check(draft, Presence::Optional)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

struct Checker {
    presence: Presence,
    errors: Vec<FieldError>,
}

impl Checker {
    /// Records a missing-value error when required. Returns `None` either way.
    fn missing<T>(&mut self, field: &'static str, label: &str) -> Option<T> {
        if self.presence == Presence::Required {
            self.errors
                .push(FieldError::new(field, format!("{label} is required")));
        }
        None
    }

    fn reject<T>(&mut self, field: &'static str, message: impl Into<String>) -> Option<T> {
        self.errors.push(FieldError::new(field, message));
        None
    }

    fn text(&mut self, field: &'static str, label: &str, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            None => self.missing(field, label),
            Some("") => self.reject(field, format!("{label} is required")),
            Some(text) => Some(text.to_string()),
        }
    }

    fn choice<T>(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<&str>,
        parse: fn(&str) -> Option<T>,
        allowed: &str,
    ) -> Option<T> {
        let Some(raw) = value else {
            return self.missing(field, label);
        };
        parse(raw).or_else(|| self.reject(field, format!("{label} must be {allowed}")))
    }

    fn national_number(&mut self, value: Option<&str>) -> Option<String> {
        const FIELD: &str = "national_number";
        match value {
            None => self.missing(FIELD, "National number"),
            Some(raw) if is_valid_national_number(raw) => Some(raw.to_string()),
            Some(_) => self.reject(
                FIELD,
                format!(
                    "National number must be {NATIONAL_NUMBER_PREFIX} followed by {NATIONAL_NUMBER_DIGITS} digits"
                ),
            ),
        }
    }

    fn count(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<&FormValue<i64>>,
    ) -> Option<u32> {
        let n = match value {
            None => return self.missing(field, label),
            Some(FormValue::Typed(n)) => *n,
            // Integers past i64 still parse as JSON numbers.
            Some(FormValue::Other(other)) if other.is_u64() => {
                return self.reject(field, format!("{label} is too large"));
            }
            Some(FormValue::Other(_)) => {
                return self.reject(field, format!("{label} must be a whole number"));
            }
        };
        if n < 0 {
            return self.reject(field, format!("{label} must be 0 or more"));
        }
        u32::try_from(n)
            .ok()
            .or_else(|| self.reject(field, format!("{label} is too large")))
    }

    fn amount(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<&FormValue<f64>>,
    ) -> Option<f64> {
        match value {
            None => self.missing(field, label),
            Some(FormValue::Other(_)) => self.reject(field, format!("{label} must be a number")),
            Some(FormValue::Typed(n)) if !n.is_finite() => {
                self.reject(field, format!("{label} must be a number"))
            }
            Some(FormValue::Typed(n)) if *n < 0.0 => {
                self.reject(field, format!("{label} must be 0 or more"))
            }
            Some(FormValue::Typed(n)) => Some(*n),
        }
    }

    fn flag(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<&FormValue<bool>>,
    ) -> Option<bool> {
        match value {
            None => self.missing(field, label),
            Some(FormValue::Typed(flag)) => Some(*flag),
            Some(FormValue::Other(_)) => {
                self.reject(field, format!("{label} must be true or false"))
            }
        }
    }
}

fn check(draft: &MemberDraft, presence: Presence) -> Result<MemberPatch, ValidationErrors> {
    let mut c = Checker {
        presence,
        errors: Vec::new(),
    };

    let patch = MemberPatch {
        first_name: c.text("first_name", "First name", draft.first_name.as_deref()),
        last_name: c.text("last_name", "Last name", draft.last_name.as_deref()),
        date_of_birth: c.text("date_of_birth", "Date of birth", draft.date_of_birth.as_deref()),
        gender: c.choice(
            "gender",
            "Gender",
            draft.gender.as_deref(),
            Gender::parse,
            "Male or Female",
        ),
        national_number: c.national_number(draft.national_number.as_deref()),
        jamaat: c.text("jamaat", "Jamaat", draft.jamaat.as_deref()),
        family_situation: c.choice(
            "family_situation",
            "Family situation",
            draft.family_situation.as_deref(),
            FamilySituation::parse,
            "Married, Divorced or Single",
        ),
        children_count: c.count(
            "children_count",
            "Children count",
            draft.children_count.as_ref(),
        ),
        children_over_15_count: c.count(
            "children_over_15_count",
            "Children over 15 count",
            draft.children_over_15_count.as_ref(),
        ),
        spouse_is_ahmadi: c.flag(
            "spouse_is_ahmadi",
            "Spouse affiliation",
            draft.spouse_is_ahmadi.as_ref(),
        ),
        salary_mad: c.amount("salary_mad", "Salary", draft.salary_mad.as_ref()),
        salary_type: c.choice(
            "salary_type",
            "Salary type",
            draft.salary_type.as_deref(),
            SalaryType::parse,
            "Fixed or Variable",
        ),
        monthly_tchanda: c.amount(
            "monthly_tchanda",
            "Monthly tchanda",
            draft.monthly_tchanda.as_ref(),
        ),
        is_mousi: c.flag("is_mousi", "Membership fee status", draft.is_mousi.as_ref()),
        is_active: c.flag("is_active", "Active status", draft.is_active.as_ref()),
        jamaat_role: c.text("jamaat_role", "Jamaat role", draft.jamaat_role.as_deref()),
    };

    if c.errors.is_empty() {
        Ok(patch)
    } else {
        Err(ValidationErrors(c.errors))
    }
}
