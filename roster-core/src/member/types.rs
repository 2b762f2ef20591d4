//! Core types for member records.
//!
//! A member record is split into its server-assigned [`MemberId`] and the
//! [`MemberFields`] a representative edits. Form input arrives as a
//! [`MemberDraft`], which keeps every value optional and every enumeration as
//! the raw string typed by the user until the validator has seen it. Numbers
//! and flags arrive as [`FormValue`]s so a value of the wrong type is reported
//! against its field rather than failing the whole draft.

use serde::{Deserialize, Deserializer, Serialize};

/// Gender of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Gender {
    /// Converts to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Parses from string representation (exact match).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Family situation of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FamilySituation {
    /// Married.
    Married,
    /// Divorced.
    Divorced,
    /// Single.
    Single,
}

impl FamilySituation {
    /// Converts to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Married => "Married",
            Self::Divorced => "Divorced",
            Self::Single => "Single",
        }
    }

    /// Parses from string representation (exact match).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Married" => Some(Self::Married),
            "Divorced" => Some(Self::Divorced),
            "Single" => Some(Self::Single),
            _ => None,
        }
    }
}

/// How a member's salary is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalaryType {
    /// Fixed monthly salary.
    Fixed,
    /// Variable income.
    Variable,
}

impl SalaryType {
    /// Converts to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Variable => "Variable",
        }
    }

    /// Parses from string representation (exact match).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Fixed" => Some(Self::Fixed),
            "Variable" => Some(Self::Variable),
            _ => None,
        }
    }
}

/// Server-assigned member identifier.
///
/// The member service has returned both numeric and string ids, so this
/// deserializes from either and always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Creates an id from its string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for MemberId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for MemberId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// The validated, editable attributes of a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberFields {
    pub first_name: String,
    pub last_name: String,
    /// Date of birth as displayed by the form; only presence is enforced.
    pub date_of_birth: String,
    pub gender: Gender,
    /// National number in canonical `MOR####` form.
    pub national_number: String,
    /// Local jamaat the member belongs to.
    pub jamaat: String,
    pub family_situation: FamilySituation,
    pub children_count: u32,
    pub children_over_15_count: u32,
    pub spouse_is_ahmadi: bool,
    /// Salary amount in dirhams.
    pub salary_mad: f64,
    pub salary_type: SalaryType,
    /// Monthly contribution amount.
    pub monthly_tchanda: f64,
    /// Whether the member pays the membership fee.
    pub is_mousi: bool,
    pub is_active: bool,
    /// Role label of the member within the jamaat.
    pub jamaat_role: String,
}

/// A stored member record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: MemberId,
    #[serde(flatten)]
    pub fields: MemberFields,
}

impl MemberRecord {
    /// Returns the member's display name ("First Last").
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.fields.first_name, self.fields.last_name)
    }
}

/// A form value that may not have the expected type yet.
///
/// Deserializes as `Typed` when the JSON value fits `T`, otherwise keeps the
/// value as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue<T> {
    Typed(T),
    Other(serde_json::Value),
}

impl<T> From<T> for FormValue<T> {
    fn from(value: T) -> Self {
        Self::Typed(value)
    }
}

/// Raw member input collected by a form.
///
/// Nothing here has been checked. Enumerations stay as the typed strings and
/// counts stay signed so that the validator can report what was wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub national_number: Option<String>,
    pub jamaat: Option<String>,
    pub family_situation: Option<String>,
    pub children_count: Option<FormValue<i64>>,
    pub children_over_15_count: Option<FormValue<i64>>,
    pub spouse_is_ahmadi: Option<FormValue<bool>>,
    pub salary_mad: Option<FormValue<f64>>,
    pub salary_type: Option<String>,
    pub monthly_tchanda: Option<FormValue<f64>>,
    pub is_mousi: Option<FormValue<bool>>,
    pub is_active: Option<FormValue<bool>>,
    pub jamaat_role: Option<String>,
}

impl From<&MemberFields> for MemberDraft {
    fn from(fields: &MemberFields) -> Self {
        Self {
            first_name: Some(fields.first_name.clone()),
            last_name: Some(fields.last_name.clone()),
            date_of_birth: Some(fields.date_of_birth.clone()),
            gender: Some(fields.gender.as_str().to_string()),
            national_number: Some(fields.national_number.clone()),
            jamaat: Some(fields.jamaat.clone()),
            family_situation: Some(fields.family_situation.as_str().to_string()),
            children_count: Some(i64::from(fields.children_count).into()),
            children_over_15_count: Some(i64::from(fields.children_over_15_count).into()),
            spouse_is_ahmadi: Some(fields.spouse_is_ahmadi.into()),
            salary_mad: Some(fields.salary_mad.into()),
            salary_type: Some(fields.salary_type.as_str().to_string()),
            monthly_tchanda: Some(fields.monthly_tchanda.into()),
            is_mousi: Some(fields.is_mousi.into()),
            is_active: Some(fields.is_active.into()),
            jamaat_role: Some(fields.jamaat_role.clone()),
        }
    }
}

impl From<&MemberRecord> for MemberDraft {
    fn from(record: &MemberRecord) -> Self {
        Self::from(&record.fields)
    }
}

/// A validated partial update.
///
/// Absent fields are left untouched by [`MemberPatch::apply_to`] and are not
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jamaat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_situation: Option<FamilySituation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_over_15_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spouse_is_ahmadi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_mad: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_type: Option<SalaryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_tchanda: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mousi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jamaat_role: Option<String>,
}

impl MemberPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the present fields into `fields`.
    pub fn apply_to(&self, fields: &mut MemberFields) {
        if let Some(ref v) = self.first_name {
            fields.first_name.clone_from(v);
        }
        if let Some(ref v) = self.last_name {
            fields.last_name.clone_from(v);
        }
        if let Some(ref v) = self.date_of_birth {
            fields.date_of_birth.clone_from(v);
        }
        if let Some(v) = self.gender {
            fields.gender = v;
        }
        if let Some(ref v) = self.national_number {
            fields.national_number.clone_from(v);
        }
        if let Some(ref v) = self.jamaat {
            fields.jamaat.clone_from(v);
        }
        if let Some(v) = self.family_situation {
            fields.family_situation = v;
        }
        if let Some(v) = self.children_count {
            fields.children_count = v;
        }
        if let Some(v) = self.children_over_15_count {
            fields.children_over_15_count = v;
        }
        if let Some(v) = self.spouse_is_ahmadi {
            fields.spouse_is_ahmadi = v;
        }
        if let Some(v) = self.salary_mad {
            fields.salary_mad = v;
        }
        if let Some(v) = self.salary_type {
            fields.salary_type = v;
        }
        if let Some(v) = self.monthly_tchanda {
            fields.monthly_tchanda = v;
        }
        if let Some(v) = self.is_mousi {
            fields.is_mousi = v;
        }
        if let Some(v) = self.is_active {
            fields.is_active = v;
        }
        if let Some(ref v) = self.jamaat_role {
            fields.jamaat_role.clone_from(v);
        }
    }

    /// Converts a patch carrying every field into complete [`MemberFields`].
    ///
    /// Returns `None` if any field is absent.
    #[must_use]
    pub fn into_fields(self) -> Option<MemberFields> {
        Some(MemberFields {
            first_name: self.first_name?,
            last_name: self.last_name?,
            date_of_birth: self.date_of_birth?,
            gender: self.gender?,
            national_number: self.national_number?,
            jamaat: self.jamaat?,
            family_situation: self.family_situation?,
            children_count: self.children_count?,
            children_over_15_count: self.children_over_15_count?,
            spouse_is_ahmadi: self.spouse_is_ahmadi?,
            salary_mad: self.salary_mad?,
            salary_type: self.salary_type?,
            monthly_tchanda: self.monthly_tchanda?,
            is_mousi: self.is_mousi?,
            is_active: self.is_active?,
            jamaat_role: self.jamaat_role?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> MemberFields {
        MemberFields {
            first_name: "Ali".to_string(),
            last_name: "Hassan".to_string(),
            date_of_birth: "1990-01-01".to_string(),
            gender: Gender::Male,
            national_number: "MOR0123".to_string(),
            jamaat: "Rabat".to_string(),
            family_situation: FamilySituation::Married,
            children_count: 2,
            children_over_15_count: 0,
            spouse_is_ahmadi: true,
            salary_mad: 8000.0,
            salary_type: SalaryType::Fixed,
            monthly_tchanda: 500.0,
            is_mousi: false,
            is_active: true,
            jamaat_role: "Member".to_string(),
        }
    }

    #[test]
    fn enum_parse_is_exact() {
        assert_eq!(Gender::parse("Female"), Some(Gender::Female));
        assert_eq!(Gender::parse("female"), None);
        assert_eq!(FamilySituation::parse("Divorced"), Some(FamilySituation::Divorced));
        assert_eq!(FamilySituation::parse("Widowed"), None);
        assert_eq!(SalaryType::parse("Variable"), Some(SalaryType::Variable));
        assert_eq!(SalaryType::parse(""), None);
    }

    #[test]
    fn member_id_accepts_numbers_and_strings() {
        let numeric: MemberId = serde_json::from_str("42").unwrap();
        let text: MemberId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(numeric, text);
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "\"42\"");
    }

    #[test]
    fn record_serializes_flat() {
        let record = MemberRecord {
            id: MemberId::new("7"),
            fields: sample_fields(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "7");
        assert_eq!(value["first_name"], "Ali");
        assert_eq!(value["gender"], "Male");
        assert_eq!(value["salary_type"], "Fixed");
        assert_eq!(record.full_name(), "Ali Hassan");
    }

    #[test]
    fn draft_from_record_round_trips_values() {
        let record = MemberRecord {
            id: MemberId::new("7"),
            fields: sample_fields(),
        };
        let draft = MemberDraft::from(&record);
        assert_eq!(draft.gender.as_deref(), Some("Male"));
        assert_eq!(draft.family_situation.as_deref(), Some("Married"));
        assert_eq!(draft.children_count, Some(FormValue::Typed(2)));
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut fields = sample_fields();
        let patch = MemberPatch {
            last_name: Some("Zahra".to_string()),
            children_count: Some(3),
            is_active: Some(false),
            ..MemberPatch::default()
        };
        patch.apply_to(&mut fields);

        assert_eq!(fields.first_name, "Ali");
        assert_eq!(fields.last_name, "Zahra");
        assert_eq!(fields.children_count, 3);
        assert!(!fields.is_active);
        assert_eq!(fields.national_number, "MOR0123");
    }

    #[test]
    fn patch_skips_absent_fields_when_serialized() {
        let patch = MemberPatch {
            jamaat: Some("Casablanca".to_string()),
            ..MemberPatch::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"jamaat":"Casablanca"}"#
        );
        assert!(MemberPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn partial_patch_does_not_become_fields() {
        let patch = MemberPatch {
            first_name: Some("Ali".to_string()),
            ..MemberPatch::default()
        };
        assert!(patch.into_fields().is_none());
    }
}
