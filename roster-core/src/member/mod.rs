//! Member records and the shared validator.
//!
//! The create and edit forms run the same rule set, so the rules cannot drift
//! between screens.
//!
//! # Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `first_name`, `last_name`, `jamaat`, `jamaat_role`, `date_of_birth` | non-empty |
//! | `gender` | `Male` or `Female` |
//! | `national_number` | `MOR` followed by exactly 4 digits |
//! | `family_situation` | `Married`, `Divorced` or `Single` |
//! | `children_count`, `children_over_15_count` | integer ≥ 0 |
//! | `spouse_is_ahmadi`, `is_mousi`, `is_active` | boolean |
//! | `salary_mad`, `monthly_tchanda` | number ≥ 0 |
//! | `salary_type` | `Fixed` or `Variable` |

pub mod types;
mod validation;

pub use types::{
    FamilySituation, FormValue, Gender, MemberDraft, MemberFields, MemberId, MemberPatch,
    MemberRecord, SalaryType,
};
pub use validation::{
    canonicalize_national_number, is_valid_national_number, validate, validate_patch, FieldError,
    ValidationErrors, NATIONAL_NUMBER_DIGITS, NATIONAL_NUMBER_PREFIX,
};
