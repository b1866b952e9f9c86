use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::errors::{ConstraintViolation, CustomerError};
use super::value_objects::{
    Address, Email, Gender, Interest, MaritalStatus, Revenue, UserAccount,
};

// ============================================================================
// Customer Aggregate
// ============================================================================

const LAST_NAME_PREFIX: &str = "o'|von|von der|von und zu|van";
const NAME_PATTERN: &str = "[A-ZÄÖÜ][a-zäöüß]+";

static LAST_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^({LAST_NAME_PREFIX})?{NAME_PATTERN}(-{NAME_PATTERN})?$"
    ))
    .expect("last name pattern is valid")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Z]{3}$").expect("currency pattern is valid"));

/// Stored customer document.
///
/// `id` and `version` are owned by the persistence layer: callers never set
/// them, the patch engine never touches them. Equality is structural; use
/// [`ByEmail`] where two records with the same email must collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(rename = "nachname")]
    pub last_name: String,
    pub email: Email,
    #[serde(rename = "kategorie", default)]
    pub category: u8,
    #[serde(default)]
    pub newsletter: bool,
    #[serde(rename = "geburtsdatum", default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "umsatz", default)]
    pub revenue: Option<Revenue>,
    #[serde(default)]
    pub homepage: Option<Url>,
    #[serde(rename = "geschlecht", default)]
    pub gender: Option<Gender>,
    #[serde(rename = "familienstand", default)]
    pub marital_status: Option<MaritalStatus>,
    #[serde(rename = "interessen", default)]
    pub interests: Vec<Interest>,
    #[serde(rename = "adresse")]
    pub address: Address,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub user: Option<UserAccount>,
}

impl Customer {
    pub const MIN_CATEGORY: u8 = 0;
    pub const MAX_CATEGORY: u8 = 9;

    /// New unsaved customer with the required fields only
    pub fn new(last_name: impl Into<String>, email: Email, address: Address) -> Self {
        Self {
            id: None,
            version: None,
            last_name: last_name.into(),
            email,
            category: 0,
            newsletter: false,
            birth_date: None,
            revenue: None,
            homepage: None,
            gender: None,
            marital_status: None,
            interests: Vec::new(),
            address,
            username: None,
            created_at: None,
            updated_at: None,
            user: None,
        }
    }

    /// Stored version, 0 when the document has never been saved
    pub fn stored_version(&self) -> i64 {
        self.version.unwrap_or(0)
    }

    /// Copy the mutable business fields of `source` onto a copy of `self`.
    /// Identity, version, owner and timestamps stay with `self`.
    pub fn merged_with(&self, source: &Customer) -> Customer {
        Customer {
            last_name: source.last_name.clone(),
            email: source.email.clone(),
            category: source.category,
            newsletter: source.newsletter,
            birth_date: source.birth_date,
            revenue: source.revenue.clone(),
            homepage: source.homepage.clone(),
            gender: source.gender,
            marital_status: source.marital_status,
            interests: source.interests.clone(),
            address: source.address.clone(),
            ..self.clone()
        }
    }

    /// Check every field constraint, collecting all violations
    pub fn validate(&self, today: NaiveDate) -> Result<(), CustomerError> {
        let mut violations = Vec::new();

        if self.last_name.is_empty() {
            violations.push(ConstraintViolation::new("nachname", "must not be empty"));
        } else if !LAST_NAME_RE.is_match(&self.last_name) {
            violations.push(ConstraintViolation::new(
                "nachname",
                format!("{} does not match the last name pattern", self.last_name),
            ));
        }

        if self.email.as_str().is_empty() {
            violations.push(ConstraintViolation::new("email", "must not be empty"));
        } else if !EMAIL_RE.is_match(self.email.as_str()) {
            violations.push(ConstraintViolation::new(
                "email",
                format!("{} is not a valid email address", self.email),
            ));
        }

        if !(Self::MIN_CATEGORY..=Self::MAX_CATEGORY).contains(&self.category) {
            violations.push(ConstraintViolation::new(
                "kategorie",
                format!(
                    "must be between {} and {}",
                    Self::MIN_CATEGORY,
                    Self::MAX_CATEGORY
                ),
            ));
        }

        if let Some(birth_date) = self.birth_date {
            if birth_date >= today {
                violations.push(ConstraintViolation::new(
                    "geburtsdatum",
                    "must be in the past",
                ));
            }
        }

        if let Some(revenue) = &self.revenue {
            if !CURRENCY_RE.is_match(&revenue.currency) {
                violations.push(ConstraintViolation::new(
                    "umsatz",
                    format!("{} is not a currency code", revenue.currency),
                ));
            }
        }

        let mut seen = HashSet::new();
        if !self.interests.iter().all(|interest| seen.insert(*interest)) {
            violations.push(ConstraintViolation::new(
                "interessen",
                "must not contain duplicates",
            ));
        }

        if self.address.postal_code.chars().count() != Address::POSTAL_CODE_LENGTH {
            violations.push(ConstraintViolation::new(
                "plz",
                format!(
                    "must have exactly {} characters",
                    Address::POSTAL_CODE_LENGTH
                ),
            ));
        }
        if self.address.city.is_empty() {
            violations.push(ConstraintViolation::new("ort", "must not be empty"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(CustomerError::ConstraintViolations(violations))
        }
    }
}

/// Opt-in comparator treating two customers as the same logical entity when
/// their stored emails are equal (case-sensitive). Use as a set or map key.
#[derive(Debug, Clone)]
pub struct ByEmail(pub Customer);

impl PartialEq for ByEmail {
    fn eq(&self, other: &Self) -> bool {
        self.0.email == other.0.email
    }
}

impl Eq for ByEmail {}

impl Hash for ByEmail {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.email.hash(state);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal::Decimal;

    pub(crate) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    pub(crate) fn create_test_customer() -> Customer {
        let mut customer = Customer::new(
            "Alpha",
            Email::new("alpha@test.de"),
            Address::new("76133", "Karlsruhe"),
        );
        customer.category = 1;
        customer.birth_date = NaiveDate::from_ymd_opt(1990, 1, 31);
        customer.revenue = Some(Revenue::new(Decimal::new(1000, 0), "EUR"));
        customer.homepage = Url::parse("https://www.test.de").ok();
        customer.gender = Some(Gender::Female);
        customer.marital_status = Some(MaritalStatus::Single);
        customer.interests = vec![Interest::Reading, Interest::Travel];
        customer.username = Some("alpha1".to_string());
        customer
    }

    #[test]
    fn test_valid_customer_passes() {
        assert!(create_test_customer().validate(today()).is_ok());
    }

    #[test]
    fn test_last_name_with_prefix_and_double_name() {
        let mut customer = create_test_customer();
        for name in ["vonAlpha", "Müller-Lüdenscheidt", "o'Brien"] {
            customer.last_name = name.to_string();
            assert!(customer.validate(today()).is_ok(), "{name} should be valid");
        }
        customer.last_name = "alpha".to_string();
        assert!(customer.validate(today()).is_err());
    }

    #[test]
    fn test_violations_are_collected() {
        let mut customer = create_test_customer();
        customer.category = 10;
        customer.birth_date = Some(today());
        customer.interests = vec![Interest::Sport, Interest::Sport];
        customer.address.postal_code = "1234".to_string();

        match customer.validate(today()) {
            Err(CustomerError::ConstraintViolations(violations)) => {
                let props: Vec<_> = violations.iter().map(|v| v.property).collect();
                assert_eq!(props, vec!["kategorie", "geburtsdatum", "interessen", "plz"]);
            }
            other => panic!("expected violations, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut customer = create_test_customer();
        customer.email = Email::new("invalid-email");
        assert!(matches!(
            customer.validate(today()),
            Err(CustomerError::ConstraintViolations(_))
        ));
    }

    #[test]
    fn test_merged_with_keeps_identity() {
        let mut stored = create_test_customer();
        stored.id = Some(Uuid::new_v4());
        stored.version = Some(4);

        let mut candidate = create_test_customer();
        candidate.id = Some(Uuid::new_v4());
        candidate.version = Some(99);
        candidate.email = Email::new("new@test.de");
        candidate.username = Some("intruder".to_string());

        let merged = stored.merged_with(&candidate);
        assert_eq!(merged.id, stored.id);
        assert_eq!(merged.version, Some(4));
        assert_eq!(merged.username.as_deref(), Some("alpha1"));
        assert_eq!(merged.email.as_str(), "new@test.de");
    }

    #[test]
    fn test_by_email_collapses_on_email() {
        let a = create_test_customer();
        let mut b = create_test_customer();
        b.last_name = "Beta".to_string();
        let mut c = create_test_customer();
        c.email = Email::new("other@test.de");

        assert_ne!(a, b);
        let set: HashSet<ByEmail> = [a, b, c].into_iter().map(ByEmail).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_user_account_not_serialized() {
        let mut customer = create_test_customer();
        customer.user = Some(UserAccount::new("alpha1", "p"));
        let json = serde_json::to_value(&customer).unwrap();
        assert!(json.get("user").is_none());
        assert_eq!(json["nachname"], "Alpha");
        assert_eq!(json["adresse"]["plz"], "76133");
    }
}
