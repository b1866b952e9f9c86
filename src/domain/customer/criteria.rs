use rust_decimal::Decimal;

use super::aggregate::Customer;
use super::value_objects::{Gender, Interest, MaritalStatus};

// ============================================================================
// Search Criteria
// ============================================================================

/// One filter of a customer search, built from a query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// `nachname`: case-insensitive substring
    LastName(String),
    /// `email`: case-insensitive equality
    Email(String),
    /// `kategorie`
    Category(u8),
    /// `plz`: prefix
    PostalCode(String),
    /// `ort`: case-insensitive substring
    City(String),
    /// `umsatzmin`: revenue amount at least this value
    MinRevenue(Decimal),
    /// `geschlecht`
    Gender(Gender),
    /// `familienstand`
    MaritalStatus(MaritalStatus),
    /// `interessen`
    Interest(Interest),
    /// `newsletter`
    Newsletter(bool),
}

impl Criterion {
    /// Parse a single query parameter. Unknown keys and unparsable values
    /// yield `None`.
    pub fn from_param(key: &str, value: &str) -> Option<Self> {
        let value = value.trim();
        let criterion = match key {
            "nachname" => Criterion::LastName(value.to_lowercase()),
            "email" => Criterion::Email(value.to_lowercase()),
            "kategorie" => Criterion::Category(value.parse().ok()?),
            "plz" => Criterion::PostalCode(value.to_string()),
            "ort" => Criterion::City(value.to_lowercase()),
            "umsatzmin" => Criterion::MinRevenue(value.parse().ok()?),
            "geschlecht" => Criterion::Gender(value.parse().ok()?),
            "familienstand" => Criterion::MaritalStatus(value.parse().ok()?),
            "interessen" => Criterion::Interest(value.parse().ok()?),
            "newsletter" => Criterion::Newsletter(value.parse().ok()?),
            _ => return None,
        };
        Some(criterion)
    }

    /// Parse all query parameters; `None` if any of them is invalid
    pub fn from_params<'a, I>(params: I) -> Option<Vec<Self>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        params
            .into_iter()
            .map(|(key, value)| Self::from_param(key, value))
            .collect()
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        match self {
            Criterion::LastName(part) => customer.last_name.to_lowercase().contains(part),
            Criterion::Email(email) => customer.email.eq_ignore_case(email),
            Criterion::Category(category) => customer.category == *category,
            Criterion::PostalCode(prefix) => customer.address.postal_code.starts_with(prefix),
            Criterion::City(part) => customer.address.city.to_lowercase().contains(part),
            Criterion::MinRevenue(min) => customer
                .revenue
                .as_ref()
                .is_some_and(|revenue| revenue.amount >= *min),
            Criterion::Gender(gender) => customer.gender == Some(*gender),
            Criterion::MaritalStatus(status) => customer.marital_status == Some(*status),
            Criterion::Interest(interest) => customer.interests.contains(interest),
            Criterion::Newsletter(flag) => customer.newsletter == *flag,
        }
    }

    pub fn matches_all(criteria: &[Criterion], customer: &Customer) -> bool {
        criteria.iter().all(|criterion| criterion.matches(customer))
    }
}
