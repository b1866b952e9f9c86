use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Customer Value Objects
// ============================================================================

/// Customer email address, kept exactly as stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(pub String);

impl Email {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used for uniqueness lookups
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.normalized() == other.to_lowercase()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Postal address, a required part of every customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "plz")]
    pub postal_code: String,
    #[serde(rename = "ort")]
    pub city: String,
}

impl Address {
    pub const POSTAL_CODE_LENGTH: usize = 5;

    pub fn new(postal_code: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            postal_code: postal_code.into(),
            city: city.into(),
        }
    }
}

/// Revenue as amount plus ISO 4217 currency code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    #[serde(rename = "betrag")]
    pub amount: Decimal,
    #[serde(rename = "waehrung")]
    pub currency: String,
}

impl Revenue {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Error for enum literals that match no known variant
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown {kind} literal: {literal}")]
pub struct UnknownLiteral {
    pub kind: &'static str,
    pub literal: String,
}

/// Declares a document enum whose variants are stored as short codes and
/// may also be parsed by their long name.
macro_rules! literal_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $code:literal | $long:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code, alias = $long)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Short code as stored in the customer document
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownLiteral;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed == $code || trimmed.eq_ignore_ascii_case($long) {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownLiteral {
                    kind: $kind,
                    literal: s.to_string(),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

literal_enum! {
    /// Gender of a customer
    Gender, "gender" {
        Male => "M" | "MAENNLICH",
        Female => "W" | "WEIBLICH",
        Diverse => "D" | "DIVERS",
    }
}

literal_enum! {
    /// Marital status of a customer
    MaritalStatus, "marital status" {
        Single => "L" | "LEDIG",
        Married => "VH" | "VERHEIRATET",
        Divorced => "G" | "GESCHIEDEN",
        Widowed => "VW" | "VERWITWET",
    }
}

literal_enum! {
    /// Interest a customer may subscribe to
    Interest, "interest" {
        Sport => "S" | "SPORT",
        Reading => "L" | "LESEN",
        Travel => "R" | "REISEN",
    }
}

/// Login credentials linked to a customer. Only attached in memory during
/// create and read flows, never part of the stored customer document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    /// Opaque credential, hashing is owned by the user directory
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }
}

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_CUSTOMER: &str = "ROLE_KUNDE";
pub const ROLE_ACTUATOR: &str = "ROLE_ACTUATOR";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_parses_code_and_name() {
        assert_eq!("S".parse::<Interest>().unwrap(), Interest::Sport);
        assert_eq!("SPORT".parse::<Interest>().unwrap(), Interest::Sport);
        assert_eq!("lesen".parse::<Interest>().unwrap(), Interest::Reading);
        assert!("GOLF".parse::<Interest>().is_err());
    }

    #[test]
    fn test_marital_status_codes() {
        assert_eq!("VH".parse::<MaritalStatus>().unwrap(), MaritalStatus::Married);
        assert_eq!(MaritalStatus::Widowed.code(), "VW");
    }

    #[test]
    fn test_gender_serializes_as_code() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"W\"");
        let parsed: Gender = serde_json::from_str("\"WEIBLICH\"").unwrap();
        assert_eq!(parsed, Gender::Female);
    }

    #[test]
    fn test_email_case_insensitive_comparison() {
        let email = Email::new("Alpha@Test.de");
        assert!(email.eq_ignore_case("alpha@test.de"));
        assert_eq!(email.normalized(), "alpha@test.de");
        assert!(!email.eq_ignore_case("beta@test.de"));
    }
}
