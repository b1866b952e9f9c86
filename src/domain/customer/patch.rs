use std::str::FromStr;

use chrono::NaiveDate;
use url::Url;

use super::aggregate::Customer;
use super::commands::{PatchOp, PatchOperation};
use super::errors::CustomerError;
use super::value_objects::{Email, Gender, Interest, MaritalStatus};

// ============================================================================
// Patch Merge Engine
// ============================================================================
//
// Every patchable path is listed in `PatchField`; anything else is rejected.
// Identity, version, owner and timestamps are not patchable.
//
// ============================================================================

/// Closed set of document paths a patch may target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchField {
    LastName,
    Email,
    Category,
    Newsletter,
    BirthDate,
    Homepage,
    Gender,
    MaritalStatus,
    PostalCode,
    City,
    Interests,
}

impl PatchField {
    pub const ALL: &'static [PatchField] = &[
        PatchField::LastName,
        PatchField::Email,
        PatchField::Category,
        PatchField::Newsletter,
        PatchField::BirthDate,
        PatchField::Homepage,
        PatchField::Gender,
        PatchField::MaritalStatus,
        PatchField::PostalCode,
        PatchField::City,
        PatchField::Interests,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            PatchField::LastName => "/nachname",
            PatchField::Email => "/email",
            PatchField::Category => "/kategorie",
            PatchField::Newsletter => "/newsletter",
            PatchField::BirthDate => "/geburtsdatum",
            PatchField::Homepage => "/homepage",
            PatchField::Gender => "/geschlecht",
            PatchField::MaritalStatus => "/familienstand",
            PatchField::PostalCode => "/plz",
            PatchField::City => "/ort",
            PatchField::Interests => "/interessen",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.path() == path)
    }
}

/// Apply `operations` in order to a copy of `customer`. The input is left
/// untouched; the first failing operation aborts the whole patch.
pub fn apply_patch(
    customer: &Customer,
    operations: &[PatchOperation],
) -> Result<Customer, CustomerError> {
    let mut patched = customer.clone();
    for operation in operations {
        apply_operation(&mut patched, operation)?;
    }
    tracing::trace!(operations = operations.len(), ?patched, "Patched customer");
    Ok(patched)
}

fn apply_operation(target: &mut Customer, operation: &PatchOperation) -> Result<(), CustomerError> {
    let unsupported = || CustomerError::unsupported_patch(operation.op.as_str(), &operation.path);
    let field = PatchField::from_path(&operation.path).ok_or_else(unsupported)?;
    let value = operation.value.as_str();

    match (operation.op, field) {
        (PatchOp::Replace, PatchField::LastName) => target.last_name = value.to_string(),
        (PatchOp::Replace, PatchField::Email) => target.email = Email::new(value),
        (PatchOp::Replace, PatchField::Category) => {
            target.category = convert(field, value, "category")?
        }
        (PatchOp::Replace, PatchField::Newsletter) => {
            target.newsletter = convert(field, value, "boolean")?
        }
        (PatchOp::Replace, PatchField::BirthDate) => {
            target.birth_date = Some(convert::<NaiveDate>(field, value, "date")?)
        }
        (PatchOp::Replace, PatchField::Homepage) => {
            target.homepage = Some(convert::<Url>(field, value, "URL")?)
        }
        (PatchOp::Replace, PatchField::Gender) => {
            target.gender = Some(convert::<Gender>(field, value, "gender")?)
        }
        (PatchOp::Replace, PatchField::MaritalStatus) => {
            target.marital_status = Some(convert::<MaritalStatus>(field, value, "marital status")?)
        }
        (PatchOp::Replace, PatchField::PostalCode) => {
            target.address.postal_code = value.to_string()
        }
        (PatchOp::Replace, PatchField::City) => target.address.city = value.to_string(),
        (PatchOp::Add, PatchField::Interests) => {
            let interest: Interest = convert(field, value, "interest")?;
            if !target.interests.contains(&interest) {
                target.interests.push(interest);
            }
        }
        (PatchOp::Remove, PatchField::Interests) => {
            let interest: Interest = convert(field, value, "interest")?;
            target.interests.retain(|existing| *existing != interest);
        }
        _ => return Err(unsupported()),
    }

    Ok(())
}

fn convert<T: FromStr>(
    field: PatchField,
    value: &str,
    expected: &'static str,
) -> Result<T, CustomerError> {
    value
        .trim()
        .parse()
        .map_err(|_| CustomerError::patch_type_mismatch(field.path(), value, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::aggregate::tests::create_test_customer;

    #[test]
    fn test_replace_scalar_fields() {
        let original = create_test_customer();
        let ops = vec![
            PatchOperation::replace("/nachname", "Beta"),
            PatchOperation::replace("/kategorie", "7"),
            PatchOperation::replace("/newsletter", "true"),
            PatchOperation::replace("/geburtsdatum", "1985-12-24"),
            PatchOperation::replace("/homepage", "https://beta.test.de"),
            PatchOperation::replace("/geschlecht", "M"),
            PatchOperation::replace("/familienstand", "VERHEIRATET"),
            PatchOperation::replace("/plz", "10115"),
            PatchOperation::replace("/ort", "Berlin"),
        ];

        let patched = apply_patch(&original, &ops).unwrap();

        assert_eq!(patched.last_name, "Beta");
        assert_eq!(patched.category, 7);
        assert!(patched.newsletter);
        assert_eq!(patched.birth_date, NaiveDate::from_ymd_opt(1985, 12, 24));
        assert_eq!(patched.homepage.unwrap().as_str(), "https://beta.test.de/");
        assert_eq!(patched.gender, Some(Gender::Male));
        assert_eq!(patched.marital_status, Some(MaritalStatus::Married));
        assert_eq!(patched.address.postal_code, "10115");
        assert_eq!(patched.address.city, "Berlin");
    }

    #[test]
    fn test_original_is_not_mutated() {
        let original = create_test_customer();
        let snapshot = original.clone();
        let _ = apply_patch(&original, &[PatchOperation::replace("/email", "x@test.de")]).unwrap();
        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_later_operations_win() {
        let ops = vec![
            PatchOperation::replace("/email", "a@x.com"),
            PatchOperation::replace("/email", "b@x.com"),
        ];
        let patched = apply_patch(&create_test_customer(), &ops).unwrap();
        assert_eq!(patched.email.as_str(), "b@x.com");
    }

    #[test]
    fn test_add_interest_twice_is_idempotent() {
        let original = create_test_customer();
        let once = apply_patch(&original, &[PatchOperation::add("/interessen", "SPORT")]).unwrap();
        let twice = apply_patch(
            &original,
            &[
                PatchOperation::add("/interessen", "SPORT"),
                PatchOperation::add("/interessen", "S"),
            ],
        )
        .unwrap();
        assert_eq!(once.interests, twice.interests);
        assert_eq!(once.interests, vec![Interest::Reading, Interest::Travel, Interest::Sport]);
    }

    #[test]
    fn test_remove_interest_twice_is_idempotent() {
        let original = create_test_customer();
        let once = apply_patch(&original, &[PatchOperation::remove("/interessen", "LESEN")]).unwrap();
        let twice = apply_patch(
            &original,
            &[
                PatchOperation::remove("/interessen", "LESEN"),
                PatchOperation::remove("/interessen", "LESEN"),
            ],
        )
        .unwrap();
        assert_eq!(once.interests, vec![Interest::Travel]);
        assert_eq!(once.interests, twice.interests);
    }

    #[test]
    fn test_add_then_remove_is_net_noop() {
        let original = create_test_customer();
        let patched = apply_patch(
            &original,
            &[
                PatchOperation::add("/interessen", "SPORT"),
                PatchOperation::remove("/interessen", "SPORT"),
            ],
        )
        .unwrap();
        assert_eq!(patched.interests, original.interests);
    }

    #[test]
    fn test_type_mismatch() {
        let err = apply_patch(
            &create_test_customer(),
            &[PatchOperation::replace("/kategorie", "many")],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CustomerError::PatchTypeMismatch { ref path, ref value, .. }
                if path == "/kategorie" && value == "many"
        ));

        let err = apply_patch(
            &create_test_customer(),
            &[PatchOperation::add("/interessen", "GOLF")],
        )
        .unwrap_err();
        assert!(matches!(err, CustomerError::PatchTypeMismatch { .. }));
    }

    #[test]
    fn test_unsupported_combinations() {
        let cases = [
            PatchOperation::add("/email", "a@test.de"),
            PatchOperation::remove("/nachname", "Alpha"),
            PatchOperation::replace("/interessen", "S"),
            PatchOperation::replace("/id", "00000000-0000-0000-0000-000000000000"),
            PatchOperation::replace("/version", "9"),
            PatchOperation::replace("/adresse/plz", "12345"),
        ];
        for op in cases {
            let err = apply_patch(&create_test_customer(), &[op.clone()]).unwrap_err();
            assert!(
                matches!(err, CustomerError::UnsupportedPatchOperation { ref path, .. } if *path == op.path),
                "{op:?} should be unsupported"
            );
        }
    }

    #[test]
    fn test_identity_and_version_untouched() {
        let mut original = create_test_customer();
        original.id = Some(uuid::Uuid::new_v4());
        original.version = Some(5);
        let patched = apply_patch(&original, &[PatchOperation::replace("/ort", "Bonn")]).unwrap();
        assert_eq!(patched.id, original.id);
        assert_eq!(patched.version, Some(5));
    }

    #[test]
    fn test_every_field_has_unique_path() {
        for field in PatchField::ALL {
            assert_eq!(PatchField::from_path(field.path()), Some(*field));
        }
    }
}
