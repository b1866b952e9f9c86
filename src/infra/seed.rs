use chrono::NaiveDate;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::domain::customer::{
    Address, Customer, CustomerError, CustomerRepository, Email, Gender, Interest, MaritalStatus,
    Revenue, UserAccount, ROLE_ACTUATOR, ROLE_ADMIN, ROLE_CUSTOMER,
};

// ============================================================================
// Dev Seed Data
// ============================================================================

const SEED_PASSWORD: &str = "{noop}p";

pub fn users() -> Vec<UserAccount> {
    let mut users = vec![UserAccount::new("admin", SEED_PASSWORD).with_roles(&[
        ROLE_ADMIN,
        ROLE_CUSTOMER,
        ROLE_ACTUATOR,
    ])];
    users.extend(
        ["alpha1", "alpha2", "alpha3", "delta", "epsilon", "phi"]
            .into_iter()
            .map(|name| UserAccount::new(name, SEED_PASSWORD).with_roles(&[ROLE_CUSTOMER])),
    );
    users
}

/// Demo customers, one per seeded login, with fixed ids
pub fn customers() -> Vec<Customer> {
    let rows: [(&str, &str, &str, &str, &str); 7] = [
        ("admin", "Admin", "admin@acme.com", "00000", "Aachen"),
        ("alpha1", "Alpha", "alpha@acme.de", "11111", "Augsburg"),
        ("alpha2", "Alpha", "alpha@acme.edu", "22222", "Aalen"),
        ("alpha3", "Alpha", "alpha@acme.ch", "33333", "Ahlen"),
        ("delta", "Delta", "delta@acme.uk", "44444", "Dortmund"),
        ("epsilon", "Epsilon", "epsilon@acme.jp", "55555", "Essen"),
        ("phi", "Phi", "phi@acme.cn", "66666", "Freiburg"),
    ];

    rows.into_iter()
        .enumerate()
        .map(|(i, (username, last_name, email, postal_code, city))| {
            let mut customer = Customer::new(last_name, Email::new(email), Address::new(postal_code, city));
            customer.id = Some(Uuid::from_u128(i as u128));
            customer.category = (i % 10) as u8;
            customer.newsletter = i % 2 == 0;
            customer.birth_date = NaiveDate::from_ymd_opt(2019, 1, 1 + i as u32);
            customer.revenue = Some(Revenue::new(Decimal::new(i as i64 * 1000, 0), "EUR"));
            let domain = email.split_once('@').map_or("acme.com", |(_, domain)| domain);
            customer.homepage = Url::parse(&format!("https://www.{domain}")).ok();
            customer.gender = Some(if i % 2 == 0 { Gender::Female } else { Gender::Male });
            customer.marital_status = Some(MaritalStatus::ALL[i % MaritalStatus::ALL.len()]);
            customer.interests = match i % 3 {
                0 => vec![Interest::Sport],
                1 => vec![Interest::Reading, Interest::Travel],
                _ => Vec::new(),
            };
            customer.username = Some(username.to_string());
            customer
        })
        .collect()
}

/// Store the demo customers, returning how many were inserted
pub async fn populate(repo: &dyn CustomerRepository) -> Result<usize, CustomerError> {
    let customers = customers();
    let total = customers.len();
    for customer in customers {
        let saved = repo.save(customer).await?;
        tracing::debug!(customer_id = ?saved.id, email = %saved.email, "Seeded customer");
    }
    tracing::warn!(total, "Customer collection reloaded with demo data");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::aggregate::tests::today;
    use crate::infra::InMemoryCustomerRepository;

    #[test]
    fn test_admin_holds_all_roles() {
        let users = users();
        assert_eq!(users.len(), 7);
        let admin = users.iter().find(|u| u.username == "admin").unwrap();
        assert_eq!(admin.roles, vec![ROLE_ADMIN, ROLE_CUSTOMER, ROLE_ACTUATOR]);
        assert!(users
            .iter()
            .filter(|u| u.username != "admin")
            .all(|u| u.roles == vec![ROLE_CUSTOMER]));
    }

    #[test]
    fn test_seed_customers_are_valid_and_owned() {
        let users = users();
        for customer in customers() {
            customer.validate(today()).unwrap();
            let owner = customer.username.as_deref().unwrap();
            assert!(users.iter().any(|u| u.username == owner));
        }
    }

    #[tokio::test]
    async fn test_populate_stores_fixed_ids() {
        let repo = InMemoryCustomerRepository::new();
        assert_eq!(populate(&repo).await.unwrap(), 7);
        let alpha = repo.find_by_id(Uuid::from_u128(1)).await.unwrap().unwrap();
        assert_eq!(alpha.username.as_deref(), Some("alpha1"));
        assert_eq!(alpha.version, Some(0));
    }
}
