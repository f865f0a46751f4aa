//! Authorization identity derived from a verified peer certificate.
//!
//! Entities are ephemeral: derived fresh for every request, never
//! persisted, never mutated.

use crate::claims::{CAR_OWNER_CLAIM_OID, ROLE_CLAIM_OID};
use crate::error::IdentityError;
use crate::verify::{extract_claim, extract_subject_email};

/// Authorization role carried by a role claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Mechanic,
}

impl Role {
    /// Parse a role claim payload. The claim vocabulary is closed; an
    /// unrecognized value is an authorization failure, not a default.
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        match value {
            "user" => Ok(Role::User),
            "mechanic" => Ok(Role::Mechanic),
            other => Err(IdentityError::UnknownRole(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Mechanic => "mechanic",
        }
    }
}

/// The party behind a verified connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub email: String,
    pub role: Role,
    /// Identifier of the car this entity owns, if any
    pub owned_car: Option<String>,
}

impl Entity {
    /// Whether this entity owns the given car.
    pub fn owns(&self, car_id: &str) -> bool {
        self.owned_car.as_deref() == Some(car_id)
    }
}

/// Derive the authorization identity from a verified leaf certificate.
///
/// A certificate without a role claim cannot authorize anything;
/// `MissingRole` is a hard failure.
pub fn derive_entity(cert_der: &[u8]) -> Result<Entity, IdentityError> {
    let email = extract_subject_email(cert_der)?;
    let role = extract_claim(cert_der, ROLE_CLAIM_OID)?.ok_or(IdentityError::MissingRole)?;
    let role = Role::parse(&role)?;
    let owned_car = extract_claim(cert_der, CAR_OWNER_CLAIM_OID)?;

    Ok(Entity {
        email,
        role,
        owned_car,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::{tests::client_leaf, CertificateAuthority, DEFAULT_ROOT_VALIDITY_DAYS};
    use crate::claims::Claim;

    fn issuer() -> CertificateAuthority {
        CertificateAuthority::generate_root(DEFAULT_ROOT_VALIDITY_DAYS).unwrap()
    }

    #[test]
    fn owner_entity_is_derived() {
        let leaf = client_leaf(
            &issuer(),
            "owner-7@fleet.example",
            vec![
                Claim::Role("user".to_string()),
                Claim::CarOwner("7".to_string()),
            ],
        );

        let entity = derive_entity(&leaf.cert_der).unwrap();
        assert_eq!(entity.email, "owner-7@fleet.example");
        assert_eq!(entity.role, Role::User);
        assert!(entity.owns("7"));
        assert!(!entity.owns("8"));
    }

    #[test]
    fn mechanic_owns_nothing() {
        let leaf = client_leaf(
            &issuer(),
            "shop@fleet.example",
            vec![Claim::Role("mechanic".to_string())],
        );

        let entity = derive_entity(&leaf.cert_der).unwrap();
        assert_eq!(entity.role, Role::Mechanic);
        assert_eq!(entity.owned_car, None);
        assert!(!entity.owns("7"));
    }

    #[test]
    fn missing_role_is_a_hard_failure() {
        let leaf = client_leaf(&issuer(), "nobody@fleet.example", Vec::new());
        let result = derive_entity(&leaf.cert_der);
        assert!(matches!(result, Err(IdentityError::MissingRole)));
    }

    #[test]
    fn unknown_role_is_a_hard_failure() {
        let leaf = client_leaf(
            &issuer(),
            "pilot@fleet.example",
            vec![Claim::Role("pilot".to_string())],
        );
        let result = derive_entity(&leaf.cert_der);
        assert!(matches!(result, Err(IdentityError::UnknownRole(r)) if r == "pilot"));
    }
}
