//! Authenticated caller supplied by the identity collaborator
//!
//! Every service operation takes a `Principal` and checks ownership against
//! the entity it touches. Parents act on their own payments and bookings,
//! therapists on the bookings and slots they serve, admins on everything.

use serde::{Deserialize, Serialize};

use crate::domain::{Booking, DomainError, DomainResult, Initiator, Payment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Parent,
    Therapist,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "PARENT",
            Self::Therapist => "THERAPIST",
            Self::Admin => "ADMIN",
        }
    }

    /// Accepts the token claim spelling, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PARENT" => Some(Self::Parent),
            "THERAPIST" => Some(Self::Therapist),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn parent(id: impl Into<String>) -> Self {
        Self::new(id, Role::Parent)
    }

    pub fn therapist(id: impl Into<String>) -> Self {
        Self::new(id, Role::Therapist)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn initiator(&self) -> Initiator {
        match self.role {
            Role::Parent => Initiator::Parent,
            Role::Therapist => Initiator::Therapist,
            Role::Admin => Initiator::Admin,
        }
    }

    pub fn ensure_admin(&self) -> DomainResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(self.forbidden("administrator role required"))
        }
    }

    /// Admin, or the parent identified by `parent_id`.
    pub fn ensure_parent(&self, parent_id: &str) -> DomainResult<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Parent if self.id == parent_id => Ok(()),
            _ => Err(self.forbidden("not the owning parent")),
        }
    }

    /// Admin, or the therapist identified by `therapist_id`.
    pub fn ensure_therapist(&self, therapist_id: &str) -> DomainResult<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Therapist if self.id == therapist_id => Ok(()),
            _ => Err(self.forbidden("not the serving therapist")),
        }
    }

    pub fn ensure_can_view_payment(&self, payment: &Payment) -> DomainResult<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Parent if self.id == payment.parent_id => Ok(()),
            Role::Therapist if self.id == payment.therapist_id => Ok(()),
            _ => Err(self.forbidden("payment belongs to someone else")),
        }
    }

    /// Either side of the booking, or an admin.
    pub fn ensure_party_to(&self, booking: &Booking) -> DomainResult<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Parent if self.id == booking.parent_id => Ok(()),
            Role::Therapist if self.id == booking.therapist_id => Ok(()),
            _ => Err(self.forbidden("booking belongs to someone else")),
        }
    }

    fn forbidden(&self, reason: &str) -> DomainError {
        DomainError::Forbidden(format!("{} {}: {}", self.role.as_str(), self.id, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_checks() {
        let parent = Principal::parent("p-1");
        assert!(parent.ensure_parent("p-1").is_ok());
        assert!(matches!(parent.ensure_parent("p-2"), Err(DomainError::Forbidden(_))));
        assert!(parent.ensure_therapist("p-1").is_err());
        assert!(parent.ensure_admin().is_err());

        let admin = Principal::admin("root");
        assert!(admin.ensure_parent("anyone").is_ok());
        assert!(admin.ensure_therapist("anyone").is_ok());
    }

    #[test]
    fn role_maps_to_initiator() {
        assert_eq!(Principal::therapist("t").initiator(), Initiator::Therapist);
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("guest"), None);
    }
}
