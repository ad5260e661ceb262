use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Role;
use crate::error::Error;

/// Who is making the request, resolved once from the bearer token and passed
/// explicitly into every engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    pub email_verified: bool,
}

impl Identity {
    pub fn new(id: Uuid, role: Role, email_verified: bool) -> Self {
        Self {
            id,
            role,
            email_verified,
        }
    }

    pub fn require_role(&self, role: Role) -> Result<(), Error> {
        if self.role != role {
            return Err(Error::forbidden(format!("{} role required", role)));
        }

        Ok(())
    }

    /// Verification gates features such as bidding, never login.
    pub fn require_email_verified(&self) -> Result<(), Error> {
        if !self.email_verified {
            return Err(Error::forbidden(
                "email verification required, please verify your email to access this feature",
            ));
        }

        Ok(())
    }
}

impl PolarClass for Identity {
    fn get_polar_class_builder() -> oso::ClassBuilder<Identity> {
        oso::Class::builder()
            .name("User")
            .add_attribute_getter("id", |recv: &Identity| recv.id.to_string())
            .add_attribute_getter("role", |recv: &Identity| recv.role.name().to_string())
            .add_attribute_getter("email_verified", |recv: &Identity| recv.email_verified)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Identity::get_polar_class_builder();
        builder.build()
    }
}
