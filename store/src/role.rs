//! Role storage trait.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::StoreError;
use verileaf_types::{Identity, RegistryEvent};

/// The two privileged roles, stored together as one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    pub owner: Identity,
    pub verifier: Identity,
}

/// Trait for the role record written at construction.
pub trait RoleStore {
    /// The stored roles, or `None` if the registry was never constructed
    /// over this store.
    fn get_roles(&self) -> Result<Option<Roles>, StoreError>;

    /// Replace the stored roles and append `event` to the audit trail.
    fn put_roles(&self, roles: &Roles, event: &RegistryEvent) -> Result<(), StoreError>;
}

impl<T: RoleStore + ?Sized> RoleStore for &T {
    fn get_roles(&self) -> Result<Option<Roles>, StoreError> {
        (**self).get_roles()
    }

    fn put_roles(&self, roles: &Roles, event: &RegistryEvent) -> Result<(), StoreError> {
        (**self).put_roles(roles, event)
    }
}

impl<T: RoleStore + ?Sized> RoleStore for Arc<T> {
    fn get_roles(&self) -> Result<Option<Roles>, StoreError> {
        (**self).get_roles()
    }

    fn put_roles(&self, roles: &Roles, event: &RegistryEvent) -> Result<(), StoreError> {
        (**self).put_roles(roles, event)
    }
}
