use std::sync::Arc;

use expensa_core::AppResult;
use expensa_domain::{EmailAddress, Permission, default_groups};

use crate::{BootstrapRepository, PasswordHasher, SeedAdministrator, SeedOutcome, SeedPlan};

/// Seeds the permission catalog, the default groups and the first administrator.
#[derive(Clone)]
pub struct BootstrapService {
    repository: Arc<dyn BootstrapRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl BootstrapService {
    /// Creates a new bootstrap service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn BootstrapRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    /// Applies the default seed. Safe to run on every start.
    ///
    /// The administrator is only created while the user store is empty.
    pub async fn seed(&self, admin_email: &str, admin_password: &str) -> AppResult<SeedOutcome> {
        let administrator = if self.repository.has_users().await? {
            None
        } else {
            Some(SeedAdministrator {
                email: EmailAddress::new(admin_email)?,
                password_hash: self.password_hasher.hash_password(admin_password)?,
            })
        };

        self.repository
            .seed(&SeedPlan {
                permissions: Permission::all(),
                groups: default_groups(),
                administrator,
            })
            .await
    }
}
