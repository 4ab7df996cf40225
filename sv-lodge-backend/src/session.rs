use rand::{thread_rng, Rng as _};
use sv_lodge_storage::models::User;

use crate::error::AppError;

const ID_LENGTH: usize = 9;

/// Random lowercase alphanumeric id, used for users and bookings.
#[must_use]
pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(ID_LENGTH)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

/// The operator logged in on this device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    user: User,
}

impl Session {
    #[must_use]
    pub const fn new(user: User) -> Self {
        Self { user }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn into_user(self) -> User {
        self.user
    }

    #[must_use]
    pub const fn can_view_ledger(&self) -> bool {
        self.user.role.can_view_ledger()
    }

    pub fn require_ledger(&self) -> Result<(), AppError> {
        if self.can_view_ledger() {
            Ok(())
        } else {
            Err(AppError::LedgerNotAllowed)
        }
    }
}
