use async_trait::async_trait;
use pgwire::api::auth::{AuthSource, LoginInfo, Password};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};

/// Login name that unlocks the back-office surface.
pub const ADMIN_USER: &str = "admin";

/// What a connection may do, fixed at login time.
///
/// `Admin` is the back-office identity: catalog writes, booking status
/// changes, customer details, calendar subscriptions. Every other login is
/// `Public` and sees only the customer-facing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Public,
}

impl Role {
    pub fn for_user(user: &str) -> Role {
        if user == ADMIN_USER {
            Role::Admin
        } else {
            Role::Public
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Passwords for the two tiers. When no admin password is configured the
/// admin login is locked out entirely.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    public_password: String,
    admin_password: Option<String>,
}

impl AuthConfig {
    pub fn new(public_password: String, admin_password: Option<String>) -> Self {
        Self {
            public_password,
            admin_password,
        }
    }
}

#[derive(Debug)]
pub struct SlotdAuthSource {
    config: AuthConfig,
}

impl SlotdAuthSource {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AuthSource for SlotdAuthSource {
    async fn get_password(&self, login: &LoginInfo) -> PgWireResult<Password> {
        let wants_admin = login
            .user()
            .map(|u| Role::for_user(u).is_admin())
            .unwrap_or(false);

        let password = if wants_admin {
            match &self.config.admin_password {
                Some(p) => p.clone(),
                None => {
                    metrics::counter!(crate::observability::AUTH_FAILURES_TOTAL).increment(1);
                    return Err(PgWireError::UserError(Box::new(ErrorInfo::new(
                        "FATAL".into(),
                        "28000".into(),
                        "admin login is disabled".into(),
                    ))));
                }
            }
        } else {
            self.config.public_password.clone()
        };

        Ok(Password::new(None, password.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_admin_login_is_admin() {
        assert!(Role::for_user(ADMIN_USER).is_admin());
        assert!(!Role::for_user("shopfront").is_admin());
        // Login names are exact, like Postgres users
        assert!(!Role::for_user("ADMIN").is_admin());
        assert!(!Role::for_user("").is_admin());
    }
}
