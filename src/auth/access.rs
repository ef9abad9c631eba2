use crate::models::User;

/// Who is making the current request. Resolved from the session cookie by
/// [`crate::middleware::auth::identity_middleware`] and carried in the request
/// extensions; absent for anonymous requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
    pub active: bool,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            active: user.active,
            roles: user.roles.iter().map(|r| r.name.clone()).collect(),
        }
    }
}

/// Outcome of an access check on a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No session: send the client to the login page.
    LoginRequired,
    /// Logged in, but inactive or missing the role: 403.
    Forbidden,
}

/// True only for an active identity holding `required_role`.
pub fn is_authorized(identity: Option<&Identity>, required_role: &str) -> bool {
    match identity {
        Some(id) => id.active && id.has_role(required_role),
        None => false,
    }
}

pub fn check_access(identity: Option<&Identity>, required_role: &str) -> Access {
    if is_authorized(identity, required_role) {
        Access::Granted
    } else if identity.is_some() {
        Access::Forbidden
    } else {
        Access::LoginRequired
    }
}
