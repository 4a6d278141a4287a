//! Login gate and role-based view access.
//!
//! Credential verification is a collaborator behind a trait, not a literal
//! comparison in the client. The session itself is ephemeral: one
//! authenticated flag plus the granted role, nothing persisted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::state::AppView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
}

impl Role {
    /// Views a role may select. Admin sees everything; teachers see the
    /// camera, the stats charts and their own tab.
    pub fn allowed_views(&self) -> &'static [AppView] {
        match self {
            Role::Admin => &[
                AppView::Camera,
                AppView::Stats,
                AppView::Admin,
                AppView::Teacher,
            ],
            Role::Teacher => &[AppView::Camera, AppView::Stats, AppView::Teacher],
        }
    }
}

/// Credential verification collaborator. Returns the granted role, or `None`
/// when the credentials are rejected.
pub trait CredentialVerifier {
    fn verify(&self, username: &str, password: &str) -> Result<Option<Role>>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    ok: bool,
    #[serde(default)]
    role: Option<String>,
}

/// Verifies credentials against an HTTP auth endpoint:
/// `POST {username, password}` → `{ok, role?}`.
pub struct HttpCredentialVerifier {
    agent: ureq::Agent,
    url: String,
}

impl HttpCredentialVerifier {
    pub fn new(url: &str, timeout: std::time::Duration) -> Result<Self> {
        url::Url::parse(url).with_context(|| format!("invalid auth url '{}'", url))?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Ok(Self {
            agent,
            url: url.to_string(),
        })
    }
}

impl CredentialVerifier for HttpCredentialVerifier {
    fn verify(&self, username: &str, password: &str) -> Result<Option<Role>> {
        let response = self
            .agent
            .post(&self.url)
            .send_json(LoginRequest { username, password })
            .with_context(|| format!("verify credentials against {}", self.url))?;
        let body: LoginResponse = response.into_json().context("decode login response")?;
        if !body.ok {
            return Ok(None);
        }
        Ok(match body.role.as_deref() {
            Some("admin") => Some(Role::Admin),
            Some("teacher") | None => Some(Role::Teacher),
            Some(other) => {
                log::warn!("auth endpoint returned unknown role '{}'", other);
                None
            }
        })
    }
}

/// Ephemeral session state.
#[derive(Debug, Default)]
pub struct Session {
    role: Option<Role>,
}

impl Session {
    pub fn new() -> Self {
        Self { role: None }
    }

    pub fn login(
        &mut self,
        verifier: &dyn CredentialVerifier,
        username: &str,
        password: &str,
    ) -> Result<bool> {
        self.role = verifier.verify(username, password)?;
        Ok(self.role.is_some())
    }

    pub fn logout(&mut self) {
        self.role = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn may_view(&self, view: AppView) -> bool {
        self.role
            .map(|role| role.allowed_views().contains(&view))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedVerifier(Option<Role>);

    impl CredentialVerifier for FixedVerifier {
        fn verify(&self, _username: &str, _password: &str) -> Result<Option<Role>> {
            Ok(self.0)
        }
    }

    #[test]
    fn rejected_credentials_leave_session_unauthenticated() {
        let mut session = Session::new();
        let ok = session
            .login(&FixedVerifier(None), "teacher", "wrong")
            .unwrap();
        assert!(!ok);
        assert!(!session.is_authenticated());
        assert!(!session.may_view(AppView::Camera));
    }

    #[test]
    fn teacher_role_gates_admin_view() {
        let mut session = Session::new();
        session
            .login(&FixedVerifier(Some(Role::Teacher)), "teacher", "pw")
            .unwrap();
        assert!(session.may_view(AppView::Camera));
        assert!(session.may_view(AppView::Stats));
        assert!(!session.may_view(AppView::Admin));

        session.logout();
        assert!(!session.is_authenticated());
    }
}
