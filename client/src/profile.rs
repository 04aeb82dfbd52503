//! Connection settings for one RETS server

use retsq_shared::error::{Error, Result};

/// Immutable connection settings for one server, built from configuration.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub user_agent: Option<String>,
    pub user_agent_password: Option<String>,
    pub rets_version: Option<String>,
    pub use_post_method: bool,
    pub http_authentication_method: Option<String>,
}

impl SessionProfile {
    pub fn builder(
        login_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> SessionProfileBuilder {
        SessionProfileBuilder {
            login_url: login_url.into(),
            username: username.into(),
            password: password.into(),
            user_agent: None,
            user_agent_password: None,
            rets_version: None,
            use_post_method: false,
            http_authentication_method: None,
        }
    }

    /// Version string sent in the `RETS-Version` header.
    pub fn rets_version(&self) -> &str {
        self.rets_version.as_deref().unwrap_or("RETS/1.7.2")
    }
}

/// Builds a fully-populated [`SessionProfile`] in one step.
#[derive(Debug, Clone)]
pub struct SessionProfileBuilder {
    login_url: String,
    username: String,
    password: String,
    user_agent: Option<String>,
    user_agent_password: Option<String>,
    rets_version: Option<String>,
    use_post_method: bool,
    http_authentication_method: Option<String>,
}

impl SessionProfileBuilder {
    pub fn user_agent(mut self, value: Option<String>) -> Self {
        self.user_agent = value;
        self
    }

    pub fn user_agent_password(mut self, value: Option<String>) -> Self {
        self.user_agent_password = value;
        self
    }

    pub fn rets_version(mut self, value: Option<String>) -> Self {
        self.rets_version = value;
        self
    }

    pub fn use_post_method(mut self, value: bool) -> Self {
        self.use_post_method = value;
        self
    }

    pub fn http_authentication_method(mut self, value: Option<String>) -> Self {
        self.http_authentication_method = value;
        self
    }

    pub fn build(self) -> Result<SessionProfile> {
        if self.login_url.trim().is_empty() {
            return Err(Error::Configuration("login_url must not be empty".into()));
        }
        if self.username.trim().is_empty() {
            return Err(Error::Configuration("username must not be empty".into()));
        }
        Ok(SessionProfile {
            login_url: self.login_url,
            username: self.username,
            password: self.password,
            user_agent: self.user_agent,
            user_agent_password: self.user_agent_password,
            rets_version: self.rets_version,
            use_post_method: self.use_post_method,
            http_authentication_method: self.http_authentication_method,
        })
    }
}
