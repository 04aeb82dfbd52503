//! Command implementations

pub mod histogram;
pub mod metadata;
pub mod object;
pub mod query;

use crate::config::MlsConfig;
use anyhow::Result;
use retsq_client::{HttpTransport, Session};

/// Resource and class overrides are both-or-neither; enforced here before
/// any network call so the engine can assume it.
pub(crate) fn validate_overrides(
    resource: &Option<String>,
    class: &Option<String>,
) -> Result<()> {
    if resource.is_some() != class.is_some() {
        anyhow::bail!("if a class is specified, a resource must also be specified, and vice versa");
    }
    Ok(())
}

/// Build a session for the configured server. Login is the caller's job.
pub(crate) fn connect(config: &MlsConfig) -> Result<Session> {
    let profile = config.session_profile()?;
    let transport = HttpTransport::new(profile)?;
    Ok(Session::new(Box::new(transport)))
}
