//! Session gateway: login lifecycle, call guards, teardown

use crate::transport::RetsTransport;
use retsq_shared::error::{Error, Result};
use retsq_shared::{MediaObject, QueryExtras, SearchBatch, TableField};
use tracing::warn;

/// An authenticated session against one RETS server.
///
/// Owns the transport exclusively; nothing else may call login or logout
/// on it. Every data call requires a prior successful [`Session::login`].
pub struct Session {
    transport: Box<dyn RetsTransport>,
    logged_in: bool,
}

impl Session {
    pub fn new(transport: Box<dyn RetsTransport>) -> Self {
        Self {
            transport,
            logged_in: false,
        }
    }

    /// Authenticate, retrying exactly once.
    ///
    /// Some servers inexplicably fail the first login but succeed if you
    /// try again, so a first failure is logged and retried; the second
    /// failure is propagated. Calling this again after success is
    /// undefined.
    pub async fn login(&mut self) -> Result<()> {
        if let Err(first) = self.transport.login().await {
            warn!("first login attempt failed, retrying once: {}", first);
            self.transport
                .login()
                .await
                .map_err(|second| Error::Authentication(second.to_string()))?;
        }
        self.logged_in = true;
        Ok(())
    }

    fn require_login(&self, call: &str) -> Result<()> {
        if !self.logged_in {
            return Err(Error::Protocol(format!("{} called before login", call)));
        }
        Ok(())
    }

    pub async fn search(
        &mut self,
        resource: &str,
        class: &str,
        query: &str,
        extras: &QueryExtras,
    ) -> Result<SearchBatch> {
        self.require_login("search")?;
        self.transport.search(resource, class, query, extras).await
    }

    pub async fn fetch_object(
        &mut self,
        resource: &str,
        field: &str,
        record_id: &str,
        object_ids: &str,
        by_location: bool,
    ) -> Result<Vec<MediaObject>> {
        self.require_login("fetch_object")?;
        self.transport
            .get_object(resource, field, record_id, object_ids, by_location)
            .await
    }

    pub async fn table_metadata(&mut self, resource: &str, class: &str) -> Result<Vec<TableField>> {
        self.require_login("table_metadata")?;
        self.transport.get_table_metadata(resource, class).await
    }

    pub async fn lookup_values(&mut self, resource: &str, lookup_name: &str) -> Result<Vec<String>> {
        self.require_login("lookup_values")?;
        self.transport.get_lookup_values(resource, lookup_name).await
    }

    pub async fn system_metadata(&mut self) -> Result<serde_json::Value> {
        self.require_login("system_metadata")?;
        self.transport.get_system_metadata().await
    }

    pub async fn resources_metadata(&mut self, resource: &str) -> Result<serde_json::Value> {
        self.require_login("resources_metadata")?;
        self.transport.get_resources_metadata(resource).await
    }

    pub async fn classes_metadata(&mut self, resource: &str) -> Result<serde_json::Value> {
        self.require_login("classes_metadata")?;
        self.transport.get_classes_metadata(resource).await
    }

    /// Tear the session down. Never fails: commands call this on every
    /// exit path after the primary outcome is already determined, so a
    /// logout failure is only logged.
    pub async fn disconnect(&mut self) {
        if !self.logged_in {
            return;
        }
        if let Err(err) = self.transport.logout().await {
            warn!("disconnect failed (ignored): {}", err);
        }
        self.logged_in = false;
    }
}
