//! The narrow seam between the session gateway and the wire protocol

use async_trait::async_trait;
use retsq_shared::error::Result;
use retsq_shared::{MediaObject, QueryExtras, SearchBatch, TableField};

/// The operations the engine needs from a RETS server.
///
/// [`Session`](crate::Session) is the only caller; it layers the
/// login-retry and logged-in bookkeeping on top. Implementations perform
/// one blocking round trip per call — these methods are the program's only
/// suspension points.
#[async_trait]
pub trait RetsTransport: Send {
    /// One authentication attempt. Retry policy lives in the session, not
    /// here.
    async fn login(&mut self) -> Result<()>;

    async fn search(
        &mut self,
        resource: &str,
        class: &str,
        query: &str,
        extras: &QueryExtras,
    ) -> Result<SearchBatch>;

    /// Fetch media objects for one record. `object_ids` is a server-side
    /// selector (usually `*` or a comma-separated index list).
    async fn get_object(
        &mut self,
        resource: &str,
        field: &str,
        record_id: &str,
        object_ids: &str,
        by_location: bool,
    ) -> Result<Vec<MediaObject>>;

    async fn get_table_metadata(&mut self, resource: &str, class: &str)
        -> Result<Vec<TableField>>;

    /// Long values of one lookup, in server order.
    async fn get_lookup_values(&mut self, resource: &str, lookup_name: &str)
        -> Result<Vec<String>>;

    async fn get_system_metadata(&mut self) -> Result<serde_json::Value>;

    async fn get_resources_metadata(&mut self, resource: &str) -> Result<serde_json::Value>;

    async fn get_classes_metadata(&mut self, resource: &str) -> Result<serde_json::Value>;

    async fn logout(&mut self) -> Result<()>;
}
