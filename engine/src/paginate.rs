//! Paginated search execution over one resource/class pair

use retsq_client::Session;
use retsq_shared::error::Result;
use retsq_shared::{QueryExtras, SearchBatch};
use tracing::debug;

/// Parameters of one pagination run.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub resource: String,
    pub class: String,
    pub query: String,
    pub limit: u64,
    pub offset: u64,
    pub count_only: bool,
    pub standard_names: bool,
    pub select: Option<String>,
}

enum RunnerState {
    /// No search issued yet.
    Idle,
    /// Last page was full; another fetch is due.
    Accumulating,
    Done,
}

/// Drives repeated search calls, advancing the offset until the stopping
/// condition is met.
///
/// Batches are pulled lazily with [`PageRunner::next_batch`]; the sequence
/// is finite and a runner is not restartable — start a fresh one for a
/// repeat. In count-only mode exactly one round trip is made and the
/// emitted batch carries only the total count.
///
/// The loop continues while `row_count >= limit` — a page exactly equal to
/// `limit` means "may have more", so a result set that is an exact
/// multiple of `limit` costs one extra, empty round trip. That boundary is
/// part of the server contract and is pinned by tests.
pub struct PageRunner<'a> {
    session: &'a mut Session,
    query: PageQuery,
    offset: u64,
    state: RunnerState,
}

impl<'a> PageRunner<'a> {
    pub fn new(session: &'a mut Session, query: PageQuery) -> Self {
        let offset = query.offset;
        Self {
            session,
            query,
            offset,
            state: RunnerState::Idle,
        }
    }

    /// Fetch the next page, or `None` once the run is complete.
    pub async fn next_batch(&mut self) -> Result<Option<SearchBatch>> {
        match self.state {
            RunnerState::Done => Ok(None),
            RunnerState::Idle | RunnerState::Accumulating => {
                let extras = QueryExtras::new(
                    self.query.limit,
                    self.offset,
                    self.query.count_only,
                    self.query.standard_names,
                    self.query.select.clone(),
                );
                let batch = self
                    .session
                    .search(
                        &self.query.resource,
                        &self.query.class,
                        &self.query.query,
                        &extras,
                    )
                    .await?;

                if self.query.count_only {
                    self.state = RunnerState::Done;
                    return Ok(Some(SearchBatch::count_only(batch.total_count)));
                }

                debug!(
                    "page offset={} rows={} total={:?}",
                    self.offset, batch.row_count, batch.total_count
                );
                self.offset += batch.row_count;
                self.state = if batch.row_count >= self.query.limit {
                    RunnerState::Accumulating
                } else {
                    RunnerState::Done
                };
                Ok(Some(batch))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use retsq_client::RetsTransport;
    use retsq_shared::error::Error;
    use retsq_shared::{MediaObject, Row, TableField};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Serves scripted page sizes and records each requested offset.
    struct PagedTransport {
        pages: Vec<u64>,
        total: Option<u64>,
        calls: Arc<AtomicUsize>,
        offsets: Arc<Mutex<Vec<u64>>>,
    }

    fn rows(n: u64) -> Vec<Row> {
        (0..n)
            .map(|i| Row::from_pairs(vec![("ListingID".to_string(), format!("L{}", i))]))
            .collect()
    }

    #[async_trait]
    impl RetsTransport for PagedTransport {
        async fn login(&mut self) -> Result<()> {
            Ok(())
        }

        async fn search(
            &mut self,
            _resource: &str,
            _class: &str,
            _query: &str,
            extras: &QueryExtras,
        ) -> Result<SearchBatch> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            self.offsets.lock().unwrap().push(extras.offset);
            let size = self.pages.get(call).copied().unwrap_or(0);
            Ok(SearchBatch::new(rows(size), self.total))
        }

        async fn get_object(
            &mut self,
            _resource: &str,
            _field: &str,
            _record_id: &str,
            _object_ids: &str,
            _by_location: bool,
        ) -> Result<Vec<MediaObject>> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_table_metadata(
            &mut self,
            _resource: &str,
            _class: &str,
        ) -> Result<Vec<TableField>> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_lookup_values(
            &mut self,
            _resource: &str,
            _lookup_name: &str,
        ) -> Result<Vec<String>> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_system_metadata(&mut self) -> Result<serde_json::Value> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_resources_metadata(&mut self, _resource: &str) -> Result<serde_json::Value> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_classes_metadata(&mut self, _resource: &str) -> Result<serde_json::Value> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn logout(&mut self) -> Result<()> {
            Ok(())
        }
    }

    async fn logged_in_session(
        pages: Vec<u64>,
        total: Option<u64>,
    ) -> (Session, Arc<AtomicUsize>, Arc<Mutex<Vec<u64>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let offsets = Arc::new(Mutex::new(Vec::new()));
        let mut session = Session::new(Box::new(PagedTransport {
            pages,
            total,
            calls: calls.clone(),
            offsets: offsets.clone(),
        }));
        session.login().await.unwrap();
        (session, calls, offsets)
    }

    fn query(limit: u64, count_only: bool) -> PageQuery {
        PageQuery {
            resource: "Property".to_string(),
            class: "Residential".to_string(),
            query: "(Status=Active)".to_string(),
            limit,
            offset: 0,
            count_only,
            standard_names: false,
            select: None,
        }
    }

    #[tokio::test]
    async fn test_three_pages_with_short_final_page() {
        let (mut session, calls, offsets) =
            logged_in_session(vec![100, 100, 37], Some(237)).await;
        let mut runner = PageRunner::new(&mut session, query(100, false));

        let mut sizes = Vec::new();
        while let Some(batch) = runner.next_batch().await.unwrap() {
            sizes.push(batch.row_count);
        }

        assert_eq!(sizes, vec![100, 100, 37]);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(*offsets.lock().unwrap(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_exact_multiple_costs_one_extra_round_trip() {
        // 200 results at limit 100: the second full page still reads as
        // "may have more", so a third, empty call is made.
        let (mut session, calls, offsets) = logged_in_session(vec![100, 100], Some(200)).await;
        let mut runner = PageRunner::new(&mut session, query(100, false));

        let mut sizes = Vec::new();
        while let Some(batch) = runner.next_batch().await.unwrap() {
            sizes.push(batch.row_count);
        }

        assert_eq!(sizes, vec![100, 100, 0]);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(*offsets.lock().unwrap(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_count_only_is_a_single_round_trip() {
        let (mut session, calls, _offsets) =
            logged_in_session(vec![100, 100, 100], Some(1234)).await;
        let mut runner = PageRunner::new(&mut session, query(5, true));

        let batch = runner.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.total_count, Some(1234));
        assert!(batch.rows.is_empty());
        assert_eq!(batch.row_count, 0);

        assert!(runner.next_batch().await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_run_is_not_restartable() {
        let (mut session, calls, _offsets) = logged_in_session(vec![3], Some(3)).await;
        let mut runner = PageRunner::new(&mut session, query(100, false));

        assert!(runner.next_batch().await.unwrap().is_some());
        assert!(runner.next_batch().await.unwrap().is_none());
        assert!(runner.next_batch().await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_initial_offset_is_respected() {
        let (mut session, _calls, offsets) = logged_in_session(vec![10], Some(10)).await;
        let mut spec = query(100, false);
        spec.offset = 500;
        let mut runner = PageRunner::new(&mut session, spec);
        runner.next_batch().await.unwrap();
        assert_eq!(*offsets.lock().unwrap(), vec![500]);
    }
}
