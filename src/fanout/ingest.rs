use super::Result;
use crate::broker::Supervisor;
use crate::model::{NewPublication, Publication};
use crate::store::Store;

use chrono::{SubsecRound, Utc};
use std::sync::Arc;

/// Persists new publications and hands them to the fan-out worker.
#[derive(Clone)]
pub struct Ingest {
    store: Arc<dyn Store>,
    broker: Arc<Supervisor>,
}

impl Ingest {
    pub fn new(store: Arc<dyn Store>, broker: Arc<Supervisor>) -> Self {
        Self { store, broker }
    }

    /// Store the publication, then queue it for fan-out.
    ///
    /// The result is only returned once the publication is committed.  If queueing fails
    /// after that, the publication stays stored but is never fanned out, and the error
    /// is returned.
    pub async fn add_publication(&self, new: NewPublication) -> Result<Publication> {
        // the store keeps microseconds; match it so the stored and returned copies agree
        let at = Utc::now().trunc_subsecs(6);
        let publication = self.store.add_publication(new.author, &new.text, at).await?;
        let snapshot = publication.to_snapshot()?;

        if let Err(e) = self.broker.channel().enqueue(&snapshot).await {
            log::error!(
                "Publication {} by {} was stored but could not be queued for fan-out: {}",
                publication.id,
                publication.author,
                e
            );
            return Err(e.into());
        }
        log::debug!("Queued publication {} for fan-out", publication.id);
        Ok(publication)
    }
}
