//! Queue Watcher - keeps a local copy of engine state current
//!
//! Joins in two steps (subscribe, then snapshot) so no delta committed after
//! the snapshot can be missed. A revision gap triggers a fresh snapshot.

use crate::client::{EventStream, PhotoQueueClient};
use crate::error::{Result, SdkError};
use photoqueue_core::application::{ApplyOutcome, QueueMirror};
use photoqueue_core::domain::{QueueSnapshot, Revision};
use tracing::{debug, warn};

pub struct QueueWatcher {
    client: PhotoQueueClient,
    events: EventStream,
    mirror: QueueMirror,
    resyncs: u64,
}

impl QueueWatcher {
    pub async fn start(client: PhotoQueueClient) -> Result<Self> {
        let events = client.subscribe().await?;
        let snapshot = client.snapshot().await?;
        debug!(revision = snapshot.revision, "Watcher joined");

        Ok(Self {
            client,
            events,
            mirror: QueueMirror::from_snapshot(snapshot),
            resyncs: 0,
        })
    }

    pub fn state(&self) -> &QueueSnapshot {
        self.mirror.state()
    }

    pub fn revision(&self) -> Revision {
        self.mirror.revision()
    }

    /// How many times a gap forced a snapshot re-fetch
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Wait for the next change to the mirrored state.
    ///
    /// `Ok(None)` means the daemon closed the stream.
    pub async fn changed(&mut self) -> Result<Option<&QueueSnapshot>> {
        loop {
            let event = match self.events.next().await {
                Some(event) => event?,
                None => return Ok(None),
            };

            match self.mirror.apply(event) {
                ApplyOutcome::Applied => return Ok(Some(self.mirror.state())),
                ApplyOutcome::Stale => continue,
                ApplyOutcome::Gap { expected, received } => {
                    warn!(expected, received, "Missed deltas; resyncing from snapshot");
                    self.resync().await?;
                    return Ok(Some(self.mirror.state()));
                }
            }
        }
    }

    /// Replace the mirror with a freshly fetched snapshot
    pub async fn resync(&mut self) -> Result<()> {
        let snapshot = self.client.snapshot().await?;
        self.mirror.resync(snapshot);
        self.resyncs += 1;
        Ok(())
    }

    /// Block until the mirror has caught up to `revision`
    pub async fn wait_for_revision(&mut self, revision: Revision) -> Result<&QueueSnapshot> {
        while self.mirror.revision() < revision {
            if self.changed().await?.is_none() {
                return Err(SdkError::Connection("event stream closed".to_string()));
            }
        }
        Ok(self.mirror.state())
    }
}
