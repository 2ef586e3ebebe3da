// Queue Store - authoritative entry collection and state machine

use crate::domain::{EntryId, EntryStatus, PaymentMethod, QueueEntry};
use crate::error::{AppError, Result};
use std::collections::HashMap;

/// Single authoritative collection of entries plus the in-service pointer.
///
/// Not synchronized: the CommandProcessor owns it behind its write lock.
#[derive(Debug, Default)]
pub struct QueueStore {
    /// Admission order
    entries: Vec<QueueEntry>,
    index: HashMap<EntryId, usize>,
    in_service: Option<EntryId>,
}

/// What a forced status change did, so the caller can fire the ledger hook
#[derive(Debug, Clone)]
pub struct ForceOutcome {
    pub entry: QueueEntry,
    pub previous: EntryStatus,
}

impl ForceOutcome {
    /// Entry moved into `done` from some other state
    pub fn reached_done(&self) -> bool {
        self.entry.status == EntryStatus::Done && self.previous != EntryStatus::Done
    }
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&QueueEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn in_service(&self) -> Option<&QueueEntry> {
        self.in_service.as_deref().and_then(|id| self.get(id))
    }

    /// Waiting and in-service entries in admission order
    pub fn active_queue(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter().filter(|e| e.status.is_active())
    }

    /// Append a freshly admitted entry at the FIFO tail
    pub fn insert(&mut self, entry: QueueEntry) -> Result<()> {
        if self.index.contains_key(&entry.id) {
            return Err(AppError::Internal(format!(
                "entry id {} already present",
                entry.id
            )));
        }
        if entry.status != EntryStatus::Waiting {
            return Err(AppError::Internal(format!(
                "new entry {} must be waiting, was {}",
                entry.id, entry.status
            )));
        }
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// waiting -> inService; only one entry may hold the station
    pub fn begin_service(&mut self, id: &str, now_millis: i64) -> Result<QueueEntry> {
        let i = self.position(id)?;
        if self.entries[i].status != EntryStatus::Waiting {
            return Err(AppError::InvalidTransition(format!(
                "entry {} is {}, not waiting",
                id, self.entries[i].status
            )));
        }
        if let Some(current) = self.in_service.as_deref() {
            return Err(AppError::ResourceBusy(format!(
                "entry {} is already in service",
                current
            )));
        }
        self.entries[i].begin_service(now_millis)?;
        self.in_service = Some(self.entries[i].id.clone());
        Ok(self.entries[i].clone())
    }

    /// inService -> done
    pub fn complete(
        &mut self,
        id: &str,
        payment_method: PaymentMethod,
        now_millis: i64,
    ) -> Result<QueueEntry> {
        let i = self.position(id)?;
        self.entries[i].complete(payment_method, now_millis)?;
        self.release(id);
        Ok(self.entries[i].clone())
    }

    /// waiting | inService -> cancelled
    pub fn cancel(&mut self, id: &str, now_millis: i64) -> Result<QueueEntry> {
        let i = self.position(id)?;
        self.entries[i].cancel(now_millis)?;
        self.release(id);
        Ok(self.entries[i].clone())
    }

    /// Privileged override: any state to any state, single in-service still enforced
    pub fn force(
        &mut self,
        id: &str,
        target: EntryStatus,
        payment_method: Option<PaymentMethod>,
        now_millis: i64,
    ) -> Result<ForceOutcome> {
        let i = self.position(id)?;
        if target == EntryStatus::InService {
            if let Some(current) = self.in_service.as_deref() {
                if current != id {
                    return Err(AppError::InvalidTransition(format!(
                        "cannot force {} into service while {} is in service",
                        id, current
                    )));
                }
            }
        }

        let previous = self.entries[i].status;
        self.entries[i].force(target, payment_method, now_millis)?;

        if target == EntryStatus::InService {
            self.in_service = Some(self.entries[i].id.clone());
        } else {
            self.release(id);
        }

        Ok(ForceOutcome {
            entry: self.entries[i].clone(),
            previous,
        })
    }

    /// Drop every entry and the in-service pointer; returns how many were removed
    pub fn reset(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.index.clear();
        self.in_service = None;
        removed
    }

    /// Invariants that correct serialization guarantees.
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let serving: Vec<&QueueEntry> = self
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::InService)
            .collect();
        if serving.len() > 1 {
            return Err(format!("{} entries in service", serving.len()));
        }
        let pointer = self.in_service.as_deref();
        let actual = serving.first().map(|e| e.id.as_str());
        if pointer != actual {
            return Err(format!(
                "in-service pointer {:?} disagrees with entries {:?}",
                pointer, actual
            ));
        }
        if self.index.len() != self.entries.len() {
            return Err("duplicate entry ids".to_string());
        }
        if let Some(bad) = self.entries.iter().find(|e| !e.is_price_consistent()) {
            return Err(format!("entry {} has inconsistent total price", bad.id));
        }
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("entry {} not found", id)))
    }

    fn release(&mut self, id: &str) {
        if self.in_service.as_deref() == Some(id) {
            self.in_service = None;
        }
    }
}
