use std::collections::HashSet;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use dashmap::DashMap;

use super::wait_for_graph::WaitForGraph;
use super::TransactionId;
use crate::common::PageId;
use crate::error::{DbError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

struct PageLockState {
    mode: Option<LockMode>,
    holders: HashSet<TransactionId>,
}

impl PageLockState {
    fn empty() -> Self {
        Self {
            mode: None,
            holders: HashSet::new(),
        }
    }

    /// True if `tid` requesting `kind` must wait.
    fn blocked(&self, tid: TransactionId, kind: LockMode) -> bool {
        match self.mode {
            None => false,
            Some(LockMode::Shared) => match kind {
                LockMode::Shared => false,
                // Exclusive: blocked unless tid is the sole shared holder (upgrade).
                LockMode::Exclusive => !(self.holders.len() == 1 && self.holders.contains(&tid)),
            },
            Some(LockMode::Exclusive) => !self.holders.contains(&tid),
        }
    }

    /// Grants `kind` to `tid`. A no-op when `tid` already holds a lock at least as strong as
    /// `kind` on this page (e.g. re-requesting Shared while already holding Exclusive) — granting
    /// would otherwise downgrade the page's mode and let a concurrent shared request slip in
    /// underneath an exclusive holder's uncommitted write.
    fn grant(&mut self, tid: TransactionId, kind: LockMode) {
        if self.mode == Some(LockMode::Exclusive) && self.holders.contains(&tid) {
            return;
        }
        match kind {
            LockMode::Shared => {
                self.mode = Some(LockMode::Shared);
                self.holders.insert(tid);
            }
            LockMode::Exclusive => {
                self.mode = Some(LockMode::Exclusive);
                self.holders.clear();
                self.holders.insert(tid);
            }
        }
    }

    fn release(&mut self, tid: TransactionId) {
        self.holders.remove(&tid);
        if self.holders.is_empty() {
            self.mode = None;
        }
    }
}

/// Page-level shared/exclusive lock manager with wait-for-graph deadlock detection. Locks are
/// acquired on demand and held until `release`/`release_all` is called at the owning
/// transaction's commit or abort boundary (strict two-phase locking).
pub struct LockManager {
    page_locks: DashMap<PageId, Mutex<PageLockState>>,
    tid_pages: DashMap<TransactionId, HashSet<PageId>>,
    wait_for_graph: Mutex<WaitForGraph>,
    retry_quantum: Duration,
}

impl LockManager {
    pub fn new(retry_quantum: Duration) -> Self {
        Self {
            page_locks: DashMap::new(),
            tid_pages: DashMap::new(),
            wait_for_graph: Mutex::new(WaitForGraph::new()),
            retry_quantum,
        }
    }

    /// Blocks until `tid` holds `kind` on `pid`, or a deadlock involving `tid` is detected.
    pub fn acquire(&self, tid: TransactionId, pid: PageId, kind: LockMode) -> Result<()> {
        loop {
            let blocking_holders: HashSet<TransactionId> = {
                let entry = self
                    .page_locks
                    .entry(pid)
                    .or_insert_with(|| Mutex::new(PageLockState::empty()));
                let mut state = entry.lock().unwrap();
                if !state.blocked(tid, kind) {
                    state.grant(tid, kind);
                    drop(state);
                    self.tid_pages.entry(tid).or_default().insert(pid);
                    self.wait_for_graph.lock().unwrap().clear(tid);
                    return Ok(());
                }
                state.holders.iter().copied().filter(|&h| h != tid).collect()
            };

            {
                let mut wfg = self.wait_for_graph.lock().unwrap();
                wfg.set_waits(tid, blocking_holders);
                if wfg.has_cycle() {
                    wfg.clear(tid);
                    log::warn!("transaction {} aborted: deadlock waiting on {:?}", tid, pid);
                    return Err(DbError::TransactionAborted { tid });
                }
            }

            thread::sleep(self.retry_quantum);
        }
    }

    pub fn release(&self, tid: TransactionId, pid: PageId) {
        if let Some(entry) = self.page_locks.get(&pid) {
            entry.lock().unwrap().release(tid);
        }
        if let Some(mut pages) = self.tid_pages.get_mut(&tid) {
            pages.remove(&pid);
        }
    }

    /// Releases every lock `tid` holds, in any order, and drops it from the wait-for graph.
    pub fn release_all(&self, tid: TransactionId) {
        if let Some((_, pages)) = self.tid_pages.remove(&tid) {
            for pid in pages {
                if let Some(entry) = self.page_locks.get(&pid) {
                    entry.lock().unwrap().release(tid);
                }
            }
        }
        self.wait_for_graph.lock().unwrap().clear(tid);
    }

    pub fn holds(&self, tid: TransactionId, pid: PageId) -> bool {
        self.page_locks
            .get(&pid)
            .map(|entry| entry.lock().unwrap().holders.contains(&tid))
            .unwrap_or(false)
    }
}
