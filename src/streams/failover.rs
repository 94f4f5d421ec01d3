//! Failover between live streams
//!
//! The controller owns the currently displayed stream and the set of streams
//! that failed during this session. When a stream fails it walks forward
//! through the catalog (wrapping around) and switches to the first stream
//! that has not failed yet. Once every stream has failed it stays in
//! [`FailoverState::AllFailed`] until the application is restarted.

use std::collections::BTreeSet;

use super::{initial_stream, StreamCatalog, StreamDescriptor, StreamId};

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailoverState<'a> {
    Playing(&'a StreamDescriptor),
    AllFailed,
}

/// Result of reporting a stream failure
#[derive(Debug, Clone, PartialEq)]
pub enum FailoverOutcome {
    /// The stream was already known to be bad; nothing changed
    AlreadyFailed,
    /// Playback moved to the next healthy stream
    Switched { from: StreamId, to: StreamId },
    /// No healthy stream left
    AllFailed,
    /// The id is not in the catalog; it was recorded but nothing moved
    UnknownStream,
}

#[derive(Debug, Clone)]
pub struct FailoverController {
    catalog: StreamCatalog,
    current: usize,
    failed: BTreeSet<StreamId>,
    all_failed: bool,
}

impl FailoverController {
    /// Start on the catalog's primary stream (or its first one)
    pub fn new(catalog: StreamCatalog) -> Self {
        let current = initial_stream(&catalog)
            .and_then(|s| catalog.position(s.id()))
            .unwrap_or(0);
        Self {
            catalog,
            current,
            failed: BTreeSet::new(),
            all_failed: false,
        }
    }

    pub fn catalog(&self) -> &StreamCatalog {
        &self.catalog
    }

    pub fn state(&self) -> FailoverState<'_> {
        if self.all_failed {
            return FailoverState::AllFailed;
        }
        match self.catalog.get(self.current) {
            Some(stream) => FailoverState::Playing(stream),
            None => FailoverState::AllFailed,
        }
    }

    /// The stream on screen, `None` once everything has failed
    pub fn current(&self) -> Option<&StreamDescriptor> {
        match self.state() {
            FailoverState::Playing(stream) => Some(stream),
            FailoverState::AllFailed => None,
        }
    }

    pub fn failed(&self) -> &BTreeSet<StreamId> {
        &self.failed
    }

    pub fn is_failed(&self, id: &StreamId) -> bool {
        self.failed.contains(id)
    }

    pub fn is_all_failed(&self) -> bool {
        self.all_failed
    }

    /// Record a fatal playback failure and pick the next stream.
    pub fn on_stream_failure(&mut self, failed_id: &StreamId) -> FailoverOutcome {
        if self.failed.contains(failed_id) {
            return FailoverOutcome::AlreadyFailed;
        }
        self.failed.insert(failed_id.clone());

        let Some(position) = self.catalog.position(failed_id) else {
            tracing::warn!(
                stream = %failed_id,
                "failure reported for a stream outside the catalog"
            );
            return FailoverOutcome::UnknownStream;
        };

        let len = self.catalog.len();
        for step in 1..len {
            let index = (position + step) % len;
            let Some(candidate) = self.catalog.get(index) else {
                continue;
            };
            if !self.failed.contains(candidate.id()) {
                tracing::info!(
                    failed = %failed_id,
                    next = %candidate.title(),
                    "stream failed, switching"
                );
                self.current = index;
                return FailoverOutcome::Switched {
                    from: failed_id.clone(),
                    to: candidate.id().clone(),
                };
            }
        }

        tracing::error!(failed = self.failed.len(), "all streams have failed");
        self.all_failed = true;
        FailoverOutcome::AllFailed
    }

    /// Manual channel pick. Refused for failed streams, unknown ids and
    /// once every stream has failed.
    pub fn select(&mut self, id: &StreamId) -> bool {
        if self.all_failed || self.failed.contains(id) {
            return false;
        }
        match self.catalog.position(id) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "failover_tests.rs"]
mod tests;
