use crate::summary::{MatchStatus, MatchSummary};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("match is already {from}; cannot move to {to}")]
    TerminalStatus { from: &'static str, to: &'static str },
    #[error("invalid status transition from {from} to {to}")]
    StatusRegression { from: &'static str, to: &'static str },
    #[error("match format cannot change once the match has started")]
    FormatChanged,
}

/// MatchFeed keeps the latest canonical snapshot shown by the overlay and
/// guards the match lifecycle across snapshots:
/// - terminal statuses are never left
/// - the format is fixed once play starts
#[derive(Debug, Default)]
pub struct MatchFeed {
    /// Most recent accepted snapshot
    current: Option<MatchSummary>,
    /// Number of snapshots accepted since the last reset
    accepted: u64,
}

impl MatchFeed {
    pub fn new() -> Self {
        MatchFeed::default()
    }

    pub fn current(&self) -> Option<&MatchSummary> {
        self.current.as_ref()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Checks a snapshot against the previous one without storing it.
    pub fn check(&self, next: &MatchSummary) -> Result<(), FeedError> {
        let Some(previous) = &self.current else {
            return Ok(());
        };
        if !previous.status.can_transition_to(next.status) {
            let from = previous.status.as_str();
            let to = next.status.as_str();
            return Err(if previous.status.is_terminal() {
                FeedError::TerminalStatus { from, to }
            } else {
                FeedError::StatusRegression { from, to }
            });
        }
        if previous.status != MatchStatus::NotStarted && previous.format != next.format {
            return Err(FeedError::FormatChanged);
        }
        Ok(())
    }

    /// Replaces the current snapshot when the lifecycle allows it.
    pub fn ingest(&mut self, next: MatchSummary) -> Result<&MatchSummary, FeedError> {
        if let Err(err) = self.check(&next) {
            tracing::warn!("match feed rejected snapshot: {err}");
            return Err(err);
        }
        if let Some(previous) = &self.current {
            if previous.status != next.status {
                tracing::info!(
                    from = previous.status.as_str(),
                    to = next.status.as_str(),
                    "match status changed"
                );
            }
        }
        self.accepted += 1;
        Ok(self.current.insert(next))
    }

    /// Clears the feed so a new match can begin.
    pub fn reset(&mut self) -> Option<MatchSummary> {
        self.accepted = 0;
        self.current.take()
    }
}
