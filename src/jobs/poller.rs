use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::jobs::{JobKind, JobSnapshot, JobStatus, StatusSource};

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Pending(JobSnapshot),
    Completed(JobSnapshot),
    Failed {
        snapshot: JobSnapshot,
        message: String,
    },
    /// The source could not be read this tick; polling continues.
    Unavailable,
    Exhausted {
        polls: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollerState {
    Idle,
    Polling,
    Stopped,
}

/// Fixed-interval job poller that stops itself on a terminal status.
///
/// `tick` takes `&mut self`, so at most one fetch is ever in flight.
#[derive(Debug)]
pub struct Poller {
    kind: JobKind,
    interval: Duration,
    max_polls: Option<usize>,
    state: PollerState,
    polls: usize,
}

impl Poller {
    pub fn new(kind: JobKind, interval: Duration) -> Self {
        Self {
            kind,
            interval,
            max_polls: None,
            state: PollerState::Idle,
            polls: 0,
        }
    }

    pub fn with_max_polls(mut self, max_polls: Option<usize>) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state == PollerState::Polling {
            bail!("{} job polling already started", self.kind.as_str());
        }
        self.state = PollerState::Polling;
        self.polls = 0;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.state = PollerState::Stopped;
    }

    pub fn is_polling(&self) -> bool {
        self.state == PollerState::Polling
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    /// One poll; `None` when the poller is not running.
    pub fn tick<S: StatusSource>(&mut self, source: &mut S) -> Option<PollOutcome> {
        if !self.is_polling() {
            return None;
        }

        self.polls += 1;
        let snapshot = match source.fetch() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(kind = self.kind.as_str(), poll = self.polls, error = %err, "job status unavailable");
                return Some(PollOutcome::Unavailable);
            }
        };

        debug!(
            kind = self.kind.as_str(),
            job_id = %snapshot.id,
            status = %snapshot.status,
            percentage = snapshot.progress.percentage,
            terminal = snapshot.status.is_terminal(),
            "polled job status"
        );

        let outcome = match snapshot.status {
            JobStatus::Completed => {
                self.stop();
                PollOutcome::Completed(snapshot)
            }
            JobStatus::Failed => {
                self.stop();
                let message = snapshot
                    .error
                    .clone()
                    .filter(|error| !error.trim().is_empty())
                    .unwrap_or_else(|| self.kind.failure_message().to_string());
                PollOutcome::Failed { snapshot, message }
            }
            _ => PollOutcome::Pending(snapshot),
        };
        Some(outcome)
    }

    /// Polls immediately, then every interval, until a terminal status or the poll budget runs out.
    pub fn run<S, F>(&mut self, source: &mut S, mut on_update: F) -> Result<PollOutcome>
    where
        S: StatusSource,
        F: FnMut(&JobSnapshot),
    {
        self.start()?;
        info!(
            kind = self.kind.as_str(),
            interval_ms = self.interval.as_millis() as u64,
            "started job polling"
        );

        loop {
            match self.tick(source) {
                Some(PollOutcome::Pending(snapshot)) => on_update(&snapshot),
                Some(PollOutcome::Unavailable) => {}
                Some(outcome) => {
                    if let PollOutcome::Completed(snapshot) | PollOutcome::Failed { snapshot, .. } =
                        &outcome
                    {
                        on_update(snapshot);
                    }
                    return Ok(outcome);
                }
                None => return Ok(PollOutcome::Exhausted { polls: self.polls }),
            }

            if self.max_polls.is_some_and(|max| self.polls >= max) {
                self.stop();
                warn!(kind = self.kind.as_str(), polls = self.polls, "job polling budget exhausted");
                return Ok(PollOutcome::Exhausted { polls: self.polls });
            }

            thread::sleep(self.interval);
        }
    }
}
