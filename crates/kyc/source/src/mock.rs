//! Programmable status source for tests and local development.

use kyc_types::{StatusReport, UserId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{SourceError, SourceResult};
use crate::StatusSource;

/// One scripted fetch outcome.
#[derive(Debug, Clone)]
enum Scripted {
    Report(StatusReport),
    Error(String),
    /// Never resolves. Exercises the coordinator's timeout path.
    Hang,
}

/// Status source with scripted responses and a call counter.
///
/// Responses are consumed in order. When the script runs out, the fallback
/// report (if set) is repeated; otherwise the fetch errors. An optional
/// artificial delay keeps a fetch in flight long enough for concurrency
/// tests to pile callers onto it.
#[derive(Default)]
pub struct MockStatusSource {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<StatusReport>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that always answers with the same report.
    pub fn always(report: StatusReport) -> Self {
        let source = Self::new();
        source.set_fallback(report);
        source
    }

    /// Queue a successful response.
    pub fn push_report(&self, report: StatusReport) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Scripted::Report(report));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Scripted::Error(message.into()));
    }

    /// Queue a fetch that never resolves.
    pub fn push_hang(&self) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Scripted::Hang);
    }

    /// Set the report repeated once the script is exhausted.
    pub fn set_fallback(&self, report: StatusReport) {
        *self.fallback.lock().expect("mock fallback lock") = Some(report);
    }

    /// Delay every response by the given duration.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("mock delay lock") = Some(delay);
    }

    /// Number of fetches this source has served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StatusSource for MockStatusSource {
    async fn fetch_status(&self, user_id: &UserId) -> SourceResult<StatusReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().expect("mock script lock").pop_front();
        let delay = *self.delay.lock().expect("mock delay lock");

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(Scripted::Report(report)) => Ok(report),
            Some(Scripted::Error(message)) => Err(SourceError::Transport(message)),
            Some(Scripted::Hang) => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            None => match self.fallback.lock().expect("mock fallback lock").clone() {
                Some(report) => Ok(report),
                None => Err(SourceError::UnknownUser(user_id.to_string())),
            },
        }
    }
}
