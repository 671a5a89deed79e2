//! Outcome reporting seam.
//!
//! The core emits classified events into an [`OutcomeSink`] and never waits on
//! it. Aggregation lives behind the trait.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::session::SessionReport;

/// One check evaluated against one response
#[derive(Debug, Clone, PartialEq)]
pub struct CheckEvent {
    pub tag: &'static str,
    pub check: String,
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
}

/// One completed (or failed) request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEvent {
    pub tag: &'static str,
    /// 0 when the transport failed
    pub status: u16,
    pub passed: bool,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

/// Fire-and-forget receiver of classified outcomes.
///
/// Implementations must not block; they are called from inside session tasks.
pub trait OutcomeSink: Send + Sync {
    fn record_check(&self, event: CheckEvent);

    fn record_request(&self, _event: RequestEvent) {}

    fn record_session_start(&self, _session_id: u64) {}

    fn record_session(&self, _report: &SessionReport) {}

    /// An arrival was shed because every pool slot was busy
    fn record_dropped_arrival(&self) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn record_check(&self, _event: CheckEvent) {}
}

/// Events forwarded by [`ChannelSink`]
#[derive(Debug, Clone)]
pub enum ReporterEvent {
    Check(CheckEvent),
    Request(RequestEvent),
    SessionStarted(u64),
    Session(SessionReport),
    ArrivalDropped,
}

/// Forwards events into an unbounded channel. Sends after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ReporterEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReporterEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutcomeSink for ChannelSink {
    fn record_check(&self, event: CheckEvent) {
        let _ = self.tx.send(ReporterEvent::Check(event));
    }

    fn record_request(&self, event: RequestEvent) {
        let _ = self.tx.send(ReporterEvent::Request(event));
    }

    fn record_session_start(&self, session_id: u64) {
        let _ = self.tx.send(ReporterEvent::SessionStarted(session_id));
    }

    fn record_session(&self, report: &SessionReport) {
        let _ = self.tx.send(ReporterEvent::Session(report.clone()));
    }

    fn record_dropped_arrival(&self) {
        let _ = self.tx.send(ReporterEvent::ArrivalDropped);
    }
}

/// Forwards every event to each inner sink
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn OutcomeSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn OutcomeSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn OutcomeSink>) {
        self.sinks.push(sink);
    }
}

impl OutcomeSink for FanoutSink {
    fn record_check(&self, event: CheckEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record_check(event.clone());
            }
            last.record_check(event);
        }
    }

    fn record_request(&self, event: RequestEvent) {
        for sink in &self.sinks {
            sink.record_request(event.clone());
        }
    }

    fn record_session_start(&self, session_id: u64) {
        for sink in &self.sinks {
            sink.record_session_start(session_id);
        }
    }

    fn record_session(&self, report: &SessionReport) {
        for sink in &self.sinks {
            sink.record_session(report);
        }
    }

    fn record_dropped_arrival(&self) {
        for sink in &self.sinks {
            sink.record_dropped_arrival();
        }
    }
}
