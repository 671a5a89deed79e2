//! Core of the banking API load simulator.
//!
//! - [`harness`] issues one tagged request and classifies it against an
//!   [`ExpectationSet`].
//! - [`workflow`] drives a [`Session`] through login, account provisioning,
//!   operations and cleanup.
//! - [`scheduler`] decides how many sessions run and when, per [`LoadProfile`].
//! - [`reporter`] is the outbound seam for classified outcomes.

pub mod error;
pub mod expectation;
pub mod harness;
pub mod profile;
pub mod reporter;
pub mod request;
pub mod scheduler;
pub mod session;
pub mod transport;
pub mod workflow;

pub use error::{ProfileError, StageParseError, TransportError};
pub use expectation::{ExpectationSet, JSON_CONTENT_TYPE, TRANSPORT_ERROR_CHECK};
pub use harness::{Outcome, RequestHarness};
pub use profile::{FixedProfile, LoadProfile, RampingProfile, Stage};
pub use reporter::{CheckEvent, ChannelSink, FanoutSink, NullSink, OutcomeSink, RequestEvent};
pub use request::{AccountType, Method, Operation, OperationRequest};
pub use scheduler::{RunSummary, Scheduler, SessionRunner};
pub use session::{AbandonReason, Session, SessionReport, SessionState};
pub use transport::{HttpResponse, ReqwestTransport, Transport, DEFAULT_REQUEST_TIMEOUT};
pub use workflow::{AmountRange, SessionWorkflow, WorkflowPlan};
