//! Test-case session model and submission workflow for the TestPortal client.
//!
//! A [`SessionStore`] owns the editable document and the lifecycle of the most
//! recent submission. A [`SubmissionOrchestrator`] turns a snapshot of that
//! document into one request against the execution service and resolves it to
//! an [`Outcome`], which the store's owner writes back with
//! [`SessionStore::settle_submission`].

pub mod client;
pub mod orchestrator;
pub mod outcome;
pub mod store;


pub use client::{ExecutionClient, HttpExecutionClient, ServiceResponse, TransportError};
pub use orchestrator::{Settlement, SubmissionOrchestrator};
pub use outcome::{Outcome, SubmissionId, SubmissionState};
pub use store::{
    SessionDocument, SessionError, SessionStore, StoreEvent, SubmissionTicket, SubscriptionId,
    TestCaseField,
};
