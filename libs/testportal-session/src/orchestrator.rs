/// Submission Orchestrator - One Snapshot, One Request, One Outcome
///
/// **Responsibility:**
/// Serialize a document snapshot, issue exactly one request to the execution
/// service and resolve it to an `Outcome`.
///
/// **Critical Properties:**
/// - Never mutates the store; the store's owner applies each `Settlement`
/// - Never fails: transport errors become `Outcome::TransportFailure`
/// - Does not interpret status codes; any completed exchange is `Success`
/// - No retries, no caching of identical snapshots

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::client::ExecutionClient;
use crate::outcome::{Outcome, SubmissionId};
use crate::store::{SessionDocument, SubmissionTicket};

/// Outcome of one submission, tagged with the id captured when it began
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub id: SubmissionId,
    pub outcome: Outcome,
}

#[derive(Clone)]
pub struct SubmissionOrchestrator {
    client: Arc<dyn ExecutionClient>,
}

impl SubmissionOrchestrator {
    pub fn new(client: Arc<dyn ExecutionClient>) -> Self {
        Self { client }
    }

    /// Resolve one snapshot to an outcome
    #[instrument(skip_all, fields(language = %snapshot.language, test_cases = snapshot.test_cases.len()))]
    pub async fn submit(&self, snapshot: &SessionDocument) -> Outcome {
        let request = snapshot.to_request();

        match self.client.execute(&request).await {
            Ok(response) => {
                info!(status = response.status, "Execution service responded");
                Outcome::Success {
                    status: response.status,
                    body: response.body,
                }
            }
            Err(e) => {
                warn!(error = %e, "Submission did not complete");
                Outcome::TransportFailure {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Run `submit` on a background task and send the tagged outcome to `settlements`.
    ///
    /// A closed receiver means nobody is waiting for the result; it is dropped.
    pub fn dispatch(
        &self,
        ticket: SubmissionTicket,
        settlements: mpsc::UnboundedSender<Settlement>,
    ) -> JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            let outcome = orchestrator.submit(&ticket.snapshot).await;
            let settlement = Settlement {
                id: ticket.id,
                outcome,
            };
            if settlements.send(settlement).is_err() {
                warn!(submission = %ticket.id, "Settlement receiver closed; outcome dropped");
            }
        })
    }
}
