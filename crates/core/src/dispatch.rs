//! Best-effort batch delivery of composed campaigns.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::campaign::Campaign;
use crate::domain::customer::CustomerId;
use crate::errors::MailError;

/// Outbound delivery seam. A single send either succeeds or fails; the
/// transport never retries on its own.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;

    /// Verifies the transport is usable without delivering anything.
    async fn health_check(&self) -> Result<(), MailError>;
}

/// Outcome of one dispatch batch. `sent + skipped + failed` always accounts
/// for every planned campaign.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub planned: usize,
    pub sent: usize,
    pub skipped: Vec<SkippedCampaign>,
    pub failed: Vec<FailedDelivery>,
}

/// A campaign that was never attempted because the customer has no contact
/// address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCampaign {
    pub customer_id: CustomerId,
}

/// A campaign whose delivery was attempted and rejected by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDelivery {
    pub customer_id: CustomerId,
    pub address: String,
    pub error: String,
}

/// Attempts every campaign in order, one blocking send at a time. A failed
/// send is recorded and the batch continues; nothing is retried. An empty
/// batch short-circuits without touching the transport.
pub async fn dispatch_campaigns<M>(transport: &M, campaigns: &[Campaign]) -> DispatchReport
where
    M: MailTransport + ?Sized,
{
    let mut report = DispatchReport { planned: campaigns.len(), ..DispatchReport::default() };
    if campaigns.is_empty() {
        return report;
    }

    for campaign in campaigns {
        let address = campaign.email.as_deref().map(str::trim).filter(|a| !a.is_empty());
        let Some(address) = address else {
            report.skipped.push(SkippedCampaign { customer_id: campaign.customer_id });
            continue;
        };

        match transport.send(address, &campaign.subject, &campaign.message).await {
            Ok(()) => report.sent += 1,
            Err(error) => {
                warn!(
                    event_name = "crm.dispatch.send_failed",
                    customer_id = campaign.customer_id.0,
                    error = %error,
                    "campaign delivery failed, continuing batch"
                );
                report.failed.push(FailedDelivery {
                    customer_id: campaign.customer_id,
                    address: address.to_string(),
                    error: error.to_string(),
                });
            }
        }
    }

    report
}

/// Recorded outbound message, for assertions in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Test double that records every send and can be scripted to reject
/// specific addresses.
#[derive(Default)]
pub struct InMemoryMailTransport {
    sent: Mutex<Vec<RecordedMail>>,
    rejected_addresses: HashSet<String>,
}

impl InMemoryMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sent: Mutex::new(Vec::new()),
            rejected_addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sent(&self) -> Vec<RecordedMail> {
        self.sent.lock().expect("mail transport lock poisoned").clone()
    }
}

#[async_trait]
impl MailTransport for InMemoryMailTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if self.rejected_addresses.contains(to) {
            return Err(MailError::Transport(format!("delivery to `{to}` rejected")));
        }
        self.sent.lock().expect("mail transport lock poisoned").push(RecordedMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn health_check(&self) -> Result<(), MailError> {
        Ok(())
    }
}
