use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Material request lifecycle
    RequestCreated(Uuid),
    RequestUpdated(Uuid),
    RequestSubmitted(Uuid),
    RequestRecommended(Uuid),
    RequestApproved(Uuid),
    RequestDisapproved { request_id: Uuid, reason: String },
    RequestRecalled(Uuid),
    RequestPosted(Uuid),
    RequestReceived(Uuid),
    RequestTransmitted(Uuid),
    RequestCancelled(Uuid),
    RequestDeleted(Uuid),
    RequestStatusChanged {
        request_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Organization events
    BusinessUnitCreated(Uuid),
    BusinessUnitUpdated(Uuid),
    BusinessUnitDeleted(Uuid),
    DepartmentCreated(Uuid),
    DepartmentUpdated(Uuid),
    DepartmentDeleted(Uuid),

    // User events
    UserCreated(Uuid),
    UserUpdated(Uuid),
    UserDeactivated(Uuid),
    PasswordChanged(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background loop draining the event channel.
///
/// Events are currently consumed for structured logging only; the channel is
/// the seam where outbound integrations would attach.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::RequestStatusChanged {
                request_id,
                old_status,
                new_status,
            } => {
                info!(
                    request_id = %request_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Request status changed"
                );
            }
            Event::RequestDisapproved { request_id, reason } => {
                warn!(request_id = %request_id, reason = %reason, "Request disapproved");
            }
            other => {
                info!(event = ?other, "Domain event");
            }
        }
    }
    info!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::RequestCreated(id)).await.unwrap();
        sender.send(Event::RequestSubmitted(id)).await.unwrap();

        assert!(matches!(rx.recv().await, Some(Event::RequestCreated(got)) if got == id));
        assert!(matches!(rx.recv().await, Some(Event::RequestSubmitted(got)) if got == id));
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::RequestUpdated(Uuid::new_v4())).await.is_err());
    }
}
