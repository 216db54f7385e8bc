//! Delivery of fan-out plans through the MessagePusher.

use crate::domain::{Delivery, MessagePusher, PresenceTransition, RelayEvent};

/// Push every delivery, logging (not propagating) push failures.
///
/// Returns the number of connections addressed.
pub(super) async fn push_deliveries(
    pusher: &dyn MessagePusher,
    deliveries: impl IntoIterator<Item = Delivery>,
) -> usize {
    let mut addressed = 0;
    for delivery in deliveries {
        if delivery.targets.is_empty() {
            tracing::debug!("No recipients for {:?}, skipping", delivery.event);
            continue;
        }
        addressed += delivery.targets.len();
        if let Err(e) = pusher.broadcast(delivery.targets, &delivery.event).await {
            tracing::warn!("Failed to deliver event: {}", e);
        }
    }
    addressed
}

/// Presence transitions contained in a set of deliveries.
pub(super) fn transitions_of(deliveries: &[Delivery]) -> Vec<PresenceTransition> {
    deliveries
        .iter()
        .filter_map(|delivery| match &delivery.event {
            RelayEvent::UserStatus(transition) => Some(transition.clone()),
            _ => None,
        })
        .collect()
}
