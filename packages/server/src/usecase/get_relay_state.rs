//! UseCase: リレー状態のスナップショット取得（デバッグ用）

use crate::domain::RelaySnapshot;

use super::SharedRelay;

pub struct GetRelayStateUseCase {
    relay: SharedRelay,
}

impl GetRelayStateUseCase {
    pub fn new(relay: SharedRelay) -> Self {
        Self { relay }
    }

    pub async fn execute(&self) -> RelaySnapshot {
        self.relay.lock().await.snapshot()
    }
}
