//! Shared application state.

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::{
    domain::MessagePusher,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, GetRelayStateUseCase,
        NotifyTypingUseCase, RoomMembershipUseCase, SendMessageUseCase, SharedRelay,
        UpdatePresenceUseCase,
    },
};

/// Use cases reachable from the handlers
pub struct AppState {
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub update_presence_usecase: Arc<UpdatePresenceUseCase>,
    pub room_membership_usecase: Arc<RoomMembershipUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub notify_typing_usecase: Arc<NotifyTypingUseCase>,
    pub get_relay_state_usecase: Arc<GetRelayStateUseCase>,
}

impl AppState {
    /// Wire every use case to the same relay state and pusher
    pub fn new(
        relay: SharedRelay,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(
                relay.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
                relay.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            update_presence_usecase: Arc::new(UpdatePresenceUseCase::new(
                relay.clone(),
                message_pusher.clone(),
                clock,
            )),
            room_membership_usecase: Arc::new(RoomMembershipUseCase::new(relay.clone())),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                relay.clone(),
                message_pusher.clone(),
            )),
            notify_typing_usecase: Arc::new(NotifyTypingUseCase::new(
                relay.clone(),
                message_pusher,
            )),
            get_relay_state_usecase: Arc::new(GetRelayStateUseCase::new(relay)),
        }
    }
}
