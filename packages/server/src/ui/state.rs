//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    BootstrapSessionUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
    DispatchEventUseCase, GetPresenceUseCase,
};

/// State handed to every axum handler
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// BootstrapSessionUseCase（room:init 送信のユースケース）
    pub bootstrap_session_usecase: Arc<BootstrapSessionUseCase>,
    /// DispatchEventUseCase（受信イベント処理のユースケース）
    pub dispatch_event_usecase: Arc<DispatchEventUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// GetPresenceUseCase（在室状況取得のユースケース）
    pub get_presence_usecase: Arc<GetPresenceUseCase>,
    /// Capacity of each connection's outbound queue
    pub outbound_capacity: usize,
}
