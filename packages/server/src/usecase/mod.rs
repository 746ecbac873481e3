//! UseCase 層
//!
//! ドメインモデルと Hub を組み合わせて、接続・初期同期・イベント処理・切断・在室状況の
//! 取得といったアプリケーションの操作を提供します。

pub mod bootstrap_session;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod dispatch_event;
pub mod error;
pub mod get_presence;

pub use bootstrap_session::BootstrapSessionUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use dispatch_event::{DispatchEventUseCase, Outbound};
pub use error::{BootstrapError, ConnectError, DispatchError};
pub use get_presence::{GetPresenceUseCase, RoomPresence};
