//! UseCase 層のエラー型

use thiserror::Error;

use crate::{
    domain::{AuthError, RepositoryError},
    infrastructure::{dto::websocket::ErrorCode, hub::HubError},
};

/// 接続の認可・登録エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("user '{user_id}' is not a member of room '{room_id}'")]
    Forbidden { room_id: String, user_id: String },
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Hub(#[from] HubError),
}

impl ConnectError {
    /// 接続アップグレード入口向けのエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            ConnectError::Unauthorized(_) => "UNAUTHORIZED",
            ConnectError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            ConnectError::Forbidden { .. } => "FORBIDDEN",
            ConnectError::Repository(_) | ConnectError::Hub(_) => "INTERNAL_ERROR",
        }
    }
}

/// room:init 構築エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// 受信イベント 1 件の処理エラー（送信者にだけ通知され、接続は維持される）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("'{0}' requires control permission")]
    Unauthorized(&'static str),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("unknown event type '{0}'")]
    UnknownEvent(String),
}

impl DispatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DispatchError::Unauthorized(_) => ErrorCode::Unauthorized,
            DispatchError::InvalidPayload(_) => ErrorCode::InvalidPayload,
            DispatchError::UnknownEvent(_) => ErrorCode::UnknownEvent,
        }
    }
}
