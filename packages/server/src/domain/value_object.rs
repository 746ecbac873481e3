//! Value objects.
//!
//! Identifiers are validated once at the boundary and are cheap to clone afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum accepted length of a room code.
const ROOM_CODE_MAX_LEN: usize = 32;

/// User identifier issued by the account system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("UserId"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistent room identifier. Rooms in the hub registry are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("RoomId"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public code viewers use to address a room (e.g. `K3X9QZ2A`).
///
/// Codes are ASCII alphanumeric and compared case-insensitively; the stored form is uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(value: &str) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("RoomCode"));
        }
        if trimmed.len() > ROOM_CODE_MAX_LEN || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValueObjectError::Malformed {
                kind: "RoomCode",
                value: value.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one live socket. A user with two tabs open has two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unix epoch milliseconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_rejects_blank_value() {
        // テスト項目: 空白のみの UserId は作成できない
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = UserId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("UserId")));
    }

    #[test]
    fn test_room_id_round_trips_through_string() {
        // テスト項目: RoomId は文字列との相互変換で値を保持する
        // given (前提条件):
        let room_id = RoomId::new("room-1".to_string()).unwrap();

        // when (操作):
        let raw: String = room_id.clone().into();

        // then (期待する結果):
        assert_eq!(raw, "room-1");
        assert_eq!(RoomId::try_from(raw).unwrap(), room_id);
    }

    #[test]
    fn test_room_code_is_normalised_to_uppercase() {
        // テスト項目: RoomCode は前後の空白を除去し大文字に正規化される
        // given (前提条件):
        let raw = " k3x9qz2a ";

        // when (操作):
        let code = RoomCode::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(code.as_str(), "K3X9QZ2A");
    }

    #[test]
    fn test_room_code_rejects_non_alphanumeric() {
        // テスト項目: 英数字以外を含む RoomCode はエラーになる
        // given (前提条件):
        let raw = "ab/../cd";

        // when (操作):
        let result = RoomCode::new(raw);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ValueObjectError::Malformed { kind: "RoomCode", .. })
        ));
    }

    #[test]
    fn test_room_code_rejects_overlong_value() {
        // テスト項目: 長すぎる RoomCode はエラーになる
        // given (前提条件):
        let raw = "A".repeat(ROOM_CODE_MAX_LEN + 1);

        // when (操作):
        let result = RoomCode::new(&raw);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: ConnectionId は生成ごとに異なる値になる
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        // then (期待する結果):
        assert_ne!(first, second);
    }
}
