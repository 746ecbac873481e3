//! 永続化協調者の実装
//!
//! - `inmemory`: HashMap ベースの実装（単一プロセス / テスト用）
//! - `fixtures`: JSON フィクスチャからの初期データ読み込み

pub mod fixtures;
pub mod inmemory;

pub use fixtures::{FixtureError, Fixtures};
pub use inmemory::InMemoryRoomRepository;
