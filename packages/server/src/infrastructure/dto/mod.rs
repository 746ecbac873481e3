//! Data Transfer Objects (DTOs) for the room hub.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket envelope and event catalog
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
