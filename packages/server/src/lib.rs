//! Real-time room hub for Cowatch watch-together rooms.
//!
//! Viewers of a room share a video timeline and a chat stream over WebSocket.
//! This crate holds the live connection registry (the hub), the inbound event
//! state machine, and the bootstrap snapshot sent to newly joined viewers.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
