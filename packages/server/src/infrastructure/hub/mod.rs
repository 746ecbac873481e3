//! In-process room hub.
//!
//! The hub is the single owner of "who is connected to which room". Everything else
//! talks to it through a [`HubHandle`].

pub mod command;
pub mod config;
pub mod dispatch_queue;
pub mod handle;
pub mod registry;
pub mod server;

pub use config::{HubConfig, OverflowPolicy};
pub use handle::{HubError, HubHandle};
pub use registry::{OutboundReceiver, OutboundSender, outbound_queue};
pub use server::Hub;
