//! Infrastructure layer: the hub, wire DTOs and collaborator implementations.

pub mod auth;
pub mod dto;
pub mod hub;
pub mod repository;
