//! Request handlers for the LitKeep gateway

pub mod articles;
pub mod health;
pub mod migrations;
pub mod temp;
