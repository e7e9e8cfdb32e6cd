//! Core authentication logic: configuration, clock, tokens and user lookup

pub mod auth;
pub mod clock;
pub mod config;
pub mod users;
