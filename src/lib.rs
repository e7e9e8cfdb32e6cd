//! Blog Auth - bearer token authentication
//!
//! Issues, verifies and refreshes signed, time-bound access and refresh
//! tokens, and exposes login/refresh endpoints built on them.

pub mod core;
