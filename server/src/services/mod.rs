//! Room and persistence services behind the websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Presence and broadcast hold live room state in memory. Documents and
//! identity are collaborator traits with a Postgres and an in-process
//! implementation each, chosen at startup in `main`.

pub mod broadcast;
pub mod document;
pub mod identity;
pub mod presence;
