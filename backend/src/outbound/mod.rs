//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories for database-less runs
//! - **mail**: SMTP delivery through lettre, or log-only
//! - **queue**: in-process task queue and retrying worker
//! - **security**: argon2 password hashing
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod mail;
pub mod memory;
pub mod persistence;
pub mod queue;
pub mod security;
