//! Inbound adapters that translate external triggers into domain calls.
//!
//! HTTP handlers live under [`http`]; the cron [`beat`] turns clock ticks
//! into queued tasks.

pub mod beat;
pub mod http;
