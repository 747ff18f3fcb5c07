//! Activity logging: JSONL writer plus a background logger thread.

pub mod activity;
pub mod jsonl;
