//! Talent Realtime - Server-push cache synchronisation for the job domain
//!
//! This crate keeps a client-side query cache consistent with server-side
//! job changes. It authenticates to the backend's Socket.IO `/jobs`
//! channel with the stored bearer token and, for each job event, marks the
//! affected cached queries stale.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
