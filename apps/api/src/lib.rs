//! Interview scheduling orchestration service.
//!
//! Wires LiveKit (realtime sessions and agent dispatch), Deepgram,
//! ElevenLabs and Google Gemini (the voice pipeline providers), PostgreSQL,
//! S3-compatible object storage, and SMTP into a candidate workflow:
//! resume upload, interview booking, and realtime session token issuance.
//!
//! Three binaries share this library: `api` (HTTP server), `agent` (worker
//! registration with agent dispatch) and `check-keys` (credential probes).

pub mod booking;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod email;
pub mod errors;
pub mod models;
pub mod resume;
pub mod routes;
pub mod session;
pub mod state;
pub mod worker;
