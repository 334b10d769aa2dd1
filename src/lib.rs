//! Lead Capture & CRM Sync API Library
//!
//! Captures email leads exactly once per address and forwards each one to an
//! external CRM with bounded retries, persisting the sync outcome on the
//! lead record.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and schema bootstrap.
//! - `errors`: Error handling types.
//! - `models`: Core data models.
//! - `lead_store`: Durable lead storage.
//! - `crm_client`: External CRM push client with retry/backoff.
//! - `ingestion`: Submission orchestration and validation.
//! - `handlers`: HTTP request handlers.

pub mod config;
pub mod crm_client;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod ingestion;
pub mod lead_store;
pub mod models;
