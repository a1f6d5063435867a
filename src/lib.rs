//! Core of a picture-album application: folder scanning, catalog
//! reconciliation and thumbnail cache maintenance.
//!
//! The pipeline runs scan -> reconcile -> build -> clean, with each stage
//! fanning out to a bounded pool of worker threads and reporting back to a
//! single coordinator. The presentation layer (a console front in this
//! crate, see `main.rs`) only receives typed [`state::data::Notification`]
//! events over a channel.

pub mod cache;
pub mod convert;
pub mod error;
pub mod import;
pub mod scan;
pub mod state;

pub use error::Error;
