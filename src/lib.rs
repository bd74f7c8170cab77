//! face-attendance library crate.
//!
//! Auto-capture attendance client: a camera session, a face presence
//! sampler, the capture controller that ties them together, and the REST
//! client for the recognition backend.

pub mod api;
pub mod camera;
pub mod capture;
pub mod config;
pub mod detect;
pub mod replay;
pub mod timestamp;
pub mod views;
