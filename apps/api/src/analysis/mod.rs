//! Resume analysis, job matching, tailoring and career advice.
//!
//! `tasks` holds the four model-backed operations. `handlers` exposes them over HTTP.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod schemas;
pub mod tasks;
