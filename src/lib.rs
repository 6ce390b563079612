//! Library exports for the SpAI client, shared between the `spai` binary and
//! tests.

pub mod auth;
pub mod client;
pub mod config;
pub mod events;
pub mod features;
pub mod models;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
