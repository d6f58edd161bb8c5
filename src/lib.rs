//! Lead-management CRM server: leads, hotlist, deal pipeline, sales reps,
//! team members, contacts and analytics over a JSON HTTP API.

pub mod core;
pub mod crm;
pub mod main_module;

pub use crate::core::config::AppConfig;
pub use crate::core::shared::state::AppState;
pub use crate::main_module::{build_router, build_store, run_axum_server};
