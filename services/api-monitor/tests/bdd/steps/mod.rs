//! BDD step definitions for the API monitor service

pub mod history_steps;
pub mod lifecycle_steps;
pub mod registry_steps;
