pub mod admin;
pub mod auth;
pub mod billing;
pub mod health;
pub mod leads;
pub mod metrics;
pub mod unlock;
