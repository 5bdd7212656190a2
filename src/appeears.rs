//! Client for the NASA AppEEARS extraction API
mod provider;
pub use provider::Provider;

pub mod poll;
pub mod task;
