pub mod cloud_resources;
pub mod secure;
pub mod state;
pub mod status;

pub use state::AppState;
