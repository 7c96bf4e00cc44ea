pub mod client;
pub mod error;
pub mod id;
pub mod model;
pub mod resources;
pub mod session;

pub use client::ApiClient;
pub use error::ApiError;
pub use session::{Session, SessionState, SessionWatch};
