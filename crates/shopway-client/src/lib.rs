pub mod client;
pub mod error;
pub mod types;

pub use client::{RouteClient, RouteSource};
pub use error::RouteError;
pub use types::RouteRequest;
