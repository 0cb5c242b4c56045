pub mod auth;
pub mod response;

pub use auth::BearerCredential;
pub use response::{ApiResponse, ApiResult};
