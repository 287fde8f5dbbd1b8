pub mod json;
pub mod response;

pub use json::ValidJson;
pub use response::{ApiResponse, ApiResult};
