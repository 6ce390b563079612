pub mod api_client;
pub mod error;
pub mod request;

pub use api_client::ApiClient;
pub use error::ApiError;
pub use request::{ApiRequest, UserScope};
