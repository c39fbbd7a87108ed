pub mod relay;

use service_core::error::AppError;

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
