use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Envelope every backend response is wrapped in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Unwraps `data`, turning `success: false` or a missing payload into an error.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(match self.error {
                Some(err) => anyhow!("{}: {}", err.code, err.message),
                None => anyhow!("request reported failure without an error body"),
            });
        }

        self.data
            .ok_or_else(|| anyhow!("response is missing its data payload"))
    }
}
