use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct ComposeRequest {
    pub(crate) lines: Vec<String>,
    pub(crate) role: Option<String>,
    pub(crate) position: Option<String>,
    pub(crate) style: Option<String>,
    pub(crate) crop: Option<String>,
    /// Background image, base64-encoded.
    pub(crate) background: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ComposeResponse {
    pub(crate) image_base64: String,
    pub(crate) mime: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SettingsInfo {
    pub(crate) positions: Vec<String>,
    pub(crate) styles: Vec<String>,
    pub(crate) crops: Vec<String>,
    pub(crate) roles: Vec<String>,
    pub(crate) profiles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
