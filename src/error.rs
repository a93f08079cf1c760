use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Could not read uploaded file: {0}")]
    MalformedInput(String),

    #[error("Webhook request failed: {0}")]
    Transport(String),

    #[error("Webhook answered with status {status}: {body}")]
    WebhookStatus { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LeadError>;
