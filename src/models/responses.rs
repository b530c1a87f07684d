use serde::{Deserialize, Serialize};

/// Public result of a face comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub matched: bool,
    pub distance: f64,
    pub similarity: f64,
    #[serde(rename = "percentageMatch")]
    pub percentage_match: String,
}

/// Service metadata returned by `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub name: String,
    pub status: String,
    pub endpoints: EndpointList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointList {
    #[serde(rename = "compareFaces")]
    pub compare_faces: String,
    #[serde(rename = "compareMixed")]
    pub compare_mixed: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Seconds since the process started
    pub uptime: f64,
    pub message: String,
    pub date: String,
}

/// Error envelope: a single message, the HTTP status carries the rest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
