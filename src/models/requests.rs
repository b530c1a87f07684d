use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to compare two remote images
///
/// Both fields are optional at the serde level so a missing field is reported
/// with the service's own 400 message instead of a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CompareFacesRequest {
    #[validate(required, length(min = 1))]
    #[serde(rename = "image1Url", default)]
    pub image1_url: Option<String>,
    #[validate(required, length(min = 1))]
    #[serde(rename = "image2Url", default)]
    pub image2_url: Option<String>,
}

impl CompareFacesRequest {
    /// Both URLs, once `validate()` has passed
    pub fn urls(&self) -> Option<(&str, &str)> {
        match (self.image1_url.as_deref(), self.image2_url.as_deref()) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some((a, b)),
            _ => None,
        }
    }
}
