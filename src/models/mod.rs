// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{VerificationResult, UploadedImage, PercentagePolicy};
pub use requests::CompareFacesRequest;
pub use responses::{ComparisonResponse, IndexResponse, EndpointList, HealthResponse, ErrorResponse};
