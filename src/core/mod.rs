// Comparison pipeline exports
pub mod acquire;
pub mod format;
pub mod normalize;
pub mod pipeline;

pub use acquire::{AcquireError, ImageAcquirer, ScopedImage};
pub use format::{format_result, percentage_match};
pub use normalize::{ImageNormalizer, NormalizeError, NormalizedImage};
pub use pipeline::{Comparator, CompareError};
