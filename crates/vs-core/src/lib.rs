pub mod error;
pub mod job;
mod model_types;

pub use error::GenError;
pub use job::{GenerationJob, GenerationRequest, JobKey, JobStatus};
pub use model_types::{AspectRatio, Resolution, VideoDuration};
