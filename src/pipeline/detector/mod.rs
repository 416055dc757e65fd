//! PII detection
//!
//! Two strategies feed the span resolver: the structured detector (pattern
//! library) and the entity adapter (external recognizer). Their priority
//! order is [`DetectionMethod::priority`](crate::pipeline::models::DetectionMethod::priority).

pub mod entity;
pub mod structured;

pub use entity::{
    EntityAdapter, EntityAdapterOptions, EntityRecognizer, RecognizedEntity, RecognizerError,
};
pub use structured::StructuredDetector;
