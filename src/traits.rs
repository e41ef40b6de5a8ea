use crate::errors::Result;
use image::DynamicImage;

/// Outcome of a single transformation call.
///
/// A transport-level success does not guarantee an image: the service may
/// answer with text-only or empty content, which the orchestrator treats as
/// a failed frame without writing an output file.
#[derive(Debug, Clone)]
pub enum TransformOutcome {
    /// The first inline image payload of the response, decoded.
    Produced(DynamicImage),
    /// The call succeeded but carried no image payload.
    Empty,
}

/// Abstraction over the remote frame transformation service.
///
/// The orchestrator depends on this seam instead of the concrete HTTP
/// client, so batch semantics are testable with scripted mocks.
pub trait FrameTransformer {
    /// Perform exactly one remote transformation call for one decoded frame.
    ///
    /// No retries happen at this level; failure classification (notably
    /// throttling via [`crate::UpscaleError::is_rate_limited`]) is carried
    /// in the error.
    fn transform(&self, image: &DynamicImage) -> Result<TransformOutcome>;
}
