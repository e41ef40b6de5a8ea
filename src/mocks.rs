use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use image::DynamicImage;

use crate::errors::{Result, UpscaleError};
use crate::traits::{FrameTransformer, TransformOutcome};

/// One scripted reply for [`MockTransformer`].
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Echo the input frame back as the produced image.
    Produced,
    Empty,
    Fail {
        message: String,
        status: Option<u16>,
    },
}

impl ScriptedOutcome {
    pub fn rate_limited() -> Self {
        Self::Fail {
            message: "resource exhausted".to_string(),
            status: Some(429),
        }
    }

    pub fn server_error() -> Self {
        Self::Fail {
            message: "internal error".to_string(),
            status: Some(500),
        }
    }
}

/// Scripted stand-in for the remote service, used by orchestrator tests.
///
/// Replies are consumed front-to-back; once the script is exhausted every
/// further call echoes the input. The call counter lets tests assert that
/// skipped frames never reach the service.
pub struct MockTransformer {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    calls: AtomicUsize,
}

impl MockTransformer {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(outcomes: Vec<ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTransformer for MockTransformer {
    fn transform(&self, image: &DynamicImage) -> Result<TransformOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Mock-only lock; poisoning would mean a test already panicked.
        let next = self.script.lock().unwrap().pop_front();
        match next {
            None | Some(ScriptedOutcome::Produced) => {
                Ok(TransformOutcome::Produced(image.clone()))
            }
            Some(ScriptedOutcome::Empty) => Ok(TransformOutcome::Empty),
            Some(ScriptedOutcome::Fail { message, status }) => {
                Err(UpscaleError::Api { message, status })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_consumed_in_order() {
        let mock = MockTransformer::scripted(vec![
            ScriptedOutcome::Empty,
            ScriptedOutcome::rate_limited(),
        ]);
        let img = DynamicImage::new_rgb8(4, 4);

        assert!(matches!(
            mock.transform(&img),
            Ok(TransformOutcome::Empty)
        ));
        assert!(mock.transform(&img).is_err_and(|e| e.is_rate_limited()));

        // Exhausted script falls back to echoing.
        assert!(matches!(
            mock.transform(&img),
            Ok(TransformOutcome::Produced(_))
        ));
        assert_eq!(mock.call_count(), 3);
    }
}
