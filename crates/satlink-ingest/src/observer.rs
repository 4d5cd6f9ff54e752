use satlink_frame::Frame;
use satlink_health::Alert;

pub type ObserverResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Best-effort hook called after each decoded frame has been stored and evaluated.
///
/// Errors and panics are logged by the service and never reach the receive loop.
pub trait FrameObserver: Send + Sync {
    fn observe(&self, frame: &Frame, alerts: &[Alert]) -> ObserverResult;
}

impl<F> FrameObserver for F
where
    F: Fn(&Frame, &[Alert]) -> ObserverResult + Send + Sync,
{
    fn observe(&self, frame: &Frame, alerts: &[Alert]) -> ObserverResult {
        self(frame, alerts)
    }
}
