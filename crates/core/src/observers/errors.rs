use crate::{
    events::{EventPayload, JavascriptError, PromiseRejection},
    telemetry::Telemetry,
};

/// Global error and unhandled-rejection listener. Every occurrence is
/// forwarded; there is no rate limiting.
#[derive(Clone)]
pub struct ErrorReporter {
    telemetry: Telemetry,
}

impl ErrorReporter {
    pub fn new(telemetry: Telemetry) -> Self {
        Self { telemetry }
    }

    pub fn on_error(&self, error: JavascriptError) {
        self.telemetry.track(EventPayload::JavascriptError(error));
    }

    pub fn on_unhandled_rejection(&self, reason: Option<String>, stack: Option<String>) {
        self.telemetry
            .track(EventPayload::PromiseRejection(PromiseRejection {
                reason,
                stack,
                extra: Default::default(),
            }));
    }
}
