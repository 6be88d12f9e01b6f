//! Payment notification adapters.

mod resend;
mod tracing_notifier;

pub use resend::ResendNotifier;
pub use tracing_notifier::TracingNotifier;
