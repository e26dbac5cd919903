//! The LibreAssistant orchestration loop.
//!
//! One request flows through a bounded state machine:
//!
//! 1. **Receive** a user message
//! 2. **Render context** (system instructions + conversation so far)
//! 3. **Send to the model** via the configured `ModelClient`
//! 4. **Parse** the returned text into exactly one `Action`
//! 5. **If plugin invocation**: execute it under a timeout, fold the
//!    result back into context, loop back to step 3
//! 6. **If final message**: format the outcome and stop
//!
//! The loop always terminates: plugin rounds are bounded by
//! `max_iterations` and unparseable model output by the parse-retry
//! ceiling. Whatever happens inside, the caller receives exactly one
//! coherent `RequestOutcome`.

pub mod context;
pub mod controller;
pub mod executor;
pub mod formatter;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::ContextAssembler;
pub use controller::IterationController;
pub use executor::PluginExecutor;
pub use formatter::ApiResponse;
pub use usage::{PluginInvocation, UsageLog};
