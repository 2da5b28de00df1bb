pub mod trial_ctx;
pub mod trial_flow;

pub use trial_ctx::TrialCtx;
pub use trial_flow::{TrialFlow, TrialOutcome};
