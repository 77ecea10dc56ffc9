//! Question generation: distribution planning, session lifecycle and the paced
//! driver loop that fills every planned slot.

pub mod control;
pub mod driver;
pub mod plan;
pub mod retry;
pub mod run;
pub mod session;
pub mod validate;

pub use control::{ControlSignal, SessionController, SessionHandle};
pub use driver::{DriverConfig, GenerationDriver, QuestionGenerator};
pub use plan::{plan, Allocation, AllocationPlan, PlanStrategy};
pub use retry::{Backoff, RetryDecision, RetryPolicy, RetryState};
pub use run::{
    load_topics_file, run_generate, run_plan, run_topics, GenerateOutcome, GenerateRequest, TopicInput,
    TopicSource,
};
pub use session::{
    percentage, GenerationSession, ProgressSnapshot, SessionState, SessionSummary, SlotFailure,
};
pub use validate::{answer_matches_type, validate_question};
