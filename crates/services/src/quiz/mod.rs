mod controller;
mod deferred;
mod session;
mod view;
mod workflow;

// Public API of the quiz subsystem.
pub use controller::{ActiveSession, QuizController};
pub use deferred::DeferredCall;
pub use session::{Advance, QuizSession, QuizState, SessionId};
pub use view::{FeedbackText, QuizConfig, QuizView};
pub use workflow::{ContinueOutcome, QuizLoopService, SubmitOutcome};
