//! Conversational project intake.
//!
//! [`catalog`] holds the questions, [`flow`] walks them, [`snapshot`]
//! persists progress, [`present`] is the rendering seam and [`gateway`]
//! delivers the final answers.

pub mod answers;
pub mod catalog;
pub mod condition;
pub mod flow;
pub mod gateway;
pub mod present;
pub mod snapshot;
pub mod summary;

pub use answers::{AnswerStore, AnswerValue};
pub use catalog::{Catalog, Choice, Question, QuestionType};
pub use condition::Condition;
pub use flow::{FlowSettings, FlowState, IntakeFlow, ReviewChoice};
pub use gateway::{HttpGateway, Submission, SubmissionGateway, SubmissionReceipt};
pub use present::{Message, Output, Presenter, Progress, RenderedQuestion, Role, Transcript};
pub use snapshot::{FileProgressStore, MemoryProgressStore, ProgressSnapshot, ProgressStore};
