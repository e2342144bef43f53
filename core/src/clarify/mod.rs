pub mod question;
pub mod session;

pub use question::{Answer, AnswerAction, Question};
pub use session::ClarificationSession;
