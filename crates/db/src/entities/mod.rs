//! Database entities.

#![allow(missing_docs)]

pub mod choice;
pub mod event_config;
pub mod participant;
pub mod poll;
pub mod poll_answer;
pub mod poll_answer_choice;
pub mod poll_config;
pub mod question;
pub mod question_answer;
pub mod question_config;
pub mod vote;

pub use choice::Entity as Choice;
pub use event_config::Entity as EventConfig;
pub use participant::Entity as Participant;
pub use poll::Entity as Poll;
pub use poll_answer::Entity as PollAnswer;
pub use poll_answer_choice::Entity as PollAnswerChoice;
pub use poll_config::Entity as PollConfig;
pub use question::Entity as Question;
pub use question_answer::Entity as QuestionAnswer;
pub use question_config::Entity as QuestionConfig;
pub use vote::Entity as Vote;
