//! Database repositories.

mod answer;
mod config;
mod event_config;
mod participant;
mod poll;
mod question;
mod vote;

pub use answer::AnswerRepository;
pub use config::ConfigRepository;
pub use event_config::EventConfigRepository;
pub use participant::ParticipantRepository;
pub use poll::{ChoiceRepository, PollRepository};
pub use question::QuestionRepository;
pub use vote::VoteRepository;
