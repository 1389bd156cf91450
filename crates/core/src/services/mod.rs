//! Business logic services.

#![allow(missing_docs)]

pub mod config_resolver;
pub mod identity;
pub mod interaction;
mod retry;
pub mod vote_ledger;

pub use config_resolver::{
    ConfigInput, ConfigResolver, InteractionConfig, InteractionKind, PollConfigInput,
    QuestionConfigInput,
};
pub use identity::IdentityProvisioner;
pub use interaction::{
    Answer, AnswerPayload, ChoiceEdit, CreatePollInput, CreateQuestionInput, InteractionFields,
    InteractionStore, Poll, PollAnswer, Question, UpdatePollInput, UpdateQuestionInput,
};
pub use vote_ledger::{VoteLedger, VoteOutcome};

/// Target kinds a vote can point at.
pub use interactions_db::entities::vote::TargetKind;
