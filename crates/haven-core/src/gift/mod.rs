//! Gift exchange: participants, event scoping, the matching generator and
//! the reveal sequence.

pub mod event;
pub mod matching;
pub mod participant;
pub mod reveal;
pub mod shuffle;

pub use event::EventId;
pub use matching::{Match, MatchView, NewMatch};
pub use participant::{NewParticipant, Participant};
