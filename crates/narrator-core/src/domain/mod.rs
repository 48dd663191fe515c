//! Domain types shared by every narrator crate.

mod profile;
mod session;

pub use profile::VoiceProfile;
pub use session::{
    BackendKind, PlaybackOutcome, PlaybackSession, PlaybackStatus, SessionEvent, SessionState,
    SessionToken,
};
