pub mod queue;
pub(crate) mod session;
pub mod state;

pub use queue::TrackQueue;
pub use state::{PlaybackState, PlayerStatus};
