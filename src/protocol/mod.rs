pub mod events;
pub mod intents;
pub mod tracks;

pub use events::*;
pub use intents::*;
pub use tracks::*;
