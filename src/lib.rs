pub mod adblock;
pub mod config;
pub mod dearrow;
pub mod error;
pub mod guard;
pub mod hook;
pub mod injections;
pub mod json;
pub mod location;
pub mod model;
pub mod passes;
pub mod progress;
pub mod renderers;
pub mod shelves;
pub mod shorts;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::{ConfigReader, Settings, SharedSettings};
    pub use crate::dearrow::{BrandingSource, DeArrow, DeArrowClient};
    pub use crate::error::{Error, Result};
    pub use crate::hook::{Decode, Decoded, JsonDecoder, Reshelf};
    pub use crate::injections::{HostState, NoHostState, QueueSnapshot, SponsorSegment};
    pub use crate::location::{Location, LocationSource, PageContext, SharedLocation};
}

pub use error::{Error, Result};
pub use hook::{Decode, Decoded, JsonDecoder, Reshelf, ReshelfBuilder};
