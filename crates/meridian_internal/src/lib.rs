//! # Meridian Internal Library
//!
//! Re-exports the core Meridian crates for convenience.

/// Layer 1: resource identity, plugin declaration and statuses.
pub use meridian_resource;

/// Layer 2: effect nodes and coroutine programs.
pub use meridian_io;

/// Layer 3: module lifecycle and localization.
pub use meridian_platform;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use meridian_io::prelude::*;
    pub use meridian_platform::prelude::*;
    pub use meridian_resource::prelude::*;
}
