pub mod config;
pub mod events;
pub mod normalize;
pub mod reducer;
pub mod state;

pub use config::*;
pub use events::*;
pub use reducer::*;
pub use state::*;
