pub mod backup;
pub mod drift;
pub mod effects;
pub mod git;
pub mod install;
pub mod integrate;
pub mod notes;
pub mod remote;

pub use backup::*;
pub use drift::*;
pub use effects::*;
pub use git::*;
pub use install::*;
pub use integrate::*;
pub use notes::*;
pub use remote::*;
