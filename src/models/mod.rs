pub mod chat;
pub mod folder;
pub mod group;
pub mod roster;
pub mod section;

pub use chat::*;
pub use folder::*;
pub use group::*;
pub use roster::*;
pub use section::*;
