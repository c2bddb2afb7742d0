pub mod protocol;
pub mod sender;
pub mod snapshot;
