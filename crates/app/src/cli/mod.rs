pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Device, Identity, Init, Invite, Password, Room, Version};
