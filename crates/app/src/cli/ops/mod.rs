pub mod device;
pub mod identity;
pub mod init;
pub mod invite;
pub mod password;
pub mod room;
pub mod version;

pub use device::Device;
pub use identity::Identity;
pub use init::Init;
pub use invite::Invite;
pub use password::Password;
pub use room::Room;
pub use version::Version;
