mod host;
pub(crate) mod host_directory;
mod host_listener;
mod host_status;

pub use self::host::Host;
pub use self::host_directory::{HostDirectory, HostMap};
pub use self::host_listener::HostListener;
#[cfg(test)]
pub(crate) use self::host_listener::MockHostListener;
pub use self::host_status::HostStatus;
