use bytemuck::NoUninit;
use derive_more::Display;

/// Availability of a host, as viewed from the control connection.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, NoUninit)]
#[repr(u8)]
pub enum HostStatus {
    /// No status change has been observed for the host yet. Hosts leave this state as soon as
    /// they are added to the directory.
    Unknown,
    /// The host was discovered through topology queries or reported up by the server.
    Up,
    /// The host was reported down by the server, or removed from the cluster.
    Down,
}
