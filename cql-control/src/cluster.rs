pub use crate::cluster::config::{ControlConnectionConfig, ControlConnectionConfigBuilder};
pub use crate::cluster::connection::{Connection, ConnectionProperties, EventHandler};
pub use crate::cluster::connection_manager::{ConnectionManager, Connector};
pub use crate::cluster::control_connection::ControlConnection;
pub use crate::cluster::event_handler::TopologyEventHandler;
pub use crate::cluster::host_info::HostInfo;
pub use crate::cluster::pipeline::PipelineStep;
pub use crate::cluster::request_runner::{DefaultRequestRunner, RequestRunner};

mod config;
mod connection;
mod connection_manager;
mod control_connection;
mod event_handler;
mod host_info;
mod pipeline;
mod request_runner;
pub mod topology;
mod topology_refresher;
