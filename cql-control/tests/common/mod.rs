#![allow(dead_code)]

use cql_control::authenticators::Credentials;
use cql_control::cluster::topology::{Host, HostListener};
use cql_control::cluster::{
    ConnectionManager, ControlConnection, ControlConnectionConfig, DefaultRequestRunner,
};
use cql_control::error::{Error, Result};
use cql_control::events::ServerEvent;
use cql_control::frame::message_error::{ErrorBody, ErrorType};
use cql_control::frame::message_request::{COMPRESSION, CQL_VERSION, CQL_VERSION_VAL};
use cql_control::frame::{RequestBody, ResponseBody, ResultBody, Version};
use cql_control::future::BoxFuture;
use cql_control::transport::ControlTransport;
use cql_control::types::{Row, Value};
use futures::future::ready;
use futures::FutureExt;
use fxhash::FxHashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

pub const PORT: u16 = 9042;

const PASSWORD_AUTHENTICATOR: &str = "org.apache.cassandra.auth.PasswordAuthenticator";

pub type TestControlConnection =
    ControlConnection<FakeTransport, FakeConnectionManager, DefaultRequestRunner>;

pub fn address(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, last))
}

pub fn socket_address(last: u8) -> SocketAddr {
    SocketAddr::new(address(last), PORT)
}

#[derive(Clone, Debug)]
pub struct FakeNode {
    pub address: IpAddr,
    pub rpc_address: Option<IpAddr>,
    pub rack: String,
    pub datacenter: String,
    pub host_id: Uuid,
    pub release_version: String,
    pub reachable: bool,
    pub max_version: Version,
}

impl FakeNode {
    pub fn new(address: IpAddr) -> Self {
        FakeNode {
            address,
            rpc_address: Some(address),
            rack: "rack1".into(),
            datacenter: "dc1".into(),
            host_id: Uuid::new_v4(),
            release_version: "4.0.1".into(),
            reachable: true,
            max_version: Version::MAX,
        }
    }

    fn local_row(&self) -> Row {
        vec![
            ("rack", Value::from(self.rack.as_str())),
            ("data_center", Value::from(self.datacenter.as_str())),
            ("host_id", Value::from(self.host_id)),
            ("release_version", Value::from(self.release_version.as_str())),
        ]
        .into_iter()
        .collect()
    }

    fn peer_row(&self) -> Row {
        let mut row = self.local_row();
        row.set("peer", self.address);
        row.set("rpc_address", self.rpc_address);
        row
    }
}

#[derive(Default)]
struct ClusterState {
    nodes: Vec<FakeNode>,
    credentials: Option<Credentials>,
    failing_peer_queries: usize,
    attempts: Vec<(IpAddr, Version)>,
    requests: Vec<(IpAddr, RequestBody)>,
    event_senders: Vec<Sender<ServerEvent>>,
}

impl ClusterState {
    fn local_rows(&self, local: IpAddr) -> Vec<Row> {
        self.nodes
            .iter()
            .filter(|node| node.address == local)
            .map(FakeNode::local_row)
            .collect()
    }

    fn peer_rows<F: Fn(&FakeNode) -> bool>(&self, local: IpAddr, filter: F) -> Vec<Row> {
        self.nodes
            .iter()
            .filter(|node| node.address != local && filter(*node))
            .map(FakeNode::peer_row)
            .collect()
    }
}

/// In-memory cluster answering control plane requests from system tables it keeps in nodes.
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<ClusterState>,
}

impl FakeCluster {
    pub fn new(nodes: Vec<FakeNode>) -> Arc<Self> {
        let cluster = FakeCluster::default();
        cluster.state.lock().unwrap().nodes = nodes;
        Arc::new(cluster)
    }

    pub fn with_nodes(count: u8) -> Arc<Self> {
        FakeCluster::new((1..=count).map(address).map(FakeNode::new).collect())
    }

    pub fn require_credentials(&self, credentials: Credentials) {
        self.state.lock().unwrap().credentials = Some(credentials);
    }

    /// Makes the next single peer query fail with a server error.
    pub fn fail_next_peer_query(&self) {
        self.state.lock().unwrap().failing_peer_queries += 1;
    }

    pub fn update_node<F: FnOnce(&mut FakeNode)>(&self, address: IpAddr, update: F) {
        let mut state = self.state.lock().unwrap();
        let node = state
            .nodes
            .iter_mut()
            .find(|node| node.address == address)
            .unwrap();
        update(node);
    }

    pub fn add_node(&self, node: FakeNode) {
        self.state.lock().unwrap().nodes.push(node);
    }

    pub fn remove_node(&self, address: IpAddr) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .retain(|node| node.address != address);
    }

    /// Connection attempts, in order.
    pub fn attempts(&self) -> Vec<(IpAddr, Version)> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub fn requests(&self) -> Vec<(IpAddr, RequestBody)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Pushes an event over every connection opened so far.
    pub async fn push_event(&self, event: ServerEvent) {
        let senders = self.state.lock().unwrap().event_senders.clone();
        for sender in senders {
            let _ = sender.send(event.clone()).await;
        }
    }

    fn node(&self, address: IpAddr) -> Option<FakeNode> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .iter()
            .find(|node| node.address == address)
            .cloned()
    }

    fn respond(&self, local: IpAddr, version: Version, request: &RequestBody) -> ResponseBody {
        let mut state = self.state.lock().unwrap();
        state.requests.push((local, request.clone()));

        match request {
            RequestBody::Options => {
                let mut supported = FxHashMap::default();
                supported.insert(CQL_VERSION.to_string(), vec![CQL_VERSION_VAL.to_string()]);
                supported.insert(COMPRESSION.to_string(), vec!["lz4".to_string()]);
                ResponseBody::Supported(supported)
            }
            RequestBody::Startup(_) => {
                let node = state.nodes.iter().find(|node| node.address == local);
                match node {
                    Some(node) if version > node.max_version => {
                        let message = format!("Unsupported protocol version {}", version);
                        error_response(ErrorType::Protocol, message)
                    }
                    Some(_) if state.credentials.is_some() => {
                        ResponseBody::Authenticate(PASSWORD_AUTHENTICATOR.into())
                    }
                    _ => ResponseBody::Ready,
                }
            }
            RequestBody::Credentials(credentials) => match &state.credentials {
                Some(expected) if expected.as_map() == credentials => ResponseBody::Ready,
                _ => error_response(ErrorType::Authentication, "Bad credentials"),
            },
            RequestBody::AuthResponse(_) => ResponseBody::AuthSuccess(None),
            RequestBody::Register(_) => ResponseBody::Ready,
            RequestBody::Query(query) if query.query.contains("system.local") => {
                ResponseBody::Result(ResultBody::Rows(state.local_rows(local)))
            }
            RequestBody::Query(query) if query.query.contains("WHERE peer = ?") => {
                if state.failing_peer_queries > 0 {
                    state.failing_peer_queries -= 1;
                    return error_response(ErrorType::Server, "Peer query failed");
                }

                let peer = match query.values.first() {
                    Some(Value::Inet(peer)) => *peer,
                    _ => return error_response(ErrorType::Invalid, "Missing peer address"),
                };

                let rows = state.peer_rows(local, |node| node.address == peer);
                ResponseBody::Result(ResultBody::Rows(rows))
            }
            RequestBody::Query(_) => {
                let rows = state.peer_rows(local, |_| true);
                ResponseBody::Result(ResultBody::Rows(rows))
            }
        }
    }
}

fn error_response<S: Into<String>>(ty: ErrorType, message: S) -> ResponseBody {
    ResponseBody::Error(ErrorBody::new(ty, message))
}

pub struct FakeTransport {
    cluster: Arc<FakeCluster>,
    addr: SocketAddr,
    version: Version,
}

impl ControlTransport for FakeTransport {
    fn write_request<'a>(
        &'a self,
        request: &'a RequestBody,
    ) -> BoxFuture<'a, Result<ResponseBody>> {
        let response = self.cluster.respond(self.addr.ip(), self.version, request);
        ready(Ok(response)).boxed()
    }

    fn is_broken(&self) -> bool {
        false
    }

    fn address(&self) -> SocketAddr {
        self.addr
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        ready(Ok(())).boxed()
    }
}

pub struct FakeConnectionManager {
    cluster: Arc<FakeCluster>,
}

impl FakeConnectionManager {
    pub fn new(cluster: Arc<FakeCluster>) -> Self {
        FakeConnectionManager { cluster }
    }
}

impl ConnectionManager<FakeTransport> for FakeConnectionManager {
    fn connection(
        &self,
        event_handler: Option<Sender<ServerEvent>>,
        addr: SocketAddr,
        version: Version,
    ) -> BoxFuture<Result<FakeTransport>> {
        let cluster = self.cluster.clone();
        async move {
            cluster
                .state
                .lock()
                .unwrap()
                .attempts
                .push((addr.ip(), version));

            match cluster.node(addr.ip()) {
                Some(node) if node.reachable => {}
                _ => {
                    let message = format!("{} refused connection", addr);
                    let error = io::Error::new(io::ErrorKind::ConnectionRefused, message);
                    return Err(Error::Io(error));
                }
            }

            if let Some(sender) = event_handler {
                cluster.state.lock().unwrap().event_senders.push(sender);
            }

            Ok(FakeTransport {
                cluster,
                addr,
                version,
            })
        }
        .boxed()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Found,
    Up,
    Down,
    Lost,
}

/// Listener remembering every notification it received.
#[derive(Default)]
pub struct RecordingListener {
    notifications: Mutex<Vec<(Notification, IpAddr)>>,
}

impl RecordingListener {
    pub fn notifications(&self) -> Vec<(Notification, IpAddr)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn notifications_for(&self, address: IpAddr) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|(_, host)| *host == address)
            .map(|(notification, _)| notification)
            .collect()
    }

    pub fn clear(&self) {
        self.notifications.lock().unwrap().clear();
    }

    fn record(&self, notification: Notification, host: &Arc<Host>) {
        self.notifications
            .lock()
            .unwrap()
            .push((notification, host.address()));
    }
}

impl HostListener for RecordingListener {
    fn host_found(&self, host: &Arc<Host>) {
        self.record(Notification::Found, host);
    }

    fn host_up(&self, host: &Arc<Host>) {
        self.record(Notification::Up, host);
    }

    fn host_down(&self, host: &Arc<Host>) {
        self.record(Notification::Down, host);
    }

    fn host_lost(&self, host: &Arc<Host>) {
        self.record(Notification::Lost, host);
    }
}

pub fn control_connection(
    cluster: &Arc<FakeCluster>,
    config: ControlConnectionConfig,
) -> (TestControlConnection, Arc<RecordingListener>) {
    let listener = Arc::new(RecordingListener::default());
    let control_connection = ControlConnection::new(
        config,
        Arc::new(FakeConnectionManager::new(cluster.clone())),
        Arc::new(DefaultRequestRunner),
        Default::default(),
    );
    control_connection
        .directory()
        .add_listener(listener.clone());

    (control_connection, listener)
}

/// Polls until the condition holds, failing the test after a few seconds.
pub async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..500 {
        if condition() {
            return;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("Condition not met in time");
}
