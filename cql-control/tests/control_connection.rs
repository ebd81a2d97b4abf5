mod common;

use common::*;
use cql_control::authenticators::{Credentials, StaticPasswordAuthenticatorProvider};
use cql_control::cluster::topology::HostStatus;
use cql_control::cluster::{ControlConnectionConfig, ControlConnectionConfigBuilder};
use cql_control::error::Error;
use cql_control::events::{ServerEvent, SimpleServerEvent};
use cql_control::frame::events::{
    SchemaChange, SchemaChangeOptions, SchemaChangeTarget, SchemaChangeType, StatusChange,
    StatusChangeType, TopologyChange, TopologyChangeType,
};
use cql_control::frame::message_request::BodyReqRegister;
use cql_control::frame::{RequestBody, Version};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

fn status_event(change_type: StatusChangeType, last: u8) -> ServerEvent {
    ServerEvent::StatusChange(StatusChange {
        change_type,
        addr: socket_address(last),
    })
}

fn topology_event(change_type: TopologyChangeType, last: u8) -> ServerEvent {
    ServerEvent::TopologyChange(TopologyChange {
        change_type,
        addr: socket_address(last),
    })
}

#[tokio::test]
async fn bootstrap_discovers_cluster() {
    let cluster = FakeCluster::with_nodes(3);
    cluster.update_node(address(3), |node| {
        node.rpc_address = Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    });

    let (control_connection, listener) =
        control_connection(&cluster, ControlConnectionConfig::default());

    let connection = control_connection
        .bootstrap(vec![address(1)])
        .await
        .unwrap();
    assert_eq!(connection.host(), address(1));
    assert_eq!(connection.properties().datacenter.as_deref(), Some("dc1"));

    let directory = control_connection.directory();
    assert_eq!(directory.len(), 3);
    for last in 1..=3 {
        let host = directory.host(address(last)).unwrap();
        assert_eq!(host.status(), HostStatus::Up);
        assert_eq!(host.info().rack.as_deref(), Some("rack1"));
        assert_eq!(
            listener.notifications_for(address(last)),
            vec![Notification::Found, Notification::Up]
        );
    }

    let register = cluster
        .requests()
        .into_iter()
        .find_map(|(_, request)| match request {
            RequestBody::Register(register) => Some(register),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        register,
        BodyReqRegister::new(vec![
            SimpleServerEvent::TopologyChange,
            SimpleServerEvent::StatusChange,
            SimpleServerEvent::SchemaChange,
        ])
    );
}

#[tokio::test]
async fn connect_stops_at_first_available_host() {
    let cluster = FakeCluster::with_nodes(3);
    cluster.update_node(address(1), |node| node.reachable = false);

    let (control_connection, _) = control_connection(&cluster, ControlConnectionConfig::default());

    let connection = control_connection
        .connect(vec![address(1), address(2), address(3)])
        .await
        .unwrap();

    assert_eq!(connection.host(), address(2));
    assert_eq!(
        cluster.attempts(),
        vec![(address(1), Version::V4), (address(2), Version::V4)]
    );
    assert_eq!(
        connection.host(),
        control_connection.connection().unwrap().host()
    );
}

#[tokio::test]
async fn connect_reports_every_failed_host() {
    let cluster = FakeCluster::with_nodes(2);
    cluster.update_node(address(1), |node| node.reachable = false);
    cluster.update_node(address(2), |node| node.reachable = false);

    let (control_connection, _) = control_connection(&cluster, ControlConnectionConfig::default());

    let error = control_connection
        .connect(vec![address(2), address(9), address(1)])
        .await
        .unwrap_err();

    match error {
        Error::NoHostsAvailable { errors } => {
            let hosts: Vec<IpAddr> = errors.iter().map(|(host, _)| *host).collect();
            assert_eq!(hosts, vec![address(2), address(9), address(1)]);
            for (_, error) in errors {
                assert!(matches!(error, Error::Io(_)));
            }
        }
        error => panic!("Unexpected error: {}", error),
    }
}

#[tokio::test]
async fn connect_downgrades_protocol_version() {
    let cluster = FakeCluster::with_nodes(2);
    cluster.update_node(address(1), |node| node.max_version = Version::V2);

    let (control_connection, _) = control_connection(&cluster, ControlConnectionConfig::default());

    let connection = control_connection.connect(vec![address(1)]).await.unwrap();
    assert_eq!(connection.version(), Version::V2);
    assert_eq!(control_connection.protocol_version(), Version::V2);

    control_connection.connect(vec![address(2)]).await.unwrap();

    assert_eq!(
        cluster.attempts(),
        vec![
            (address(1), Version::V4),
            (address(1), Version::V3),
            (address(1), Version::V2),
            (address(2), Version::V2),
        ]
    );
}

#[tokio::test]
async fn connect_respects_minimum_protocol_version() {
    let cluster = FakeCluster::with_nodes(1);
    cluster.update_node(address(1), |node| node.max_version = Version::V2);

    let config = ControlConnectionConfigBuilder::new()
        .with_min_protocol_version(Version::V3)
        .build()
        .unwrap();
    let (control_connection, _) = control_connection(&cluster, config);

    let error = control_connection
        .connect(vec![address(1)])
        .await
        .unwrap_err();

    match error {
        Error::NoHostsAvailable { errors } => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].1.server_error().unwrap().is_protocol_error());
        }
        error => panic!("Unexpected error: {}", error),
    }
    assert_eq!(control_connection.protocol_version(), Version::V3);
}

#[tokio::test]
async fn connect_authenticates_with_credentials_on_first_version() {
    let cluster = FakeCluster::with_nodes(1);
    cluster.require_credentials(Credentials::new("cassandra", "cassandra"));

    let config = ControlConnectionConfigBuilder::new()
        .with_protocol_version(Version::V1)
        .with_credentials(Credentials::new("cassandra", "cassandra"))
        .build()
        .unwrap();
    let (control_connection, _) = control_connection(&cluster, config);

    control_connection.connect(vec![address(1)]).await.unwrap();

    let authenticated = cluster
        .requests()
        .iter()
        .any(|(_, request)| matches!(request, RequestBody::Credentials(_)));
    assert!(authenticated);
}

#[tokio::test]
async fn connect_authenticates_with_sasl() {
    let cluster = FakeCluster::with_nodes(1);
    cluster.require_credentials(Credentials::new("cassandra", "cassandra"));

    let provider = StaticPasswordAuthenticatorProvider::new("cassandra", "cassandra");
    let config = ControlConnectionConfigBuilder::new()
        .with_authenticator_provider(Arc::new(provider))
        .build()
        .unwrap();
    let (control_connection, _) = control_connection(&cluster, config);

    control_connection.connect(vec![address(1)]).await.unwrap();

    let authenticated = cluster
        .requests()
        .iter()
        .any(|(_, request)| matches!(request, RequestBody::AuthResponse(_)));
    assert!(authenticated);
}

#[tokio::test]
async fn connect_known_hosts_uses_directory() {
    let cluster = FakeCluster::with_nodes(2);
    let (control_connection, _) = control_connection(&cluster, ControlConnectionConfig::default());

    control_connection
        .bootstrap(vec![address(1)])
        .await
        .unwrap();

    cluster.update_node(address(1), |node| node.reachable = false);
    let connection = control_connection.connect_known_hosts().await.unwrap();

    assert_eq!(connection.host(), address(2));
}

#[tokio::test]
async fn refresh_hosts_prunes_missing_hosts_silently() {
    let cluster = FakeCluster::with_nodes(3);
    let (control_connection, listener) =
        control_connection(&cluster, ControlConnectionConfig::default());

    control_connection.connect(vec![address(1)]).await.unwrap();
    control_connection.refresh_hosts().await.unwrap();
    listener.clear();

    cluster.remove_node(address(3));
    control_connection.refresh_hosts().await.unwrap();

    let directory = control_connection.directory();
    assert_eq!(directory.len(), 2);
    assert!(!directory.contains(address(3)));
    assert!(listener.notifications().is_empty());
}

#[tokio::test]
async fn refresh_hosts_reports_relocation() {
    let cluster = FakeCluster::with_nodes(2);
    let (control_connection, listener) =
        control_connection(&cluster, ControlConnectionConfig::default());

    control_connection.connect(vec![address(1)]).await.unwrap();
    control_connection.refresh_hosts().await.unwrap();
    listener.clear();

    cluster.update_node(address(2), |node| node.rack = "rack2".into());
    control_connection.refresh_hosts().await.unwrap();

    assert_eq!(
        listener.notifications(),
        vec![
            (Notification::Down, address(2)),
            (Notification::Lost, address(2)),
            (Notification::Found, address(2)),
            (Notification::Up, address(2)),
        ]
    );

    listener.clear();
    control_connection.refresh_hosts().await.unwrap();

    assert!(listener.notifications().is_empty());
    let host = control_connection.directory().host(address(2)).unwrap();
    assert!(host.is_up());
    assert_eq!(host.info().rack.as_deref(), Some("rack2"));
}

#[tokio::test]
async fn refresh_host_updates_single_host() {
    let cluster = FakeCluster::with_nodes(2);
    let (control_connection, listener) =
        control_connection(&cluster, ControlConnectionConfig::default());

    control_connection.connect(vec![address(1)]).await.unwrap();
    control_connection.refresh_host(address(2)).await.unwrap();
    control_connection.refresh_host(address(1)).await.unwrap();
    control_connection.refresh_host(address(7)).await.unwrap();

    assert_eq!(control_connection.directory().len(), 2);
    assert_eq!(
        listener.notifications(),
        vec![
            (Notification::Found, address(2)),
            (Notification::Up, address(2)),
            (Notification::Found, address(1)),
            (Notification::Up, address(1)),
        ]
    );
}

#[tokio::test]
async fn events_update_host_status() {
    let cluster = FakeCluster::with_nodes(3);
    let (control_connection, listener) =
        control_connection(&cluster, ControlConnectionConfig::default());

    control_connection
        .bootstrap(vec![address(1)])
        .await
        .unwrap();
    listener.clear();

    cluster
        .push_event(status_event(StatusChangeType::Down, 2))
        .await;
    wait_for(|| listener.notifications_for(address(2)) == vec![Notification::Down]).await;
    let host = control_connection.directory().host(address(2)).unwrap();
    assert!(host.is_down());

    // already down
    cluster
        .push_event(status_event(StatusChangeType::Down, 2))
        .await;
    cluster
        .push_event(status_event(StatusChangeType::Up, 2))
        .await;
    wait_for(|| {
        listener.notifications_for(address(2)) == vec![Notification::Down, Notification::Up]
    })
    .await;
    assert!(host.is_up());

    // unknown host
    cluster
        .push_event(status_event(StatusChangeType::Up, 8))
        .await;
    cluster
        .push_event(status_event(StatusChangeType::Down, 3))
        .await;
    wait_for(|| listener.notifications_for(address(3)) == vec![Notification::Down]).await;
    assert!(listener.notifications_for(address(8)).is_empty());
}

#[tokio::test]
async fn events_continue_after_failed_refresh() {
    let cluster = FakeCluster::with_nodes(3);
    let (control_connection, listener) =
        control_connection(&cluster, ControlConnectionConfig::default());

    control_connection
        .bootstrap(vec![address(1)])
        .await
        .unwrap();

    cluster
        .push_event(status_event(StatusChangeType::Down, 2))
        .await;
    wait_for(|| listener.notifications_for(address(2)) == vec![Notification::Down]).await;
    listener.clear();

    cluster.fail_next_peer_query();
    cluster
        .push_event(status_event(StatusChangeType::Up, 2))
        .await;
    cluster
        .push_event(status_event(StatusChangeType::Down, 3))
        .await;
    wait_for(|| listener.notifications_for(address(3)) == vec![Notification::Down]).await;

    let host = control_connection.directory().host(address(2)).unwrap();
    assert!(host.is_down());
    assert_eq!(
        listener.notifications(),
        vec![(Notification::Down, address(3))]
    );

    cluster
        .push_event(status_event(StatusChangeType::Up, 2))
        .await;
    wait_for(|| listener.notifications_for(address(2)) == vec![Notification::Up]).await;
    assert!(host.is_up());
}

#[tokio::test]
async fn events_update_membership() {
    let cluster = FakeCluster::with_nodes(3);
    let (control_connection, listener) =
        control_connection(&cluster, ControlConnectionConfig::default());

    control_connection
        .bootstrap(vec![address(1)])
        .await
        .unwrap();
    listener.clear();

    cluster.add_node(FakeNode::new(address(4)));
    cluster
        .push_event(topology_event(TopologyChangeType::NewNode, 4))
        .await;
    wait_for(|| {
        listener.notifications_for(address(4)) == vec![Notification::Found, Notification::Up]
    })
    .await;

    cluster
        .push_event(topology_event(TopologyChangeType::RemovedNode, 3))
        .await;
    wait_for(|| {
        listener.notifications_for(address(3)) == vec![Notification::Down, Notification::Lost]
    })
    .await;
    assert!(!control_connection.directory().contains(address(3)));

    cluster
        .push_event(status_event(StatusChangeType::Down, 2))
        .await;
    cluster
        .push_event(topology_event(TopologyChangeType::RemovedNode, 2))
        .await;
    wait_for(|| {
        listener.notifications_for(address(2)) == vec![Notification::Down, Notification::Lost]
    })
    .await;

    cluster
        .push_event(ServerEvent::SchemaChange(SchemaChange {
            change_type: SchemaChangeType::Created,
            target: SchemaChangeTarget::Keyspace,
            options: SchemaChangeOptions::Keyspace("ks".into()),
        }))
        .await;
    cluster
        .push_event(topology_event(TopologyChangeType::NewNode, 4))
        .await;
    cluster
        .push_event(topology_event(TopologyChangeType::RemovedNode, 9))
        .await;
    cluster
        .push_event(status_event(StatusChangeType::Down, 4))
        .await;
    wait_for(|| {
        listener.notifications_for(address(4))
            == vec![Notification::Found, Notification::Up, Notification::Down]
    })
    .await;

    assert_eq!(control_connection.directory().len(), 2);
}

#[tokio::test]
async fn close_releases_connection() {
    let cluster = FakeCluster::with_nodes(1);
    let (control_connection, _) = control_connection(&cluster, ControlConnectionConfig::default());

    control_connection.close().await.unwrap();

    control_connection.connect(vec![address(1)]).await.unwrap();
    control_connection.close().await.unwrap();

    assert!(control_connection.connection().is_none());
    assert!(matches!(
        control_connection.refresh_hosts().await,
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        control_connection.register().await,
        Err(Error::NotConnected)
    ));
}
