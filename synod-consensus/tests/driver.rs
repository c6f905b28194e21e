use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use synod_common::{Envelope, MembershipView, Message, ProcessId};
use synod_consensus::{ConsensusProcess, Mode, ProcessConfig, ProcessDriver, ProcessStatus};
use synod_net::{InMemoryNetwork, LinkConfig, Transport};

async fn spawn_group(
    n: usize,
    link: LinkConfig,
) -> (InMemoryNetwork<u8>, Vec<watch::Receiver<ProcessStatus<u8>>>, Vec<tokio::task::JoinHandle<ProcessStatus<u8>>>) {
    let network = InMemoryNetwork::<u8>::new(link);
    let transport = Arc::new(network.clone());
    let mut statuses = Vec::new();
    let mut handles = Vec::new();

    for id in ProcessId::range(n) {
        let mailbox = network.register(id).await;
        let process = ConsensusProcess::new(id, n, &ProcessConfig::seeded(100 + u64::from(id.0))).unwrap();
        let (driver, status) = ProcessDriver::new(process, Arc::clone(&transport), mailbox);
        statuses.push(status);
        handles.push(driver.spawn());
    }

    let view = MembershipView::of_size(n);
    for id in ProcessId::range(n) {
        network.send_to(id, Envelope::from_coordinator(Message::Membership(view.clone()))).await.unwrap();
    }
    (network, statuses, handles)
}

async fn wait_for_decision(status: &mut watch::Receiver<ProcessStatus<u8>>) -> u8 {
    let snapshot = tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| s.decision.is_some()))
        .await
        .expect("no decision in time")
        .expect("driver stopped");
    snapshot.decision.unwrap()
}

#[tokio::test]
async fn test_single_proposer_group_decides() {
    let (network, mut statuses, handles) = spawn_group(3, LinkConfig::instant()).await;

    network
        .send_to(ProcessId(0), Envelope::from_coordinator(Message::Launch { started_at: None }))
        .await
        .unwrap();

    let mut values = Vec::new();
    for status in statuses.iter_mut() {
        values.push(wait_for_decision(status).await);
    }
    assert!(values.iter().all(|v| *v == values[0]));

    network.shutdown().await;
    for handle in handles {
        let status = handle.await.unwrap();
        assert_eq!(status.mode, Mode::Decided);
    }
}

#[tokio::test]
async fn test_leader_decides_after_others_are_held() {
    let link = LinkConfig { base_latency_us: 20, jitter_us: 400, seed: Some(8) };
    let (network, mut statuses, handles) = spawn_group(5, link).await;

    for id in ProcessId::range(5) {
        network
            .send_to(id, Envelope::from_coordinator(Message::Launch { started_at: None }))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(2)).await;
    for id in ProcessId::range(5).skip(1) {
        network.send_to(id, Envelope::from_coordinator(Message::Hold)).await.unwrap();
    }

    let leader_value = wait_for_decision(&mut statuses[0]).await;

    network.shutdown().await;
    for handle in handles {
        let status = handle.await.unwrap();
        if let Some(v) = status.decision {
            assert_eq!(v, leader_value);
        }
    }
}

#[tokio::test]
async fn test_silenced_process_reports_silent() {
    let network = InMemoryNetwork::<u8>::new(LinkConfig::instant());
    let mailbox = network.register(ProcessId(0)).await;
    let process = ConsensusProcess::new(ProcessId(0), 1, &ProcessConfig::seeded(1).with_alpha(1.0)).unwrap();
    let (driver, mut status) = ProcessDriver::new(process, Arc::new(network.clone()), mailbox);
    let handle = driver.spawn();

    network.send_to(ProcessId(0), Envelope::from_coordinator(Message::Crash)).await.unwrap();
    network.send_to(ProcessId(0), Envelope::from_coordinator(Message::Hold)).await.unwrap();

    let silent = tokio::time::timeout(Duration::from_secs(2), status.wait_for(|s| s.mode == Mode::Silent))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert!(silent.fault_prone);

    network.shutdown().await;
    assert_eq!(handle.await.unwrap().mode, Mode::Silent);
}
