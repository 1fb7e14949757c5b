//! Integration tests wiring the node together over a real LMDB store:
//! construction → registry writes → audit trail and notification fan-out →
//! reopen.

use verileaf_crypto::keypair_from_seed;
use verileaf_node::{NodeConfig, NodeError, RegistryNode};
use verileaf_registry::{CallContext, RegistryError, Role};
use verileaf_store::EventStore;
use verileaf_types::{Identity, ImpactScore, RegistryEvent, Timestamp};
use verileaf_websocket::SubscriptionTopic;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn identity(seed: u8) -> Identity {
    keypair_from_seed(&[seed; 32]).identity()
}

fn config(dir: &tempfile::TempDir, owner: Option<Identity>) -> NodeConfig {
    NodeConfig {
        data_dir: dir.path().to_path_buf(),
        lmdb_map_size: 16 * 1024 * 1024,
        rpc_port: 0,
        websocket_port: 0,
        owner,
        initial_verifier: Some(identity(2)),
        ..NodeConfig::default()
    }
}

fn ctx(caller: Identity, secs: u64) -> CallContext {
    CallContext::new(caller, Timestamp::new(secs))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_start_constructs_with_configured_owner() {
    let dir = tempfile::tempdir().unwrap();
    let node = RegistryNode::new(config(&dir, Some(identity(1)))).unwrap();

    let registry = node.registry.read().await;
    assert_eq!(registry.owner(), identity(1));
    assert_eq!(registry.verifier(), identity(2));
    let trail = registry.events(0, 10).unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].sequence, 0);
    assert_eq!(
        trail[0].event,
        RegistryEvent::VerifierUpdated {
            new_verifier: identity(2)
        }
    );
    assert_eq!(node.metrics.verifier_updates.get(), 1);
    assert_eq!(node.metrics.audit_log_length.get(), 1);
}

#[tokio::test]
async fn empty_store_without_owner_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let result = RegistryNode::new(config(&dir, None));
    assert!(matches!(result, Err(NodeError::MissingOwner)));
}

#[tokio::test]
async fn null_owner_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let result = RegistryNode::new(config(&dir, Some(Identity::NULL)));
    assert!(matches!(result, Err(NodeError::NullOwner)));
}

#[tokio::test]
async fn writes_fan_out_to_log_metrics_and_websocket() {
    let dir = tempfile::tempdir().unwrap();
    let node = RegistryNode::new(config(&dir, Some(identity(1)))).unwrap();
    let mut scores = node.ws_state.scores_tx.subscribe();
    let farmer = identity(3);

    {
        let mut registry = node.registry.write().await;
        registry
            .register_claim(&ctx(farmer, 10), b"polygon".to_vec(), "Green Valley".into())
            .unwrap();
        registry
            .submit_impact_score(&ctx(identity(2), 20), farmer, 87)
            .unwrap();
    }

    assert_eq!(node.store.event_count().unwrap(), 3);
    assert_eq!(node.metrics.claims_registered.get(), 1);
    assert_eq!(node.metrics.scores_submitted.get(), 1);
    assert_eq!(node.metrics.audit_log_length.get(), 3);

    let pushed = scores.recv().await.unwrap();
    assert_eq!(pushed.topic, SubscriptionTopic::Scores);
    assert_eq!(
        pushed.data,
        RegistryEvent::ScoreSubmitted {
            identity: farmer,
            score: ImpactScore::new(87).unwrap(),
            submitted_by: identity(2),
        }
    );
}

#[tokio::test]
async fn state_and_roles_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let farmer = identity(3);
    let next_verifier = identity(4);

    {
        let node = RegistryNode::new(config(&dir, Some(identity(1)))).unwrap();
        let mut registry = node.registry.write().await;
        registry
            .register_claim(&ctx(farmer, 10), b"polygon".to_vec(), "Green Valley".into())
            .unwrap();
        registry
            .submit_impact_score(&ctx(identity(2), 20), farmer, 87)
            .unwrap();
        registry
            .set_verifier(&ctx(identity(1), 30), next_verifier)
            .unwrap();
        node.store.sync().unwrap();
    }

    // A different configured owner must not take over the stored registry.
    let node = RegistryNode::new(config(&dir, Some(identity(9)))).unwrap();
    let mut registry = node.registry.write().await;
    assert_eq!(registry.owner(), identity(1));
    assert_eq!(registry.verifier(), next_verifier);

    let claim = registry.get_claim(&farmer).unwrap();
    assert!(claim.present);
    assert_eq!(claim.location_name, "Green Valley");
    assert_eq!(claim.registered_at, Timestamp::new(10));
    assert_eq!(registry.score_of(&farmer).unwrap().value(), 87);

    assert!(matches!(
        registry.submit_impact_score(&ctx(identity(2), 40), farmer, 10),
        Err(RegistryError::Unauthorized(Role::Verifier))
    ));
    assert!(matches!(
        registry.set_verifier(&ctx(identity(9), 40), identity(9)),
        Err(RegistryError::Unauthorized(Role::Owner))
    ));

}

#[tokio::test]
async fn audit_trail_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let farmer = identity(3);

    {
        let node = RegistryNode::new(config(&dir, Some(identity(1)))).unwrap();
        let mut registry = node.registry.write().await;
        registry
            .register_claim(&ctx(farmer, 10), b"polygon".to_vec(), "Green Valley".into())
            .unwrap();
        registry
            .submit_impact_score(&ctx(identity(2), 20), farmer, 87)
            .unwrap();
        registry
            .set_verifier(&ctx(identity(1), 30), identity(4))
            .unwrap();
        node.store.sync().unwrap();
    }

    let node = RegistryNode::new(config(&dir, None)).unwrap();
    assert_eq!(node.metrics.audit_log_length.get(), 4);

    let mut registry = node.registry.write().await;
    let trail = registry.events(0, 100).unwrap();
    assert_eq!(
        trail.iter().map(|e| e.sequence).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(
        trail.into_iter().map(|e| e.event).collect::<Vec<_>>(),
        vec![
            RegistryEvent::VerifierUpdated {
                new_verifier: identity(2)
            },
            RegistryEvent::ClaimRegistered {
                identity: farmer,
                location_name: "Green Valley".into(),
            },
            RegistryEvent::ScoreSubmitted {
                identity: farmer,
                score: ImpactScore::new(87).unwrap(),
                submitted_by: identity(2),
            },
            RegistryEvent::VerifierUpdated {
                new_verifier: identity(4)
            },
        ]
    );

    // New writes continue the sequence.
    registry
        .register_claim(&ctx(farmer, 40), b"polygon".to_vec(), "Green Valley".into())
        .unwrap();
    assert_eq!(registry.events(4, 10).unwrap()[0].sequence, 4);
    assert_eq!(node.metrics.audit_log_length.get(), 5);
}

#[tokio::test]
async fn reopen_without_configured_owner() {
    let dir = tempfile::tempdir().unwrap();
    drop(RegistryNode::new(config(&dir, Some(identity(1)))).unwrap());
    let node = RegistryNode::new(config(&dir, None)).unwrap();
    assert_eq!(node.registry.read().await.owner(), identity(1));
}

#[tokio::test]
async fn start_and_stop_servers() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir, Some(identity(1)));
    config.enable_websocket = true;
    let mut node = RegistryNode::new(config).unwrap();

    node.start().await.unwrap();
    node.stop().await.unwrap();
}
