use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use driftwatch_daemon::reconciler;
use driftwatch_domain::{CloudProvider, Metadata, ResourceFilter, ResourceId, ResourceType, Tags};
use driftwatch_policy::{Enforcer, LoggingNotifier, PolicySet};
use driftwatch_provider::{LocalProvider, Provider};
use driftwatch_store::{InMemoryStore, Store};
use tokio_util::sync::CancellationToken;

fn resource(id: &str, owner: Option<&str>) -> driftwatch_domain::Resource {
    let mut tags = Tags::default();
    tags.owner = owner.map(|s| s.to_string());
    driftwatch_domain::Resource {
        provider: CloudProvider::Local,
        account_id: "acct-1".into(),
        region: "us-east-1".into(),
        resource_type: ResourceType::new("ec2_instance"),
        id: ResourceId::new(id),
        name: Some(format!("{id}-prod")),
        status: Some("running".into()),
        created_at: Some(chrono::Utc::now()),
        last_seen_at: Some(chrono::Utc::now()),
        tags,
        metadata: Metadata::default(),
    }
}

fn harness(provider: Arc<LocalProvider>) -> (Arc<dyn Store>, Enforcer, PolicySet) {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let provider_trait: Arc<dyn Provider> = provider;
    let enforcer = Enforcer::new(
        Some(provider_trait),
        store.clone(),
        Arc::new(LoggingNotifier),
        "driftwatch".to_string(),
    );
    (store, enforcer, PolicySet::default_set())
}

#[tokio::test]
async fn first_scan_produces_no_change_events() {
    let provider = Arc::new(LocalProvider::new(vec![resource("i-1", Some("alice")), resource("i-2", Some("bob"))]));
    let (store, enforcer, policy_set) = harness(provider.clone());

    let outcome = reconciler::tick(
        Some(&(provider as Arc<dyn Provider>)),
        &store,
        &policy_set,
        &enforcer,
        &ResourceFilter::default(),
        "local",
        "us-east-1",
    )
    .await
    .unwrap();

    assert_eq!(outcome.revision, 1);
    assert_eq!(outcome.resources_observed, 2);
    assert_eq!(outcome.change_events, 0);
    assert_eq!(store.latest_resource_set().await.unwrap().len(), 2);
}

#[tokio::test]
async fn second_scan_with_mixed_delta_produces_three_events() {
    let provider = Arc::new(LocalProvider::new(vec![resource("i-1", Some("alice")), resource("i-2", Some("bob"))]));
    let (store, enforcer, policy_set) = harness(provider.clone());
    let provider_dyn: Arc<dyn Provider> = provider.clone();

    reconciler::tick(Some(&provider_dyn), &store, &policy_set, &enforcer, &ResourceFilter::default(), "local", "us-east-1")
        .await
        .unwrap();

    let mut modified = resource("i-2", Some("bob"));
    modified.status = Some("stopped".into());
    provider.set_resources(vec![modified, resource("i-3", Some("carol"))]);

    let outcome = reconciler::tick(Some(&provider_dyn), &store, &policy_set, &enforcer, &ResourceFilter::default(), "local", "us-east-1")
        .await
        .unwrap();

    assert_eq!(outcome.revision, 2);
    assert_eq!(outcome.change_events, 3); // i-1 disappeared, i-2 modified, i-3 created
}

#[tokio::test]
async fn orphaned_prod_resource_gets_flagged_and_tagged() {
    let provider = Arc::new(LocalProvider::new(vec![resource("i-orphan", None)]));
    let (store, enforcer, policy_set) = harness(provider.clone());
    let provider_dyn: Arc<dyn Provider> = provider.clone();

    reconciler::tick(Some(&provider_dyn), &store, &policy_set, &enforcer, &ResourceFilter::default(), "local", "us-east-1")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let events = store
        .query_enforcements(&driftwatch_store::EnforcementFilter::default())
        .await
        .unwrap();
    let flagged = events.iter().find(|e| e.resource_id.as_str() == "i-orphan").unwrap();
    assert_eq!(flagged.action, driftwatch_domain::EnforcementAction::Flag);
    assert!(flagged.success);
    assert!(flagged.tags_applied.as_ref().unwrap().contains_key("driftwatch:policy-flag"));
}

#[tokio::test]
async fn missing_provider_no_ops_cleanly() {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let enforcer = Enforcer::new(None, store.clone(), Arc::new(LoggingNotifier), "driftwatch".to_string());
    let policy_set = PolicySet::default_set();

    let outcome = reconciler::tick(None, &store, &policy_set, &enforcer, &ResourceFilter::default(), "local", "us-east-1")
        .await
        .unwrap();

    assert_eq!(outcome.resources_observed, 0);
    assert_eq!(outcome.change_events, 0);
}

#[tokio::test]
async fn loop_task_stops_cleanly_on_cancellation() {
    let provider = Arc::new(LocalProvider::new(vec![resource("i-1", Some("alice"))]));
    let (store, enforcer, policy_set) = harness(provider.clone());
    let provider_dyn: Arc<dyn Provider> = provider;

    let token = CancellationToken::new();
    let ready = Arc::new(AtomicBool::new(false));
    let loop_token = token.clone();

    let handle = tokio::spawn(reconciler::run_loop(
        Some(provider_dyn),
        store,
        Arc::new(policy_set),
        Arc::new(enforcer),
        ResourceFilter::default(),
        Duration::from_millis(20),
        "local".to_string(),
        "us-east-1".to_string(),
        ready,
        loop_token,
    ));

    tokio::time::sleep(Duration::from_millis(60)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(result.is_ok(), "loop task should stop within the shutdown grace period");
}
