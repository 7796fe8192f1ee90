use super::*;
use lattice_controller_core::{
    api::{PathMatch, WeightedTargetGroup},
    ResolutionMiss, RuleError, RuleStatus,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

fn weighted(id: &str, weight: u32) -> WeightedTargetGroup {
    WeightedTargetGroup {
        target_group_id: id.to_string(),
        weight,
    }
}

#[tokio::test]
async fn creates_weighted_rule() {
    init_tracing();
    let test = Test::new(&["tg1"]);
    let rule = mk_rule(1, "", &[("tg1", 90)]);

    let status = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect("rule must be created");

    assert_eq!(
        test.api.creates(),
        vec![CreateRuleRequest {
            service_id: SERVICE_ID.to_string(),
            listener_id: LISTENER_ID.to_string(),
            name: format!("k8s-{CREATE_TIME}-rule-1"),
            priority: 1,
            r#match: None,
            action: ForwardAction {
                target_groups: vec![weighted("tg-tg1", 90)],
            },
        }]
    );
    assert_eq!(
        status,
        RuleStatus {
            service_id: SERVICE_ID.to_string(),
            listener_id: LISTENER_ID.to_string(),
            rule_id: "rule-id-1".to_string(),
            rule_arn: "arn:rule-id-1".to_string(),
            priority: 1,
        }
    );
}

#[tokio::test]
async fn creates_path_rule() {
    let test = Test::new(&["tg1", "tg2"]);
    let rule = mk_rule(3, "/ver-1", &[("tg1", 10), ("tg2", 90)]);

    test.manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect("rule must be created");

    let creates = test.api.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].priority, 3);
    assert_eq!(
        creates[0].r#match,
        Some(HttpMatch {
            method: None,
            path: Some(PathMatch::Prefix("/ver-1".to_string())),
        })
    );
    assert_eq!(
        creates[0].action.target_groups,
        vec![weighted("tg-tg1", 10), weighted("tg-tg2", 90)]
    );
}

#[tokio::test]
async fn create_is_idempotent() {
    let test = Test::new(&["tg1"]);
    let rule = mk_rule(1, "/ver-1", &[("tg1", 90)]);
    let cancel = CancellationToken::new();

    let first = test.manager.create(&rule, &cancel).await.unwrap();
    test.api.clear_calls();
    let second = test.manager.create(&rule, &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(test.api.mutations(), 0, "{:?}", test.api.calls());
    assert_eq!(test.api.remote().len(), 1);
}

#[tokio::test]
async fn adding_a_target_group_updates_in_place() {
    let test = Test::new(&["tg1", "tg2"]);
    let existing = test.api.seed(1, "", &[("tg-tg1", 90)]);
    let rule = mk_rule(1, "", &[("tg1", 90), ("tg2", 10)]);

    let status = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .unwrap();

    assert!(test.api.creates().is_empty());
    assert_eq!(
        test.api.updates(),
        vec![UpdateRuleRequest {
            service_id: SERVICE_ID.to_string(),
            listener_id: LISTENER_ID.to_string(),
            rule_id: existing.clone(),
            priority: 1,
            r#match: None,
            action: ForwardAction {
                target_groups: vec![weighted("tg-tg1", 90), weighted("tg-tg2", 10)],
            },
        }]
    );
    assert_eq!(status.rule_id, existing);
}

#[tokio::test]
async fn reweighting_updates_in_place() {
    let test = Test::new(&["tg1", "tg2"]);
    let existing = test.api.seed(1, "", &[("tg-tg1", 90), ("tg-tg2", 10)]);
    let rule = mk_rule(1, "", &[("tg1", 10), ("tg2", 90)]);

    test.manager
        .create(&rule, &CancellationToken::new())
        .await
        .unwrap();

    let updates = test.api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].rule_id, existing);
    assert_eq!(
        updates[0].action.target_groups,
        vec![weighted("tg-tg1", 10), weighted("tg-tg2", 90)]
    );
}

#[tokio::test]
async fn changing_backends_of_path_rule_updates_in_place() {
    let test = Test::new(&["tg1", "tg2"]);
    let existing = test.api.seed(1, "/ver-1", &[("tg-tg1", 90)]);
    let rule = mk_rule(1, "/ver-1", &[("tg2", 90)]);

    test.manager
        .create(&rule, &CancellationToken::new())
        .await
        .unwrap();

    assert!(test.api.creates().is_empty());
    let updates = test.api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].rule_id, existing);
    assert_eq!(updates[0].priority, 1);
}

#[tokio::test]
async fn changed_path_takes_next_priority() {
    let test = Test::new(&["tg1"]);
    let existing = test.api.seed(1, "/ver-1", &[("tg-tg1", 90)]);
    let rule = mk_rule(1, "/ver-2", &[("tg1", 90)]);

    let status = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .unwrap();

    assert!(test.api.updates().is_empty());
    let creates = test.api.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].priority, 2);
    assert_eq!(status.priority, 2);
    assert_eq!(
        test.api.remote(),
        vec![
            (existing, 1, Some("/ver-1".to_string())),
            (status.rule_id, 2, Some("/ver-2".to_string())),
        ]
    );
}

#[tokio::test]
async fn conflict_walk_skips_every_occupied_priority() {
    let test = Test::new(&["tg1"]);
    test.api.seed(1, "/ver-1", &[("tg-tg1", 90)]);
    test.api.seed(2, "/other", &[("tg-tg1", 90)]);
    let rule = mk_rule(1, "/ver-2", &[("tg1", 90)]);

    let status = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status.priority, 3);
    assert_eq!(test.api.creates()[0].priority, 3);
}

#[tokio::test]
async fn displaced_rule_is_found_again() {
    let test = Test::new(&["tg1"]);
    test.api.seed(1, "/ver-1", &[("tg-tg1", 90)]);
    let rule = mk_rule(1, "/ver-2", &[("tg1", 90)]);
    let cancel = CancellationToken::new();

    let first = test.manager.create(&rule, &cancel).await.unwrap();
    test.api.clear_calls();
    let second = test.manager.create(&rule, &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(test.api.mutations(), 0);
}

#[tokio::test]
async fn default_listener_rules_are_ignored() {
    let test = Test::new(&["tg1"]);
    test.api.seed_default();
    let rule = mk_rule(1, "", &[("tg1", 100)]);

    test.manager
        .create(&rule, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(test.api.creates().len(), 1);
    assert!(
        !test.api.calls().iter().any(|c| matches!(c, Call::Get { .. })),
        "default rules must not be fetched"
    );
}

#[tokio::test]
async fn missing_service_blocks_create() {
    let test = Test::empty();
    test.add_target_group("tg1");
    let rule = mk_rule(1, "/ver-1", &[("tg1", 90)]);

    let error = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect_err("service is not known");

    assert!(error.is_retryable());
    assert!(matches!(
        error,
        RuleError::NotReady(ResolutionMiss::Service { .. })
    ));
    assert!(test.api.calls().is_empty());
}

#[tokio::test]
async fn missing_listener_blocks_create() {
    let test = Test::empty();
    test.store
        .add_service(SERVICE_NAME, SERVICE_NAMESPACE, "serviceARN", SERVICE_ID, "test-dns");
    test.add_target_group("tg1");
    let rule = mk_rule(1, "/ver-1", &[("tg1", 90)]);

    let error = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect_err("listener is not known");

    assert!(matches!(
        error,
        RuleError::NotReady(ResolutionMiss::Listener { port: PORT, .. })
    ));
    assert!(test.api.calls().is_empty());
}

#[tokio::test]
async fn missing_target_group_blocks_create() {
    let test = Test::new(&["tg1"]);
    let rule = mk_rule(1, "/ver-1", &[("tg1", 50), ("tg2", 50)]);

    let error = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect_err("tg2 is not known");

    assert!(matches!(
        error,
        RuleError::NotReady(ResolutionMiss::TargetGroup { ref name, .. }) if name == "tg2"
    ));
    assert!(test.api.calls().is_empty());
}

#[tokio::test]
async fn imported_target_groups_resolve_separately() {
    let test = Test::new(&[]);
    let mut rule = mk_rule(1, "", &[("tg1", 100)]);
    rule.spec.action.target_groups[0].is_service_import = true;

    // Only the locally managed target group is known.
    test.add_target_group("tg1");
    let error = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect_err("import is not known");
    assert!(error.is_retryable());

    test.store.add_target_group(
        target_group_name("tg1", SERVICE_NAMESPACE),
        "vpc",
        "arn",
        "tg-import",
        true,
    );
    test.manager
        .create(&rule, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        test.api.creates()[0].action.target_groups,
        vec![weighted("tg-import", 100)]
    );
}

#[tokio::test]
async fn malformed_rule_id_is_fatal() {
    let test = Test::new(&["tg1"]);
    let mut rule = mk_rule(1, "", &[("tg1", 100)]);
    rule.spec.rule_id = "first".to_string();

    let error = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect_err("rule id must not decode");

    assert!(matches!(error, RuleError::Format(_)));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn remote_errors_are_surfaced() {
    let test = Test::new(&["tg1"]);
    test.api.conflict_on_create();
    let rule = mk_rule(1, "", &[("tg1", 100)]);

    let error = test
        .manager
        .create(&rule, &CancellationToken::new())
        .await
        .expect_err("create is rejected");

    assert!(matches!(error, RuleError::Api(ApiError::Conflict(_))));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn cancelled_create_makes_no_changes() {
    let test = Test::new(&["tg1"]);
    test.api.stall();
    let rule = mk_rule(1, "", &[("tg1", 100)]);
    let cancel = CancellationToken::new();

    let create = test.manager.create(&rule, &cancel);
    cancel.cancel();
    let error = create.await.expect_err("must be cancelled");

    assert!(matches!(error, RuleError::Cancelled));
    assert_eq!(test.api.mutations(), 0);
    assert!(test.api.remote().is_empty());
}
