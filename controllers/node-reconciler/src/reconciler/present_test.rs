//! Unit tests for present-state reconciliation

#[cfg(test)]
mod tests {
    use crate::log::ReconcileLog;
    use crate::reconciler::NodePhase;
    use crate::test_utils::*;
    use luna_client::{FieldValue, Mutation, NewNode, NodeField, NodeRepository, Operation};
    use node_spec::{DesiredInterface, DesiredNode};

    #[tokio::test]
    async fn test_creates_node_and_assigns_ip() {
        let repo = test_repository();
        let reconciler = reconciler_for(&repo);
        let mut log = ReconcileLog::new();

        let desired = desired_with_ips("n1", "g1", "eth0", &["1.2.3.4"]);
        let result = reconciler.ensure_present(&desired, &mut log).await;

        assert!(!result.failed, "unexpected failure: {}", result.message);
        assert!(result.changed);
        assert_eq!(result.phase, NodePhase::Converged);
        assert!(result.message.contains("1.2.3.4"), "snapshot should show the address: {}", result.message);
        assert_eq!(
            repo.mutations(),
            vec![
                Mutation::Created {
                    node: "n1".to_string(),
                    group: "g1".to_string(),
                },
                Mutation::IpSet {
                    node: "n1".to_string(),
                    interface: "eth0".to_string(),
                    ip: ip("1.2.3.4"),
                },
            ]
        );
        assert!(log.render().contains("INFO: Created node n1 in group g1"), "log was: {}", log.render());
    }

    #[tokio::test]
    async fn test_second_identical_pass_changes_nothing() {
        let repo = test_repository();
        let reconciler = reconciler_for(&repo);
        let desired = DesiredNode {
            localboot: Some(true),
            setupbmc: Some(false),
            service: Some(true),
            port: Some("12".to_string()),
            comment: Some("rack 4".to_string()),
            switch: Some("sw01".to_string()),
            mac: Some("52:54:00:aa:bb:01".parse().unwrap()),
            ..desired_with_ips("n1", "g1", "eth0", &["10.141.0.1", "fd00::1"])
        };

        let first = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;
        assert!(!first.failed, "unexpected failure: {}", first.message);
        assert!(first.changed);

        repo.clear_mutations();
        let second = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;
        assert!(!second.failed, "unexpected failure: {}", second.message);
        assert!(!second.changed, "second pass should be a no-op");
        assert!(repo.mutations().is_empty(), "unexpected mutations: {:?}", repo.mutations());
    }

    #[tokio::test]
    async fn test_unknown_node_without_group_is_not_created() {
        let repo = test_repository();
        let reconciler = reconciler_for(&repo);

        for desired in [DesiredNode::new("n1"), DesiredNode::new("n1").with_group("")] {
            let result = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;
            assert!(result.failed);
            assert!(!result.changed);
            assert_eq!(result.phase, NodePhase::Unknown);
            assert!(result.message.contains("Group needs to be specified"), "message was: {}", result.message);
        }
        assert!(repo.lookup("n1").await.unwrap().is_none());
        assert!(repo.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_undefined_interfaces_are_listed_and_nothing_is_mutated() {
        let repo = test_repository();
        let node = repo.create(NewNode::new("n1", "g1")).await.unwrap();
        repo.clear_mutations();
        let reconciler = reconciler_for(&repo);

        let desired = DesiredNode {
            localboot: Some(true),
            ..DesiredNode::new("n1")
                .with_interface(DesiredInterface::new("eth0", [ip("10.0.0.1")]))
                .with_interface(DesiredInterface::new("bond0", []))
                .with_interface(DesiredInterface::new("ib9", []))
        };
        let result = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;

        assert!(result.failed);
        assert!(!result.changed);
        assert_eq!(result.phase, NodePhase::Converging);
        assert_eq!(result.message, "Node n1 does not have bond0 ib9 interfaces configured");
        assert!(repo.mutations().is_empty());
        assert_eq!(
            repo.get_field(&node, NodeField::Localboot).await.unwrap(),
            Some(FieldValue::Flag(false))
        );
    }

    #[tokio::test]
    async fn test_undefined_interface_after_create_still_reports_change() {
        let repo = test_repository();
        let reconciler = reconciler_for(&repo);

        let desired = desired_with_ips("n1", "g2", "ib0", &["10.0.0.1"]);
        let result = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;

        assert!(result.failed);
        assert!(result.changed, "the node was created before the interface check");
        assert_eq!(result.phase, NodePhase::Created);
    }

    #[tokio::test]
    async fn test_only_missing_ips_are_assigned() {
        let repo = test_repository();
        let node = repo.create(NewNode::new("n1", "g1")).await.unwrap();
        repo.set_ip(&node, "eth0", ip("10.0.0.1")).await.unwrap();
        repo.clear_mutations();
        let reconciler = reconciler_for(&repo);

        let desired = DesiredNode {
            setupbmc: Some(true),
            ..desired_with_ips("n1", "g1", "eth0", &["10.0.0.1", "fd00::2"])
        };
        let result = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;

        assert!(!result.failed, "unexpected failure: {}", result.message);
        assert!(result.changed);
        assert_eq!(
            repo.mutations(),
            vec![Mutation::IpSet {
                node: "n1".to_string(),
                interface: "eth0".to_string(),
                ip: ip("fd00::2"),
            }]
        );

        let view = repo.snapshot(&node).await.unwrap();
        assert_eq!(view.interfaces["eth0"].ipv4, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(view.interfaces["eth0"].ipv6, Some("fd00::2".parse().unwrap()));

        let again = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;
        assert!(!again.failed, "unexpected failure: {}", again.message);
        assert!(!again.changed, "configured addresses must be left untouched");
    }

    #[tokio::test]
    async fn test_undesired_ips_are_never_removed() {
        let repo = test_repository();
        let node = repo.create(NewNode::new("n1", "g1")).await.unwrap();
        repo.set_ip(&node, "eth0", ip("10.0.0.1")).await.unwrap();
        repo.set_ip(&node, "eth0", ip("fd00::1")).await.unwrap();
        repo.clear_mutations();
        let reconciler = reconciler_for(&repo);
        let mut log = ReconcileLog::new();

        let desired = desired_with_ips("n1", "g1", "eth0", &["10.0.0.1"]);
        let result = reconciler.ensure_present(&desired, &mut log).await;

        assert!(!result.failed, "unexpected failure: {}", result.message);
        assert!(!result.changed);
        assert!(repo.mutations().is_empty());
        let view = repo.snapshot(&node).await.unwrap();
        assert_eq!(view.interfaces["eth0"].ipv6, Some("fd00::1".parse().unwrap()));
        assert!(log.render().contains("WARNING: fd00::1 is configured on n1/eth0"), "log was: {}", log.render());
    }

    #[tokio::test]
    async fn test_field_failure_stops_the_pass() {
        let repo = test_repository();
        let node = repo.create(NewNode::new("n1", "g1")).await.unwrap();
        repo.clear_mutations();
        repo.fail_on(Operation::SetField(NodeField::Localboot));
        let reconciler = reconciler_for(&repo);

        let desired = DesiredNode {
            localboot: Some(true),
            setupbmc: Some(false),
            service: Some(true),
            comment: Some("rack 4".to_string()),
            ..desired_with_ips("n1", "g1", "eth0", &["10.0.0.1"])
        };
        let result = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;

        assert!(result.failed);
        assert!(!result.changed);
        assert_eq!(result.phase, NodePhase::Converging);
        assert!(result.message.starts_with("Could not change localboot to true"), "message was: {}", result.message);
        assert!(repo.mutations().is_empty(), "later fields must not be attempted: {:?}", repo.mutations());

        let view = repo.snapshot(&node).await.unwrap();
        assert!(view.setupbmc);
        assert!(!view.service);
        assert_eq!(view.interfaces["eth0"].ipv4, None);
    }

    #[tokio::test]
    async fn test_failed_pass_keeps_partial_changes_and_retry_resumes() {
        let repo = test_repository();
        repo.create(NewNode::new("n1", "g1")).await.unwrap();
        repo.clear_mutations();
        repo.fail_on(Operation::SetSwitch);
        let reconciler = reconciler_for(&repo);

        let desired = DesiredNode {
            comment: Some("rack 4".to_string()),
            switch: Some("sw01".to_string()),
            ..desired_with_ips("n1", "g1", "eth0", &["10.0.0.1"])
        };
        let first = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;
        assert!(first.failed);
        assert!(first.changed, "comment was applied before the switch failed");
        assert!(first.message.starts_with("Could not change switch to sw01"), "message was: {}", first.message);

        repo.recover(Operation::SetSwitch);
        repo.clear_mutations();
        let second = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;
        assert!(!second.failed, "unexpected failure: {}", second.message);
        assert!(second.changed);
        assert_eq!(
            repo.mutations(),
            vec![
                Mutation::SwitchSet {
                    node: "n1".to_string(),
                    switch: "sw01".to_string(),
                },
                Mutation::IpSet {
                    node: "n1".to_string(),
                    interface: "eth0".to_string(),
                    ip: ip("10.0.0.1"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_group_and_switch_are_applied_through_their_setters() {
        let repo = test_repository();
        repo.create(NewNode::new("n1", "g1")).await.unwrap();
        repo.clear_mutations();
        let reconciler = reconciler_for(&repo);

        let desired = DesiredNode {
            switch: Some("sw01".to_string()),
            ..DesiredNode::new("n1").with_group("g2")
        };
        let result = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;

        assert!(!result.failed, "unexpected failure: {}", result.message);
        assert_eq!(
            repo.mutations(),
            vec![
                Mutation::GroupSet {
                    node: "n1".to_string(),
                    group: "g2".to_string(),
                },
                Mutation::SwitchSet {
                    node: "n1".to_string(),
                    switch: "sw01".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_mac_compares_normalized_addresses() {
        let repo = test_repository();
        let node = repo.create(NewNode::new("n1", "g1")).await.unwrap();
        repo.set_mac(&node, "52:54:00:aa:bb:01".parse().unwrap()).await.unwrap();
        repo.clear_mutations();
        let reconciler = reconciler_for(&repo);

        let same = DesiredNode {
            mac: Some("52-54-00-AA-BB-01".parse().unwrap()),
            ..DesiredNode::new("n1")
        };
        let result = reconciler.ensure_present(&same, &mut ReconcileLog::new()).await;
        assert!(!result.changed);

        let other = DesiredNode {
            mac: Some("52:54:00:aa:bb:02".parse().unwrap()),
            ..DesiredNode::new("n1")
        };
        let result = reconciler.ensure_present(&other, &mut ReconcileLog::new()).await;
        assert!(!result.failed, "unexpected failure: {}", result.message);
        assert!(result.changed);
        assert_eq!(
            repo.mutations(),
            vec![Mutation::MacSet {
                node: "n1".to_string(),
                mac: "52:54:00:aa:bb:02".parse().unwrap(),
            }]
        );
    }

    #[tokio::test]
    async fn test_ip_failure_names_ip_and_interface() {
        let repo = test_repository();
        repo.fail_on(Operation::SetIp);
        let reconciler = reconciler_for(&repo);

        let desired = desired_with_ips("n1", "g1", "ib0", &["10.149.0.1"]);
        let result = reconciler.ensure_present(&desired, &mut ReconcileLog::new()).await;

        assert!(result.failed);
        assert!(result.changed);
        assert_eq!(result.phase, NodePhase::Created);
        assert!(result.message.starts_with("Could not set ip 10.149.0.1 on ib0"), "message was: {}", result.message);
    }

    #[tokio::test]
    async fn test_create_rejected_by_repository() {
        let repo = test_repository();
        let reconciler = reconciler_for(&repo);

        let result = reconciler
            .ensure_present(&DesiredNode::new("n1").with_group("nope"), &mut ReconcileLog::new())
            .await;

        assert!(result.failed);
        assert!(!result.changed);
        assert_eq!(result.phase, NodePhase::Unknown);
        assert!(result.message.starts_with("Could not create node n1"), "message was: {}", result.message);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_reported() {
        let repo = test_repository();
        repo.fail_on(Operation::Lookup);
        let reconciler = reconciler_for(&repo);
        let mut log = ReconcileLog::new();

        let result = reconciler.ensure_present(&DesiredNode::new("n1").with_group("g1"), &mut log).await;

        assert!(result.failed);
        assert!(!result.changed);
        assert!(result.message.starts_with("Repository error"), "message was: {}", result.message);
        assert!(log.render().starts_with("ERROR: "), "log was: {}", log.render());
    }
}
