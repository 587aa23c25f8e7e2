//! # Integration Test Flows
//!
//! The store and the scheduler wired together through the queue listener:
//! publishes become jobs, jobs publish again, retirements cascade through
//! what the jobs derived.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kg_01_nanopub_store::test_utils::{assert_triples, ex, fixed_now, revise};
    use kg_01_nanopub_store::NanopubStoreApi;
    use kg_02_update_scheduler::test_utils::{
        make_test_scheduler, test_scheduler_config, RecordingInferencer, SchedulerHarness,
        StubImporter,
    };
    use kg_02_update_scheduler::{RuleInferencer, ServiceRegistry, TriggerKind};
    use shared_types::{CallerContext, Iri, QuadPattern, QuadSource, Term};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn acquaintance_harness() -> SchedulerHarness {
        let registry = ServiceRegistry::new().with_inferencer(Arc::new(RuleInferencer::rename(
            "acquaintance",
            ex("knows"),
            ex("acquaintance"),
        )));
        make_test_scheduler(registry, test_scheduler_config())
    }

    fn holds(h: &SchedulerHarness, s: &str, p: &str, o: &str) -> bool {
        let pattern = QuadPattern::any().subject(ex(s)).predicate(ex(p)).object(ex(o));
        QuadSource::contains(h.store.as_ref(), &pattern).unwrap()
    }

    fn pub_iri(local: &str) -> Iri {
        ex(&format!("pub/{}", local))
    }

    // =============================================================================
    // FEEDBACK LOOP
    // =============================================================================

    #[tokio::test]
    async fn test_retiring_source_cascades_to_derived_unit() {
        let h = acquaintance_harness();
        let source = h.publish(&[("alice", "knows", "bob")]).unwrap();
        h.scheduler.run_until_idle().await;
        assert!(holds(&h, "alice", "acquaintance", "bob"));

        let report = h
            .manager
            .retire(&CallerContext::agent(), &[source.clone()])
            .unwrap();

        assert_eq!(report.retired, vec![source, pub_iri("np2")]);
        assert!(!holds(&h, "alice", "acquaintance", "bob"));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_revision_rederives_from_new_source() {
        let h = acquaintance_harness();
        let original = h.publish(&[("alice", "knows", "bob")]).unwrap();
        h.scheduler.run_until_idle().await;

        let prior = h.manager.get(&original, None).unwrap();
        let mut revision = h.manager.new_nanopub();
        assert_triples(&mut revision, &[("alice", "knows", "carol")]);
        revise(&mut revision, &prior);
        let report = h
            .manager
            .publish(&CallerContext::agent(), vec![revision.clone().into()])
            .unwrap();

        assert!(report.retired.contains(&original));
        assert!(report.retired.contains(&pub_iri("np2")));

        let executed = h.scheduler.run_until_idle().await;

        assert!(executed.iter().all(|(_, outcome)| outcome.is_completed()));
        assert!(!holds(&h, "alice", "acquaintance", "bob"));
        assert!(holds(&h, "alice", "acquaintance", "carol"));
        assert!(h.manager.is_current(revision.identifier()).unwrap());
        assert!(h.manager.is_current(&pub_iri("np4")).unwrap());
    }

    #[tokio::test]
    async fn test_import_feeds_unit_inferencers() {
        let importer = Arc::new(StubImporter::new(Some(fixed_now())));
        let watcher = Arc::new(RecordingInferencer::new("watcher", TriggerKind::Unit, "loadedAt"));
        let registry = ServiceRegistry::new()
            .with_importer(importer.clone())
            .with_inferencer(watcher.clone());
        let h = make_test_scheduler(registry, test_scheduler_config());
        let entity = Iri::new(format!("{}x", StubImporter::PREFIX));

        let resolved = h.scheduler.resolve_entity(&entity, true).await.unwrap();
        h.scheduler.run_until_idle().await;

        assert_eq!(resolved, entity);
        assert_eq!(importer.loads(), 1);
        assert_eq!(
            watcher.processed(),
            vec![(Term::Iri(entity), Some(pub_iri("np1")))]
        );
    }

    #[tokio::test]
    async fn test_loose_graph_is_adopted_and_dispatched() {
        let h = acquaintance_harness();
        let mut candidate = shared_types::Dataset::new();
        candidate.add(ex("dan"), ex("knows"), ex("erin"), ex("some-graph"));

        let report = h
            .manager
            .publish(&CallerContext::agent(), vec![candidate.into()])
            .unwrap();
        h.scheduler.run_until_idle().await;

        assert_eq!(report.published.len(), 1);
        assert!(holds(&h, "dan", "acquaintance", "erin"));
        assert!(h.store.match_quads(&QuadPattern::any().graph(ex("some-graph"))).unwrap().is_empty());
    }
}
