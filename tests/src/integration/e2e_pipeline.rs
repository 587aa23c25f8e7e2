//! # End-to-End Pipeline
//!
//! A full node as `main` builds it: container from `NodeConfig`, worker
//! pool, periodic tasks and graceful shutdown.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kg_01_nanopub_store::test_utils::{ex, fixed_now};
    use kg_01_nanopub_store::{
        BlobDepot, FileUpload, NanopubStoreApi, Part, UploadKind,
    };
    use kg_02_update_scheduler::test_utils::{RecordingInferencer, StubImporter};
    use kg_02_update_scheduler::{
        CounterStore, ScheduledTask, ServiceRegistry, TaskSchedule, TriggerKind,
    };
    use node_runtime::container::config::parse_rules;
    use node_runtime::{NodeConfig, NodeContainer, NodeRuntime};
    use shared_types::vocab::{np, rdf};
    use shared_types::{CallerContext, Iri, QuadPattern, QuadSource, Term};

    fn publish(container: &NodeContainer, subject: Iri, predicate: Iri, object: Iri) -> Iri {
        let mut nanopub = container.manager.new_nanopub();
        nanopub.add(Part::Assertion, subject, predicate, object);
        let id = nanopub.identifier().clone();
        container
            .manager
            .publish(&CallerContext::agent(), vec![nanopub.into()])
            .unwrap();
        id
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_node_runs_rule_chain_to_fixpoint() {
        let rules = format!(
            "{}=>{},{}=>{}",
            ex("knows").as_str(),
            ex("acquaintance").as_str(),
            ex("acquaintance").as_str(),
            ex("related").as_str()
        );
        let config = NodeConfig {
            rules: parse_rules(&rules).unwrap(),
            ..NodeConfig::default()
        };
        let runtime = NodeRuntime::new(config).unwrap();
        runtime.start();
        let container = runtime.container();

        publish(&container, ex("alice"), ex("knows"), ex("bob"));
        runtime.shutdown().await;

        let store = container.store.as_ref();
        for predicate in ["knows", "acquaintance", "related"] {
            let pattern = QuadPattern::any()
                .subject(ex("alice"))
                .predicate(ex(predicate))
                .object(ex("bob"));
            assert!(QuadSource::contains(store, &pattern).unwrap(), "missing {}", predicate);
        }
        let units = QuadPattern::any()
            .predicate(Iri::new(rdf::TYPE))
            .object(Term::iri(np::NANOPUBLICATION));
        assert_eq!(store.match_quads(&units).unwrap().len(), 3);
        assert!(container.scheduler.queue().is_closed());
    }

    #[tokio::test]
    async fn test_node_file_archive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.storage.file_archive = Some(dir.path().to_path_buf());
        let container = NodeContainer::new(config).unwrap();
        let ctx = CallerContext::agent();
        let entity = ex("report");

        let report = container
            .manager
            .upload_files(
                &ctx,
                &entity,
                vec![FileUpload::new("report.txt", "text/plain", b"quarterly".to_vec())],
                UploadKind::File,
            )
            .unwrap();
        let file_id = &report.files_created[0];

        let (meta, bytes) = container.manager.depot().get(file_id).unwrap();
        assert_eq!(bytes, b"quarterly".to_vec());
        assert_eq!(meta.mime, "text/plain");

        container.manager.delete_file(&ctx, &entity).unwrap();
        assert!(!container.manager.depot().exists(file_id).unwrap());
    }

    #[tokio::test]
    async fn test_periodic_task_imports_before_processing() {
        let importer = Arc::new(StubImporter::new(Some(fixed_now())));
        let watcher = Arc::new(RecordingInferencer::new("watcher", TriggerKind::Unit, "watch"));
        let registry = ServiceRegistry::new()
            .with_importer(importer.clone())
            .with_task(ScheduledTask::new("watching", TaskSchedule::Once, watcher.clone()));
        let container = NodeContainer::with_registry(NodeConfig::default(), registry).unwrap();
        let entity = Iri::new(format!("{}x", StubImporter::PREFIX));
        publish(&container, entity.clone(), ex("watch"), ex("yes"));

        let runtime = NodeRuntime::from_container(container);
        runtime.start();
        runtime.shutdown().await;

        let container = runtime.container();
        assert_eq!(importer.loads(), 1);
        assert_eq!(watcher.processed(), vec![(Term::Iri(entity.clone()), None)]);
        let key = container.scheduler.config().import_key(entity.as_str());
        assert_eq!(container.counters.get(&key), 0);
        assert_eq!(container.scheduler.description(&entity).unwrap().len(), 2);
    }
}
