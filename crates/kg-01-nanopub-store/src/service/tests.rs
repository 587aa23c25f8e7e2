//! # Nanopublication Manager Tests

use super::*;
use crate::InMemoryQuadStore;
use crate::domain::errors::NanopubError;
use crate::domain::nanopub::Part;
use crate::test_utils::{
    assert_triples, derive_from, ex, fixed_now, make_test_manager, revise, test_config, TestHarness,
};
use shared_types::vocab::{dc, prov, rdf, whyis};
use shared_types::{BlankId, CallerContext, Dataset, Literal, Quad, Role, Term};

fn publish_one(h: &TestHarness, triples: &[(&str, &str, &str)]) -> Nanopublication {
    let mut nanopub = h.manager.new_nanopub();
    assert_triples(&mut nanopub, triples);
    h.manager
        .publish(&CallerContext::agent(), vec![nanopub.clone().into()])
        .unwrap();
    nanopub
}

#[test]
fn test_new_nanopub_mints_fresh_identifiers() {
    let h = make_test_manager(test_config());
    let first = h.manager.new_nanopub();
    let second = h.manager.new_nanopub();

    assert_eq!(first.identifier().as_str(), "http://ex.org/pub/np1");
    assert_eq!(second.identifier().as_str(), "http://ex.org/pub/np2");
    assert!(h.store.is_empty());
}

#[test]
fn test_publish_then_get_round_trip() {
    let h = make_test_manager(test_config());
    let nanopub = publish_one(&h, &[("alice", "knows", "bob")]);
    let id = nanopub.identifier().clone();

    assert!(h.manager.is_current(&id).unwrap());
    assert_eq!(h.listener.seen(), vec![id.clone()]);

    let fetched = h.manager.get(&id, None).unwrap();
    assert_eq!(fetched.assertion(), nanopub.assertion());

    let assertion = Term::Iri(fetched.assertion_id().clone());
    let created = fetched.objects(Part::PublicationInfo, &assertion, &Iri::new(dc::CREATED));
    assert_eq!(created, vec![Term::Literal(Literal::date_time(fixed_now()))]);
}

#[test]
fn test_get_into_existing_dataset() {
    let h = make_test_manager(test_config());
    let nanopub = publish_one(&h, &[("alice", "knows", "bob")]);

    let mut target = Dataset::new();
    target.insert(Quad::new(ex("x"), ex("p"), ex("y"), ex("other")));
    let fetched = h.manager.get(nanopub.identifier(), Some(target)).unwrap();

    assert!(fetched.dataset().has_graph(&Term::Iri(ex("other"))));
    assert!(fetched.dataset().has_graph(&Term::Iri(nanopub.assertion_id().clone())));
}

#[test]
fn test_revision_retires_prior_and_marks_modified() {
    let h = make_test_manager(test_config());
    let original = publish_one(&h, &[("alice", "age", "thirty")]);

    let mut revision = h.manager.new_nanopub();
    assert_triples(&mut revision, &[("alice", "age", "thirtyone")]);
    revise(&mut revision, &original);
    h.clock.advance(chrono::Duration::seconds(60));

    let report = h
        .manager
        .publish(&CallerContext::agent(), vec![revision.clone().into()])
        .unwrap();

    assert_eq!(report.retired, vec![original.identifier().clone()]);
    assert!(!h.manager.is_current(original.identifier()).unwrap());
    assert!(h.manager.is_current(revision.identifier()).unwrap());

    let fetched = h.manager.get(revision.identifier(), None).unwrap();
    let assertion = Term::Iri(fetched.assertion_id().clone());
    let later = Term::Literal(Literal::date_time(fixed_now() + chrono::Duration::seconds(60)));
    assert_eq!(
        fetched.objects(Part::PublicationInfo, &assertion, &Iri::new(dc::MODIFIED)),
        vec![later.clone()]
    );
    assert!(fetched
        .objects(Part::PublicationInfo, &assertion, &Iri::new(dc::CREATED))
        .is_empty());
    assert_eq!(
        fetched.objects(
            Part::PublicationInfo,
            &Term::Iri(original.identifier().clone()),
            &Iri::new(prov::INVALIDATED_AT_TIME)
        ),
        vec![later]
    );
}

#[test]
fn test_unauthorized_revision_changes_nothing() {
    let h = make_test_manager(test_config());
    let original = publish_one(&h, &[("alice", "age", "thirty")]);
    let quads_before = h.store.len();

    let mut revision = h.manager.new_nanopub();
    revision.add(Part::Assertion, ex("logo"), Iri::new(whyis::HAS_CONTENT), Literal::string("data:,hi"));
    revise(&mut revision, &original);

    let err = h
        .manager
        .publish(&CallerContext::anonymous(), vec![revision.into()])
        .unwrap_err();

    assert!(matches!(err, NanopubError::Unauthorized { .. }));
    assert!(h.manager.is_current(original.identifier()).unwrap());
    assert_eq!(h.store.len(), quads_before);
    assert!(h.depot.is_empty());
    assert_eq!(h.listener.seen().len(), 1);
}

#[test]
fn test_cascading_retirement() {
    let h = make_test_manager(test_config());
    let a = publish_one(&h, &[("a", "p", "b")]);

    let mut b = h.manager.new_nanopub();
    assert_triples(&mut b, &[("b", "p", "c")]);
    derive_from(&mut b, &a);
    let mut c = h.manager.new_nanopub();
    assert_triples(&mut c, &[("c", "p", "d")]);
    derive_from(&mut c, &b);
    h.manager
        .publish(&CallerContext::agent(), vec![b.clone().into(), c.clone().into()])
        .unwrap();
    let unrelated = publish_one(&h, &[("x", "p", "y")]);

    let report = h
        .manager
        .retire(&CallerContext::agent(), &[a.identifier().clone()])
        .unwrap();

    assert_eq!(
        report.retired,
        vec![a.identifier().clone(), b.identifier().clone(), c.identifier().clone()]
    );
    for unit in [&a, &b, &c] {
        assert!(!h.manager.is_current(unit.identifier()).unwrap());
        for graph in unit.graph_ids() {
            assert!(!h.store.snapshot().has_graph(&Term::Iri(graph.clone())));
        }
    }
    assert!(h.manager.is_current(unrelated.identifier()).unwrap());
}

#[test]
fn test_retire_is_idempotent() {
    let h = make_test_manager(test_config());
    let a = publish_one(&h, &[("a", "p", "b")]);
    let ctx = CallerContext::agent();

    let first = h.manager.retire(&ctx, &[a.identifier().clone()]).unwrap();
    let snapshot = h.store.snapshot();
    let second = h.manager.retire(&ctx, &[a.identifier().clone()]).unwrap();

    assert_eq!(first.retired, vec![a.identifier().clone()]);
    assert!(second.retired.is_empty());
    assert_eq!(h.store.snapshot(), snapshot);
}

#[test]
fn test_archive_units_survive_when_configured() {
    let mut config = test_config();
    config.delete_archive_nanopubs = false;
    let h = make_test_manager(config);
    let a = publish_one(&h, &[("a", "p", "b")]);

    let mut archive = h.manager.new_nanopub();
    assert_triples(&mut archive, &[("b", "p", "c")]);
    derive_from(&mut archive, &a);
    let head = archive.head();
    archive.add_head(head, Iri::new(rdf::TYPE), Term::iri(whyis::FRIR_NANOPUBLICATION));
    h.manager
        .publish(&CallerContext::agent(), vec![archive.clone().into()])
        .unwrap();

    let report = h
        .manager
        .retire(&CallerContext::agent(), &[a.identifier().clone()])
        .unwrap();

    assert_eq!(report.retired, vec![a.identifier().clone()]);
    assert!(h.manager.is_current(archive.identifier()).unwrap());
}

#[test]
fn test_retire_authorization() {
    let h = make_test_manager(test_config());
    let alice = ex("user/alice");
    let mut nanopub = h.manager.new_nanopub();
    assert_triples(&mut nanopub, &[("a", "p", "b")]);
    let assertion = Term::Iri(nanopub.assertion_id().clone());
    nanopub.add(Part::PublicationInfo, assertion, Iri::new(dc::CONTRIBUTOR), alice.clone());
    h.manager
        .publish(&CallerContext::agent(), vec![nanopub.clone().into()])
        .unwrap();
    let id = nanopub.identifier().clone();

    let anonymous = h.manager.retire(&CallerContext::anonymous(), &[id.clone()]);
    assert!(matches!(anonymous, Err(NanopubError::Unauthorized { .. })));

    let stranger = CallerContext::user(ex("user/bob"), vec![Role::Member]);
    assert!(h.manager.retire(&stranger, &[id.clone()]).is_err());
    assert!(h.manager.is_current(&id).unwrap());

    let owner = CallerContext::user(alice, vec![]);
    let report = h.manager.retire(&owner, &[id.clone()]).unwrap();
    assert_eq!(report.retired, vec![id]);
}

#[test]
fn test_editor_role_may_retire() {
    let h = make_test_manager(test_config());
    let a = publish_one(&h, &[("a", "p", "b")]);
    let editor = CallerContext::user(ex("user/carol"), vec![Role::Editor]);

    let report = h.manager.retire(&editor, &[a.identifier().clone()]).unwrap();
    assert_eq!(report.retired.len(), 1);
}

#[test]
fn test_loose_graph_adopted_on_publish() {
    let h = make_test_manager(test_config());
    let mut candidate = Dataset::new();
    candidate.insert(Quad::new(ex("alice"), ex("knows"), ex("bob"), ex("loose")));

    let report = h
        .manager
        .publish(&CallerContext::agent(), vec![candidate.into()])
        .unwrap();

    assert_eq!(report.published.len(), 1);
    let id = &report.published[0];
    let fetched = h.manager.get(id, None).unwrap();
    let statement = Quad::new(
        ex("alice"),
        ex("knows"),
        ex("bob"),
        fetched.assertion_id().clone(),
    );
    assert!(fetched.dataset().contains(&statement));
    assert!(!h.store.snapshot().has_graph(&Term::Iri(ex("loose"))));
}

#[test]
fn test_republish_same_identifier_replaces_content() {
    let h = make_test_manager(test_config());
    let first = publish_one(&h, &[("a", "p", "b")]);

    let mut second = Nanopublication::empty(first.identifier().clone());
    assert_triples(&mut second, &[("a", "p", "c")]);
    let report = h
        .manager
        .publish(&CallerContext::agent(), vec![second.into()])
        .unwrap();

    assert_eq!(report.retired, vec![first.identifier().clone()]);
    let fetched = h.manager.get(first.identifier(), None).unwrap();
    let objects = fetched.objects(Part::Assertion, &Term::Iri(ex("a")), &ex("p"));
    assert_eq!(objects, vec![Term::Iri(ex("c"))]);
}

#[test]
fn test_bnode_rewrite_round_trip() {
    let mut config = test_config();
    config.bnode_rewrite = true;
    let h = make_test_manager(config);

    let mut nanopub = h.manager.new_nanopub();
    nanopub.add(Part::Assertion, BlankId::new("x"), ex("name"), Literal::string("anon"));
    h.manager
        .publish(&CallerContext::agent(), vec![nanopub.clone().into()])
        .unwrap();

    let stored = h.store.snapshot();
    assert!(!stored.iter().any(|q| q.subject.is_blank() || q.object.is_blank()));

    let fetched = h.manager.get(nanopub.identifier(), None).unwrap();
    let subjects = fetched.subjects(Part::Assertion, &ex("name"), &Term::string("anon"));
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].is_blank());
}

#[test]
fn test_inline_content_extracted_to_depot() {
    let h = make_test_manager(test_config());
    let mut nanopub = h.manager.new_nanopub();
    nanopub.add(
        Part::Assertion,
        ex("logo"),
        Iri::new(whyis::HAS_CONTENT),
        Literal::string("data:text/plain;base64,aGVsbG8="),
    );

    let report = h
        .manager
        .publish(&CallerContext::agent(), vec![nanopub.clone().into()])
        .unwrap();

    assert_eq!(report.files_created.len(), 1);
    let (meta, bytes) = h.depot.get(&report.files_created[0]).unwrap();
    assert_eq!(bytes, b"hello".to_vec());
    assert_eq!(meta.mime, "text/plain");
    assert_eq!(meta.filename, "logo");

    let fetched = h.manager.get(nanopub.identifier(), None).unwrap();
    let logo = Term::Iri(ex("logo"));
    assert!(fetched
        .objects(Part::Assertion, &logo, &Iri::new(whyis::HAS_CONTENT))
        .is_empty());
    assert_eq!(
        fetched.objects(Part::Assertion, &logo, &Iri::new(whyis::HAS_FILE_ID)),
        vec![Term::string(&report.files_created[0])]
    );
}

#[test]
fn test_invalid_data_url_aborts_batch() {
    let h = make_test_manager(test_config());
    let mut nanopub = h.manager.new_nanopub();
    nanopub.add(
        Part::Assertion,
        ex("logo"),
        Iri::new(whyis::HAS_CONTENT),
        Literal::string("not a data url"),
    );

    let err = h
        .manager
        .publish(&CallerContext::agent(), vec![nanopub.into()])
        .unwrap_err();

    assert!(matches!(err, NanopubError::InvalidDataUrl { .. }));
    assert!(h.store.is_empty());
    assert!(h.listener.seen().is_empty());
}

#[test]
fn test_reupload_supersedes_and_deletes_old_blob() {
    let h = make_test_manager(test_config());
    let ctx = CallerContext::agent();
    let logo = ex("logo");

    let first = h
        .manager
        .upload_files(&ctx, &logo, vec![FileUpload::new("logo.png", "image/png", vec![1, 2, 3])], UploadKind::File)
        .unwrap();
    let second = h
        .manager
        .upload_files(&ctx, &logo, vec![FileUpload::new("logo.png", "image/png", vec![4, 5, 6])], UploadKind::File)
        .unwrap();

    assert_eq!(second.retired, vec![first.published[0].clone()]);
    assert!(!h.depot.exists(&first.files_created[0]).unwrap());
    assert!(h.depot.exists(&second.files_created[0]).unwrap());
    assert!(!h.manager.is_current(&first.published[0]).unwrap());

    let fetched = h.manager.get(&second.published[0], None).unwrap();
    let assertion = Term::Iri(fetched.assertion_id().clone());
    assert_eq!(
        fetched
            .objects(Part::PublicationInfo, &assertion, &Iri::new(dc::MODIFIED))
            .len(),
        1
    );
}

#[test]
fn test_delete_file_retires_attachment() {
    let h = make_test_manager(test_config());
    let ctx = CallerContext::agent();
    let logo = ex("logo");
    let uploaded = h
        .manager
        .upload_files(&ctx, &logo, vec![FileUpload::new("a.txt", "text/plain", b"a".to_vec())], UploadKind::File)
        .unwrap();

    let report = h.manager.delete_file(&ctx, &logo).unwrap();

    assert_eq!(report.retired, uploaded.published);
    assert_eq!(report.deleted_files, uploaded.files_created);
    assert!(h.depot.is_empty());
}

#[test]
fn test_upload_collection_links_parts() {
    let h = make_test_manager(test_config());
    let dir = ex("dir");
    let report = h
        .manager
        .upload_files(
            &CallerContext::agent(),
            &dir,
            vec![
                FileUpload::new("a.txt", "text/plain", b"a".to_vec()),
                FileUpload::new("b.txt", "text/plain", b"b".to_vec()),
                FileUpload::new("", "text/plain", Vec::new()),
            ],
            UploadKind::Collection,
        )
        .unwrap();

    assert_eq!(report.files_created.len(), 2);
    let fetched = h.manager.get(&report.published[0], None).unwrap();
    let parts = fetched.objects(Part::Assertion, &Term::Iri(dir), &Iri::new(dc::HAS_PART));
    assert!(parts.contains(&Term::Iri(ex("dir/a.txt"))));
    assert!(parts.contains(&Term::Iri(ex("dir/b.txt"))));
}

#[test]
fn test_empty_upload_publishes_nothing() {
    let h = make_test_manager(test_config());
    let report = h
        .manager
        .upload_files(&CallerContext::agent(), &ex("dir"), Vec::new(), UploadKind::Dataset)
        .unwrap();

    assert!(report.published.is_empty());
    assert!(h.store.is_empty());
}

#[test]
fn test_load_dir_keeps_staging_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.load_dir = Some(dir.path().to_path_buf());
    let h = make_test_manager(config);

    publish_one(&h, &[("a", "p", "b")]);

    let staged: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(staged.len(), 1);
    assert_eq!(
        staged[0].path().extension().and_then(|e| e.to_str()),
        Some("nq")
    );
}

#[test]
fn test_listener_notified_in_submission_order() {
    let h = make_test_manager(test_config());
    let mut first = h.manager.new_nanopub();
    assert_triples(&mut first, &[("a", "p", "b")]);
    let mut second = h.manager.new_nanopub();
    assert_triples(&mut second, &[("c", "p", "d")]);

    h.manager
        .publish(&CallerContext::agent(), vec![second.clone().into(), first.clone().into()])
        .unwrap();

    assert_eq!(
        h.listener.seen(),
        vec![second.identifier().clone(), first.identifier().clone()]
    );
}

#[test]
fn test_revision_with_reserved_characters_in_iri_publishes() {
    let h = make_test_manager(test_config());
    let original = publish_one(&h, &[("alice", "knows", "bob")]);

    let mut revision = h.manager.new_nanopub();
    let odd = Iri::new("http://ex.org/bob smith");
    revision.add(Part::Assertion, ex("alice"), ex("knows"), odd.clone());
    revise(&mut revision, &original);

    let report = h
        .manager
        .publish(&CallerContext::agent(), vec![revision.clone().into()])
        .unwrap();

    assert_eq!(report.retired, vec![original.identifier().clone()]);
    let fetched = h.manager.get(revision.identifier(), None).unwrap();
    assert_eq!(
        fetched.objects(Part::Assertion, &Term::Iri(ex("alice")), &ex("knows")),
        vec![Term::Iri(odd)]
    );
}

/// Store whose loads always fail after the staged batch is handed over.
struct RejectingStore(InMemoryQuadStore);

impl shared_types::QuadSource for RejectingStore {
    fn match_quads(
        &self,
        pattern: &shared_types::QuadPattern,
    ) -> Result<Vec<Quad>, shared_types::SourceError> {
        shared_types::QuadSource::match_quads(&self.0, pattern)
    }
}

impl QuadStore for RejectingStore {
    fn bulk_load(&self, _reader: &mut dyn std::io::BufRead) -> Result<usize, crate::StoreError> {
        Err(crate::StoreError::Backend("load rejected".to_string()))
    }

    fn remove_graph(&self, graph: &Term) -> Result<usize, crate::StoreError> {
        self.0.remove_graph(graph)
    }

    fn replace(
        &self,
        _graphs: &[Term],
        _reader: &mut dyn std::io::BufRead,
    ) -> Result<usize, crate::StoreError> {
        Err(crate::StoreError::Backend("load rejected".to_string()))
    }

    fn commit(&self) -> Result<(), crate::StoreError> {
        self.0.commit()
    }
}

#[test]
fn test_failed_load_keeps_revised_unit_and_discards_blobs() {
    let h = make_test_manager(test_config());
    let original = publish_one(&h, &[("alice", "age", "thirty")]);

    let store = Arc::new(RejectingStore(InMemoryQuadStore::new()));
    store.0.insert_all(h.store.snapshot());
    let depot = Arc::new(crate::InMemoryBlobDepot::new());
    let listener = Arc::new(crate::RecordingListener::new());
    let manager = NanopubManager::new(
        NanopubDependencies {
            store: store.clone(),
            depot: depot.clone(),
            allocator: crate::SequentialAllocator::new(),
            time_source: h.clock.clone(),
            listener: listener.clone(),
        },
        test_config(),
    );

    let mut revision = Nanopublication::empty(ex("pub/revision"));
    revision.add(
        Part::Assertion,
        ex("alice"),
        Iri::new(whyis::HAS_CONTENT),
        Literal::string("data:text/plain;base64,aGVsbG8="),
    );
    revise(&mut revision, &original);

    let err = manager
        .publish(&CallerContext::agent(), vec![revision.into()])
        .unwrap_err();

    assert!(matches!(err, NanopubError::Store(crate::StoreError::Backend(_))));
    assert!(manager.is_current(original.identifier()).unwrap());
    assert_eq!(store.0.len(), h.store.len());
    assert!(depot.is_empty());
    assert!(listener.seen().is_empty());
}

#[test]
fn test_unauthorized_attachment_later_in_batch_stores_no_blobs() {
    let h = make_test_manager(test_config());
    let owner = CallerContext::user(ex("owner"), vec![Role::Member]);
    h.manager
        .upload_files(&owner, &ex("b"), vec![FileUpload::new("b.txt", "text/plain", vec![1])], UploadKind::File)
        .unwrap();
    assert_eq!(h.depot.len(), 1);
    let quads_before = h.store.len();

    let member = CallerContext::user(ex("member"), vec![Role::Member]);
    let mut first = h.manager.new_nanopub();
    first.add(Part::Assertion, ex("a"), Iri::new(whyis::HAS_CONTENT), Literal::string("data:,one"));
    let mut second = h.manager.new_nanopub();
    second.add(Part::Assertion, ex("b"), Iri::new(whyis::HAS_CONTENT), Literal::string("data:,two"));

    let err = h
        .manager
        .publish(&member, vec![first.into(), second.into()])
        .unwrap_err();

    assert!(matches!(err, NanopubError::Unauthorized { .. }));
    assert_eq!(h.depot.len(), 1);
    assert_eq!(h.store.len(), quads_before);
}

#[test]
fn test_invalid_data_url_after_valid_one_stores_no_blobs() {
    let h = make_test_manager(test_config());
    let mut nanopub = h.manager.new_nanopub();
    nanopub.add(Part::Assertion, ex("a"), Iri::new(whyis::HAS_CONTENT), Literal::string("data:,fine"));
    nanopub.add(Part::Assertion, ex("z"), Iri::new(whyis::HAS_CONTENT), Literal::string("not a data url"));

    let err = h
        .manager
        .publish(&CallerContext::agent(), vec![nanopub.into()])
        .unwrap_err();

    match err {
        NanopubError::InvalidDataUrl { entity, .. } => assert_eq!(entity, "http://ex.org/z"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.depot.is_empty());
    assert!(h.store.is_empty());
}

#[test]
fn test_head_linking_any_part_graph_is_replaced() {
    let h = make_test_manager(test_config());
    let mut nanopub = h.manager.new_nanopub();
    assert_triples(&mut nanopub, &[("alice", "knows", "bob")]);

    // a stale head that claims the new assertion graph as its provenance
    let stale = ex("pub/stale");
    h.store.insert_all(vec![
        Quad::new(stale.clone(), Iri::new(rdf::TYPE), Term::iri(shared_types::vocab::np::NANOPUBLICATION), stale.clone()),
        Quad::new(stale.clone(), Iri::new(shared_types::vocab::np::HAS_PROVENANCE), nanopub.assertion_id().clone(), stale.clone()),
    ]);

    let report = h
        .manager
        .publish(&CallerContext::agent(), vec![nanopub.clone().into()])
        .unwrap();

    assert_eq!(report.retired, vec![stale.clone()]);
    assert!(!h.manager.is_current(&stale).unwrap());
    assert!(h.manager.is_current(nanopub.identifier()).unwrap());
}
