//! End-to-end command flows over the in-memory backend.
//!
//! Covers the persist-then-publish protocol, the error taxonomy at the
//! handler boundary, and the merge operation including its rollback
//! property (exercised through a snapshotting unit-of-work fixture, since
//! the production in-memory unit of work is deliberately non-transactional).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DocumentId, KnowledgeBaseId};
use domain::{
    Document, DocumentRepository, DomainError, ErrorKind, KnowledgeBase, KnowledgeBaseRepository,
    KnowledgeService, TxFuture, TxScope, UnitOfWork,
};
use event_bus::{DeliveryError, EventBus, EventHandler, SyncEventBus};
use persistence::{
    MemoryDocumentRepository, MemoryKnowledgeBaseRepository, MemoryStore, MemoryUnitOfWork,
};

use application::{
    AddDocument, AddDocumentHandler, CreateKnowledgeBase, CreateKnowledgeBaseHandler,
    DeleteKnowledgeBase, DeleteKnowledgeBaseHandler, GetKnowledgeBase, ListDocuments,
    MergeKnowledgeBases, MergeKnowledgeBasesHandler, RemoveDocument, RemoveDocumentHandler,
    UpdateKnowledgeBase, UpdateKnowledgeBaseHandler,
};

/// Records (event name, aggregate id) pairs in delivery order.
struct Recorder {
    seen: Arc<tokio::sync::Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl EventHandler for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    async fn handle(&self, event: &domain::DomainEvent) -> Result<(), DeliveryError> {
        self.seen
            .lock()
            .await
            .push((event.event_name().to_owned(), event.aggregate_id().to_string()));
        Ok(())
    }
}

/// Always fails; used to show delivery failures never re-fail a command.
struct Exploding;

#[async_trait]
impl EventHandler for Exploding {
    fn name(&self) -> &'static str {
        "exploding"
    }

    async fn handle(&self, event: &domain::DomainEvent) -> Result<(), DeliveryError> {
        Err(DeliveryError::handler("exploding", event.event_name(), "boom"))
    }
}

struct Fixture {
    uow: Arc<MemoryUnitOfWork>,
    kb_repo: Arc<dyn KnowledgeBaseRepository>,
    doc_repo: Arc<dyn DocumentRepository>,
    bus: Arc<SyncEventBus>,
    seen: Arc<tokio::sync::Mutex<Vec<(String, String)>>>,
}

fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let kb_repo: Arc<dyn KnowledgeBaseRepository> =
        Arc::new(MemoryKnowledgeBaseRepository::new(store.clone()));
    let doc_repo: Arc<dyn DocumentRepository> =
        Arc::new(MemoryDocumentRepository::new(store.clone()));
    let bus = Arc::new(SyncEventBus::new());
    let seen = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    bus.subscribe_all(Arc::new(Recorder { seen: seen.clone() }));

    Fixture {
        uow: Arc::new(MemoryUnitOfWork::new()),
        kb_repo,
        doc_repo,
        bus,
        seen,
    }
}

impl Fixture {
    fn service(&self) -> Arc<KnowledgeService> {
        Arc::new(KnowledgeService::new(
            self.kb_repo.clone(),
            self.doc_repo.clone(),
        ))
    }

    fn create_handler(&self) -> CreateKnowledgeBaseHandler<MemoryUnitOfWork> {
        CreateKnowledgeBaseHandler::new(self.uow.clone(), self.service(), self.bus.clone())
    }

    fn add_handler(&self) -> AddDocumentHandler<MemoryUnitOfWork> {
        AddDocumentHandler::new(
            self.uow.clone(),
            self.kb_repo.clone(),
            self.doc_repo.clone(),
            self.bus.clone(),
        )
    }

    async fn create(&self, name: &str) -> application::KnowledgeBaseDto {
        self.create_handler()
            .handle(CreateKnowledgeBase {
                name: name.to_owned(),
                description: String::new(),
            })
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn create_persists_then_publishes() {
    let fx = fixture();
    let dto = fx.create("team notes").await;

    let loaded = GetKnowledgeBase::new(fx.kb_repo.clone())
        .handle(&dto.id, false)
        .await
        .unwrap();
    assert_eq!(loaded.name, "team notes");

    let seen = fx.seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "knowledge_base.created");
    assert_eq!(seen[0].1, dto.id);
}

#[tokio::test]
async fn create_duplicate_name_conflicts_and_publishes_nothing_new() {
    let fx = fixture();
    fx.create("dup").await;

    let err = fx
        .create_handler()
        .handle(CreateKnowledgeBase {
            name: "dup".into(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(fx.seen.lock().await.len(), 1);
}

#[tokio::test]
async fn create_empty_name_fails_validation_without_side_effects() {
    let fx = fixture();
    let err = fx
        .create_handler()
        .handle(CreateKnowledgeBase {
            name: String::new(),
            description: "d".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(fx.seen.lock().await.is_empty());
}

#[tokio::test]
async fn document_lifecycle_publishes_events_in_call_order() {
    let fx = fixture();
    let kb = fx.create("kb").await;

    let doc = fx
        .add_handler()
        .handle(AddDocument {
            knowledge_base_id: kb.id.clone(),
            title: "intro".into(),
            content: "body".into(),
            tags: vec!["rust".into()],
        })
        .await
        .unwrap();
    assert_eq!(doc.title, "intro");
    assert_eq!(doc.knowledge_base_id, kb.id);

    RemoveDocumentHandler::new(
        fx.uow.clone(),
        fx.kb_repo.clone(),
        fx.doc_repo.clone(),
        fx.bus.clone(),
    )
    .handle(RemoveDocument {
        knowledge_base_id: kb.id.clone(),
        document_id: doc.id.clone(),
    })
    .await
    .unwrap();

    let names: Vec<String> = fx.seen.lock().await.iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(
        names,
        vec![
            "knowledge_base.created".to_owned(),
            "document.added".to_owned(),
            "document.removed".to_owned(),
        ]
    );

    let docs = ListDocuments::new(fx.kb_repo.clone(), fx.doc_repo.clone())
        .handle(&kb.id)
        .await
        .unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn update_missing_knowledge_base_is_not_found() {
    let fx = fixture();
    let err = UpdateKnowledgeBaseHandler::new(fx.uow.clone(), fx.kb_repo.clone(), fx.bus.clone())
        .handle(UpdateKnowledgeBase {
            id: KnowledgeBaseId::new().to_string(),
            name: "n".into(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn malformed_id_fails_validation_before_storage() {
    let fx = fixture();
    let err = UpdateKnowledgeBaseHandler::new(fx.uow.clone(), fx.kb_repo.clone(), fx.bus.clone())
        .handle(UpdateKnowledgeBase {
            id: "definitely-not-a-uuid".into(),
            name: "n".into(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn remove_missing_document_is_not_found_and_publishes_nothing_new() {
    let fx = fixture();
    let kb = fx.create("kb").await;

    let err = RemoveDocumentHandler::new(
        fx.uow.clone(),
        fx.kb_repo.clone(),
        fx.doc_repo.clone(),
        fx.bus.clone(),
    )
    .handle(RemoveDocument {
        knowledge_base_id: kb.id.clone(),
        document_id: DocumentId::new().to_string(),
    })
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(fx.seen.lock().await.len(), 1); // only the created event
}

#[tokio::test]
async fn delete_publishes_deleted_event_and_removes_documents() {
    let fx = fixture();
    let kb = fx.create("kb").await;
    fx.add_handler()
        .handle(AddDocument {
            knowledge_base_id: kb.id.clone(),
            title: "doomed".into(),
            content: "x".into(),
            tags: vec![],
        })
        .await
        .unwrap();

    DeleteKnowledgeBaseHandler::new(
        fx.uow.clone(),
        fx.kb_repo.clone(),
        fx.service(),
        fx.bus.clone(),
    )
    .handle(DeleteKnowledgeBase { id: kb.id.clone() })
    .await
    .unwrap();

    let err = GetKnowledgeBase::new(fx.kb_repo.clone())
        .handle(&kb.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let names: Vec<String> = fx.seen.lock().await.iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(
        names,
        vec![
            "knowledge_base.created".to_owned(),
            "document.added".to_owned(),
            "knowledge_base.deleted".to_owned(),
        ]
    );
}

#[tokio::test]
async fn delivery_failure_never_fails_the_command() {
    let fx = fixture();
    fx.bus.subscribe_all(Arc::new(Exploding));

    let dto = fx.create("still works").await;
    assert_eq!(dto.name, "still works");
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn merge_moves_documents_and_deletes_source() {
    let fx = fixture();
    let source = fx.create("source").await;
    let target = fx.create("target").await;

    let mut source_doc_ids = Vec::new();
    for i in 0..3 {
        let doc = fx
            .add_handler()
            .handle(AddDocument {
                knowledge_base_id: source.id.clone(),
                title: format!("doc-{i}"),
                content: format!("content-{i}"),
                tags: vec![format!("tag-{i}")],
            })
            .await
            .unwrap();
        source_doc_ids.push(doc.id);
    }
    fx.add_handler()
        .handle(AddDocument {
            knowledge_base_id: target.id.clone(),
            title: "existing".into(),
            content: "kept".into(),
            tags: vec![],
        })
        .await
        .unwrap();

    let result =
        MergeKnowledgeBasesHandler::new(fx.uow.clone(), fx.kb_repo.clone(), fx.doc_repo.clone())
            .handle(MergeKnowledgeBases {
                source_id: source.id.clone(),
                target_id: target.id.clone(),
            })
            .await
            .unwrap();

    assert_eq!(result.source_id, source.id);
    assert_eq!(result.source_name, "source");
    assert_eq!(result.target_name, "target");
    assert_eq!(result.documents_moved, 3);
    assert!(result.source_deleted);

    // Source is gone.
    let err = GetKnowledgeBase::new(fx.kb_repo.clone())
        .handle(&source.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Target owns its original document plus three recreated ones with
    // fresh ids but identical content.
    let docs = ListDocuments::new(fx.kb_repo.clone(), fx.doc_repo.clone())
        .handle(&target.id)
        .await
        .unwrap();
    assert_eq!(docs.len(), 4);

    let mut titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["doc-0", "doc-1", "doc-2", "existing"]);

    for doc in &docs {
        assert!(!source_doc_ids.contains(&doc.id), "document identity must not survive a merge");
    }
}

/// Counts every repository call; used to show self-merge fails before any
/// repository is touched.
struct CountingKbRepo {
    inner: Arc<dyn KnowledgeBaseRepository>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl KnowledgeBaseRepository for CountingKbRepo {
    async fn save(&self, scope: &mut TxScope, kb: &KnowledgeBase) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.save(scope, kb).await
    }

    async fn find_by_id(
        &self,
        scope: &mut TxScope,
        id: KnowledgeBaseId,
    ) -> Result<Option<KnowledgeBase>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(scope, id).await
    }

    async fn find_all(&self, scope: &mut TxScope) -> Result<Vec<KnowledgeBase>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all(scope).await
    }

    async fn delete(&self, scope: &mut TxScope, id: KnowledgeBaseId) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(scope, id).await
    }

    async fn exists_by_name(&self, scope: &mut TxScope, name: &str) -> Result<bool, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists_by_name(scope, name).await
    }
}

#[tokio::test]
async fn merge_with_itself_fails_before_any_repository_call() {
    let fx = fixture();
    let kb = fx.create("solo").await;

    let calls = Arc::new(AtomicUsize::new(0));
    let counting: Arc<dyn KnowledgeBaseRepository> = Arc::new(CountingKbRepo {
        inner: fx.kb_repo.clone(),
        calls: calls.clone(),
    });

    let err = MergeKnowledgeBasesHandler::new(fx.uow.clone(), counting, fx.doc_repo.clone())
        .handle(MergeKnowledgeBases {
            source_id: kb.id.clone(),
            target_id: kb.id.clone(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::MergeSelf));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn merge_with_missing_aggregates_is_not_found() {
    let fx = fixture();
    let existing = fx.create("existing").await;
    let handler =
        MergeKnowledgeBasesHandler::new(fx.uow.clone(), fx.kb_repo.clone(), fx.doc_repo.clone());

    let err = handler
        .handle(MergeKnowledgeBases {
            source_id: KnowledgeBaseId::new().to_string(),
            target_id: existing.id.clone(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = handler
        .handle(MergeKnowledgeBases {
            source_id: existing.id.clone(),
            target_id: KnowledgeBaseId::new().to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Merge rollback property, via a snapshotting unit of work
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct KbRec {
    id: KnowledgeBaseId,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
struct State {
    kbs: HashMap<KnowledgeBaseId, KbRec>,
    docs: HashMap<DocumentId, Document>,
}

impl State {
    fn docs_of(&self, kb_id: KnowledgeBaseId) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .docs
            .values()
            .filter(|d| d.knowledge_base_id() == kb_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(&b.id().as_uuid()))
        });
        docs
    }

    fn rebuild(&self, rec: &KbRec) -> KnowledgeBase {
        KnowledgeBase::reconstruct(
            rec.id,
            rec.name.clone(),
            rec.description.clone(),
            self.docs_of(rec.id),
            rec.created_at,
            rec.updated_at,
        )
    }
}

#[derive(Default)]
struct TxStore {
    state: tokio::sync::Mutex<State>,
}

struct TxKbRepo(Arc<TxStore>);

#[async_trait]
impl KnowledgeBaseRepository for TxKbRepo {
    async fn save(&self, _scope: &mut TxScope, kb: &KnowledgeBase) -> Result<(), DomainError> {
        self.0.state.lock().await.kbs.insert(
            kb.id(),
            KbRec {
                id: kb.id(),
                name: kb.name().to_owned(),
                description: kb.description().to_owned(),
                created_at: kb.created_at(),
                updated_at: kb.updated_at(),
            },
        );
        Ok(())
    }

    async fn find_by_id(
        &self,
        _scope: &mut TxScope,
        id: KnowledgeBaseId,
    ) -> Result<Option<KnowledgeBase>, DomainError> {
        let state = self.0.state.lock().await;
        Ok(state.kbs.get(&id).map(|rec| state.rebuild(rec)))
    }

    async fn find_all(&self, _scope: &mut TxScope) -> Result<Vec<KnowledgeBase>, DomainError> {
        let state = self.0.state.lock().await;
        Ok(state.kbs.values().map(|rec| state.rebuild(rec)).collect())
    }

    async fn delete(&self, _scope: &mut TxScope, id: KnowledgeBaseId) -> Result<(), DomainError> {
        self.0.state.lock().await.kbs.remove(&id);
        Ok(())
    }

    async fn exists_by_name(&self, _scope: &mut TxScope, name: &str) -> Result<bool, DomainError> {
        Ok(self
            .0
            .state
            .lock()
            .await
            .kbs
            .values()
            .any(|rec| rec.name == name))
    }
}

struct TxDocRepo(Arc<TxStore>);

#[async_trait]
impl DocumentRepository for TxDocRepo {
    async fn save(&self, _scope: &mut TxScope, doc: &Document) -> Result<(), DomainError> {
        self.0.state.lock().await.docs.insert(doc.id(), doc.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        _scope: &mut TxScope,
        id: DocumentId,
    ) -> Result<Option<Document>, DomainError> {
        Ok(self.0.state.lock().await.docs.get(&id).cloned())
    }

    async fn find_by_knowledge_base(
        &self,
        _scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<Vec<Document>, DomainError> {
        Ok(self.0.state.lock().await.docs_of(kb_id))
    }

    async fn delete(&self, _scope: &mut TxScope, id: DocumentId) -> Result<(), DomainError> {
        self.0.state.lock().await.docs.remove(&id);
        Ok(())
    }

    async fn delete_by_knowledge_base(
        &self,
        _scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<(), DomainError> {
        self.0
            .state
            .lock()
            .await
            .docs
            .retain(|_, d| d.knowledge_base_id() != kb_id);
        Ok(())
    }

    async fn search_by_tags(
        &self,
        _scope: &mut TxScope,
        tags: &[String],
    ) -> Result<Vec<Document>, DomainError> {
        Ok(self
            .0
            .state
            .lock()
            .await
            .docs
            .values()
            .filter(|d| d.tags().iter().any(|t| tags.contains(t)))
            .cloned()
            .collect())
    }
}

/// Unit of work with snapshot/restore semantics over [`TxStore`], giving the
/// in-memory fixture real rollback behavior.
struct SnapshotUow(Arc<TxStore>);

#[async_trait]
impl UnitOfWork for SnapshotUow {
    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut TxScope) -> TxFuture<'s, T> + Send + 'static,
    {
        let snapshot = self.0.state.lock().await.clone();
        let mut scope = TxScope::ambient();
        match work(&mut scope).await {
            Ok(value) => Ok(value),
            Err(err) => {
                *self.0.state.lock().await = snapshot;
                Err(err)
            }
        }
    }
}

/// Delegates to the inner repository but fails the n-th save.
struct FlakyDocRepo {
    inner: Arc<dyn DocumentRepository>,
    saves: AtomicUsize,
    fail_on: usize,
}

#[async_trait]
impl DocumentRepository for FlakyDocRepo {
    async fn save(&self, scope: &mut TxScope, doc: &Document) -> Result<(), DomainError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(DomainError::Storage("injected save failure".into()));
        }
        self.inner.save(scope, doc).await
    }

    async fn find_by_id(
        &self,
        scope: &mut TxScope,
        id: DocumentId,
    ) -> Result<Option<Document>, DomainError> {
        self.inner.find_by_id(scope, id).await
    }

    async fn find_by_knowledge_base(
        &self,
        scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<Vec<Document>, DomainError> {
        self.inner.find_by_knowledge_base(scope, kb_id).await
    }

    async fn delete(&self, scope: &mut TxScope, id: DocumentId) -> Result<(), DomainError> {
        self.inner.delete(scope, id).await
    }

    async fn delete_by_knowledge_base(
        &self,
        scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<(), DomainError> {
        self.inner.delete_by_knowledge_base(scope, kb_id).await
    }

    async fn search_by_tags(
        &self,
        scope: &mut TxScope,
        tags: &[String],
    ) -> Result<Vec<Document>, DomainError> {
        self.inner.search_by_tags(scope, tags).await
    }
}

#[tokio::test]
async fn merge_failure_at_any_step_restores_both_aggregates() {
    const SOURCE_DOCS: usize = 3;

    for fail_on in 1..=SOURCE_DOCS {
        let store = Arc::new(TxStore::default());
        let kb_repo: Arc<dyn KnowledgeBaseRepository> = Arc::new(TxKbRepo(store.clone()));
        let doc_repo: Arc<dyn DocumentRepository> = Arc::new(TxDocRepo(store.clone()));
        let uow = Arc::new(SnapshotUow(store.clone()));
        let mut scope = TxScope::ambient();

        // Seed source (3 docs) and target (1 doc) directly through the repos.
        let mut source = KnowledgeBase::create("source".into(), String::new()).unwrap();
        for i in 0..SOURCE_DOCS {
            let doc = source
                .add_document(format!("doc-{i}"), format!("content-{i}"), vec![])
                .unwrap()
                .clone();
            doc_repo.save(&mut scope, &doc).await.unwrap();
        }
        kb_repo.save(&mut scope, &source).await.unwrap();

        let mut target = KnowledgeBase::create("target".into(), String::new()).unwrap();
        let kept = target
            .add_document("kept".into(), "kept body".into(), vec![])
            .unwrap()
            .clone();
        doc_repo.save(&mut scope, &kept).await.unwrap();
        kb_repo.save(&mut scope, &target).await.unwrap();

        let pre_source_titles: Vec<String> = doc_repo
            .find_by_knowledge_base(&mut scope, source.id())
            .await
            .unwrap()
            .iter()
            .map(|d| d.title().to_owned())
            .collect();

        // Merge with the fail_on-th migrated document save exploding.
        let flaky: Arc<dyn DocumentRepository> = Arc::new(FlakyDocRepo {
            inner: doc_repo.clone(),
            saves: AtomicUsize::new(0),
            fail_on,
        });
        let err = MergeKnowledgeBasesHandler::new(uow, kb_repo.clone(), flaky)
            .handle(MergeKnowledgeBases {
                source_id: source.id().to_string(),
                target_id: target.id().to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)), "fail_on={fail_on}");

        // Both aggregates are exactly as they were.
        let source_after = kb_repo
            .find_by_id(&mut scope, source.id())
            .await
            .unwrap()
            .expect("source must survive the failed merge");
        let titles_after: Vec<String> = source_after
            .documents()
            .iter()
            .map(|d| d.title().to_owned())
            .collect();
        assert_eq!(titles_after, pre_source_titles, "fail_on={fail_on}");

        let target_after = kb_repo
            .find_by_id(&mut scope, target.id())
            .await
            .unwrap()
            .expect("target must survive the failed merge");
        assert_eq!(target_after.document_count(), 1, "fail_on={fail_on}");
        assert_eq!(target_after.documents()[0].id(), kept.id());
    }
}
