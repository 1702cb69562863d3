//! HTTP API server and composition root for the knowledge-base backend.
//!
//! The composition root selects the storage backend (in-memory or
//! PostgreSQL) and the event-bus variant from configuration, subscribes the
//! built-in event handlers, and wires everything into an Axum router with
//! structured logging and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use application::{
    AddDocumentHandler, CreateKnowledgeBaseHandler, DeleteKnowledgeBaseHandler, GetKnowledgeBase,
    ListDocuments, ListKnowledgeBases, MergeKnowledgeBasesHandler, RemoveDocumentHandler,
    SearchDocumentsByTags, UpdateKnowledgeBaseHandler,
};
use axum::Router;
use axum::routing::{get, post, put};
use domain::{DocumentRepository, KnowledgeBaseRepository, KnowledgeService, UnitOfWork};
use event_bus::{
    ConsumerConfig, ConsumerHandle, EventBus, InMemoryPartitionedLog, PartitionedEventBus,
    QueuedEventBus, SyncEventBus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::{
    MemoryDocumentRepository, MemoryKnowledgeBaseRepository, MemoryStore, MemoryUnitOfWork,
    PgDocumentRepository, PgKnowledgeBaseRepository, PgUnitOfWork,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{Config, EventBusKind};

/// Producer name stamped into outgoing event envelopes.
const PRODUCER_NAME: &str = "knowledge-service";

/// Shared handler state, generic over the unit-of-work implementation.
pub struct AppState<U> {
    pub create_kb: CreateKnowledgeBaseHandler<U>,
    pub update_kb: UpdateKnowledgeBaseHandler<U>,
    pub delete_kb: DeleteKnowledgeBaseHandler<U>,
    pub add_document: AddDocumentHandler<U>,
    pub remove_document: RemoveDocumentHandler<U>,
    pub merge: MergeKnowledgeBasesHandler<U>,
    pub get_kb: GetKnowledgeBase,
    pub list_kbs: ListKnowledgeBases,
    pub list_documents: ListDocuments,
    pub search_documents: SearchDocumentsByTags,
}

impl<U: UnitOfWork> AppState<U> {
    /// Wires the full handler set over the given backend pieces.
    pub fn new(
        uow: Arc<U>,
        kb_repo: Arc<dyn KnowledgeBaseRepository>,
        doc_repo: Arc<dyn DocumentRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> Arc<Self> {
        let service = Arc::new(KnowledgeService::new(kb_repo.clone(), doc_repo.clone()));
        Arc::new(Self {
            create_kb: CreateKnowledgeBaseHandler::new(
                uow.clone(),
                service.clone(),
                event_bus.clone(),
            ),
            update_kb: UpdateKnowledgeBaseHandler::new(
                uow.clone(),
                kb_repo.clone(),
                event_bus.clone(),
            ),
            delete_kb: DeleteKnowledgeBaseHandler::new(
                uow.clone(),
                kb_repo.clone(),
                service,
                event_bus.clone(),
            ),
            add_document: AddDocumentHandler::new(
                uow.clone(),
                kb_repo.clone(),
                doc_repo.clone(),
                event_bus.clone(),
            ),
            remove_document: RemoveDocumentHandler::new(
                uow.clone(),
                kb_repo.clone(),
                doc_repo.clone(),
                event_bus,
            ),
            merge: MergeKnowledgeBasesHandler::new(uow, kb_repo.clone(), doc_repo.clone()),
            get_kb: GetKnowledgeBase::new(kb_repo.clone()),
            list_kbs: ListKnowledgeBases::new(kb_repo.clone()),
            list_documents: ListDocuments::new(kb_repo, doc_repo.clone()),
            search_documents: SearchDocumentsByTags::new(doc_repo),
        })
    }
}

/// Keeps whatever the selected bus variant needs torn down at shutdown.
pub enum BusGuard {
    Sync,
    Queued(Arc<QueuedEventBus>),
    Partitioned(ConsumerHandle),
}

impl BusGuard {
    /// Drains and releases the bus's resources.
    pub async fn shutdown(self) {
        match self {
            BusGuard::Sync => {}
            BusGuard::Queued(bus) => bus.close().await,
            BusGuard::Partitioned(handle) => handle.stop().await,
        }
    }
}

/// Builds the configured event-bus variant.
///
/// Must run inside a tokio runtime (the queued workers and the log consumer
/// are spawned eagerly).
pub fn build_event_bus(config: &Config) -> (Arc<dyn EventBus>, BusGuard) {
    match config.event_bus {
        EventBusKind::Sync => (Arc::new(SyncEventBus::new()), BusGuard::Sync),
        EventBusKind::Queued => {
            let bus = Arc::new(QueuedEventBus::new(
                config.queue_capacity,
                config.queue_workers,
            ));
            (bus.clone(), BusGuard::Queued(bus))
        }
        EventBusKind::Partitioned => {
            let log = Arc::new(InMemoryPartitionedLog::new(config.log_partitions));
            let bus = Arc::new(PartitionedEventBus::new(log, PRODUCER_NAME));
            let consumer = bus.consumer(ConsumerConfig::default());
            (bus, BusGuard::Partitioned(consumer.spawn()))
        }
    }
}

/// Builds application state over the in-memory backend.
pub fn build_memory_state(event_bus: Arc<dyn EventBus>) -> Arc<AppState<MemoryUnitOfWork>> {
    let store = MemoryStore::new();
    AppState::new(
        Arc::new(MemoryUnitOfWork::new()),
        Arc::new(MemoryKnowledgeBaseRepository::new(store.clone())),
        Arc::new(MemoryDocumentRepository::new(store)),
        event_bus,
    )
}

/// Builds application state over PostgreSQL.
pub fn build_postgres_state(
    pool: PgPool,
    event_bus: Arc<dyn EventBus>,
) -> Arc<AppState<PgUnitOfWork>> {
    AppState::new(
        Arc::new(PgUnitOfWork::new(pool.clone())),
        Arc::new(PgKnowledgeBaseRepository::new(pool.clone())),
        Arc::new(PgDocumentRepository::new(pool)),
        event_bus,
    )
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<U: UnitOfWork + 'static>(
    state: Arc<AppState<U>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/knowledge", post(routes::knowledge_bases::create::<U>))
        .route("/api/v1/knowledge", get(routes::knowledge_bases::list::<U>))
        .route(
            "/api/v1/knowledge/merge",
            post(routes::knowledge_bases::merge::<U>),
        )
        .route(
            "/api/v1/knowledge/{id}",
            get(routes::knowledge_bases::get::<U>),
        )
        .route(
            "/api/v1/knowledge/{id}",
            put(routes::knowledge_bases::update::<U>),
        )
        .route(
            "/api/v1/knowledge/{id}",
            axum::routing::delete(routes::knowledge_bases::delete::<U>),
        )
        .route(
            "/api/v1/knowledge/{id}/documents",
            post(routes::documents::add::<U>),
        )
        .route(
            "/api/v1/knowledge/{id}/documents",
            get(routes::documents::list::<U>),
        )
        .route(
            "/api/v1/knowledge/{id}/documents/{doc_id}",
            axum::routing::delete(routes::documents::remove::<U>),
        )
        .route(
            "/api/v1/documents/search",
            get(routes::documents::search::<U>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
