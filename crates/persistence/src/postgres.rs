//! PostgreSQL persistence backend.
//!
//! Every repository call goes through the [`TxScope`] handed to it: if a
//! transaction is open on the scope the statement runs on it, otherwise it
//! runs on the ambient pool. The transaction handle is owned exclusively by
//! the single in-flight command that opened it.

use async_trait::async_trait;
use common::{DocumentId, KnowledgeBaseId};
use domain::{
    Document, DomainError, KnowledgeBase, KnowledgeBaseRepository, DocumentRepository, TxFuture,
    TxScope, UnitOfWork,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Transaction handle carried through [`TxScope`] by this backend.
pub type PgTransaction = sqlx::Transaction<'static, sqlx::Postgres>;

/// Runs the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

fn storage_err(err: sqlx::Error) -> DomainError {
    DomainError::Storage(err.to_string())
}

fn tx_err(err: sqlx::Error) -> DomainError {
    DomainError::Transaction(err.to_string())
}

fn doc_from_row(row: &PgRow) -> Result<Document, sqlx::Error> {
    Ok(Document::reconstruct(
        DocumentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        KnowledgeBaseId::from_uuid(row.try_get::<Uuid, _>("knowledge_base_id")?),
        row.try_get("title")?,
        row.try_get("content")?,
        row.try_get("tags")?,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

fn kb_from_row(row: &PgRow, documents: Vec<Document>) -> Result<KnowledgeBase, sqlx::Error> {
    Ok(KnowledgeBase::reconstruct(
        KnowledgeBaseId::from_uuid(row.try_get::<Uuid, _>("id")?),
        row.try_get("name")?,
        row.try_get("description")?,
        documents,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

/// Unit of work backed by a PostgreSQL transaction.
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn run_in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut TxScope) -> TxFuture<'s, T> + Send + 'static,
    {
        let tx = self.pool.begin().await.map_err(tx_err)?;
        let mut scope = TxScope::with_transaction::<PgTransaction>(tx);

        match work(&mut scope).await {
            Ok(value) => {
                let tx = scope
                    .take_transaction::<PgTransaction>()
                    .ok_or_else(|| {
                        DomainError::Transaction("transaction handle missing from scope".into())
                    })?;
                tx.commit().await.map_err(tx_err)?;
                Ok(value)
            }
            Err(err) => {
                if let Some(tx) = scope.take_transaction::<PgTransaction>() {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::error!(error = %rollback_err, "transaction rollback failed");
                    }
                }
                Err(err)
            }
        }
    }
}

/// PostgreSQL knowledge-base repository.
#[derive(Clone)]
pub struct PgKnowledgeBaseRepository {
    pool: PgPool,
}

impl PgKnowledgeBaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn documents_of(
        &self,
        scope: &mut TxScope,
        id: KnowledgeBaseId,
    ) -> Result<Vec<Document>, DomainError> {
        let query = sqlx::query(
            r#"
            SELECT id, knowledge_base_id, title, content, tags, created_at, updated_at
            FROM documents
            WHERE knowledge_base_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(id.as_uuid());

        let rows = match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        }
        .map_err(storage_err)?;

        rows.iter()
            .map(doc_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)
    }
}

#[async_trait]
impl KnowledgeBaseRepository for PgKnowledgeBaseRepository {
    async fn save(&self, scope: &mut TxScope, kb: &KnowledgeBase) -> Result<(), DomainError> {
        let query = sqlx::query(
            r#"
            INSERT INTO knowledge_bases (id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(kb.id().as_uuid())
        .bind(kb.name())
        .bind(kb.description())
        .bind(kb.created_at())
        .bind(kb.updated_at());

        match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(storage_err)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &mut TxScope,
        id: KnowledgeBaseId,
    ) -> Result<Option<KnowledgeBase>, DomainError> {
        let query = sqlx::query(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM knowledge_bases
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid());

        let row = match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.fetch_optional(&mut **tx).await,
            None => query.fetch_optional(&self.pool).await,
        }
        .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let documents = self.documents_of(scope, id).await?;
        kb_from_row(&row, documents)
            .map(Some)
            .map_err(storage_err)
    }

    async fn find_all(&self, scope: &mut TxScope) -> Result<Vec<KnowledgeBase>, DomainError> {
        let query = sqlx::query(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM knowledge_bases
            ORDER BY created_at, id
            "#,
        );

        let rows = match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        }
        .map_err(storage_err)?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = KnowledgeBaseId::from_uuid(
                row.try_get::<Uuid, _>("id").map_err(storage_err)?,
            );
            let documents = self.documents_of(scope, id).await?;
            result.push(kb_from_row(row, documents).map_err(storage_err)?);
        }
        Ok(result)
    }

    async fn delete(&self, scope: &mut TxScope, id: KnowledgeBaseId) -> Result<(), DomainError> {
        let query = sqlx::query("DELETE FROM knowledge_bases WHERE id = $1").bind(id.as_uuid());

        match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(storage_err)?;
        Ok(())
    }

    async fn exists_by_name(
        &self,
        scope: &mut TxScope,
        name: &str,
    ) -> Result<bool, DomainError> {
        let query = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM knowledge_bases WHERE name = $1)",
        )
        .bind(name);

        match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.fetch_one(&mut **tx).await,
            None => query.fetch_one(&self.pool).await,
        }
        .map_err(storage_err)
    }
}

/// PostgreSQL document repository.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn save(&self, scope: &mut TxScope, doc: &Document) -> Result<(), DomainError> {
        let query = sqlx::query(
            r#"
            INSERT INTO documents (id, knowledge_base_id, title, content, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                content = EXCLUDED.content,
                tags = EXCLUDED.tags,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(doc.id().as_uuid())
        .bind(doc.knowledge_base_id().as_uuid())
        .bind(doc.title())
        .bind(doc.content())
        .bind(doc.tags())
        .bind(doc.created_at())
        .bind(doc.updated_at());

        match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(storage_err)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &mut TxScope,
        id: DocumentId,
    ) -> Result<Option<Document>, DomainError> {
        let query = sqlx::query(
            r#"
            SELECT id, knowledge_base_id, title, content, tags, created_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid());

        let row = match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.fetch_optional(&mut **tx).await,
            None => query.fetch_optional(&self.pool).await,
        }
        .map_err(storage_err)?;

        row.as_ref()
            .map(doc_from_row)
            .transpose()
            .map_err(storage_err)
    }

    async fn find_by_knowledge_base(
        &self,
        scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<Vec<Document>, DomainError> {
        let query = sqlx::query(
            r#"
            SELECT id, knowledge_base_id, title, content, tags, created_at, updated_at
            FROM documents
            WHERE knowledge_base_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(kb_id.as_uuid());

        let rows = match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        }
        .map_err(storage_err)?;

        rows.iter()
            .map(doc_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)
    }

    async fn delete(&self, scope: &mut TxScope, id: DocumentId) -> Result<(), DomainError> {
        let query = sqlx::query("DELETE FROM documents WHERE id = $1").bind(id.as_uuid());

        match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(storage_err)?;
        Ok(())
    }

    async fn delete_by_knowledge_base(
        &self,
        scope: &mut TxScope,
        kb_id: KnowledgeBaseId,
    ) -> Result<(), DomainError> {
        let query =
            sqlx::query("DELETE FROM documents WHERE knowledge_base_id = $1").bind(kb_id.as_uuid());

        match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(storage_err)?;
        Ok(())
    }

    async fn search_by_tags(
        &self,
        scope: &mut TxScope,
        tags: &[String],
    ) -> Result<Vec<Document>, DomainError> {
        let query = sqlx::query(
            r#"
            SELECT id, knowledge_base_id, title, content, tags, created_at, updated_at
            FROM documents
            WHERE tags && $1
            ORDER BY created_at, id
            "#,
        )
        .bind(tags);

        let rows = match scope.transaction_mut::<PgTransaction>() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        }
        .map_err(storage_err)?;

        rows.iter()
            .map(doc_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)
    }
}
