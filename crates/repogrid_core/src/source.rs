//! Remote collaborator contracts.
//!
//! The pagination core never talks to the network itself; the worker that
//! drives it holds one [`RemoteSource`] and one [`MutationTransport`], created
//! at startup and passed in explicitly.

use crate::catalog::{RenameOutcome, RepoCatalog};
use crate::error::{CatalogError, SourceError};
use crate::models::repository::FIELD_NAME;
use crate::models::{EditOutcome, EditRequest, FetchRequest, FieldError, Page};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Cursor-paginated read side of the remote endpoint.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch up to `request.count` rows after `request.after` under
    /// `request.sort`.
    async fn fetch_page(&self, request: FetchRequest) -> Result<Page, SourceError>;
}

/// Single-field write side of the remote endpoint.
#[async_trait]
pub trait MutationTransport: Send + Sync {
    /// Submit one write. Field-level validation failures are reported in the
    /// returned [`EditOutcome`], not as an error.
    async fn submit_edit(&self, request: EditRequest) -> Result<EditOutcome, SourceError>;
}

/// In-process source backed by a shared [`RepoCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogSource {
    catalog: Arc<RwLock<RepoCatalog>>,
}

impl CatalogSource {
    pub fn new(catalog: Arc<RwLock<RepoCatalog>>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<RwLock<RepoCatalog>> {
        &self.catalog
    }
}

fn poisoned() -> SourceError {
    SourceError::Transport("catalog lock poisoned".to_string())
}

#[async_trait]
impl RemoteSource for CatalogSource {
    async fn fetch_page(&self, request: FetchRequest) -> Result<Page, SourceError> {
        let catalog = self.catalog.read().map_err(|_| poisoned())?;
        let connection = catalog
            .page(request.sort, request.after.as_ref(), request.count)
            .map_err(|err| SourceError::Rejected(err.to_string()))?;
        Ok(connection.into_page())
    }
}

#[async_trait]
impl MutationTransport for CatalogSource {
    async fn submit_edit(&self, request: EditRequest) -> Result<EditOutcome, SourceError> {
        if request.field != FIELD_NAME {
            return Ok(EditOutcome::rejected(vec![FieldError::new(
                request.field.as_str(),
                "field is read-only",
            )]));
        }
        let Some(name) = request.value.as_text() else {
            return Ok(EditOutcome::rejected(vec![FieldError::new(
                FIELD_NAME,
                "name must be text",
            )]));
        };
        let mut catalog = self.catalog.write().map_err(|_| poisoned())?;
        match catalog.rename(&request.row_id, name) {
            Ok(RenameOutcome::Renamed(_)) => Ok(EditOutcome::ok()),
            Ok(RenameOutcome::Rejected(errors)) => Ok(EditOutcome::rejected(errors)),
            Err(CatalogError::NotFound) => Err(SourceError::Status {
                status: 404,
                message: "repository not found".to_string(),
            }),
            Err(err) => Err(SourceError::Rejected(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cursor, FieldValue, SortDirection, SortField, SortOrder};

    fn source() -> CatalogSource {
        CatalogSource::new(Arc::new(RwLock::new(RepoCatalog::seeded(30, 3))))
    }

    #[tokio::test]
    async fn fetch_page_follows_cursors() {
        let source = source();
        let sort = Some(SortOrder::new(SortField::CreatedAt, SortDirection::Asc));
        let first = source
            .fetch_page(FetchRequest {
                sort,
                after: None,
                count: 20,
            })
            .await
            .expect("first page");
        assert_eq!(first.rows.len(), 20);
        assert!(first.has_next_page);
        assert_eq!(first.total_count, Some(30));

        let second = source
            .fetch_page(FetchRequest {
                sort,
                after: first.rows.last().map(|row| row.cursor.clone()),
                count: 20,
            })
            .await
            .expect("second page");
        assert_eq!(second.rows.len(), 10);
        assert!(!second.has_next_page);
    }

    #[tokio::test]
    async fn bad_cursor_is_rejected() {
        let err = source()
            .fetch_page(FetchRequest {
                sort: None,
                after: Some(Cursor::new("not-hex")),
                count: 5,
            })
            .await
            .expect_err("bad cursor");
        assert!(matches!(err, SourceError::Rejected(_)));
    }

    #[tokio::test]
    async fn submit_edit_renames_or_reports_field_errors() {
        let source = source();
        let id = {
            let catalog = source.catalog().read().expect("read");
            catalog.page(None, None, 1).expect("page").edges[0].node.id.clone()
        };

        let outcome = source
            .submit_edit(EditRequest {
                row_id: id.clone(),
                field: FIELD_NAME.to_string(),
                value: FieldValue::from("renamed-repo"),
            })
            .await
            .expect("write");
        assert!(outcome.is_ok());
        assert_eq!(
            source.catalog().read().expect("read").get(&id).map(|r| r.name.clone()),
            Some("renamed-repo".to_string())
        );

        let outcome = source
            .submit_edit(EditRequest {
                row_id: id,
                field: FIELD_NAME.to_string(),
                value: FieldValue::from("bad name!"),
            })
            .await
            .expect("write");
        assert!(!outcome.is_ok());

        let err = source
            .submit_edit(EditRequest {
                row_id: "missing".to_string(),
                field: FIELD_NAME.to_string(),
                value: FieldValue::from("whatever"),
            })
            .await
            .expect_err("unknown id");
        assert!(matches!(err, SourceError::Status { status: 404, .. }));
    }
}
