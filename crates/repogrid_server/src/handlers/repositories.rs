//! Repository HTTP handlers.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use repogrid_core::models::{
    Connection, Cursor, RenameRequest, RenameResponse, SortDirection, SortField, SortOrder,
};
use repogrid_core::{RenameOutcome, DEFAULT_PAGE_SIZE};
use serde::Deserialize;

/// Query parameters for `GET /api/repositories`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub first: Option<usize>,
    pub after: Option<String>,
    pub order_field: Option<String>,
    pub order_direction: Option<String>,
}

/// Resolve the requested ordering; a direction without a field sorts by name.
fn sort_from_query(query: &ListQuery) -> Result<Option<SortOrder>, AppError> {
    let field = match query.order_field.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            SortField::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown order_field '{}'", raw)))?,
        ),
    };
    let direction = match query.order_direction.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(SortDirection::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!("unknown order_direction '{}'", raw))
        })?),
    };
    Ok(match (field, direction) {
        (None, None) => None,
        (field, direction) => Some(SortOrder::new(
            field.unwrap_or(SortField::Name),
            direction.unwrap_or(SortDirection::Asc),
        )),
    })
}

/// List one page of repositories.
///
/// # Returns
/// The cursor connection for the requested page.
///
/// # Errors
/// Returns `400` for unknown sort parameters, bad cursors, or page sizes
/// outside `1..=100`.
pub async fn list_repositories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Connection>, HttpError> {
    let sort = sort_from_query(&query)?;
    let after = query
        .after
        .as_deref()
        .map(str::trim)
        .filter(|cursor| !cursor.is_empty())
        .map(Cursor::from);
    let first = query.first.unwrap_or(DEFAULT_PAGE_SIZE);

    let catalog = state
        .catalog
        .read()
        .map_err(|_| AppError::Server("catalog lock poisoned".to_string()))?;
    let connection = catalog.page(sort, after.as_ref(), first)?;
    tracing::debug!(
        first,
        returned = connection.edges.len(),
        has_next_page = connection.has_next_page,
        "listed repositories"
    );
    Ok(Json(connection))
}

/// Rename a repository.
///
/// # Returns
/// `200` with the updated repository, or `422` with field errors when the
/// name is rejected.
///
/// # Errors
/// Returns `404` when the repository does not exist.
pub async fn rename_repository(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<Response, HttpError> {
    let mut catalog = state
        .catalog
        .write()
        .map_err(|_| AppError::Server("catalog lock poisoned".to_string()))?;
    let response = match catalog.rename(&id, &request.name)? {
        RenameOutcome::Renamed(repository) => {
            tracing::info!(id = %id, name = %repository.name, "repository renamed");
            (
                StatusCode::OK,
                Json(RenameResponse {
                    repository: Some(repository),
                    field_errors: Vec::new(),
                }),
            )
                .into_response()
        }
        RenameOutcome::Rejected(field_errors) => {
            tracing::debug!(id = %id, errors = field_errors.len(), "rename rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(RenameResponse {
                    repository: None,
                    field_errors,
                }),
            )
                .into_response()
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::{sort_from_query, ListQuery};
    use repogrid_core::models::{SortDirection, SortField, SortOrder};

    fn query(field: Option<&str>, direction: Option<&str>) -> ListQuery {
        ListQuery {
            order_field: field.map(str::to_string),
            order_direction: direction.map(str::to_string),
            ..ListQuery::default()
        }
    }

    #[test]
    fn sort_parameters_resolve_to_orders() {
        assert_eq!(sort_from_query(&query(None, None)).expect("none"), None);
        assert_eq!(
            sort_from_query(&query(Some("updated_at"), Some("desc"))).expect("sort"),
            Some(SortOrder::new(SortField::UpdatedAt, SortDirection::Desc))
        );
        assert_eq!(
            sort_from_query(&query(None, Some("DESC"))).expect("direction only"),
            Some(SortOrder::new(SortField::Name, SortDirection::Desc))
        );
        assert!(sort_from_query(&query(Some("forks"), None)).is_err());
        assert!(sort_from_query(&query(Some("NAME"), Some("sideways"))).is_err());
    }
}
