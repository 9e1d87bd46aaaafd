//! In-memory repository catalog with cursor pagination and rename validation.

use crate::constants::{MAX_PAGE_SIZE, MAX_REPOSITORY_NAME_LEN};
use crate::error::CatalogError;
use crate::models::repository::FIELD_NAME;
use crate::models::{
    Connection, Cursor, Edge, FieldError, Repository, SortDirection, SortField, SortOrder,
};
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use uuid::Builder;

const ADJECTIVES: &[&str] = &[
    "quantum", "cosmic", "stellar", "crystal", "velvet", "golden", "silver", "lunar", "solar",
    "arctic", "ancient", "serene", "vibrant", "electric", "atomic", "harmonic", "fractal",
    "minimal", "noble", "tranquil", "rusty", "swift", "quiet", "hidden",
];

const NOUNS: &[&str] = &[
    "parser", "cache", "router", "engine", "kernel", "ledger", "beacon", "compass", "harbor",
    "lattice", "meadow", "orbit", "prism", "quarry", "relay", "sentry", "tundra", "vault",
    "widget", "forge", "signal", "garden", "bridge", "atlas",
];

/// Result of a rename attempt that addressed an existing repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed(Repository),
    Rejected(Vec<FieldError>),
}

/// The viewer's repositories, served in any supported order.
#[derive(Debug, Clone, Default)]
pub struct RepoCatalog {
    repos: Vec<Repository>,
}

impl RepoCatalog {
    pub fn new(repos: Vec<Repository>) -> Self {
        Self { repos }
    }

    /// Generate `count` repositories deterministically from `seed`.
    ///
    /// Names are unique (an index suffix is always appended), so renames in
    /// tests can rely on collisions being intentional.
    pub fn seeded(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let epoch = Utc
            .with_ymd_and_hms(2015, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let repos = (0..count)
            .map(|i| {
                let adj = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
                let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
                let created_at = epoch + Duration::hours(rng.gen_range(0..24 * 365 * 9));
                let updated_at = created_at + Duration::hours(rng.gen_range(0..24 * 365));
                Repository {
                    id: Builder::from_random_bytes(rng.gen()).into_uuid().to_string(),
                    name: format!("{}-{}-{}", adj, noun, i),
                    stargazer_count: rng.gen_range(0..50_000),
                    created_at,
                    updated_at,
                    is_fork: rng.gen_bool(0.2),
                }
            })
            .collect();
        Self { repos }
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Repository> {
        self.repos.iter().find(|repo| repo.id == id)
    }

    /// Return up to `first` repositories after `after` in `sort` order.
    ///
    /// `None` sorts the way the upstream API does by default (stargazers,
    /// descending). Cursors carry the ordering they were issued under plus
    /// the sort key and id of their row, and a page resumes strictly after
    /// that position. Renames between pages therefore never shift unrelated
    /// rows into or out of the next page.
    ///
    /// # Errors
    /// [`CatalogError::InvalidPageSize`] when `first` is outside
    /// `1..=MAX_PAGE_SIZE`; [`CatalogError::MalformedCursor`] or
    /// [`CatalogError::CursorMismatch`] for unusable cursors.
    pub fn page(
        &self,
        sort: Option<SortOrder>,
        after: Option<&Cursor>,
        first: usize,
    ) -> Result<Connection, CatalogError> {
        if first == 0 || first > MAX_PAGE_SIZE {
            return Err(CatalogError::InvalidPageSize {
                requested: first,
                max: MAX_PAGE_SIZE,
            });
        }
        let tag = sort_tag(sort);
        let order = sort.unwrap_or_else(SortOrder::upstream_default);
        let ordered = self.ordered(order);
        let start = match after {
            Some(cursor) => {
                let position = decode_cursor(cursor, &tag)?;
                ordered.partition_point(|repo| {
                    compare_positions(order, &position_of(repo, order.field), &position)
                        != Ordering::Greater
                })
            }
            None => 0,
        };

        let end = start.saturating_add(first).min(ordered.len());
        let edges = ordered
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|repo| Edge {
                cursor: encode_cursor(&tag, &position_of(repo, order.field)),
                node: (*repo).clone(),
            })
            .collect();

        Ok(Connection {
            edges,
            total_count: self.repos.len() as u64,
            has_next_page: end < ordered.len(),
        })
    }

    /// Rename a repository, validating the new name first.
    ///
    /// # Returns
    /// [`RenameOutcome::Rejected`] with field errors when validation fails;
    /// otherwise the updated repository, with `updated_at` bumped.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] when `id` is unknown.
    pub fn rename(&mut self, id: &str, name: &str) -> Result<RenameOutcome, CatalogError> {
        if self.get(id).is_none() {
            return Err(CatalogError::NotFound);
        }
        let errors = self.validate_name(id, name);
        if !errors.is_empty() {
            return Ok(RenameOutcome::Rejected(errors));
        }
        let repo = self
            .repos
            .iter_mut()
            .find(|repo| repo.id == id)
            .ok_or(CatalogError::NotFound)?;
        repo.name = name.to_string();
        repo.updated_at = Utc::now().max(repo.updated_at);
        Ok(RenameOutcome::Renamed(repo.clone()))
    }

    /// Field errors a rename of `id` to `name` would produce.
    pub fn validate_name(&self, id: &str, name: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if name.trim().is_empty() {
            errors.push(FieldError::new(FIELD_NAME, "name can't be blank"));
            return errors;
        }
        if name.chars().count() > MAX_REPOSITORY_NAME_LEN {
            errors.push(FieldError::new(
                FIELD_NAME,
                format!("name is too long (maximum is {MAX_REPOSITORY_NAME_LEN} characters)"),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            errors.push(FieldError::new(
                FIELD_NAME,
                "name may only contain letters, digits, '.', '_' and '-'",
            ));
        }
        let taken = self
            .repos
            .iter()
            .any(|repo| repo.id != id && repo.name.eq_ignore_ascii_case(name));
        if taken {
            errors.push(FieldError::new(FIELD_NAME, "name already exists on this account"));
        }
        errors
    }

    fn ordered(&self, order: SortOrder) -> Vec<&Repository> {
        let mut keyed: Vec<(Position, &Repository)> = self
            .repos
            .iter()
            .map(|repo| (position_of(repo, order.field), repo))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_positions(order, a, b));
        keyed.into_iter().map(|(_, repo)| repo).collect()
    }
}

/// Value a repository is ordered by under one sort field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    /// Lowercased name.
    Text(String),
    Count(u64),
    /// Microseconds since the Unix epoch.
    Time(i64),
}

/// A row's place in one ordering: its sort key, ties broken by id.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    key: SortKey,
    id: String,
}

fn position_of(repo: &Repository, field: SortField) -> Position {
    let key = match field {
        SortField::Name => SortKey::Text(repo.name.to_lowercase()),
        SortField::Stargazers => SortKey::Count(repo.stargazer_count),
        SortField::CreatedAt => SortKey::Time(repo.created_at.timestamp_micros()),
        SortField::UpdatedAt => SortKey::Time(repo.updated_at.timestamp_micros()),
    };
    Position {
        key,
        id: repo.id.clone(),
    }
}

fn compare_positions(order: SortOrder, a: &Position, b: &Position) -> Ordering {
    let primary = match order.direction {
        SortDirection::Asc => a.key.cmp(&b.key),
        SortDirection::Desc => b.key.cmp(&a.key),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn sort_tag(sort: Option<SortOrder>) -> String {
    match sort {
        Some(order) => format!("{}_{}", order.field.as_str(), order.direction.as_str()),
        None => "none".to_string(),
    }
}

fn encode_cursor(tag: &str, position: &Position) -> Cursor {
    let key = match &position.key {
        SortKey::Text(text) => format!("s:{}", text),
        SortKey::Count(count) => format!("n:{}", count),
        SortKey::Time(micros) => format!("t:{}", micros),
    };
    let raw = format!("{}|{}|{}", tag, key, position.id);
    Cursor::new(raw.bytes().map(|b| format!("{:02x}", b)).collect::<String>())
}

fn decode_cursor(cursor: &Cursor, expected_tag: &str) -> Result<Position, CatalogError> {
    let hex = cursor.as_str();
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(CatalogError::MalformedCursor);
    }
    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| CatalogError::MalformedCursor)?;
    let raw = String::from_utf8(bytes).map_err(|_| CatalogError::MalformedCursor)?;
    // Names may contain the separator; tags and ids never do.
    let (tag, rest) = raw.split_once('|').ok_or(CatalogError::MalformedCursor)?;
    let (key, id) = rest.rsplit_once('|').ok_or(CatalogError::MalformedCursor)?;
    if tag != expected_tag {
        return Err(CatalogError::CursorMismatch);
    }
    let key = match key.split_once(':') {
        Some(("s", text)) => SortKey::Text(text.to_string()),
        Some(("n", count)) => {
            SortKey::Count(count.parse().map_err(|_| CatalogError::MalformedCursor)?)
        }
        Some(("t", micros)) => {
            SortKey::Time(micros.parse().map_err(|_| CatalogError::MalformedCursor)?)
        }
        _ => return Err(CatalogError::MalformedCursor),
    };
    Ok(Position {
        key,
        id: id.to_string(),
    })
}
