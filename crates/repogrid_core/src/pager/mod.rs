//! Pagination controller.
//!
//! Reconciles the table's index-range row requests with a forward-only,
//! cursor-paginated source. The controller performs no I/O: every entry point
//! returns [`PagerEffect`]s, and the caller reports fetch completions back
//! with the [`FetchTicket`] it was handed.
//!
//! At most one fetch is outstanding at a time. A request larger than one
//! page is served by consecutive fetches, each issued only after the previous
//! page is applied. Requests that need rows while a fetch is running are
//! queued and re-evaluated in arrival order once the running request is
//! answered, so the gap check sees the grown frontier. A sort-order change
//! resets the cache, starts a new epoch, and fails every request still
//! waiting on the old one; the old fetch's completion is discarded when it
//! eventually arrives.

mod edit;

pub use edit::{EditDecision, EditPlan, EditResolution, EditStatus, EditTicket};

use crate::cache::{CacheEvent, Epoch, PageCache};
use crate::constants::MAX_PAGE_SIZE;
use crate::error::{RowsError, SourceError};
use crate::models::{FetchRequest, Page, Row, SortOrder};
use edit::PendingEdits;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Identifier the table attaches to a row-range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// Pairs a dispatched fetch with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// A request for rows `[start_row, end_row)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRequest {
    pub id: RequestId,
    pub start_row: usize,
    pub end_row: usize,
}

impl RowRequest {
    pub fn new(id: RequestId, start_row: usize, end_row: usize) -> Self {
        Self {
            id,
            start_row,
            end_row,
        }
    }
}

/// A remote fetch the caller must perform and report back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub ticket: FetchTicket,
    pub epoch: Epoch,
    pub request: FetchRequest,
}

/// Work produced by the controller for its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum PagerEffect {
    /// Answer a request with rows starting at `start_row`.
    ///
    /// `last_row` is set once the source has reported its end; rows may then
    /// be fewer than requested.
    Rows {
        request: RequestId,
        start_row: usize,
        rows: Vec<Row>,
        last_row: Option<usize>,
    },
    /// Fail a request. The cache is left as it was.
    Failed { request: RequestId, error: RowsError },
    /// Issue a remote fetch.
    Fetch(FetchPlan),
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    Fetching(Epoch),
    Resetting(Epoch),
}

/// Tunables taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerSettings {
    pub max_page_size: usize,
}

impl Default for PagerSettings {
    fn default() -> Self {
        Self {
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Append,
    Reset,
}

#[derive(Debug)]
struct InFlight {
    ticket: FetchTicket,
    epoch: Epoch,
    kind: FetchKind,
    request: RowRequest,
    count: usize,
}

/// Owns the page cache, the active sort order, and pending edits.
#[derive(Debug)]
pub struct PaginationController {
    cache: PageCache,
    active_sort: Option<SortOrder>,
    settings: PagerSettings,
    in_flight: Option<InFlight>,
    waiting: VecDeque<RowRequest>,
    next_ticket: u64,
    exhausted: bool,
    total_count: Option<u64>,
    edits: PendingEdits,
}

impl PaginationController {
    /// Create a controller whose first epoch is bound to `initial_sort`.
    pub fn new(initial_sort: Option<SortOrder>, settings: PagerSettings) -> Self {
        Self {
            cache: PageCache::new(),
            active_sort: initial_sort,
            settings: PagerSettings {
                max_page_size: settings.max_page_size.max(1),
            },
            in_flight: None,
            waiting: VecDeque::new(),
            next_ticket: 0,
            exhausted: false,
            total_count: None,
            edits: PendingEdits::default(),
        }
    }

    /// Read-only view of the cache.
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Register a cache change listener.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&CacheEvent) + Send + 'static,
    {
        self.cache.subscribe(listener);
    }

    pub fn active_sort(&self) -> Option<SortOrder> {
        self.active_sort
    }

    pub fn epoch(&self) -> Epoch {
        self.cache.epoch()
    }

    /// Collection size last reported by the source, for scrollbar sizing only.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Whether the source has reported that no rows follow the cache.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Requests parked behind the outstanding fetch.
    pub fn queued_requests(&self) -> usize {
        self.waiting.len()
    }

    pub fn state(&self) -> PagerState {
        match &self.in_flight {
            None => PagerState::Idle,
            Some(fetch) if fetch.kind == FetchKind::Reset => PagerState::Resetting(fetch.epoch),
            Some(fetch) => PagerState::Fetching(fetch.epoch),
        }
    }

    /// Handle a row-range request made under `sort`.
    ///
    /// A sort differing from the active one (structurally) resets the cache
    /// and refetches from the start; otherwise the request is answered from
    /// the cache, queued, or turned into a forward fetch.
    pub fn request_rows(&mut self, request: RowRequest, sort: Option<SortOrder>) -> Vec<PagerEffect> {
        let mut effects = Vec::new();
        if sort != self.active_sort {
            self.reset_for(sort, &mut effects);
            if request.start_row > request.end_row {
                effects.push(invalid_range(request));
            } else if request.end_row == 0 {
                effects.push(self.answer(request));
            } else {
                self.begin_fetch(request, FetchKind::Reset, &mut effects);
            }
            return effects;
        }
        self.evaluate(request, &mut effects);
        effects
    }

    /// Apply the result of the fetch identified by `ticket`.
    ///
    /// Completions for fetches that are no longer tracked (superseded by a
    /// sort change) are dropped without touching the cache.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page, SourceError>,
    ) -> Vec<PagerEffect> {
        let fetch = match self.in_flight.take() {
            Some(fetch) if fetch.ticket == ticket => fetch,
            other => {
                self.in_flight = other;
                debug!(ticket = ticket.0, "discarding completion for untracked fetch");
                return Vec::new();
            }
        };
        if fetch.epoch != self.cache.epoch() {
            debug!(
                fetch_epoch = %fetch.epoch,
                epoch = %self.cache.epoch(),
                "discarding stale fetch"
            );
            return Vec::new();
        }

        let mut effects = Vec::new();
        let outcome = result
            .map_err(RowsError::from)
            .and_then(|page| self.apply_page(&fetch, page));
        match outcome {
            Ok(()) if self.is_short_of(&fetch.request) => {
                // One page at a time: the request stays in flight until the
                // cache covers it or the source runs out.
                debug!(
                    len = self.cache.len(),
                    end = fetch.request.end_row,
                    "page short of request; fetching the next one"
                );
                self.begin_fetch(fetch.request, fetch.kind, &mut effects);
            }
            Ok(()) => effects.push(self.answer(fetch.request)),
            Err(error) => {
                warn!(
                    start = fetch.request.start_row,
                    end = fetch.request.end_row,
                    "row fetch failed: {}",
                    error
                );
                effects.push(PagerEffect::Failed {
                    request: fetch.request.id,
                    error,
                });
            }
        }
        self.drain_waiting(&mut effects);
        effects
    }

    fn evaluate(&mut self, request: RowRequest, effects: &mut Vec<PagerEffect>) {
        let len = self.cache.len();
        if request.start_row > request.end_row {
            effects.push(invalid_range(request));
        } else if request.end_row <= len {
            debug!(
                start = request.start_row,
                end = request.end_row,
                "row request served from cache"
            );
            effects.push(self.answer(request));
        } else if self.exhausted {
            effects.push(self.answer(request));
        } else if self.in_flight.is_some() {
            self.waiting.push_back(request);
        } else if request.start_row > len {
            effects.push(PagerEffect::Failed {
                request: request.id,
                error: RowsError::Gap {
                    start: request.start_row,
                    end: request.end_row,
                    frontier: len,
                },
            });
        } else {
            self.begin_fetch(request, FetchKind::Append, effects);
        }
    }

    fn begin_fetch(&mut self, request: RowRequest, kind: FetchKind, effects: &mut Vec<PagerEffect>) {
        let count = request
            .end_row
            .saturating_sub(self.cache.len())
            .clamp(1, self.settings.max_page_size);
        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        let epoch = self.cache.epoch();
        let fetch_request = FetchRequest {
            sort: self.active_sort,
            after: self.cache.last_cursor().cloned(),
            count,
        };
        debug!(
            ticket = ticket.0,
            epoch = %epoch,
            count,
            after = ?fetch_request.after,
            "issuing page fetch"
        );
        self.in_flight = Some(InFlight {
            ticket,
            epoch,
            kind,
            request,
            count,
        });
        effects.push(PagerEffect::Fetch(FetchPlan {
            ticket,
            epoch,
            request: fetch_request,
        }));
    }

    fn apply_page(&mut self, fetch: &InFlight, page: Page) -> Result<(), RowsError> {
        let received = page.rows.len();
        if received > fetch.count {
            return Err(SourceError::Malformed(format!(
                "asked for {} rows, received {}",
                fetch.count, received
            ))
            .into());
        }
        self.cache.append(fetch.epoch, page.rows)?;
        if page.total_count.is_some() {
            self.total_count = page.total_count;
        }
        self.exhausted = !page.has_next_page || received < fetch.count;
        debug!(
            received,
            len = self.cache.len(),
            exhausted = self.exhausted,
            "page appended"
        );
        Ok(())
    }

    fn is_short_of(&self, request: &RowRequest) -> bool {
        !self.exhausted && self.cache.len() < request.end_row
    }

    fn answer(&self, request: RowRequest) -> PagerEffect {
        let len = self.cache.len();
        let end = request.end_row.min(len);
        let start = request.start_row.min(end);
        PagerEffect::Rows {
            request: request.id,
            start_row: request.start_row,
            rows: self.cache.slice(start, end).to_vec(),
            last_row: self.exhausted.then_some(len),
        }
    }

    fn drain_waiting(&mut self, effects: &mut Vec<PagerEffect>) {
        while self.in_flight.is_none() {
            let Some(next) = self.waiting.pop_front() else {
                break;
            };
            self.evaluate(next, effects);
        }
    }

    fn reset_for(&mut self, sort: Option<SortOrder>, effects: &mut Vec<PagerEffect>) {
        let previous = self.cache.epoch();
        let superseded = self
            .in_flight
            .take()
            .map(|fetch| fetch.request)
            .into_iter()
            .chain(self.waiting.drain(..));
        for request in superseded {
            effects.push(PagerEffect::Failed {
                request: request.id,
                error: RowsError::Superseded { epoch: previous },
            });
        }
        self.active_sort = sort;
        self.exhausted = false;
        self.total_count = None;
        let epoch = self.cache.reset();
        let sort_label = sort.map_or_else(|| "none".to_string(), |order| order.to_string());
        info!(
            epoch = %epoch,
            sort = %sort_label,
            "sort order changed; page cache reset"
        );
    }
}

fn invalid_range(request: RowRequest) -> PagerEffect {
    PagerEffect::Failed {
        request: request.id,
        error: RowsError::InvalidRange {
            start: request.start_row,
            end: request.end_row,
        },
    }
}
