//! Background worker thread that owns the grid adapter and performs remote I/O.

use crate::backend::{GridCmd, GridEvent};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use repogrid_core::config::env_flag_enabled;
use repogrid_core::models::{EditOutcome, Page, SortModelEntry};
use repogrid_core::{
    AppError, CacheEvent, Config, EditTicket, FetchPlan, FetchTicket, GridAdapter,
    MutationTransport, PagerEffect, PagerSettings, RemoteSource, SourceError, DEFAULT_PAGE_SIZE,
    REPOSITORY_COLUMNS,
};
use std::future::Future;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Handle for sending commands to, and receiving events from, the backend worker.
pub struct BackendHandle {
    pub cmd_tx: Sender<GridCmd>,
    pub evt_rx: Receiver<GridEvent>,
    thread: Option<JoinHandle<()>>,
}

impl BackendHandle {
    /// Wrap bare channels with no worker behind them, for UI tests that
    /// script events by hand.
    pub fn from_test_channels(cmd_tx: Sender<GridCmd>, evt_rx: Receiver<GridEvent>) -> Self {
        Self {
            cmd_tx,
            evt_rx,
            thread: None,
        }
    }
}

impl Drop for BackendHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(GridCmd::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Worker tunables.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub settings: PagerSettings,
    /// Rows per table block.
    pub page_size: usize,
    /// Upper bound on a single remote call.
    pub fetch_timeout: Duration,
    /// Sort model the first epoch starts with.
    pub initial_sort: Vec<SortModelEntry>,
    pub perf_log: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            settings: PagerSettings::default(),
            page_size: DEFAULT_PAGE_SIZE,
            fetch_timeout: Duration::from_millis(repogrid_core::DEFAULT_FETCH_TIMEOUT_MS),
            initial_sort: Vec::new(),
            perf_log: false,
        }
    }
}

impl WorkerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            settings: config.pager_settings(),
            page_size: config.page_size,
            fetch_timeout: config.fetch_timeout(),
            initial_sort: Vec::new(),
            perf_log: env_flag_enabled("REPOGRID_PERF_LOG"),
        }
    }
}

enum Completion {
    Fetch {
        ticket: FetchTicket,
        started: Instant,
        result: Result<Page, SourceError>,
    },
    Edit {
        ticket: EditTicket,
        result: Result<EditOutcome, SourceError>,
    },
}

async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout),
    }
}

struct Worker {
    adapter: GridAdapter,
    source: Arc<dyn RemoteSource>,
    transport: Arc<dyn MutationTransport>,
    runtime: Runtime,
    evt_tx: Sender<GridEvent>,
    done_tx: Sender<Completion>,
    fetch_timeout: Duration,
    perf_log: bool,
}

impl Worker {
    fn handle_cmd(&mut self, cmd: GridCmd) {
        match cmd {
            GridCmd::RequestRows {
                id,
                start_row,
                end_row,
                sort_model,
            } => {
                let effects = self
                    .adapter
                    .request_rows(id, start_row, end_row, &sort_model);
                self.dispatch(effects);
            }
            GridCmd::SortChanged { id, sort_model } => {
                debug!(request = id.0, "sort model changed");
                let effects = self.adapter.sort_changed(id, &sort_model);
                self.dispatch(effects);
            }
            GridCmd::EditCell {
                cursor,
                col_id,
                value,
            } => {
                let decision = self.adapter.edit_cell(&cursor, &col_id, value);
                match decision.plan {
                    Some(plan) if decision.accepted => {
                        let _ = self.evt_tx.send(GridEvent::EditSubmitted {
                            cursor,
                            col_id,
                        });
                        let transport = Arc::clone(&self.transport);
                        let done_tx = self.done_tx.clone();
                        let limit = self.fetch_timeout;
                        self.runtime.spawn(async move {
                            let result =
                                with_timeout(limit, transport.submit_edit(plan.request)).await;
                            let _ = done_tx.send(Completion::Edit {
                                ticket: plan.ticket,
                                result,
                            });
                        });
                    }
                    _ => {
                        let _ = self.evt_tx.send(GridEvent::EditRejected { cursor, col_id });
                    }
                }
            }
            GridCmd::Shutdown => {}
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Fetch {
                ticket,
                started,
                result,
            } => {
                if self.perf_log {
                    info!(
                        target: "repogrid_gui::backend_perf",
                        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                        rows = result.as_ref().map(|page| page.rows.len()).unwrap_or(0),
                        ok = result.is_ok(),
                        cached = self.adapter.controller().cache().len(),
                        "backend fetch perf"
                    );
                }
                let effects = self.adapter.complete_fetch(ticket, result);
                self.dispatch(effects);
            }
            Completion::Edit { ticket, result } => {
                let Some(resolution) = self.adapter.complete_edit(ticket, result) else {
                    return;
                };
                let col_id = self
                    .adapter
                    .columns()
                    .iter()
                    .find(|column| column.field == resolution.field)
                    .map(|column| column.id.to_string())
                    .unwrap_or_else(|| resolution.field.clone());
                let _ = self
                    .evt_tx
                    .send(GridEvent::EditSettled { col_id, resolution });
            }
        }
    }

    fn dispatch(&mut self, effects: Vec<PagerEffect>) {
        for effect in effects {
            match effect {
                PagerEffect::Rows {
                    request,
                    start_row,
                    rows,
                    last_row,
                } => {
                    let _ = self.evt_tx.send(GridEvent::RowsLoaded {
                        id: request,
                        start_row,
                        rows,
                        last_row,
                        total_count: self.adapter.controller().total_count(),
                    });
                }
                PagerEffect::Failed { request, error } => {
                    let _ = self.evt_tx.send(GridEvent::RowsFailed { id: request, error });
                }
                PagerEffect::Fetch(plan) => self.spawn_fetch(plan),
            }
        }
    }

    fn spawn_fetch(&self, plan: FetchPlan) {
        let FetchPlan {
            ticket, request, ..
        } = plan;
        let source = Arc::clone(&self.source);
        let done_tx = self.done_tx.clone();
        let limit = self.fetch_timeout;
        self.runtime.spawn(async move {
            let started = Instant::now();
            let result = with_timeout(limit, source.fetch_page(request)).await;
            let _ = done_tx.send(Completion::Fetch {
                ticket,
                started,
                result,
            });
        });
    }
}

/// Spawn the backend worker thread that owns the pagination controller.
///
/// The controller runs on the worker thread; remote calls run on a small
/// tokio runtime owned by the worker and report back over a channel, so the
/// UI thread only ever exchanges [`GridCmd`] and [`GridEvent`] values.
///
/// # Arguments
/// - `source`: Read side of the remote endpoint.
/// - `transport`: Write side of the remote endpoint.
/// - `options`: Page sizing, timeout, and initial sort.
///
/// # Returns
/// A [`BackendHandle`] containing the command sender and event receiver.
///
/// # Errors
/// Returns an error if the runtime or the worker thread cannot be created.
pub fn spawn_backend(
    source: Arc<dyn RemoteSource>,
    transport: Arc<dyn MutationTransport>,
    options: WorkerOptions,
) -> Result<BackendHandle, AppError> {
    let (cmd_tx, cmd_rx) = unbounded::<GridCmd>();
    let (evt_tx, evt_rx) = unbounded();
    let (done_tx, done_rx) = unbounded();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("repogrid-gui-io")
        .enable_all()
        .build()
        .map_err(|err| AppError::Server(format!("failed to start runtime: {}", err)))?;

    let mut adapter = GridAdapter::new(
        REPOSITORY_COLUMNS,
        options.initial_sort,
        options.settings,
        options.page_size,
    );
    let hook_tx = evt_tx.clone();
    adapter.controller_mut().subscribe(move |event| {
        let forwarded = match event {
            CacheEvent::Reset { epoch } => GridEvent::CacheReset { epoch: *epoch },
            CacheEvent::RowUpdated { epoch, index, row } => GridEvent::RowUpdated {
                epoch: *epoch,
                index: *index,
                row: row.clone(),
            },
            CacheEvent::Appended { .. } => return,
        };
        let _ = hook_tx.send(forwarded);
    });

    let mut worker = Worker {
        adapter,
        source,
        transport,
        runtime,
        evt_tx,
        done_tx,
        fetch_timeout: options.fetch_timeout,
        perf_log: options.perf_log,
    };

    let thread = thread::Builder::new()
        .name("repogrid-gui-backend".to_string())
        .spawn(move || {
            loop {
                select! {
                    recv(cmd_rx) -> cmd => match cmd {
                        Ok(GridCmd::Shutdown) | Err(_) => break,
                        Ok(cmd) => worker.handle_cmd(cmd),
                    },
                    recv(done_rx) -> completion => {
                        if let Ok(completion) = completion {
                            worker.handle_completion(completion);
                        }
                    },
                }
            }
            let pending = worker.adapter.controller().pending_edit_count();
            if pending > 0 {
                warn!(pending, "backend stopping with edits still in flight");
            }
            worker.runtime.shutdown_timeout(Duration::from_millis(500));
        })
        .map_err(|err| AppError::Server(format!("failed to spawn backend: {}", err)))?;

    Ok(BackendHandle {
        cmd_tx,
        evt_rx,
        thread: Some(thread),
    })
}
