use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::config::Options;
use super::handler::BatchHandler;
use super::split::split;
use super::types::{BatcherError, Completion, Sizable};

/// Aggregates individually added items into batches and hands them to a
/// caller-supplied handler under a concurrency bound.
///
/// Items are grouped in strict arrival order. A batch never exceeds
/// `max_batch_size` items or `max_batch_byte_size` bytes (where configured),
/// and at most `max_handlers` handler invocations run at any moment. Each
/// item's outcome is the outcome of the batch that carried it.
///
/// Cloning is cheap and every clone feeds the same queue.
pub struct Batcher<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Batcher<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<T> {
    options: Options,
    handler: Box<dyn BatchHandler<T>>,
    core: Mutex<Core<T>>,
    done: CancellationToken,
}

/// Queue, in-flight count and lifecycle state share one lock so a cut
/// decision is atomic with respect to concurrent producers and the
/// `max_handlers` bound stays exact.
struct Core<T> {
    queue: VecDeque<Pending<T>>,
    active: usize,
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Draining,
    Closed,
}

/// An enqueued item awaiting dispatch. Exactly one batch claims it and
/// resolves its completion sender exactly once.
struct Pending<T> {
    item: T,
    size: usize,
    done: oneshot::Sender<Result<(), BatcherError>>,
}

impl<T> Batcher<T>
where
    T: Sizable + Send + 'static,
{
    /// Creates a batcher that feeds cut batches to `handler`.
    ///
    /// `handler` is any [`BatchHandler`] implementation, including plain
    /// async closures of shape `Fn(Vec<T>) -> Future<Result<(), HandlerError>>`.
    pub fn new<H>(options: Options, handler: H) -> Self
    where
        H: BatchHandler<T> + 'static,
    {
        Batcher {
            shared: Arc::new(Shared {
                options,
                handler: Box::new(handler),
                core: Mutex::new(Core {
                    queue: VecDeque::new(),
                    active: 0,
                    state: State::Open,
                }),
                done: CancellationToken::new(),
            }),
        }
    }

    /// Adds an item and waits until the batch carrying it settles.
    ///
    /// Returns the handler's error verbatim (as
    /// [`BatcherError::Handler`]) when that batch fails, or the validation
    /// error for items rejected before enqueue. This await is the only
    /// back-pressure mechanism: a burst of `add` callers is throttled by
    /// handler throughput and `max_handlers`.
    pub async fn add(&self, item: T) -> Result<(), BatcherError> {
        self.add_no_wait(item).await
    }

    /// Adds an item without waiting; the returned [`Completion`] resolves
    /// once the batch carrying the item settles.
    ///
    /// Rejections (post-shutdown, oversized item) come back through an
    /// already-failed `Completion`; this call itself never blocks.
    pub fn add_no_wait(&self, item: T) -> Completion {
        // Sampled before taking the lock: byte_size is caller code.
        let size = item.byte_size();
        let limit = self.shared.options.max_batch_byte_size;

        let mut core = self.shared.lock_core();
        if core.state != State::Open {
            return Completion::ready(Err(BatcherError::Shutdown));
        }
        if limit > 0 && size > limit {
            return Completion::ready(Err(BatcherError::ItemTooLarge { size, limit }));
        }

        let (tx, rx) = oneshot::channel();
        core.queue.push_back(Pending {
            item,
            size,
            done: tx,
        });
        let batches = cut(&mut core, &self.shared.options, false);
        drop(core);

        for batch in batches {
            self.spawn_batch(batch);
        }
        Completion::waiting(rx)
    }

    /// Stops accepting items, dispatches everything still queued (the
    /// `min_batch_size` gate is ignored) and waits until every in-flight
    /// and newly cut batch has settled.
    ///
    /// Idempotent: later calls, concurrent or not, wait for the same
    /// quiescence point. Afterwards `add`/`add_no_wait` fail with
    /// [`BatcherError::Shutdown`].
    pub async fn shutdown_and_drain(&self) {
        let batches = {
            let mut core = self.shared.lock_core();
            if core.state == State::Open {
                core.state = State::Draining;
                debug!(
                    queued = core.queue.len(),
                    in_flight = core.active,
                    "draining batcher"
                );
            }
            let batches = cut(&mut core, &self.shared.options, true);
            self.shared.close_if_quiescent(&mut core);
            batches
        };

        for batch in batches {
            self.spawn_batch(batch);
        }
        self.shared.done.cancelled().await;
    }

    /// Runs the handler for one cut batch and fans its single outcome out
    /// to every item's completion sender.
    fn spawn_batch(&self, batch: Vec<Pending<T>>) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut items = Vec::with_capacity(batch.len());
            let mut dones = Vec::with_capacity(batch.len());
            for pending in batch {
                items.push(pending.item);
                dones.push(pending.done);
            }

            trace!(batch_len = items.len(), "invoking handler");
            match this.shared.handler.handle(items).await {
                Ok(()) => {
                    for done in dones {
                        // A dropped Completion is not an error.
                        let _ = done.send(Ok(()));
                    }
                }
                Err(err) => {
                    debug!(error = %err, "handler failed, failing the whole batch");
                    let err: Arc<dyn std::error::Error + Send + Sync> = Arc::from(err);
                    for done in dones {
                        let _ = done.send(Err(BatcherError::Handler(Arc::clone(&err))));
                    }
                }
            }

            this.on_batch_settled();
        });
    }

    /// Releases the batch's concurrency slot and lets the dispatcher cut
    /// again; during drain this is what eventually empties the queue.
    fn on_batch_settled(&self) {
        let batches = {
            let mut core = self.shared.lock_core();
            core.active -= 1;
            let forced = core.state == State::Draining;
            let batches = cut(&mut core, &self.shared.options, forced);
            self.shared.close_if_quiescent(&mut core);
            batches
        };

        for batch in batches {
            self.spawn_batch(batch);
        }
    }
}

impl<T> Shared<T> {
    fn lock_core(&self) -> MutexGuard<'_, Core<T>> {
        self.core.lock().expect("batcher state lock poisoned")
    }

    fn close_if_quiescent(&self, core: &mut Core<T>) {
        if core.state == State::Draining && core.active == 0 && core.queue.is_empty() {
            core.state = State::Closed;
            debug!("batcher drained");
            self.done.cancel();
        }
    }
}

/// Cuts zero or more batches from the front of the queue.
///
/// Bounded by the current concurrency headroom, the per-batch count and byte
/// ceilings, and (unless `forced`, i.e. draining) the `min_batch_size` gate
/// against the remaining queued count. Increments `active` by the number of
/// batches cut; the caller must submit every one of them.
fn cut<T>(core: &mut Core<T>, options: &Options, forced: bool) -> Vec<Vec<Pending<T>>> {
    let headroom = options.max_handlers - core.active;
    if headroom == 0 || core.queue.is_empty() {
        return Vec::new();
    }

    let batches = if options.max_batch_byte_size == 0 {
        cut_by_count(core, options, forced, headroom)
    } else {
        cut_by_bytes(core, options, forced, headroom)
    };

    core.active += batches.len();
    if !batches.is_empty() {
        trace!(
            batches = batches.len(),
            left_queued = core.queue.len(),
            in_flight = core.active,
            "cut batches"
        );
    }
    batches
}

/// Count-only cutting: sized by the pure [`split`] function, with
/// `max_handlers` narrowed to the live headroom and the threshold dropped
/// to 1 while draining.
fn cut_by_count<T>(
    core: &mut Core<T>,
    options: &Options,
    forced: bool,
    headroom: usize,
) -> Vec<Vec<Pending<T>>> {
    let effective = Options {
        min_batch_size: if forced { 1 } else { options.min_batch_size },
        max_batch_size: options.max_batch_size,
        max_batch_byte_size: 0,
        max_handlers: headroom,
    };

    split(core.queue.len(), &effective)
        .into_iter()
        .map(|size| core.queue.drain(..size).collect())
        .collect()
}

/// Byte-aware cutting: a greedy left-to-right pass that closes a batch the
/// moment the next item would break the count or byte ceiling. No lookahead,
/// no reordering. Oversized single items are rejected at `add_no_wait`, so
/// the first item of a batch is always admissible.
fn cut_by_bytes<T>(
    core: &mut Core<T>,
    options: &Options,
    forced: bool,
    headroom: usize,
) -> Vec<Vec<Pending<T>>> {
    let min = if forced { 1 } else { options.min_batch_size };
    let mut batches = Vec::new();

    while core.queue.len() >= min && batches.len() < headroom {
        let mut batch = Vec::new();
        let mut bytes = 0usize;

        while let Some(front) = core.queue.front() {
            if options.max_batch_size > 0 && batch.len() >= options.max_batch_size {
                break;
            }
            if !batch.is_empty() && bytes + front.size > options.max_batch_byte_size {
                break;
            }
            bytes += front.size;
            let pending = core.queue.pop_front().expect("front was just observed");
            batch.push(pending);
        }

        debug_assert!(!batch.is_empty(), "byte-aware cut produced an empty batch");
        batches.push(batch);
    }

    batches
}
