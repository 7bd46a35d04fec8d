use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tileworld_common::{EngineResult, TickableId};
use tileworld_kernel::World;
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, check_rate};
use crate::presentation::Presentation;
use crate::stats::CycleStats;
use crate::tickable::{SharedWorld, Tickable, TickableInfo};

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Entry {
    info: TickableInfo,
    tickable: Arc<Mutex<dyn Tickable>>,
    world: Option<SharedWorld>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    fn push(&mut self, entry: impl FnOnce(TickableId) -> Entry) -> TickableId {
        self.next_id += 1;
        let id = TickableId(self.next_id);
        self.entries.push(entry(id));
        id
    }

    fn take_where(&mut self, pred: impl Fn(&Entry) -> bool) -> Vec<Entry> {
        let (taken, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| pred(e));
        self.entries = kept;
        taken
    }

    fn contains(&self, id: TickableId) -> bool {
        self.entries.iter().any(|e| e.info.id == id)
    }
}

struct Inner<C: Clock> {
    clock: C,
    config: Mutex<EngineConfig>,
    registry: Mutex<Registry>,
    presentation: Mutex<Option<Arc<dyn Presentation>>>,
    stats: Mutex<CycleStats>,
    running: AtomicBool,
    /// Bumped by every `start`; a loop thread exits once it no longer owns
    /// the current epoch.
    epoch: AtomicU64,
    thread: Mutex<Option<JoinHandle<()>>>,
}

/// Fixed-rate scheduler.
///
/// Each cycle waits out whatever is left of the period since the previous
/// cycle started (none after an overrun), then ticks every registered
/// tickable in registration order. Handles are cheap to clone and may be
/// passed into tickables.
pub struct Engine<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for Engine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Engine<SystemClock> {
    /// An engine at 20 ticks per second on the wall clock.
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), SystemClock::default())
    }

    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        Self::with_clock(config, SystemClock::default())
    }
}

impl Default for Engine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Engine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: EngineConfig, clock: C) -> Self {
        let stats = CycleStats::new(config.stats_window);
        Self {
            inner: Arc::new(Inner {
                clock,
                config: Mutex::new(config),
                registry: Mutex::new(Registry::default()),
                presentation: Mutex::new(None),
                stats: Mutex::new(stats),
                running: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                thread: Mutex::new(None),
            }),
        }
    }

    pub fn clock(&self) -> &C {
        &self.inner.clock
    }

    pub fn ticks_per_second(&self) -> f64 {
        lock(&self.inner.config).ticks_per_second
    }

    /// Takes effect at the next cycle boundary.
    pub fn set_ticks_per_second(&self, rate: f64) -> EngineResult<()> {
        check_rate(rate)?;
        lock(&self.inner.config).ticks_per_second = rate;
        info!(rate, "tick rate changed");
        Ok(())
    }

    pub fn set_presentation(&self, presentation: Arc<dyn Presentation>) {
        *lock(&self.inner.presentation) = Some(presentation);
    }

    // --- registration ---

    /// Register a tickable. It is first ticked on the cycle after the one in
    /// progress, if any.
    pub fn add_object<T: Tickable + 'static>(&self, tickable: Arc<Mutex<T>>) -> TickableId {
        let id = lock(&self.inner.registry).push(|id| Entry {
            info: TickableInfo::of::<T>(id, false),
            tickable,
            world: None,
        });
        debug!(tickable = %id, "tickable added");
        id
    }

    pub fn add_world(&self, world: SharedWorld) -> TickableId {
        let id = lock(&self.inner.registry).push(|id| Entry {
            info: TickableInfo::of::<World>(id, true),
            tickable: world.clone(),
            world: Some(world),
        });
        debug!(tickable = %id, "world added");
        id
    }

    /// Deregister. A tick already running finishes; the tickable is skipped
    /// from then on, including later in the current cycle.
    pub fn remove_object(&self, id: TickableId) -> bool {
        let removed = lock(&self.inner.registry).take_where(|e| e.info.id == id);
        !removed.is_empty()
    }

    pub fn remove_objects(&self, pred: impl Fn(&TickableInfo) -> bool) -> Vec<TickableInfo> {
        lock(&self.inner.registry)
            .take_where(|e| pred(&e.info))
            .into_iter()
            .map(|e| e.info)
            .collect()
    }

    /// Remove every tickable registered with type `T`.
    pub fn remove_objects_of<T: 'static>(&self) -> usize {
        self.remove_objects(|info| info.is::<T>()).len()
    }

    pub fn remove_world(&self, world: &SharedWorld) -> bool {
        let removed = lock(&self.inner.registry)
            .take_where(|e| e.world.as_ref().is_some_and(|w| Arc::ptr_eq(w, world)));
        !removed.is_empty()
    }

    pub fn remove_worlds(&self) -> Vec<SharedWorld> {
        lock(&self.inner.registry)
            .take_where(|e| e.world.is_some())
            .into_iter()
            .filter_map(|e| e.world)
            .collect()
    }

    pub fn active_worlds(&self) -> Vec<SharedWorld> {
        lock(&self.inner.registry)
            .entries
            .iter()
            .filter_map(|e| e.world.clone())
            .collect()
    }

    pub fn tickables(&self) -> Vec<TickableInfo> {
        lock(&self.inner.registry)
            .entries
            .iter()
            .map(|e| e.info.clone())
            .collect()
    }

    /// Replace every registered world with `world` in one registry update,
    /// then point the presentation at it. Other tickables stay registered.
    /// Returns the worlds that were active.
    pub fn switch_active_world(&self, world: SharedWorld) -> Vec<SharedWorld> {
        let (previous, id) = {
            let mut registry = lock(&self.inner.registry);
            let previous: Vec<SharedWorld> = registry
                .take_where(|e| e.world.is_some())
                .into_iter()
                .filter_map(|e| e.world)
                .collect();
            let next = world.clone();
            let id = registry.push(|id| Entry {
                info: TickableInfo::of::<World>(id, true),
                tickable: next.clone(),
                world: Some(next),
            });
            (previous, id)
        };
        let presentation = lock(&self.inner.presentation).clone();
        if let Some(presentation) = presentation {
            presentation.show_world(&world);
        }
        info!(tickable = %id, replaced = previous.len(), "active world switched");
        previous
    }

    // --- running ---

    /// Run one cycle on the calling thread, without pacing.
    pub fn run_cycle(&self) {
        self.inner.run_cycle();
    }

    /// Run paced cycles on the calling thread until `duration` of clock time
    /// has passed. Returns the number of cycles run.
    pub fn run_for(&self, duration: Duration) -> u64 {
        let deadline = self.inner.clock.now() + duration;
        let mut previous = None;
        let mut cycles = 0;
        loop {
            self.inner.pace(&mut previous);
            if self.inner.clock.now() >= deadline {
                break;
            }
            self.inner.run_cycle();
            cycles += 1;
        }
        cycles
    }

    /// Spawn the scheduling thread. A no-op when already running.
    pub fn start(&self) -> std::io::Result<()> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let weak = Arc::downgrade(&self.inner);
        let spawned = thread::Builder::new()
            .name("tileworld-engine".into())
            .spawn(move || run_loop(weak, epoch));
        match spawned {
            Ok(handle) => {
                *lock(&self.inner.thread) = Some(handle);
                info!(rate = self.ticks_per_second(), "engine started");
                Ok(())
            }
            Err(err) => {
                self.inner.running.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Stop the scheduling thread after its current cycle. Joins it unless
    /// called from that thread, e.g. by a tickable.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = lock(&self.inner.thread).take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!("engine thread panicked");
            }
        }
        info!("engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> CycleStats {
        lock(&self.inner.stats).clone()
    }

    /// Cycles run since creation.
    pub fn cycles(&self) -> u64 {
        lock(&self.inner.stats).cycles()
    }
}

fn run_loop<C: Clock>(weak: Weak<Inner<C>>, epoch: u64) {
    let mut previous = None;
    loop {
        // Exits once every engine handle is gone.
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.owns(epoch) {
            break;
        }
        inner.pace(&mut previous);
        if !inner.owns(epoch) {
            break;
        }
        inner.run_cycle();
    }
    debug!(epoch, "engine loop exited");
}

impl<C: Clock> Inner<C> {
    fn owns(&self, epoch: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn period(&self) -> Duration {
        lock(&self.config).period()
    }

    /// Sleep out the rest of the period measured from the previous cycle
    /// start, then mark the start of this one.
    fn pace(&self, previous: &mut Option<Duration>) {
        if let Some(started) = *previous {
            let elapsed = self.clock.now().saturating_sub(started);
            let period = self.period();
            if elapsed < period {
                self.clock.sleep(period - elapsed);
            }
        }
        *previous = Some(self.clock.now());
    }

    fn run_cycle(&self) {
        let started = self.clock.now();
        let cycle = lock(&self.stats).cycles() + 1;
        let _span = tracing::info_span!("engine_cycle", cycle).entered();

        let snapshot: Vec<(TickableId, Arc<Mutex<dyn Tickable>>)> = lock(&self.registry)
            .entries
            .iter()
            .map(|e| (e.info.id, Arc::clone(&e.tickable)))
            .collect();

        for (id, tickable) in snapshot {
            if !lock(&self.registry).contains(id) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| lock(tickable.as_ref()).tick()));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(tickable = %id, error = %err, "tick failed"),
                Err(payload) => {
                    error!(tickable = %id, panic = %panic_message(payload.as_ref()), "tick panicked")
                }
            }
        }

        let spent = self.clock.now().saturating_sub(started);
        let period = self.period();
        if spent > period {
            debug!(cycle, ?spent, ?period, "cycle overran its period");
        }
        lock(&self.stats).record(spent, period);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
