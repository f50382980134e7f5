use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::debug;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Tiles finished out of the tiles in the current generation.
///
/// Read by the presentation layer for a "done / total" readout.
#[derive(Debug, Default)]
pub struct Progress {
    done: AtomicUsize,
    total: AtomicUsize,
}

impl Progress {
    /// Reset for a new generation with `total` tiles.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    /// Force `done` up to `total`.
    pub fn finish(&self) {
        self.done
            .store(self.total.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    /// `(done, total)`.
    pub fn get(&self) -> (usize, usize) {
        (
            self.done.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Lifecycle of a compute request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been computed yet.
    Idle,
    /// A caller is queued for the exclusive right to the grid.
    Requested,
    /// Tiles are being dispatched and evaluated.
    Running,
    /// Superseded; remaining tiles are being counted off without work.
    Draining,
    /// Every tile is accounted for.
    Done,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Done,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Draining => 1,
            _ => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Requested => "Queued\u{2026}",
            Self::Running => "Computing\u{2026}",
            Self::Draining => "Cancelling\u{2026}",
            Self::Done => "Done",
        }
    }
}

/// One fill of the grid: a cancellation token plus a countdown of tiles not
/// yet accounted for.
///
/// The generation stays live while the coordinator's epoch still equals
/// its id; any newer request bumps the epoch. Whether it finishes or is
/// superseded, the countdown always reaches zero, releasing
/// [`wait`](Self::wait).
#[derive(Debug)]
pub struct Generation {
    id: u64,
    epoch: Arc<AtomicU64>,
    outstanding: Mutex<usize>,
    drained: Condvar,
    phase: AtomicU8,
}

impl Generation {
    fn new(id: u64, epoch: Arc<AtomicU64>, tiles: usize) -> Self {
        Self {
            id,
            epoch,
            outstanding: Mutex::new(tiles),
            drained: Condvar::new(),
            phase: AtomicU8::new(Phase::Running.as_u8()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// `true` once a newer request has superseded this generation.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.epoch.load(Ordering::Acquire) != self.id
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Tiles neither finished nor counted off yet.
    pub fn outstanding(&self) -> usize {
        *lock(&self.outstanding)
    }

    /// Note that the generation has started counting off skipped tiles.
    pub(crate) fn begin_draining(&self) {
        let _ = self.phase.compare_exchange(
            Phase::Running.as_u8(),
            Phase::Draining.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Account for `count` tiles, finished or skipped.
    pub(crate) fn complete(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut outstanding = lock(&self.outstanding);
        *outstanding = outstanding.saturating_sub(count);
        if *outstanding == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until every tile is accounted for.
    pub fn wait(&self) {
        let mut outstanding = lock(&self.outstanding);
        while *outstanding > 0 {
            outstanding = self
                .drained
                .wait(outstanding)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn finish(&self) {
        self.phase.store(Phase::Done.as_u8(), Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Decides which compute request may write the grid.
///
/// One request holds the exclusive right at a time and at most one more
/// waits for it; anyone arriving while that slot is taken is turned away.
/// Every request first bumps the epoch, which cancels whatever generation
/// is running, so the queued request always starts from the newest view.
#[derive(Debug)]
pub struct Coordinator {
    epoch: Arc<AtomicU64>,
    queue_slot: Mutex<()>,
    queued: AtomicBool,
    exclusive: Mutex<()>,
    latest: Mutex<Option<Arc<Generation>>>,
    progress: Arc<Progress>,
}

/// Proof of holding the exclusive right, bound to a fresh generation.
/// Dropping it lets the queued request in.
pub(crate) struct Admission<'a> {
    pub(crate) generation: Arc<Generation>,
    _exclusive: MutexGuard<'a, ()>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            epoch: Arc::new(AtomicU64::new(0)),
            queue_slot: Mutex::new(()),
            queued: AtomicBool::new(false),
            exclusive: Mutex::new(()),
            latest: Mutex::new(None),
            progress: Arc::new(Progress::default()),
        }
    }

    /// Supersede the running generation, if any.
    pub fn cancel(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    pub fn progress(&self) -> &Arc<Progress> {
        &self.progress
    }

    pub fn latest(&self) -> Option<Arc<Generation>> {
        lock(&self.latest).clone()
    }

    pub fn phase(&self) -> Phase {
        if self.queued.load(Ordering::Acquire) {
            return Phase::Requested;
        }
        self.latest()
            .map(|g| g.phase())
            .unwrap_or(Phase::Idle)
    }

    /// Wait for the exclusive right and open a generation of `tiles` tiles,
    /// or return `None` at once if another request is already waiting.
    pub(crate) fn admit(&self, tiles: usize) -> Option<Admission<'_>> {
        self.cancel();

        let slot = match self.queue_slot.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        self.queued.store(true, Ordering::Release);
        let exclusive = lock(&self.exclusive);
        self.queued.store(false, Ordering::Release);
        drop(slot);

        // Read after taking the slot's place: requests turned away while we
        // waited have already bumped the epoch, so this id is the newest.
        let id = self.epoch.load(Ordering::Acquire);
        let generation = Arc::new(Generation::new(id, Arc::clone(&self.epoch), tiles));
        *lock(&self.latest) = Some(Arc::clone(&generation));
        debug!(generation = id, tiles, "Generation admitted");

        Some(Admission {
            generation,
            _exclusive: exclusive,
        })
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_counts_and_finishes() {
        let p = Progress::default();
        p.reset(4);
        p.inc();
        p.inc();
        assert_eq!(p.get(), (2, 4));
        p.finish();
        assert_eq!(p.get(), (4, 4));
        p.reset(9);
        assert_eq!(p.get(), (0, 9));
    }

    #[test]
    fn new_admission_cancels_previous_generation() {
        let c = Coordinator::new();
        let first = c.admit(3).unwrap().generation;
        assert!(!first.is_cancelled());
        c.cancel();
        assert!(first.is_cancelled());

        let second = c.admit(3).unwrap().generation;
        assert!(!second.is_cancelled());
        assert!(second.id() > first.id());
    }

    #[test]
    fn countdown_releases_waiter() {
        let c = Coordinator::new();
        let generation = c.admit(5).unwrap().generation;
        let waiter = {
            let g = Arc::clone(&generation);
            std::thread::spawn(move || g.wait())
        };
        generation.complete(2);
        assert_eq!(generation.outstanding(), 3);
        generation.complete(3);
        waiter.join().unwrap();
        assert_eq!(generation.outstanding(), 0);
    }

    #[test]
    fn phases_move_forward() {
        let c = Coordinator::new();
        assert_eq!(c.phase(), Phase::Idle);
        let generation = c.admit(1).unwrap().generation;
        assert_eq!(c.phase(), Phase::Running);
        generation.begin_draining();
        assert_eq!(c.phase(), Phase::Draining);
        generation.finish();
        assert_eq!(c.phase(), Phase::Done);
        // Draining never resurrects a finished generation.
        generation.begin_draining();
        assert_eq!(generation.phase(), Phase::Done);
    }

    #[test]
    fn second_waiter_is_rejected() {
        let c = Arc::new(Coordinator::new());
        let running = c.admit(1).unwrap();

        let queued = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || c.admit(1).map(|a| a.generation.id()))
        };
        while c.phase() != Phase::Requested {
            std::thread::yield_now();
        }
        assert!(c.admit(1).is_none(), "a third request must be turned away");
        assert!(running.generation.is_cancelled());

        drop(running);
        let queued_id = queued.join().unwrap();
        assert!(queued_id.is_some());
    }
}
