//! A thread-safe map whose entries expire after a sliding idle timeout.
//!
//! One cache-wide [`Mutex`] guards both the entries and a min-heap of
//! deadlines. A single reaper thread sleeps on a [`Condvar`] until the
//! earliest deadline, then evicts whatever is due. Reads slide an entry's
//! deadline without touching the heap; when the reaper pops a stale node it
//! re-queues it at the entry's current deadline instead of evicting.
//!
//! Replacing or deleting a key does not touch the heap. The old node stays
//! queued until its original deadline and is skipped then: a replaced key
//! carries a new generation, a deleted key has no entry. Dead nodes are
//! therefore bounded by the number of `set` calls within one TTL.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest TTL the cache honours; longer values are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct Entry<V> {
    value: V,
    deadline: Instant,
    generation: u64,
}

/// Heap node: (deadline, generation, key). Ordered earliest first via `Reverse`.
type Due = Reverse<(Instant, u64, String)>;

struct State<V> {
    entries: HashMap<String, Entry<V>>,
    deadlines: BinaryHeap<Due>,
    next_generation: u64,
    shutdown: bool,
}

struct Shared<V> {
    state: Mutex<State<V>>,
    wake: Condvar,
    ttl: Duration,
}

impl<V> Shared<V> {
    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Session-keyed store with sliding expiration and one background reaper.
///
/// Values are handed out by clone, so large or mutable values belong behind
/// an `Arc`. Dropping the cache stops and joins the reaper.
pub struct ExpiringCache<V> {
    shared: Arc<Shared<V>>,
    reaper: Option<JoinHandle<()>>,
}

impl<V> ExpiringCache<V>
where
    V: Clone + Send + 'static,
{
    /// Create a cache and start its reaper. `ttl` is clamped to [`MAX_TTL`].
    pub fn new(ttl: Duration) -> Self {
        if ttl > MAX_TTL {
            tracing::warn!(?ttl, max = ?MAX_TTL, "cache ttl clamped");
        }
        let ttl = ttl.min(MAX_TTL);
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                entries: HashMap::new(),
                deadlines: BinaryHeap::new(),
                next_generation: 0,
                shutdown: false,
            }),
            wake: Condvar::new(),
            ttl,
        });

        let reaper_shared = Arc::clone(&shared);
        let reaper = thread::Builder::new()
            .name("cache-reaper".into())
            .spawn(move || reap(&reaper_shared))
            .map_err(|e| tracing::error!(error = %e, "failed to spawn cache reaper; entries expire on access only"))
            .ok();

        Self { shared, reaper }
    }

    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    /// Look up `key`, sliding its deadline to now + TTL on a hit.
    ///
    /// An entry past its deadline is a miss even if the reaper has not got
    /// to it yet.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.shared.lock();
        let entry = state.entries.get_mut(key)?;
        if entry.deadline <= now {
            state.entries.remove(key);
            tracing::debug!(key, "entry expired before reaping");
            return None;
        }
        entry.deadline = deadline_after(now, self.shared.ttl);
        Some(entry.value.clone())
    }

    /// Insert or replace `key`. The new value runs a full TTL; the replaced
    /// value's heap node is left to be skipped at its old deadline.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let deadline = deadline_after(Instant::now(), self.shared.ttl);
        let mut state = self.shared.lock();
        let generation = state.next_generation;
        state.next_generation += 1;
        state.deadlines.push(Reverse((deadline, generation, key.clone())));
        state.entries.insert(
            key,
            Entry {
                value,
                deadline,
                generation,
            },
        );
        drop(state);
        self.shared.wake.notify_one();
    }

    /// Remove `key`. Removing an absent key is a no-op. Its heap node is
    /// skipped when it comes due.
    pub fn delete(&self, key: &str) -> Option<V> {
        self.shared.lock().entries.remove(key).map(|entry| entry.value)
    }

    /// Whether `key` is present, without sliding its deadline.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.shared
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.deadline > now)
    }

    /// Entries currently stored, including any that are due but not yet
    /// reaped.
    pub fn len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Drop for ExpiringCache<V> {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(reaper) = self.reaper.take() {
            let _ = reaper.join();
        }
    }
}

/// `now + ttl`, saturating at [`MAX_TTL`] when the clock cannot represent it.
fn deadline_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(MAX_TTL))
        .unwrap_or(now)
}

/// Reaper loop. Holds the lock only while inspecting the heap; sleeps on the
/// condvar until the earliest deadline or until `set`/drop wakes it.
fn reap<V>(shared: &Shared<V>) {
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            return;
        }

        let now = Instant::now();
        let earliest = state.deadlines.peek().map(|Reverse((deadline, _, _))| *deadline);
        let wait = match earliest {
            None => None,
            Some(deadline) if deadline > now => Some(deadline - now),
            Some(_) => {
                if let Some(Reverse((_, generation, key))) = state.deadlines.pop() {
                    evict_if_due(&mut state, generation, key, now);
                }
                continue;
            }
        };

        state = match wait {
            None => shared.wake.wait(state).unwrap_or_else(|e| e.into_inner()),
            Some(timeout) => {
                shared
                    .wake
                    .wait_timeout(state, timeout)
                    .unwrap_or_else(|e| e.into_inner())
                    .0
            }
        };
    }
}

fn evict_if_due<V>(state: &mut State<V>, generation: u64, key: String, now: Instant) {
    let Some(entry) = state.entries.get(&key) else {
        return;
    };
    // Node from a replaced value.
    if entry.generation != generation {
        return;
    }
    if entry.deadline > now {
        let deadline = entry.deadline;
        state.deadlines.push(Reverse((deadline, generation, key)));
        return;
    }
    state.entries.remove(&key);
    tracing::info!(key = %key, "session expired");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn set_then_get_returns_value() {
        let cache = ExpiringCache::new(ms(500));
        cache.set("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert!(cache.contains_key("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_of_unknown_key_is_a_miss() {
        let cache: ExpiringCache<u32> = ExpiringCache::new(ms(500));
        assert_eq!(cache.get("never-set"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn delete_then_get_misses() {
        let cache = ExpiringCache::new(ms(500));
        cache.set("a", 1);
        assert_eq!(cache.delete("a"), Some(1));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn delete_of_absent_key_is_a_no_op() {
        let cache: ExpiringCache<u32> = ExpiringCache::new(ms(500));
        assert_eq!(cache.delete("nope"), None);
        cache.set("a", 1);
        cache.delete("a");
        assert_eq!(cache.delete("a"), None);
    }

    #[test]
    fn read_slides_the_deadline() {
        let cache = ExpiringCache::new(ms(500));
        cache.set("a", 1);

        thread::sleep(ms(300));
        assert_eq!(cache.get("a"), Some(1));

        // Past the original deadline but within TTL of the read.
        thread::sleep(ms(300));
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn idle_entry_expires() {
        let cache = ExpiringCache::new(ms(500));
        cache.set("a", 1);

        thread::sleep(ms(300));
        assert_eq!(cache.get("a"), Some(1));

        thread::sleep(ms(600));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn reaper_removes_idle_entries_without_reads() {
        let cache = ExpiringCache::new(ms(100));
        cache.set("a", 1);
        cache.set("b", 2);

        thread::sleep(ms(400));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn repeated_reads_keep_entry_alive() {
        let cache = ExpiringCache::new(ms(200));
        cache.set("a", 1);
        for _ in 0..8 {
            thread::sleep(ms(80));
            assert_eq!(cache.get("a"), Some(1));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn replacing_a_key_restarts_its_ttl() {
        let cache = ExpiringCache::new(ms(300));
        cache.set("a", 1);
        thread::sleep(ms(200));
        cache.set("a", 2);

        // The first value's deadline passes; the replacement must survive it.
        thread::sleep(ms(200));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn delete_then_reset_survives_old_deadline() {
        let cache = ExpiringCache::new(ms(300));
        cache.set("a", 1);
        thread::sleep(ms(200));
        cache.delete("a");
        cache.set("a", 2);

        // The deleted value's node comes due here and must not evict the new one.
        thread::sleep(ms(200));
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn deletes_racing_expiry_leave_nothing_behind() {
        let cache = Arc::new(ExpiringCache::new(ms(50)));
        for round in 0..10 {
            cache.set("a", round);
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        thread::sleep(ms(40 + t * 5));
                        cache.delete("a");
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        }
        thread::sleep(ms(100));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let cache = ExpiringCache::new(Duration::from_secs(u64::MAX));
        assert_eq!(cache.ttl(), MAX_TTL);
        cache.set("a", 1);
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn deadline_after_saturates() {
        let now = Instant::now();
        assert_eq!(deadline_after(now, ms(10)), now + ms(10));
        assert!(deadline_after(now, Duration::from_secs(u64::MAX)) > now);
    }

    #[test]
    fn other_keys_are_unaffected_by_eviction() {
        let cache = ExpiringCache::new(ms(200));
        cache.set("short", 1);
        thread::sleep(ms(120));
        cache.set("long", 2);
        thread::sleep(ms(120));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn concurrent_access_from_many_threads() {
        let cache = Arc::new(ExpiringCache::new(Duration::from_secs(5)));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{t}-{i}");
                        cache.set(key.clone(), i);
                        assert_eq!(cache.get(&key), Some(i));
                        if i % 2 == 0 {
                            cache.delete(&key);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 8 * 50);
    }

    #[test]
    fn drop_stops_the_reaper() {
        let cache = ExpiringCache::new(Duration::from_secs(3600));
        cache.set("a", 1);
        drop(cache);
    }
}
