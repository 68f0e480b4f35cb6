use std::sync::{Condvar, PoisonError, WaitTimeoutResult};
use std::time::Duration;

/// A `std::sync::Mutex` that shrugs off poisoning.
///
/// A panic on one producer thread must not turn every later log call into a
/// panic, so a poisoned lock is simply taken over.
pub struct Mutex<T: ?Sized> {
    inner: std::sync::Mutex<T>,
}

pub type MutexGuard<'a, T> = std::sync::MutexGuard<'a, T>;

impl<T> Mutex<T> {
    pub const fn new(t: T) -> Mutex<T> {
        Mutex {
            inner: std::sync::Mutex::new(t),
        }
    }
}

impl<T: ?Sized> Mutex<T> {
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: ?Sized + std::fmt::Debug> std::fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutex").field("data", &&*self.lock()).finish()
    }
}

pub fn wait_while<'a, T, F>(cond: &Condvar, guard: MutexGuard<'a, T>, condition: F) -> MutexGuard<'a, T>
where
    F: FnMut(&mut T) -> bool,
{
    cond.wait_while(guard, condition)
        .unwrap_or_else(PoisonError::into_inner)
}

pub fn wait_timeout_while<'a, T, F>(
    cond: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
    condition: F,
) -> (MutexGuard<'a, T>, WaitTimeoutResult)
where
    F: FnMut(&mut T) -> bool,
{
    cond.wait_timeout_while(guard, timeout, condition)
        .unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn poisoned_lock_is_recovered() {
        let mutex = std::sync::Arc::new(Mutex::new(1u32));
        let cloned = mutex.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock();
            panic!("poison");
        })
        .join();
        *mutex.lock() += 1;
        assert_eq!(*mutex.lock(), 2);
    }
}
