//! Type aliases for commonly used thread-safe types.
//!
//! The console has three kinds of threads touching shared data: the operator
//! control flow, the per-connection reader loop, and the frame producer.
//! These aliases name the containers they share.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spiderbot_core::types::*;
//!
//! // Instead of: Arc<Mutex<VecDeque<Frame>>>
//! let queue: ThreadSafeDeque<Frame> = thread_safe_deque_with_capacity(1);
//! ```

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`
/// and no lock poisoning.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe deque for cross-thread queue/buffer management.
pub type ThreadSafeDeque<T> = Arc<Mutex<VecDeque<T>>>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create a new empty `ThreadSafeDeque<T>` with room for `capacity` items.
#[inline]
pub fn thread_safe_deque_with_capacity<T>(capacity: usize) -> ThreadSafeDeque<T> {
    Arc::new(Mutex::new(VecDeque::with_capacity(capacity)))
}
