//! Host scheduling capability
//!
//! The engine never runs deferred work itself. It hands closures to a
//! [`Scheduler`] supplied by the host, which runs them one at a time on a
//! later loop iteration ("tick").

mod local;

pub use local::LocalScheduler;

/// Deferred unit of work handed to the host.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Defers callbacks to a later iteration of a single-threaded event loop.
///
/// Implementations only promise that a task runs after the current
/// synchronous stack unwinds; no ordering beyond that is assumed.
pub trait Scheduler {
    /// Queue `task` to run on a later tick.
    fn schedule(&self, task: Task);
}
