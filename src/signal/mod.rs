/*!
 * Signal Module
 * Per-object signal state tracking and observer notification
 */

pub mod tracker;
pub mod traits;

pub use tracker::SignalTracker;
pub use traits::{SignalObserver, Waitable};
