/*!
 * Core Module
 * Shared types and error definitions
 */

pub mod errors;
pub mod types;

pub use errors::{PortError, PortResult};
pub use types::{Koid, PacketKey, Rights, Signals};
