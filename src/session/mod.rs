/*!
 * Session management for operator-driven range transfers.
 *
 * This module provides:
 * - The session record and its transition rules
 * - The shared single-slot owner used by the handler and the range task
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::SessionSlot;
pub use models::{PositionRange, ReferenceStep, Session, SessionPhase};
