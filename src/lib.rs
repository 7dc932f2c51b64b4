/*!
 * # Topic Relay
 *
 * A Telegram bot library that copies a contiguous range of source channel
 * messages into a freshly created forum topic, without the "forwarded from"
 * header.
 *
 * ## Features
 *
 * - Operator conversation: name a topic, send the START link, send the END link
 * - Two transfer strategies:
 *   - Direct relay (native copy with the provenance header suppressed)
 *   - Manual reconstruct (fetch the message and rebuild it by content kind)
 * - Strictly ordered, rate-limited range processing in a background task
 * - A single progress message edited in place, then one final summary
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Command dispatch, authorization and session operations
 * - `session`: The single in-flight session and its shared owner
 * - `reference`: Message link parsing
 * - `transfer`: Per-message transfer strategies and the rate limiter
 * - `range_processor`: The background range task
 * - `progress`: Progress message and operator-facing texts
 * - `message`: Tagged message content
 * - `transport`: Messaging platform abstraction:
 *   - `transport::telegram`: Bot API client
 *   - `transport::mock`: In-memory transport for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod message;
pub mod progress;
pub mod range_processor;
pub mod reference;
pub mod session;
pub mod transfer;
pub mod transport;

// Re-export main types for easier usage
pub use app_config::{Config, TransferMode};
pub use app_controller::Controller;
pub use errors::{AppError, SessionError, TransferError, TransportError};
pub use range_processor::{RangeOutcome, RangeProcessor};
pub use session::SessionSlot;
pub use transport::Transport;
