/*!
 * Error types for the topic-relay application.
 *
 * This module contains custom error types for the different layers of the bot,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to the messaging transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Error when sending an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code or Bot API error code
        status_code: u16,
        /// Description returned by the API
        message: String,
    },

    /// Flood control triggered by the API
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Description returned by the API
        message: String,
        /// Seconds the API asked us to wait, when advertised
        retry_after_secs: Option<u64>,
    },

    /// The bot token was rejected
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The referenced message does not exist or is not readable
    #[error("Message not found: {0}")]
    NotFound(String),
}

impl TransportError {
    /// Whether this error makes every following call fail as well.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }
}

/// Why a single position could not be transferred
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    /// The transport refused or failed the call
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The fetched message has no kind the relay can rebuild
    #[error("Unsupported message content at position {0}")]
    UnsupportedContent(i64),

    /// Range processing failed outside of a single position
    #[error("Range processing aborted: {0}")]
    Aborted(String),
}

/// Operator-facing failures of the session state machine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Caller is not on the allow-list
    #[error("Caller {0} is not authorized")]
    Unauthorized(i64),

    /// `/create_topic` without a name
    #[error("Topic name is empty")]
    EmptyTopicName,

    /// A reference arrived before any thread exists
    #[error("No destination thread has been created")]
    NoThread,

    /// The text did not end in a message position
    #[error("No message reference found in '{0}'")]
    InvalidReference(String),

    /// End position precedes start position
    #[error("End position {end} is before start position {start}")]
    EndBeforeStart {
        /// Recorded start position
        start: i64,
        /// Rejected end position
        end: i64,
    },

    /// A range is being transferred right now
    #[error("A transfer is already running")]
    TransferInProgress,

    /// The destination thread could not be created
    #[error("Thread creation failed: {0}")]
    ThreadCreation(#[from] TransportError),

    /// The status message for a new range could not be posted
    #[error("Could not post the progress message: {0}")]
    ProgressUnavailable(TransportError),
}

impl SessionError {
    /// The single reply the operator sees for this failure.
    pub fn operator_notice(&self) -> String {
        match self {
            Self::Unauthorized(_) => "❌ Unauthorized".to_string(),
            Self::EmptyTopicName => "Usage: /create_topic TOPIC_NAME".to_string(),
            Self::NoThread => "⚠️ First create a topic with /create_topic".to_string(),
            Self::InvalidReference(_) => {
                "❌ Invalid link. Send proper Telegram message link.".to_string()
            }
            Self::EndBeforeStart { .. } => "❌ END link must come after START link!".to_string(),
            Self::TransferInProgress => {
                "⏳ A transfer is already running, wait for its summary.".to_string()
            }
            Self::ThreadCreation(_) => "⚠️ Failed to create topic".to_string(),
            Self::ProgressUnavailable(_) => "⚠️ Process failed".to_string(),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error from the session state machine
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
