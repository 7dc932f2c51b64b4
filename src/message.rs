/*!
 * Message content model.
 *
 * A fetched source message is classified once into [`MessageContent`]; the
 * manual reconstruction strategy then matches on it exhaustively to pick
 * the send call of the same kind.
 */

use crate::transport::types::{Message, MessageEntity};

/// Caption text and its formatting spans
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Caption {
    pub text: Option<String>,
    pub entities: Vec<MessageEntity>,
}

impl Caption {
    pub fn new(text: Option<String>, entities: Vec<MessageEntity>) -> Self {
        Self { text, entities }
    }
}

/// Content of a source message, by kind
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Plain or formatted text
    Text {
        text: String,
        entities: Vec<MessageEntity>,
    },
    /// Still image, referenced by its largest size
    Photo { file_id: String, caption: Caption },
    /// Video file
    Video { file_id: String, caption: Caption },
    /// Generic file
    Document { file_id: String, caption: Caption },
    /// Sticker, which carries no caption
    Sticker { file_id: String },
    /// Anything the relay cannot rebuild (polls, locations, service messages...)
    Unsupported,
}

impl MessageContent {
    /// Short kind name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Photo { .. } => "photo",
            Self::Video { .. } => "video",
            Self::Document { .. } => "document",
            Self::Sticker { .. } => "sticker",
            Self::Unsupported => "unsupported",
        }
    }
}

impl From<&Message> for MessageContent {
    fn from(message: &Message) -> Self {
        let caption = || Caption::new(message.caption.clone(), message.caption_entities.clone());

        if let Some(text) = &message.text {
            return Self::Text {
                text: text.clone(),
                entities: message.entities.clone(),
            };
        }
        if let Some(largest) = message.photo.last() {
            return Self::Photo {
                file_id: largest.file_id.clone(),
                caption: caption(),
            };
        }
        if let Some(video) = &message.video {
            return Self::Video {
                file_id: video.file_id.clone(),
                caption: caption(),
            };
        }
        if let Some(document) = &message.document {
            return Self::Document {
                file_id: document.file_id.clone(),
                caption: caption(),
            };
        }
        if let Some(sticker) = &message.sticker {
            return Self::Sticker {
                file_id: sticker.file_id.clone(),
            };
        }
        Self::Unsupported
    }
}
