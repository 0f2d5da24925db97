use chrono::{DateTime, Utc};

pub type FolderId = String;
pub type MessageId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: FolderId,
    pub display_name: String,
    pub parent_id: Option<FolderId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub email_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyContentType {
    Text,
    Html,
}

impl BodyContentType {
    /// Anything the server does not label as html is treated as plain text.
    pub fn from_wire(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("html") {
            BodyContentType::Html
        } else {
            BodyContentType::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    pub content_type: BodyContentType,
    pub content: String,
}

/// A message as retrieved from the folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub subject: String,
    pub received_at: Option<DateTime<Utc>>,
    pub sender: Sender,
    /// Absent when the server omitted the full body.
    pub body: Option<MessageBody>,
    pub preview: String,
    pub permalink: String,
}

/// A message whose body has been reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub id: MessageId,
    pub subject: String,
    pub received_at: Option<DateTime<Utc>>,
    pub sender: Sender,
    pub text: String,
    pub permalink: String,
}

impl NormalizedMessage {
    pub fn new(message: Message, text: String) -> Self {
        Self {
            id: message.id,
            subject: message.subject,
            received_at: message.received_at,
            sender: message.sender,
            text,
            permalink: message.permalink,
        }
    }
}
