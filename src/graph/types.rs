//! Wire shapes of the mail API's JSON responses.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::email::{BodyContentType, Folder, Message, MessageBody, Sender};

/// `{value: [...], "@odata.nextLink"?: string}`
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailFolderDto {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub parent_folder_id: Option<String>,
}

impl From<MailFolderDto> for Folder {
    fn from(dto: MailFolderDto) -> Self {
        Folder {
            id: dto.id,
            display_name: dto.display_name,
            parent_id: dto.parent_folder_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddressDto {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientDto {
    pub email_address: Option<EmailAddressDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBodyDto {
    pub content_type: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    #[serde(default)]
    pub id: String,
    pub subject: Option<String>,
    pub received_date_time: Option<String>,
    pub from: Option<RecipientDto>,
    pub body: Option<ItemBodyDto>,
    pub body_preview: Option<String>,
    pub web_link: Option<String>,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        let received_at = dto
            .received_date_time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let address = dto.from.and_then(|r| r.email_address).unwrap_or_default();
        let sender = Sender {
            name: address.name.unwrap_or_default(),
            email_address: address.address.unwrap_or_default(),
        };

        let body = dto.body.map(|b| MessageBody {
            content_type: BodyContentType::from_wire(b.content_type.as_deref().unwrap_or("text")),
            content: b.content.unwrap_or_default(),
        });

        Message {
            id: dto.id,
            subject: dto.subject.unwrap_or_default(),
            received_at,
            sender,
            body,
            preview: dto.body_preview.unwrap_or_default(),
            permalink: dto.web_link.unwrap_or_default(),
        }
    }
}
