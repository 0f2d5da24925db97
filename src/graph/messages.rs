use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;

use crate::domain::email::Message;
use crate::error::Result;
use crate::graph::http::{HttpRetryClient, Query, Transport};
use crate::graph::retry::Sleeper;
use crate::graph::types::{MessageDto, Page};
use crate::graph::{endpoint, keyed};

pub const MESSAGE_PAGE_SIZE: u32 = 50;
pub const MESSAGE_SELECT_FIELDS: &str = "id,subject,from,receivedDateTime,webLink,bodyPreview,body";

/// Where the next page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// First request: endpoint plus filter and paging parameters.
    Start { url: String, query: Query },
    /// Continuation link, used verbatim with no extra parameters.
    Next(String),
}

#[derive(Debug)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub next: Option<PageCursor>,
}

pub struct MessagePaginator<'a, T, S> {
    http: &'a HttpRetryClient<T, S>,
    base: &'a str,
    token: &'a str,
}

impl<'a, T: Transport, S: Sleeper> MessagePaginator<'a, T, S> {
    pub fn new(http: &'a HttpRetryClient<T, S>, base: &'a str, token: &'a str) -> Self {
        Self { http, base, token }
    }

    pub fn first_cursor(&self, folder_id: &str, since: DateTime<Utc>) -> Result<PageCursor> {
        let url = endpoint(self.base, &["me", &keyed("mailFolders", folder_id), "messages"])?;
        let query = vec![
            ("$filter".to_string(), received_since_filter(since)),
            ("$top".to_string(), MESSAGE_PAGE_SIZE.to_string()),
            ("$select".to_string(), MESSAGE_SELECT_FIELDS.to_string()),
        ];
        Ok(PageCursor::Start { url, query })
    }

    /// Fetches the page a cursor points at. Depends on nothing but the cursor.
    pub fn fetch_page(&self, cursor: &PageCursor) -> Result<MessagePage> {
        let page: Page<MessageDto> = match cursor {
            PageCursor::Start { url, query } => self.http.get_json(url, self.token, query)?,
            PageCursor::Next(link) => self.http.get_json(link, self.token, &[])?,
        };
        debug!(
            "fetched {} messages, continuation: {}",
            page.value.len(),
            page.next_link.is_some()
        );
        Ok(MessagePage {
            messages: page.value.into_iter().map(Message::from).collect(),
            next: page.next_link.map(PageCursor::Next),
        })
    }

    /// All messages received at or after `since`, in server order.
    pub fn fetch(&self, folder_id: &str, since: DateTime<Utc>) -> Result<Messages<'_, 'a, T, S>> {
        let cursor = self.first_cursor(folder_id, since)?;
        Ok(Messages {
            pager: self,
            cursor: Some(cursor),
            buffered: VecDeque::new(),
            pages: 0,
        })
    }
}

pub fn received_since_filter(since: DateTime<Utc>) -> String {
    format!(
        "receivedDateTime ge {}",
        since.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Lazy, single-pass sequence over every page. A page is only requested
/// once the previous one has been fully consumed; after an error the
/// iterator is exhausted.
pub struct Messages<'p, 'a, T, S> {
    pager: &'p MessagePaginator<'a, T, S>,
    cursor: Option<PageCursor>,
    buffered: VecDeque<Message>,
    pages: usize,
}

impl<T, S> Messages<'_, '_, T, S> {
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }
}

impl<T: Transport, S: Sleeper> Iterator for Messages<'_, '_, T, S> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.buffered.pop_front() {
                return Some(Ok(message));
            }
            let cursor = self.cursor.take()?;
            match self.pager.fetch_page(&cursor) {
                Ok(page) => {
                    self.pages += 1;
                    self.cursor = page.next;
                    self.buffered.extend(page.messages);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<T: Transport, S: Sleeper> std::iter::FusedIterator for Messages<'_, '_, T, S> {}
