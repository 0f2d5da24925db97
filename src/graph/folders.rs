use std::collections::HashMap;

use log::{debug, warn};

use crate::domain::email::{Folder, FolderId};
use crate::error::{Error, Result};
use crate::graph::http::{HttpRetryClient, Transport};
use crate::graph::retry::Sleeper;
use crate::graph::types::{MailFolderDto, Page};
use crate::graph::{endpoint, keyed};

const FOLDER_PAGE_SIZE: &str = "200";

/// Walks a slash-separated path of display names down the folder tree.
///
/// Listings are cached for the lifetime of the resolver, so one run never
/// sees two different ids for the same path.
pub struct FolderResolver<'a, T, S> {
    http: &'a HttpRetryClient<T, S>,
    base: &'a str,
    token: &'a str,
    // None = top level
    listings: HashMap<Option<FolderId>, Vec<Folder>>,
}

/// Non-empty segments of a folder path.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(Error::EmptyFolderPath);
    }
    Ok(segments)
}

impl<'a, T: Transport, S: Sleeper> FolderResolver<'a, T, S> {
    pub fn new(http: &'a HttpRetryClient<T, S>, base: &'a str, token: &'a str) -> Self {
        Self {
            http,
            base,
            token,
            listings: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, path: &str) -> Result<FolderId> {
        self.resolve_folder(path).map(|f| f.id)
    }

    pub fn resolve_folder(&mut self, path: &str) -> Result<Folder> {
        let segments = split_path(path)?;
        let (first, rest) = segments
            .split_first()
            .ok_or(Error::EmptyFolderPath)?;

        let top = find_named(self.listing(None)?, first);
        let mut current = match top {
            Some(folder) => folder,
            None => self.well_known(first)?,
        };

        for segment in rest {
            let children = self.listing(Some(&current.id))?;
            current = find_named(children, segment).ok_or_else(|| Error::FolderNotFound {
                segment: (*segment).to_string(),
                parent: Some(current.display_name.clone()),
            })?;
        }

        debug!("resolved '{path}' to {}", current.id);
        Ok(current)
    }

    fn listing(&mut self, parent: Option<&FolderId>) -> Result<&[Folder]> {
        let key = parent.cloned();
        if !self.listings.contains_key(&key) {
            let url = match parent {
                None => endpoint(self.base, &["me", "mailFolders"])?,
                Some(id) => endpoint(self.base, &["me", &keyed("mailFolders", id), "childFolders"])?,
            };
            let query = vec![("$top".to_string(), FOLDER_PAGE_SIZE.to_string())];
            let page: Page<MailFolderDto> = self.http.get_json(&url, self.token, &query)?;
            if page.next_link.is_some() {
                warn!("folder listing at {url} has more than {FOLDER_PAGE_SIZE} entries; only the first page is searched");
            }
            let folders = page.value.into_iter().map(Folder::from).collect();
            self.listings.insert(key.clone(), folders);
        }
        Ok(self.listings.get(&key).map(Vec::as_slice).unwrap_or_default())
    }

    /// Default folders are addressable by a fixed name that can differ from
    /// their display name (e.g. `sentitems`).
    fn well_known(&mut self, name: &str) -> Result<Folder> {
        let url = endpoint(self.base, &["me", &keyed("mailFolders", name)])?;
        match self.http.get_json::<MailFolderDto>(&url, self.token, &[]) {
            Ok(dto) => {
                let folder = Folder::from(dto);
                debug!("'{name}' resolved as well-known folder '{}'", folder.display_name);
                Ok(folder)
            }
            Err(Error::Http { status: 400 | 404, .. }) => Err(Error::FolderNotFound {
                segment: name.to_string(),
                parent: None,
            }),
            Err(e) => Err(e),
        }
    }
}

/// First match in listing order wins; duplicate sibling names are not an error.
fn find_named(folders: &[Folder], name: &str) -> Option<Folder> {
    folders.iter().find(|f| f.display_name == name).cloned()
}
