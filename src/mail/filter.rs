use crate::domain::email::NormalizedMessage;

/// Case-insensitive single-keyword match over subject, body and sender.
///
/// Comma rejection happens in config; by the time a filter exists the
/// keyword is a single term.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    needle: Option<String>,
}

impl KeywordFilter {
    pub fn new(keyword: Option<&str>) -> Self {
        let needle = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);
        Self { needle }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.needle.as_deref()
    }

    pub fn matches(&self, message: &NormalizedMessage) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        [
            message.subject.as_str(),
            message.text.as_str(),
            message.sender.name.as_str(),
            message.sender.email_address.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle.as_str()))
    }
}
