use std::collections::HashMap;

use tootview_core::ids::GlobalId;
use url::Url;

/// The account a mention anchor points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionTarget {
    pub acct: String,
    pub id: GlobalId,
}

impl MentionTarget {
    /// The text that replaces the anchor body, e.g. `@bob (id:42)`.
    pub fn label(&self) -> String {
        format!("@{} (id:{})", self.acct, self.id)
    }
}

/// Profile URL → account lookup, built by the caller from a toot's structured mention list.
///
/// URLs are compared after parsing, so `https://Example.social/@bob` and
/// `https://example.social/@bob` match. Strings that do not parse as URLs are compared verbatim.
#[derive(Clone, Debug, Default)]
pub struct MentionMetadata {
    by_url: HashMap<String, MentionTarget>,
}

fn normalize(url: &str) -> String {
    let url = url.trim();
    match Url::parse(url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.to_string(),
    }
}

impl MentionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, acct: impl Into<String>, id: GlobalId) {
        self.by_url.insert(
            normalize(url),
            MentionTarget {
                acct: acct.into(),
                id,
            },
        );
    }

    pub fn get(&self, href: &str) -> Option<&MentionTarget> {
        self.by_url.get(&normalize(href))
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

impl<U, A> FromIterator<(U, A, GlobalId)> for MentionMetadata
where
    U: AsRef<str>,
    A: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (U, A, GlobalId)>>(iter: T) -> Self {
        let mut metadata = Self::new();
        for (url, acct, id) in iter {
            metadata.insert(url.as_ref(), acct, id);
        }
        metadata
    }
}
