/// Content scripts compiled into the relay and invoked by identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentScript {
    /// Captures `{title, text, url}` from the current document
    PageSnapshot,
}

impl ContentScript {
    /// Every bundled script
    pub const ALL: &'static [ContentScript] = &[ContentScript::PageSnapshot];

    /// Stable identifier of the script
    pub fn id(&self) -> &'static str {
        match self {
            ContentScript::PageSnapshot => "page-snapshot",
        }
    }

    /// Script body, executed as a function body in the page context
    pub fn source(&self) -> &'static str {
        match self {
            ContentScript::PageSnapshot => include_str!("page_snapshot.js"),
        }
    }

    /// Looks up a bundled script by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        let script = Self::ALL.iter().find(|s| s.id() == id).copied();
        if script.is_none() {
            ::log::debug!("No bundled content script with id {}", id);
        }
        script
    }
}
