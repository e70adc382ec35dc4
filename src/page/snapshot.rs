//! Page snapshot adapter
//!
//! A snapshot is a JSON description of a rendered page, typically exported
//! by a browser extension:
//!
//! ```json
//! {
//!   "url": "https://example.org/",
//!   "title": "Example",
//!   "elements": [
//!     { "id": 1, "tag": "h1", "text": "Intro" },
//!     { "id": 2, "tag": "a", "text": "Docs", "href": "/docs", "ancestors": ["nav"] },
//!     { "id": 3, "tag": "main", "text": "Welcome to the example page" }
//!   ]
//! }
//! ```
//!
//! `SnapshotPage` answers locator queries from the element list and keeps
//! the side effects (highlight, focus, history) in memory.

use super::{
    heading_level, BlurAction, ContentElement, ContentLocator, ElementId, HeaderFilter,
    LinkFilter, PageActions,
};
use crate::error::PagevoxError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Ids and classes that usually mark an unannotated main region
const MAIN_CANDIDATES: &[&str] = &["main-content", "main"];

/// Serialized page description
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Elements in document order
    #[serde(default)]
    pub elements: Vec<SnapshotElement>,
}

/// One element of a snapshot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotElement {
    pub id: ElementId,
    pub tag: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub href: Option<String>,

    /// ARIA role attribute
    #[serde(default)]
    pub role: Option<String>,

    /// HTML id attribute
    #[serde(default)]
    pub html_id: Option<String>,

    #[serde(default)]
    pub classes: Vec<String>,

    /// Names of enclosing regions (tags, `#id`, `.class`)
    #[serde(default)]
    pub ancestors: Vec<String>,

    #[serde(default)]
    pub tabindex: Option<i32>,
}

impl SnapshotElement {
    fn to_content(&self) -> ContentElement {
        let element = ContentElement::new(self.id, &self.tag, self.text.clone());
        match self.href {
            Some(ref href) => element.with_href(href.clone()),
            None => element,
        }
    }

    fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    fn within(&self, ancestor: &str) -> bool {
        self.ancestors.iter().any(|a| a.eq_ignore_ascii_case(ancestor))
    }

    fn looks_like_main(&self) -> bool {
        let id_matches = self
            .html_id
            .as_deref()
            .is_some_and(|id| MAIN_CANDIDATES.contains(&id));
        let class_matches = self
            .classes
            .iter()
            .any(|c| MAIN_CANDIDATES.contains(&c.as_str()));
        id_matches || class_matches
    }
}

/// Mutable side-effect state of the page
#[derive(Debug, Default)]
struct PageStatus {
    highlighted: BTreeSet<ElementId>,
    focused: Option<(ElementId, BlurAction)>,
    tab_indexes: HashMap<ElementId, Option<i32>>,
    history: Vec<String>,
    position: usize,
}

/// Content locator and page actions backed by a snapshot
#[derive(Debug)]
pub struct SnapshotPage {
    snapshot: PageSnapshot,
    status: Mutex<PageStatus>,
}

impl SnapshotPage {
    pub fn new(snapshot: PageSnapshot) -> Self {
        let status = PageStatus {
            tab_indexes: snapshot
                .elements
                .iter()
                .map(|e| (e.id, e.tabindex))
                .collect(),
            history: vec![snapshot.url.clone()],
            ..PageStatus::default()
        };

        Self {
            snapshot,
            status: Mutex::new(status),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PagevoxError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)
            .map_err(|e| PagevoxError::Page(format!("Invalid page snapshot: {}", e)))?;
        Ok(Self::new(snapshot))
    }

    /// Load a snapshot file
    pub fn load(path: &Path) -> Result<Self, PagevoxError> {
        tracing::debug!("Loading page snapshot from {:?}", path);
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PagevoxError::Page(format!("Failed to read page snapshot {:?}: {}", path, e))
        })?;
        Self::from_json(&contents)
    }

    fn status(&self) -> MutexGuard<'_, PageStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current location (last navigation target)
    pub fn location(&self) -> String {
        let status = self.status();
        status.history[status.position].clone()
    }

    /// Ids of the elements currently highlighted
    pub fn highlighted(&self) -> Vec<ElementId> {
        self.status().highlighted.iter().copied().collect()
    }

    /// Id of the element that has keyboard focus
    pub fn focused(&self) -> Option<ElementId> {
        self.status().focused.map(|(id, _)| id)
    }

    pub fn current_tab_index(&self, id: ElementId) -> Option<i32> {
        self.status().tab_indexes.get(&id).copied().flatten()
    }

    /// Move focus away from the focused element, running its blur action
    pub fn blur(&self) {
        let mut status = self.status();
        if let Some((id, action)) = status.focused.take() {
            match action {
                BlurAction::RestoreTabIndex(previous) => {
                    status.tab_indexes.insert(id, previous);
                }
            }
            tracing::trace!("Element {} lost focus", id);
        }
    }
}

impl ContentLocator for SnapshotPage {
    fn headers(&self, filter: &HeaderFilter) -> Vec<ContentElement> {
        self.snapshot
            .elements
            .iter()
            .filter(|e| match heading_level(&e.tag) {
                Some(level) => filter.level.map_or(true, |wanted| wanted == level),
                None => false,
            })
            .map(SnapshotElement::to_content)
            .collect()
    }

    fn links(&self, filter: &LinkFilter) -> Vec<ContentElement> {
        self.snapshot
            .elements
            .iter()
            .filter(|e| e.is_tag("a") && e.href.is_some())
            .filter(|e| filter.ancestor.as_deref().map_or(true, |a| e.within(a)))
            .map(SnapshotElement::to_content)
            .collect()
    }

    fn main(&self) -> Option<ContentElement> {
        let elements = &self.snapshot.elements;

        let annotated = elements.iter().find(|e| e.is_tag("main")).or_else(|| {
            elements
                .iter()
                .find(|e| e.role.as_deref().is_some_and(|r| r.eq_ignore_ascii_case("main")))
        });
        if let Some(main) = annotated {
            return Some(main.to_content());
        }

        // Without markup, trust the conventional id/class only when it is unique
        let mut candidates = elements.iter().filter(|e| e.looks_like_main());
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only.to_content()),
            _ => None,
        }
    }

    fn title(&self) -> Option<String> {
        self.snapshot
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    }
}

impl PageActions for SnapshotPage {
    fn highlight(&self, element: &ContentElement) {
        tracing::trace!("Highlight {} ({})", element.id(), element.tag());
        self.status().highlighted.insert(element.id());
    }

    fn unhighlight(&self, element: &ContentElement) {
        tracing::trace!("Unhighlight {} ({})", element.id(), element.tag());
        self.status().highlighted.remove(&element.id());
    }

    fn tab_index(&self, element: &ContentElement) -> Option<i32> {
        self.current_tab_index(element.id())
    }

    fn set_tab_index(&self, element: &ContentElement, tab_index: Option<i32>) {
        self.status().tab_indexes.insert(element.id(), tab_index);
    }

    fn focus(&self, element: &ContentElement, on_blur: BlurAction) {
        // The previously focused element blurs first
        self.blur();
        tracing::debug!("Focus moved to {} ({})", element.id(), element.tag());
        self.status().focused = Some((element.id(), on_blur));
    }

    fn navigate(&self, href: &str) {
        tracing::info!("Navigating to {}", href);
        let mut status = self.status();
        let next = status.position + 1;
        status.history.truncate(next);
        status.history.push(href.to_string());
        status.position = next;
        status.focused = None;
        status.highlighted.clear();
    }

    fn history_back(&self) {
        let mut status = self.status();
        if status.position == 0 {
            tracing::debug!("No previous page in history");
            return;
        }
        status.position -= 1;
        tracing::info!("Back to {}", status.history[status.position]);
    }

    fn history_forward(&self) {
        let mut status = self.status();
        if status.position + 1 >= status.history.len() {
            tracing::debug!("No next page in history");
            return;
        }
        status.position += 1;
        tracing::info!("Forward to {}", status.history[status.position]);
    }
}
