//! Page access module
//!
//! The controller never looks at a page directly. It goes through two
//! collaborators:
//! - [`ContentLocator`] answers queries (headers, links, main content, title)
//!   with ordered element handles
//! - [`PageActions`] applies side effects (highlight, focus, navigation)
//!
//! `snapshot` provides both over a JSON description of a page.

pub mod snapshot;

pub use snapshot::{PageSnapshot, SnapshotPage};

/// Identifier of an element inside a page
pub type ElementId = u32;

/// Opaque handle to a page element
///
/// Built by content locators only; the controller reads it but never
/// constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentElement {
    id: ElementId,
    tag: String,
    text: String,
    href: Option<String>,
}

impl ContentElement {
    /// Create a handle. The tag is stored upper-case, like a DOM node name.
    pub fn new(id: ElementId, tag: &str, text: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.to_ascii_uppercase(),
            text: text.into(),
            href: None,
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Upper-case tag name ("H2", "A", "MAIN")
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text content
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Whether the element is an anchor
    pub fn is_link(&self) -> bool {
        self.tag == "A"
    }

    /// Heading level for H1..H6
    pub fn heading_level(&self) -> Option<u8> {
        heading_level(&self.tag)
    }
}

/// Parse a heading level out of a tag name
pub(crate) fn heading_level(tag: &str) -> Option<u8> {
    let mut chars = tag.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('h' | 'H'), Some(d @ '1'..='6'), None) => d.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

/// Restrict headers to one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFilter {
    pub level: Option<u8>,
}

impl HeaderFilter {
    pub fn level(level: u8) -> Self {
        Self { level: Some(level) }
    }
}

/// Restrict links to those inside an ancestor region
///
/// The ancestor is named the way the locator understands it: a tag
/// ("footer", "nav"), `#id` or `.class`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilter {
    pub ancestor: Option<String>,
}

impl LinkFilter {
    pub fn within(ancestor: impl Into<String>) -> Self {
        Self {
            ancestor: Some(ancestor.into()),
        }
    }
}

/// What happens once a focused element loses focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurAction {
    /// Put back the tab index the element had before it was focused
    /// (`None` removes the attribute)
    RestoreTabIndex(Option<i32>),
}

/// Queries over the current page
pub trait ContentLocator: Send + Sync {
    /// Headers in document order
    fn headers(&self, filter: &HeaderFilter) -> Vec<ContentElement>;

    /// Links in document order
    fn links(&self, filter: &LinkFilter) -> Vec<ContentElement>;

    /// The main content region, if one can be identified
    fn main(&self) -> Option<ContentElement>;

    /// The page title, if any
    fn title(&self) -> Option<String>;
}

/// Side effects on the current page
///
/// All of these are synchronous triggers; none of them is awaited.
pub trait PageActions: Send + Sync {
    /// Mark the element as the one being read
    fn highlight(&self, element: &ContentElement);

    /// Remove the mark set by `highlight`
    fn unhighlight(&self, element: &ContentElement);

    /// Current tab index of the element
    fn tab_index(&self, element: &ContentElement) -> Option<i32>;

    fn set_tab_index(&self, element: &ContentElement, tab_index: Option<i32>);

    /// Move keyboard focus to the element
    fn focus(&self, element: &ContentElement, on_blur: BlurAction);

    /// Load another location
    fn navigate(&self, href: &str);

    fn history_back(&self);

    fn history_forward(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_is_upper_case() {
        let element = ContentElement::new(1, "h2", "Details");
        assert_eq!(element.tag(), "H2");
        assert_eq!(element.heading_level(), Some(2));
        assert!(!element.is_link());
    }

    #[test]
    fn test_link_element() {
        let element = ContentElement::new(7, "a", "Docs").with_href("/docs");
        assert!(element.is_link());
        assert_eq!(element.href(), Some("/docs"));
        assert_eq!(element.heading_level(), None);
    }

    #[test]
    fn test_heading_level_parsing() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("H6"), Some(6));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("h12"), None);
        assert_eq!(heading_level("header"), None);
    }
}
