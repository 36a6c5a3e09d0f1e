//! In-memory page
//!
//! A [`ViewHost`] backed by plain strings. Used headless by the CLI and as
//! the observable page in tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{GlyphPass, ViewHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Widget,
    Container,
}

#[derive(Debug, Clone)]
struct Element {
    id: String,
    kind: ElementKind,
    content: String,
    highlighted: bool,
    writes: u32,
}

/// A banner currently attached to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: String,
    pub markup: String,
}

#[derive(Debug, Default)]
struct PageState {
    elements: Vec<Element>,
    banners: Vec<Banner>,
    glyph_passes: u32,
}

impl PageState {
    fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }
}

/// Page held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryPage {
    state: Mutex<PageState>,
}

impl MemoryPage {
    /// An empty page with no elements
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard dashboard layout: five widgets showing `0`, three empty lists
    pub fn dashboard() -> Self {
        Self::new()
            .with_widget(super::TOTAL_USERS, "0")
            .with_widget(super::ACTIVE_CONVERSATIONS, "0")
            .with_widget(super::WAITING_USERS, "0")
            .with_widget(super::ACTIVE_COUNT, "0")
            .with_widget(super::WAITING_COUNT, "0")
            .with_container(super::ACTIVE_CONVERSATIONS_LIST, "")
            .with_container(super::WAITING_USERS_LIST, "")
            .with_container(super::RECENT_MESSAGES_LIST, "")
    }

    /// Add a text widget
    pub fn with_widget(self, id: &str, text: &str) -> Self {
        self.insert(id, ElementKind::Widget, text)
    }

    /// Add a list container
    pub fn with_container(self, id: &str, markup: &str) -> Self {
        self.insert(id, ElementKind::Container, markup)
    }

    fn insert(self, id: &str, kind: ElementKind, content: &str) -> Self {
        {
            let mut state = self.lock();
            state.elements.retain(|e| e.id != id);
            state.elements.push(Element {
                id: id.to_string(),
                kind,
                content: content.to_string(),
                highlighted: false,
                writes: 0,
            });
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current text or markup of an element
    pub fn content(&self, id: &str) -> Option<String> {
        self.lock().element(id).map(|e| e.content.clone())
    }

    /// Whether the element currently carries the change highlight
    pub fn is_highlighted(&self, id: &str) -> bool {
        self.lock().element(id).map(|e| e.highlighted).unwrap_or(false)
    }

    /// How many times an element has been written since creation
    pub fn write_count(&self, id: &str) -> u32 {
        self.lock().element(id).map(|e| e.writes).unwrap_or(0)
    }

    /// Banners in insertion order
    pub fn banners(&self) -> Vec<Banner> {
        self.lock().banners.clone()
    }

    /// Number of glyph passes run against this page
    pub fn glyph_passes(&self) -> u32 {
        self.lock().glyph_passes
    }

    /// Serialize the page as a simple HTML document
    pub fn render_document(&self) -> String {
        let state = self.lock();
        let mut out = String::from("<body>\n");

        for banner in &state.banners {
            out.push_str(&banner.markup);
            out.push('\n');
        }

        for element in &state.elements {
            let (tag, class) = match element.kind {
                ElementKind::Widget if element.highlighted => ("span", " class=\"highlight\""),
                ElementKind::Widget => ("span", ""),
                ElementKind::Container => ("div", ""),
            };
            out.push_str(&format!(
                "<{tag} id=\"{}\"{class}>{}</{tag}>\n",
                element.id, element.content
            ));
        }

        out.push_str("</body>\n");
        out
    }
}

impl ViewHost for MemoryPage {
    fn text(&self, id: &str) -> Option<String> {
        self.content(id)
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        let mut state = self.lock();
        match state.element_mut(id) {
            Some(element) => {
                element.content = text.to_string();
                element.writes += 1;
                true
            }
            None => false,
        }
    }

    fn write(&self, container_id: &str, content: &str) -> bool {
        self.set_text(container_id, content)
    }

    fn set_highlight(&self, id: &str, on: bool) {
        if let Some(element) = self.lock().element_mut(id) {
            element.highlighted = on;
        }
    }

    fn push_banner(&self, banner_id: &str, markup: &str) {
        self.lock().banners.push(Banner {
            id: banner_id.to_string(),
            markup: markup.to_string(),
        });
    }

    fn remove_banner(&self, banner_id: &str) -> bool {
        let mut state = self.lock();
        let before = state.banners.len();
        state.banners.retain(|b| b.id != banner_id);
        state.banners.len() != before
    }

    fn apply_glyphs(&self, glyphs: &dyn GlyphPass) {
        let mut state = self.lock();
        state.glyph_passes += 1;

        for element in state.elements.iter_mut() {
            if element.kind == ElementKind::Container {
                element.content = glyphs.apply(&element.content);
            }
        }
        for banner in state.banners.iter_mut() {
            banner.markup = glyphs.apply(&banner.markup);
        }
    }
}
