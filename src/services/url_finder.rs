//! URL-finder registry consumed at Quick Tab creation time.
//!
//! Per-site extraction heuristics plug in as `UrlFinder` implementations
//! keyed by domain-type string. The generic resolution chain runs: direct
//! link on the element, parent-chain walk, registry lookup, then a generic
//! container scan over child elements.

use std::collections::HashMap;

/// DOM-free element snapshot handed to finders.
#[derive(Debug, Clone, Default)]
pub struct ElementInfo {
    pub tag: String,
    pub href: Option<String>,
    pub attributes: HashMap<String, String>,
    pub parent: Option<Box<ElementInfo>>,
    pub children: Vec<ElementInfo>,
}

impl ElementInfo {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }
}

/// Hints forwarded to site-specific finders.
#[derive(Debug, Clone, Default)]
pub struct FindHints {
    /// Domain-type string selecting a registered finder.
    pub domain_type: Option<String>,
}

/// One site's extraction heuristic.
pub trait UrlFinder: Send + Sync {
    fn find(&self, element: &ElementInfo, hints: &FindHints) -> Option<String>;
}

impl<F> UrlFinder for F
where
    F: Fn(&ElementInfo, &FindHints) -> Option<String> + Send + Sync,
{
    fn find(&self, element: &ElementInfo, hints: &FindHints) -> Option<String> {
        self(element, hints)
    }
}

/// Registry of site-specific finders plus the generic fallback chain.
#[derive(Default)]
pub struct UrlFinderRegistry {
    finders: HashMap<String, Box<dyn UrlFinder>>,
}

impl UrlFinderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, domain_type: &str, finder: Box<dyn UrlFinder>) {
        self.finders.insert(domain_type.to_string(), finder);
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }

    /// Resolves a URL for the element, trying each stage in order.
    pub fn find_url(&self, element: &ElementInfo, hints: &FindHints) -> Option<String> {
        if let Some(url) = direct_link(element) {
            return Some(url);
        }
        if let Some(url) = parent_chain(element) {
            return Some(url);
        }
        if let Some(domain_type) = hints.domain_type.as_deref() {
            if let Some(finder) = self.finders.get(domain_type) {
                if let Some(url) = finder.find(element, hints) {
                    return Some(url);
                }
            }
        }
        container_scan(element)
    }
}

fn is_link(element: &ElementInfo) -> Option<String> {
    if element.tag == "a" {
        if let Some(href) = element.href.as_deref() {
            if !href.is_empty() && !href.starts_with('#') {
                return Some(href.to_string());
            }
        }
    }
    None
}

fn direct_link(element: &ElementInfo) -> Option<String> {
    is_link(element)
}

fn parent_chain(element: &ElementInfo) -> Option<String> {
    let mut current = element.parent.as_deref();
    while let Some(parent) = current {
        if let Some(url) = is_link(parent) {
            return Some(url);
        }
        current = parent.parent.as_deref();
    }
    None
}

fn container_scan(element: &ElementInfo) -> Option<String> {
    for child in &element.children {
        if let Some(url) = is_link(child) {
            return Some(url);
        }
        if let Some(url) = container_scan(child) {
            return Some(url);
        }
    }
    None
}
