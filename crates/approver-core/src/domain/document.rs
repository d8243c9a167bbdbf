//! Element - document form of an RPC result.
//!
//! A small owned tree that decisions render themselves into and that the
//! response codec serializes. Attribute and child order is insertion order,
//! which keeps the serialized text deterministic.

/// One node of a document tree.
///
/// A node carries either text or children, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Leaf element holding only text, e.g. `<code>DatabaseLock</code>`.
    pub fn text_node(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        debug_assert!(self.children.is_empty(), "element <{}> already has children", self.name);
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        debug_assert!(self.text.is_none(), "element <{}> already has text", self.name);
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// True when the element serializes as a self-closing tag.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_keep_insertion_order() {
        let root = Element::new("root")
            .with_child(Element::text_node("b", "2"))
            .with_child(Element::text_node("a", "1"));

        let names: Vec<&str> = root.children().iter().map(Element::name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(root.child("a").and_then(Element::text), Some("1"));
        assert!(root.child("missing").is_none());
    }

    #[test]
    fn empty_means_no_text_and_no_children() {
        assert!(Element::new("x").with_attribute("k", "v").is_empty());
        assert!(!Element::text_node("x", "").is_empty());
        assert!(!Element::new("x").with_child(Element::new("y")).is_empty());
    }

    #[test]
    #[should_panic(expected = "element <m> already has text")]
    fn child_after_text_is_rejected() {
        let _ = Element::text_node("m", "t").with_child(Element::new("c"));
    }

    #[test]
    #[should_panic(expected = "element <m> already has children")]
    fn text_after_children_is_rejected() {
        let _ = Element::new("m").with_child(Element::new("c")).with_text("t");
    }
}
