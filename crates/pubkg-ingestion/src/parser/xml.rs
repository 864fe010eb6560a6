//! Minimal owned XML element tree built from quick-xml events.
//!
//! PubMed and PMC records are small enough to hold in memory, and the
//! extraction rules need ancestor/descendant lookups that a streaming state
//! machine makes awkward. Whitespace between elements is kept so that
//! `text_content` does not glue adjacent words together.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use pubkg_common::{PubkgError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(start_element(e)),
                Ok(Event::End(_)) => {
                    let finished = stack
                        .pop()
                        .ok_or_else(|| PubkgError::Xml("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(finished)),
                        None => {
                            if root.is_none() {
                                root = Some(finished);
                            }
                        }
                    }
                }
                Ok(Event::Text(ref e)) => {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        // Unknown DTD entities (&nbsp; etc.) keep their raw form
                        .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                    push_text(&mut stack, text);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_text(&mut stack, text);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(PubkgError::Xml(format!(
                        "at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(PubkgError::Xml(format!("unclosed element <{}>", open.name)));
        }
        root.map(|root| XmlDocument { root })
            .ok_or_else(|| PubkgError::Xml("document has no root element".to_string()))
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }
}

fn start_element(e: &BytesStart<'_>) -> XmlElement {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect();
    XmlElement { name, attributes, children: Vec::new() }
}

fn push_text(stack: &mut [XmlElement], text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        // Merge with a preceding text node so entity splits don't fragment text
        if let Some(XmlNode::Text(prev)) = current.children.last_mut() {
            prev.push_str(&text);
        } else {
            current.children.push(XmlNode::Text(text));
        }
    }
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Direct text children, in order.
    pub fn direct_texts(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Text(t) => Some(t.as_str()),
            XmlNode::Element(_) => None,
        })
    }

    /// Text before the first child element, if any.
    pub fn leading_text(&self) -> Option<&str> {
        match self.children.first() {
            Some(XmlNode::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Concatenation of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// All descendant elements in document order (self excluded).
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a XmlElement>) {
        for child in self.child_elements() {
            out.push(child);
            child.collect_descendants(out);
        }
    }

    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        self.descendants()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.descendants().into_iter().find(|e| e.name == name)
    }

    /// First `child` element directly under any descendant `parent`.
    pub fn find_child_of(&self, parent: &str, child: &str) -> Option<&XmlElement> {
        self.find_all(parent)
            .into_iter()
            .find_map(|p| p.child(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_with_attributes() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0"?>
<!DOCTYPE PubmedArticleSet>
<root a="1">
  <item IdType="doi">10.1/x</item>
  <item>second &amp; last</item>
  <empty/>
</root>"#,
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(root.name, "root");
        assert_eq!(root.attr("a"), Some("1"));
        let items = root.find_all("item");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].attr("IdType"), Some("doi"));
        assert_eq!(items[1].text_content(), "second & last");
        assert!(root.child("empty").is_some());
    }

    #[test]
    fn test_mixed_content_text() {
        let doc = XmlDocument::parse("<p>Alpha <i>beta</i> gamma</p>").unwrap();
        let p = doc.root();
        assert_eq!(p.leading_text(), Some("Alpha "));
        assert_eq!(p.text_content(), "Alpha beta gamma");
        assert_eq!(p.direct_texts().collect::<Vec<_>>(), vec!["Alpha ", " gamma"]);
    }

    #[test]
    fn test_whitespace_between_elements_kept() {
        let doc = XmlDocument::parse("<a><b>x</b>\n  <c>y</c></a>").unwrap();
        assert_eq!(doc.root().children.len(), 3);
        assert_eq!(doc.root().leading_text(), None);
        assert_eq!(doc.root().text_content(), "x\n  y");
    }

    #[test]
    fn test_find_child_of_skips_other_titles() {
        let doc = XmlDocument::parse(
            "<r><ArticleTitle>Paper</ArticleTitle><Journal><Title>Nature</Title></Journal></r>",
        )
        .unwrap();
        let title = doc.root().find_child_of("Journal", "Title").unwrap();
        assert_eq!(title.text_content(), "Nature");
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("<a><b>").is_err());
    }
}
