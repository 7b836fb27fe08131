//! A generic XML/HTML document tree.
//!
//! The XML drivers (XLSX, ODS, XML-Spreadsheet, HTML tables) all walk the
//! same node shape, dispatching on element names with namespace-prefix
//! tolerance: `ss:Cell`, `table:table-cell`, and `c:chart` are matched by
//! their local part after the colon.
//!
//! Two parsing modes share the builder: strict XML (namespace-aware
//! documents out of archives) and lenient HTML (case-folded names, void
//! elements, stray end tags ignored, undecodable entities kept verbatim).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{MarkupError, MarkupResult};

/// Elements that never carry content in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// One element node.
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    /// Element name as written (prefix preserved)
    pub name: String,
    /// Attributes in document order, names as written
    pub attrs: Vec<(String, String)>,
    /// Child elements
    pub children: Vec<XmlNode>,
    /// Direct text content (child-element text excluded)
    pub text: String,
}

/// Strip a namespace prefix (`ss:Cell` → `Cell`).
pub fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

impl XmlNode {
    /// Parse a strict XML document into its root element.
    pub fn parse(bytes: &[u8]) -> MarkupResult<XmlNode> {
        build_tree(bytes, false)
    }

    /// Parse an HTML-ish document leniently.
    pub fn parse_lenient(bytes: &[u8]) -> MarkupResult<XmlNode> {
        build_tree(bytes, true)
    }

    /// Whether this node's local name equals `name` (prefix-insensitive).
    pub fn is(&self, name: &str) -> bool {
        local_name(&self.name) == name
    }

    /// Attribute lookup by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| local_name(k) == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.is(name))
    }

    /// All direct children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.is(name))
    }

    /// Depth-first search for every descendant with the given local name.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlNode> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlNode>) {
        for child in &self.children {
            if child.is(name) {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// All text in this subtree, concatenated in document order.
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }
}

fn build_tree(bytes: &[u8], lenient: bool) -> MarkupResult<XmlNode> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().check_end_names = false;

    let mut root: Option<XmlNode> = None;
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(ev) => ev,
            Err(e) if lenient => {
                log::warn!("lenient parse stopping on malformed markup: {e}");
                break;
            }
            Err(e) => return Err(MarkupError::Parse(e.to_string())),
        };

        match event {
            Event::Start(ref e) => {
                let node = start_node(e, lenient);
                let is_void = lenient && VOID_ELEMENTS.contains(&node.name.as_str());
                if is_void {
                    attach(&mut stack, &mut root, node);
                } else {
                    stack.push(node);
                }
            }
            Event::Empty(ref e) => {
                let node = start_node(e, lenient);
                attach(&mut stack, &mut root, node);
            }
            Event::End(ref e) => {
                let end_name = name_of(e.name().as_ref(), lenient);
                // In lenient mode a stray end tag closes nothing; a
                // mismatched one closes elements down to its opener.
                let matches_open = stack.iter().rposition(|n| n.name == end_name);
                match matches_open {
                    Some(pos) => {
                        while stack.len() > pos {
                            let node = stack.pop().unwrap();
                            attach(&mut stack, &mut root, node);
                        }
                    }
                    None if lenient => {}
                    None => {
                        if let Some(node) = stack.pop() {
                            attach(&mut stack, &mut root, node);
                        }
                    }
                }
            }
            Event::Text(ref t) => {
                let text = match t.unescape() {
                    Ok(s) => s.into_owned(),
                    Err(_) if lenient => String::from_utf8_lossy(t).into_owned(),
                    Err(e) => return Err(MarkupError::Parse(e.to_string())),
                };
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(ref t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(t));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    // Unclosed elements fold up into their parents.
    while let Some(node) = stack.pop() {
        attach(&mut stack, &mut root, node);
    }

    root.ok_or_else(|| MarkupError::Parse("document has no root element".into()))
}

fn start_node(e: &BytesStart<'_>, lenient: bool) -> XmlNode {
    let name = name_of(e.name().as_ref(), lenient);
    let mut attrs = Vec::new();
    for attr in e.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let key = if lenient { key.to_ascii_lowercase() } else { key };
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attrs.push((key, value));
    }
    XmlNode {
        name,
        attrs,
        children: Vec::new(),
        text: String::new(),
    }
}

fn name_of(raw: &[u8], lenient: bool) -> String {
    let name = String::from_utf8_lossy(raw).into_owned();
    if lenient {
        name.to_ascii_lowercase()
    } else {
        name
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tree() {
        let doc = br#"<root a="1"><child>hello</child><child>world</child></root>"#;
        let root = XmlNode::parse(doc).unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.attr("a"), Some("1"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "hello");
        assert_eq!(root.text_content(), "helloworld");
    }

    #[test]
    fn test_prefix_tolerance() {
        let doc = br#"<ss:Workbook xmlns:ss="urn:x"><ss:Worksheet ss:Name="S1"/></ss:Workbook>"#;
        let root = XmlNode::parse(doc).unwrap();
        assert!(root.is("Workbook"));
        let ws = root.child("Worksheet").unwrap();
        assert_eq!(ws.attr("Name"), Some("S1"));
    }

    #[test]
    fn test_find_all_recursive() {
        let doc = br#"<a><b><c/></b><c/><d><e><c/></e></d></a>"#;
        let root = XmlNode::parse(doc).unwrap();
        assert_eq!(root.find_all("c").len(), 3);
    }

    #[test]
    fn test_entities_decoded() {
        let doc = br#"<r>a &amp; b &lt;c&gt;</r>"#;
        let root = XmlNode::parse(doc).unwrap();
        assert_eq!(root.text, "a & b <c>");
    }

    #[test]
    fn test_lenient_case_folding_and_void_elements() {
        let doc = b"<TABLE><TR><TD>x<br>y</TD></TR></TABLE>";
        let root = XmlNode::parse_lenient(doc).unwrap();
        assert_eq!(root.name, "table");
        let td = &root.children[0].children[0];
        assert_eq!(td.name, "td");
        assert_eq!(td.text, "xy");
        assert_eq!(td.children[0].name, "br");
    }

    #[test]
    fn test_lenient_stray_end_tag() {
        let doc = b"<table><tr><td>a</td></tr></b></table>";
        let root = XmlNode::parse_lenient(doc).unwrap();
        assert_eq!(root.find_all("td").len(), 1);
    }

    #[test]
    fn test_unclosed_elements_fold_up() {
        let doc = b"<table><tr><td>a<tr><td>b";
        let root = XmlNode::parse_lenient(doc).unwrap();
        assert_eq!(root.name, "table");
        assert_eq!(root.find_all("td").len(), 2);
    }
}
