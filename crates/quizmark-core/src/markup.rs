//! Lenient rich-text fragment scanner.
//!
//! Splits authored markup into a node tree where every node keeps its exact
//! source text. The top-level nodes of a fragment partition the input: their
//! `outer` strings concatenate back to the original source byte for byte.
//! Malformed markup never fails; stray end tags become `Other` nodes and
//! unclosed elements end where their parent (or the input) ends.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token as HtmlToken, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts,
};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "figure",
    "table", "ul", "ol", "section",
];

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a lower-cased tag name and its decoded attributes.
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text,
    Comment,
    /// Doctype, processing instruction, or a stray end tag.
    Other,
}

/// A node of a scanned fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Source text of the whole node, tags included.
    pub outer: String,
    /// Source text between the start and end tags (empty for non-elements).
    pub inner: String,
    pub children: Vec<Node>,
}

impl Node {
    fn leaf(kind: NodeKind, src: &str) -> Self {
        Self {
            kind,
            outer: src.to_string(),
            inner: String::new(),
            children: Vec::new(),
        }
    }

    /// Lower-cased tag name for elements.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tag() == Some(name)
    }

    /// Whether this is an `<ul>` or `<ol>`.
    pub fn is_list(&self) -> bool {
        matches!(self.tag(), Some("ul") | Some("ol"))
    }

    /// Decoded text content, like the DOM `textContent` property.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self.kind {
            NodeKind::Text => out.push_str(&decode_entities(&self.outer)),
            NodeKind::Element { .. } => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
            NodeKind::Comment | NodeKind::Other => {}
        }
    }

    /// Value of an attribute, if present. Names are matched case-insensitively.
    pub fn attr(&self, name: &str) -> Option<String> {
        let NodeKind::Element { attrs, .. } = &self.kind else {
            return None;
        };
        attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// All descendant elements with the given tag, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&Node> {
        let mut found = Vec::new();
        for child in &self.children {
            child.collect_descendants(name, &mut found);
        }
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Node>) {
        if self.is_tag(name) {
            found.push(self);
        }
        for child in &self.children {
            child.collect_descendants(name, found);
        }
    }

    /// First descendant element with the given tag.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.children.iter().find_map(|child| {
            if child.is_tag(name) {
                Some(child)
            } else {
                child.find(name)
            }
        })
    }
}

/// Every element with the given tag among `nodes` and their descendants.
pub fn find_all<'a>(nodes: &'a [Node], name: &str) -> Vec<&'a Node> {
    let mut found = Vec::new();
    for node in nodes {
        node.collect_descendants(name, &mut found);
    }
    found
}

/// An element that has been opened but not yet closed.
struct OpenElement {
    name: String,
    attrs: Vec<(String, String)>,
    start: usize,
    inner_start: usize,
    children: Vec<Node>,
}

impl OpenElement {
    fn close(self, src: &str, inner_end: usize, outer_end: usize) -> Node {
        Node {
            kind: NodeKind::Element {
                name: self.name,
                attrs: self.attrs,
            },
            outer: src[self.start..outer_end].to_string(),
            inner: src[self.inner_start..inner_end].to_string(),
            children: self.children,
        }
    }
}

struct TreeBuilder<'a> {
    src: &'a str,
    stack: Vec<OpenElement>,
    roots: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    /// Close the innermost open element matching `name`, implicitly closing
    /// anything opened inside it. Returns `false` when nothing matches.
    fn close(&mut self, name: &str, tag_start: usize, tag_end: usize) -> bool {
        let Some(depth) = self.stack.iter().rposition(|open| open.name == name) else {
            return false;
        };
        while self.stack.len() > depth + 1 {
            if let Some(open) = self.stack.pop() {
                let node = open.close(self.src, tag_start, tag_start);
                self.push(node);
            }
        }
        if let Some(open) = self.stack.pop() {
            let node = open.close(self.src, tag_start, tag_end);
            self.push(node);
        }
        true
    }

    fn finish(mut self) -> Vec<Node> {
        let end = self.src.len();
        while let Some(open) = self.stack.pop() {
            let node = open.close(self.src, end, end);
            self.push(node);
        }
        self.roots
    }
}

/// Scan a markup fragment into its top-level nodes.
pub fn parse_fragment(src: &str) -> Vec<Node> {
    let mut builder = TreeBuilder {
        src,
        stack: Vec::new(),
        roots: Vec::new(),
    };
    let bytes = src.as_bytes();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        let Some(token) = scan_tag(src, pos) else {
            pos += 1;
            continue;
        };
        if text_start < pos {
            builder.push(Node::leaf(NodeKind::Text, &src[text_start..pos]));
        }
        match token {
            Token::Comment { end } => {
                builder.push(Node::leaf(NodeKind::Comment, &src[pos..end]));
                pos = end;
            }
            Token::Declaration { end } => {
                builder.push(Node::leaf(NodeKind::Other, &src[pos..end]));
                pos = end;
            }
            Token::EndTag { name, end } => {
                if !builder.close(&name, pos, end) {
                    builder.push(Node::leaf(NodeKind::Other, &src[pos..end]));
                }
                pos = end;
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
                end,
            } => {
                if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                    builder.push(Node {
                        kind: NodeKind::Element { name, attrs },
                        outer: src[pos..end].to_string(),
                        inner: String::new(),
                        children: Vec::new(),
                    });
                    pos = end;
                } else if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    let closing = format!("</{name}");
                    let body_end = find_ignore_case(src, end, &closing).unwrap_or(src.len());
                    let close_end = src[body_end..]
                        .find('>')
                        .map(|i| body_end + i + 1)
                        .unwrap_or(src.len());
                    let mut children = Vec::new();
                    if body_end > end {
                        children.push(Node::leaf(NodeKind::Text, &src[end..body_end]));
                    }
                    builder.push(Node {
                        kind: NodeKind::Element { name, attrs },
                        outer: src[pos..close_end].to_string(),
                        inner: src[end..body_end].to_string(),
                        children,
                    });
                    pos = close_end;
                } else {
                    builder.stack.push(OpenElement {
                        name,
                        attrs,
                        start: pos,
                        inner_start: end,
                        children: Vec::new(),
                    });
                    pos = end;
                }
            }
        }
        text_start = pos;
    }
    if text_start < src.len() {
        builder.push(Node::leaf(NodeKind::Text, &src[text_start..]));
    }
    builder.finish()
}

enum Token {
    Comment {
        end: usize,
    },
    Declaration {
        end: usize,
    },
    EndTag {
        name: String,
        end: usize,
    },
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        end: usize,
    },
}

impl Token {
    fn end(&self) -> usize {
        match self {
            Token::Comment { end }
            | Token::Declaration { end }
            | Token::EndTag { end, .. }
            | Token::StartTag { end, .. } => *end,
        }
    }
}

/// Recognize a tag starting at `pos` (which holds `<`). Returns `None` when
/// the `<` is plain text.
fn scan_tag(src: &str, pos: usize) -> Option<Token> {
    let rest = &src[pos..];
    if let Some(after) = rest.strip_prefix("<!--") {
        let end = after
            .find("-->")
            .map(|i| pos + 4 + i + 3)
            .unwrap_or(src.len());
        return Some(Token::Comment { end });
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = rest.find('>').map(|i| pos + i + 1).unwrap_or(src.len());
        return Some(Token::Declaration { end });
    }

    let name_start = if rest.starts_with("</") { pos + 2 } else { pos + 1 };
    if !src.as_bytes().get(name_start)?.is_ascii_alphabetic() {
        return None;
    }
    let end = find_tag_end(src, name_start)? + 1;
    let tag = tokenize_tag(&src[pos..end])?;
    let name = tag.name.to_string();
    match tag.kind {
        TagKind::EndTag => Some(Token::EndTag { name, end }),
        TagKind::StartTag => Some(Token::StartTag {
            name,
            attrs: tag
                .attrs
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect(),
            self_closing: tag.self_closing,
            end,
        }),
    }
}

/// Keeps the first tag the tokenizer emits.
#[derive(Default)]
struct FirstTag {
    tag: Option<Tag>,
}

impl TokenSink for FirstTag {
    type Handle = ();

    fn process_token(&mut self, token: HtmlToken, _line_number: u64) -> TokenSinkResult<()> {
        if let HtmlToken::TagToken(tag) = token {
            self.tag.get_or_insert(tag);
        }
        TokenSinkResult::Continue
    }
}

/// Tokenize the source of exactly one tag with html5ever.
fn tokenize_tag(raw: &str) -> Option<Tag> {
    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from_slice(raw));
    let mut tokenizer = Tokenizer::new(FirstTag::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    tokenizer.sink.tag.take()
}

/// One start or end tag located in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    /// Lower-cased tag name.
    pub name: String,
    pub is_end: bool,
    pub self_closing: bool,
}

/// Every markup token of `src` as `(start, token)`, in source order.
fn tokens(src: &str) -> Vec<(usize, Token)> {
    let bytes = src.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        match scan_tag(src, pos) {
            Some(token) => {
                let end = token.end();
                found.push((pos, token));
                pos = end;
            }
            None => pos += 1,
        }
    }
    found
}

/// Start and end tags of `src` in source order. Comments and declarations
/// are skipped.
pub fn tag_spans(src: &str) -> Vec<TagSpan> {
    tokens(src)
        .into_iter()
        .filter_map(|(start, token)| match token {
            Token::StartTag {
                name,
                self_closing,
                end,
                ..
            } => Some(TagSpan {
                start,
                end,
                name,
                is_end: false,
                self_closing,
            }),
            Token::EndTag { name, end } => Some(TagSpan {
                start,
                end,
                name,
                is_end: true,
                self_closing: false,
            }),
            Token::Comment { .. } | Token::Declaration { .. } => None,
        })
        .collect()
}

/// Index of the `>` ending a tag, skipping quoted attribute values.
fn find_tag_end(src: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in src.as_bytes()[from..].iter().enumerate() {
        match (quote, *b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(*b),
            (None, b'>') => return Some(from + i),
            (None, b'<') => return None,
            _ => {}
        }
    }
    None
}

fn find_ignore_case(src: &str, from: usize, needle: &str) -> Option<usize> {
    let haystack = src[from..].to_ascii_lowercase();
    haystack.find(&needle.to_ascii_lowercase()).map(|i| from + i)
}

/// Decode HTML character references, named (`&ndash;`) and numeric alike.
/// Unknown references are left as they are.
pub fn decode_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

/// Remove every tag and comment, leaving raw (undecoded) text.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for (start, token) in tokens(html) {
        out.push_str(&html[last..start]);
        last = token.end();
    }
    out.push_str(&html[last..]);
    out
}

/// Escape a string for safe insertion into markup.
pub fn escape(s: &str) -> String {
    html_escape::encode_quoted_attribute(s).into_owned()
}

/// Plain text of a fragment with block boundaries turned into line breaks.
pub fn to_plain_text(html: &str) -> String {
    fn walk(node: &Node, out: &mut String) {
        match &node.kind {
            NodeKind::Text => out.push_str(&decode_entities(&node.outer)),
            NodeKind::Element { name, .. } => {
                if name == "br" {
                    out.push('\n');
                    return;
                }
                for child in &node.children {
                    walk(child, out);
                }
                if BLOCK_ELEMENTS.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
            NodeKind::Comment | NodeKind::Other => {}
        }
    }

    let mut raw = String::new();
    for node in parse_fragment(html) {
        walk(&node, &mut raw);
    }
    raw.lines()
        .map(|line| line.replace('\u{a0}', " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_nodes_partition_source() {
        let src = "<p>One</p>\n<ul><li>a</li><li>b</li></ul> tail <br>";
        let nodes = parse_fragment(src);
        let joined: String = nodes.iter().map(|n| n.outer.as_str()).collect();
        assert_eq!(joined, src);
        assert!(nodes[0].is_tag("p"));
        assert!(nodes[2].is_list());
        assert_eq!(nodes[2].descendants("li").len(), 2);
    }

    #[test]
    fn inner_and_text_content() {
        let nodes = parse_fragment("<p>Fish &amp; <strong>chips</strong></p>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].inner, "Fish &amp; <strong>chips</strong>");
        assert_eq!(nodes[0].text(), "Fish & chips");
    }

    #[test]
    fn unclosed_elements_end_at_input_end() {
        let src = "<p>open <em>never closed";
        let nodes = parse_fragment(src);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].outer, src);
        assert_eq!(nodes[0].text(), "open never closed");
    }

    #[test]
    fn stray_end_tag_is_kept() {
        let src = "</div><p>x</p>";
        let nodes = parse_fragment(src);
        assert_eq!(nodes[0].kind, NodeKind::Other);
        assert_eq!(nodes[0].outer, "</div>");
        assert!(nodes[1].is_tag("p"));
    }

    #[test]
    fn implicit_close_of_inner_elements() {
        let nodes = parse_fragment("<div><p>a<b>bold</div><p>next</p>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].outer, "<div><p>a<b>bold</div>");
        assert_eq!(nodes[1].text(), "next");
    }

    #[test]
    fn attributes_and_classes() {
        let nodes = parse_fragment(r#"<figure class="table wide" data-x='1'><table></table></figure>"#);
        assert!(nodes[0].has_class("table"));
        assert!(!nodes[0].has_class("tab"));
        assert_eq!(nodes[0].attr("data-x").as_deref(), Some("1"));
        assert!(nodes[0].find("table").is_some());
    }

    #[test]
    fn quoted_gt_in_attribute() {
        let nodes = parse_fragment(r#"<a title="a > b">link</a>"#);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text(), "link");
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let src = "3 < 4 and <p>ok</p>";
        let nodes = parse_fragment(src);
        assert_eq!(nodes[0].kind, NodeKind::Text);
        assert_eq!(nodes[0].outer, "3 < 4 and ");
    }

    #[test]
    fn decode_numeric_entities() {
        assert_eq!(decode_entities("&#65;&#x42;&nbsp;&bogus;"), "AB\u{a0}&bogus;");
    }

    #[test]
    fn decode_named_entities() {
        assert_eq!(
            decode_entities("Q11&ndash;12 the river&rsquo;s edge &mdash; or not"),
            "Q11\u{2013}12 the river\u{2019}s edge \u{2014} or not"
        );
    }

    #[test]
    fn attribute_values_are_decoded() {
        let nodes = parse_fragment(r#"<span title="fish &amp; chips" hidden>x</span>"#);
        assert_eq!(nodes[0].attr("title").as_deref(), Some("fish & chips"));
        assert_eq!(nodes[0].attr("hidden").as_deref(), Some(""));
    }

    #[test]
    fn tag_spans_locate_tags() {
        let spans = tag_spans("<p>a<br/><!-- c --></P>");
        let names: Vec<_> = spans
            .iter()
            .map(|t| (t.name.as_str(), t.is_end, t.self_closing))
            .collect();
        assert_eq!(
            names,
            vec![("p", false, false), ("br", false, true), ("p", true, false)]
        );
        assert_eq!((spans[2].start, spans[2].end), (19, 23));
    }

    #[test]
    fn plain_text_breaks_blocks() {
        let text = to_plain_text("<h2>Task 1</h2><p>Describe the&nbsp;chart.</p><p></p>");
        assert_eq!(text, "Task 1\nDescribe the chart.");
    }

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("<p>Q1 <b>river</b></p>"), "Q1 river");
        assert_eq!(strip_tags("a<!-- note --> &lt; b < c"), "a &lt; b < c");
    }
}
