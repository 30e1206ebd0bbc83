//! Block splitting over the top-level nodes of a document.
//!
//! An explicit two-state machine: `Outside` passes nodes through until one
//! whose trimmed text starts with a block's opening sequence; `Inside`
//! accumulates sibling markup until a sibling whose text contains the
//! closing sequence. Interior siblings contribute their full markup, the
//! closing sibling only its text. Running out of input while `Inside` is
//! the `finish` transition and yields an unterminated block.

use crate::markup::{self, Node, NodeKind};
use crate::model::BlockKind;

/// Output of the splitter, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A top-level node outside any block.
    Content(Node),
    /// The raw body of a delimited block.
    Block(RawBlock),
}

/// A delimited block with its opening and closing sequences removed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    pub kind: BlockKind,
    /// Index of the top-level node that opened the block.
    pub opened_at: usize,
    pub body: String,
    /// Markup that followed the closing sequence inside the closing node.
    pub trailing: String,
    pub terminated: bool,
}

#[derive(Debug)]
enum State {
    Outside,
    Inside(RawBlock),
}

/// Incremental splitter; feed nodes in order, then call [`finish`](Self::finish).
#[derive(Debug)]
pub struct BlockScanner {
    state: State,
    segments: Vec<Segment>,
}

impl Default for BlockScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockScanner {
    pub fn new() -> Self {
        Self {
            state: State::Outside,
            segments: Vec::new(),
        }
    }

    /// Whether a block is currently open.
    pub fn is_inside(&self) -> bool {
        matches!(self.state, State::Inside(_))
    }

    pub fn feed(&mut self, index: usize, node: Node) {
        match std::mem::replace(&mut self.state, State::Outside) {
            State::Outside => self.feed_outside(index, node),
            State::Inside(block) => self.feed_inside(block, node),
        }
    }

    fn feed_outside(&mut self, index: usize, node: Node) {
        let Some(kind) = opener_kind(&node) else {
            self.segments.push(Segment::Content(node));
            return;
        };
        let markup = if node.is_element() {
            node.inner.as_str()
        } else {
            node.outer.as_str()
        };
        let after_open = match markup.find(kind.open()) {
            Some(at) => format!("{}{}", &markup[..at], &markup[at + kind.open().len()..]),
            None => markup.to_string(),
        };

        let mut block = RawBlock {
            kind,
            opened_at: index,
            body: String::new(),
            trailing: String::new(),
            terminated: false,
        };
        match after_open.find(kind.close()) {
            Some(at) => {
                block.body = after_open[..at].to_string();
                block.trailing = after_open[at + kind.close().len()..].to_string();
                block.terminated = true;
                tracing::debug!(%kind, index, "single-node block");
                self.segments.push(Segment::Block(block));
            }
            None => {
                block.body = after_open;
                self.state = State::Inside(block);
            }
        }
    }

    fn feed_inside(&mut self, mut block: RawBlock, node: Node) {
        let text = node.text();
        match text.find(block.kind.close()) {
            Some(at) => {
                block.body.push_str(&markup::escape(&text[..at]));
                block.trailing = markup::escape(&text[at + block.kind.close().len()..]);
                block.terminated = true;
                tracing::debug!(kind = %block.kind, opened_at = block.opened_at, "block closed");
                self.segments.push(Segment::Block(block));
            }
            None => {
                block.body.push_str(&node.outer);
                self.state = State::Inside(block);
            }
        }
    }

    /// End-of-input transition. A block still open becomes an unterminated
    /// segment holding everything after its opener.
    pub fn finish(mut self) -> Vec<Segment> {
        if let State::Inside(block) = std::mem::replace(&mut self.state, State::Outside) {
            tracing::debug!(kind = %block.kind, opened_at = block.opened_at, "block unterminated at end of input");
            self.segments.push(Segment::Block(block));
        }
        self.segments
    }
}

/// Lists and figure tables never open blocks, whatever their text says.
fn opener_kind(node: &Node) -> Option<BlockKind> {
    match &node.kind {
        NodeKind::Element { .. } if node.is_list() || node.is_tag("figure") || node.is_tag("table") => None,
        NodeKind::Element { .. } | NodeKind::Text => BlockKind::opened_by(&node.text()),
        NodeKind::Comment | NodeKind::Other => None,
    }
}

/// Split a document's top-level nodes into content and block segments.
pub fn split_blocks(nodes: Vec<Node>) -> Vec<Segment> {
    let mut scanner = BlockScanner::new();
    for (index, node) in nodes.into_iter().enumerate() {
        scanner.feed(index, node);
    }
    scanner.finish()
}
