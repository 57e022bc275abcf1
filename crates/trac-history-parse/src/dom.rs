//! Queryable tree-node capability the interpreters are written against.
//!
//! The parsing stages only need four primitive operations from an HTML
//! tree; everything else (class tokens, searches, text rendering) is
//! derived here. [`scraper::ElementRef`] is the production implementation.

use scraper::{ElementRef, Node};

/// A child of an element: either a nested element or a run of text.
#[derive(Debug, Clone, Copy)]
pub enum Child<'a, N> {
    Element(N),
    Text(&'a str),
}

/// Read-only view of one element in a parsed document.
///
/// Equality is node identity, not structural equality.
pub trait DomNode<'a>: Copy + PartialEq {
    /// Lower-case tag name.
    fn tag(&self) -> &'a str;

    fn attr(&self, name: &str) -> Option<&'a str>;

    /// Enclosing element, if any.
    fn parent_element(&self) -> Option<Self>;

    /// Element and text children in document order.
    fn child_nodes(&self) -> Vec<Child<'a, Self>>;

    /// Whitespace-separated tokens of the `class` attribute.
    fn classes(&self) -> impl Iterator<Item = &'a str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    fn is(&self, tag: &str) -> bool {
        self.tag().eq_ignore_ascii_case(tag)
    }

    /// Direct element children.
    fn children(&self) -> Vec<Self> {
        self.child_nodes()
            .into_iter()
            .filter_map(|c| match c {
                Child::Element(e) => Some(e),
                Child::Text(_) => None,
            })
            .collect()
    }

    /// All descendant elements matching `pred`, in document order.
    fn find_all<P: Fn(&Self) -> bool>(&self, pred: P) -> Vec<Self> {
        collect_matching(*self, &pred, true)
    }

    /// Descendant elements matching `pred` that have no matching ancestor
    /// below `self`, in document order.
    fn find_outermost<P: Fn(&Self) -> bool>(&self, pred: P) -> Vec<Self> {
        collect_matching(*self, &pred, false)
    }

    /// First descendant element matching `pred`.
    fn find<P: Fn(&Self) -> bool>(&self, pred: P) -> Option<Self> {
        let mut stack = self.children();
        stack.reverse();
        while let Some(node) = stack.pop() {
            if pred(&node) {
                return Some(node);
            }
            push_children(&mut stack, node);
        }
        None
    }

    /// Text runs below this element, in document order.
    fn text_runs(&self) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut stack = self.child_nodes();
        stack.reverse();
        while let Some(child) = stack.pop() {
            match child {
                Child::Text(t) => out.push(t),
                Child::Element(e) => stack.extend(e.child_nodes().into_iter().rev()),
            }
        }
        out
    }

    /// Trimmed text runs joined with `sep`, empty runs skipped.
    fn joined_text(&self, sep: &str) -> String {
        self.text_runs()
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// Rendered text with all whitespace collapsed to single spaces.
    fn normalized_text(&self) -> String {
        normalize_ws(&self.text_runs().concat())
    }
}

/// Pre-order walk with an explicit stack; nesting depth is bounded by the
/// heap, not the call stack.
fn collect_matching<'a, N: DomNode<'a>, P: Fn(&N) -> bool>(
    root: N,
    pred: &P,
    descend_into_matches: bool,
) -> Vec<N> {
    let mut out = Vec::new();
    let mut stack = root.children();
    stack.reverse();
    while let Some(node) = stack.pop() {
        let matched = pred(&node);
        if matched {
            out.push(node);
        }
        if !matched || descend_into_matches {
            push_children(&mut stack, node);
        }
    }
    out
}

/// Push `node`'s element children so the first child is popped first.
fn push_children<'a, N: DomNode<'a>>(stack: &mut Vec<N>, node: N) {
    stack.extend(node.children().into_iter().rev());
}

/// Collapse runs of whitespace to one space and trim the ends.
#[must_use]
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Elements that start and end a line when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "table",
    "tr",
    "ul",
];

/// Render an element's text with one line per block, as a reader sees it.
///
/// Block elements and `<br>` break lines, inline markup does not, `<pre>`
/// keeps its own line breaks. Lines are whitespace-normalized and blank
/// lines dropped.
pub fn block_text<'a, N: DomNode<'a>>(node: N) -> String {
    let mut lines = LineBuffer::default();
    render_blocks(node, &mut lines);
    lines.finish()
}

#[derive(Default)]
struct LineBuffer {
    lines: Vec<String>,
    current: String,
}

impl LineBuffer {
    fn push(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn flush(&mut self) {
        let line = normalize_ws(&self.current);
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.flush();
        self.lines.join("\n")
    }
}

enum Step<'a, N> {
    Visit(Child<'a, N>, bool),
    /// End of a block element.
    Close,
}

fn render_blocks<'a, N: DomNode<'a>>(node: N, lines: &mut LineBuffer) {
    let mut stack: Vec<Step<'a, N>> = node
        .child_nodes()
        .into_iter()
        .rev()
        .map(|c| Step::Visit(c, false))
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Close => lines.flush(),
            Step::Visit(Child::Text(text), true) => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    lines.push(first);
                }
                for part in parts {
                    lines.flush();
                    lines.push(part);
                }
            }
            Step::Visit(Child::Text(text), false) => lines.push(text),
            Step::Visit(Child::Element(e), _) if e.is("br") => lines.flush(),
            Step::Visit(Child::Element(e), in_pre) => {
                if BLOCK_TAGS.iter().any(|t| e.is(t)) {
                    lines.flush();
                    stack.push(Step::Close);
                }
                let in_pre = in_pre || e.is("pre");
                stack.extend(
                    e.child_nodes()
                        .into_iter()
                        .rev()
                        .map(|c| Step::Visit(c, in_pre)),
                );
            }
        }
    }
}

impl<'a> DomNode<'a> for ElementRef<'a> {
    fn tag(&self) -> &'a str {
        self.value().name()
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.value().attr(name)
    }

    fn parent_element(&self) -> Option<Self> {
        (**self).parent().and_then(ElementRef::wrap)
    }

    fn child_nodes(&self) -> Vec<Child<'a, Self>> {
        // Deref to the tree node; `children` on `ElementRef` is the trait method.
        (**self)
            .children()
            .filter_map(|node| match node.value() {
                Node::Text(text) => Some(Child::Text(&**text)),
                Node::Element(_) => ElementRef::wrap(node).map(Child::Element),
                _ => None,
            })
            .collect()
    }
}
