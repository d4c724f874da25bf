//! Structural queries - a small CSS selector engine
//!
//! Supported grammar (enough for every path `anchoring` emits, plus the
//! common hand-written cases):
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( ( '>' | ws ) compound )*
//! compound  := ( tag | '*' )? ( '#' ident | '.' ident | attr | ':nth-child(' int ')' )*
//! attr      := '[' ident ( '=' ( string | ident ) )? ']'
//! ```
//!
//! Matching follows `Element.querySelector`: the first element in preorder
//! below the scope that matches. Ancestors outside the scope still take
//! part in matching combinators.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};
use ahash::AHashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Combinator {
    Child,
    Descendant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// `None` is the universal selector
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    /// `[name]` when the value is `None`, `[name="value"]` otherwise
    attributes: Vec<(String, Option<String>)>,
    nth_child: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

/// A parsed selector list, reusable across queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSelector {
    alternatives: Vec<Complex>,
}

impl CompiledSelector {
    pub fn parse(source: &str) -> Result<Self> {
        Parser::new(source).parse_list()
    }

    /// Whether the element `node_id` matches any alternative
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> bool {
        self.alternatives.iter().any(|complex| {
            let last = complex.compounds.len() - 1;
            match_from(arena, node_id, complex, last)
        })
    }
}

/// Right-to-left match of `complex` ending at `compounds[index]`.
///
/// Backtracking keeps its own stack of `(node, compound)` candidates, and
/// each pair is tried once, so deep paths cost heap, not call stack.
fn match_from(arena: &DomArena, node_id: NodeId, complex: &Complex, index: usize) -> bool {
    let mut pending = vec![(node_id, index)];
    let mut tried: AHashSet<(NodeId, usize)> = AHashSet::new();

    while let Some((node_id, index)) = pending.pop() {
        if !tried.insert((node_id, index)) {
            continue;
        }
        let Ok(node) = arena.get(node_id) else {
            continue;
        };
        if !match_compound(arena, node, &complex.compounds[index]) {
            continue;
        }
        if index == 0 {
            return true;
        }

        let parent = parent_element(arena, node);
        match complex.combinators[index - 1] {
            Combinator::Child => pending.extend(parent.map(|p| (p, index - 1))),
            Combinator::Descendant => {
                let ancestors: Vec<NodeId> = std::iter::successors(parent, |&id| {
                    arena.get(id).ok().and_then(|n| parent_element(arena, n))
                })
                .collect();
                // Nearest ancestor on top
                pending.extend(ancestors.into_iter().rev().map(|a| (a, index - 1)));
            }
        }
    }
    false
}

fn parent_element(arena: &DomArena, node: &DomNode) -> Option<NodeId> {
    node.parent_id
        .filter(|&parent| arena.get(parent).map_or(false, DomNode::is_element))
}

fn match_compound(arena: &DomArena, node: &DomNode, compound: &Compound) -> bool {
    if !node.is_element() {
        return false;
    }
    if let Some(tag) = &compound.tag {
        if !node.node_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if node.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    if !compound
        .classes
        .iter()
        .all(|class| node.classes().any(|c| c == class))
    {
        return false;
    }
    if !compound
        .attributes
        .iter()
        .all(|(name, value)| match (node.attr(name), value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        })
    {
        return false;
    }
    if let Some(n) = compound.nth_child {
        return element_position(arena, node) == n;
    }
    true
}

/// 1-based position among the parent's element children. A node without a
/// parent is its own only sibling.
fn element_position(arena: &DomArena, node: &DomNode) -> usize {
    match node.parent_id {
        Some(parent) => arena
            .element_children(parent)
            .position(|id| id == node.node_id)
            .map_or(1, |p| p + 1),
        None => 1,
    }
}

impl DomArena {
    /// First descendant of `scope` (preorder, scope excluded) matching `selector`
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let compiled = CompiledSelector::parse(selector)?;
        let mut found = None;
        self.walk_descendants(scope, |id| {
            if compiled.matches(self, id) {
                found = Some(id);
                false
            } else {
                true
            }
        })?;
        Ok(found)
    }

    /// Every descendant of `scope` matching `selector`, in document order
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let compiled = CompiledSelector::parse(selector)?;
        let mut found = Vec::new();
        self.walk_descendants(scope, |id| {
            if compiled.matches(self, id) {
                found.push(id);
            }
            true
        })?;
        Ok(found)
    }

    /// Preorder walk below `scope`; the visitor returns `false` to stop
    fn walk_descendants<F>(&self, scope: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeId) -> bool,
    {
        let root = self.get(scope)?;
        let mut stack: Vec<NodeId> = root.children_ids.iter().rev().copied().collect();
        while let Some(node_id) = stack.pop() {
            if !visit(node_id) {
                break;
            }
            stack.extend(self.get(node_id)?.children_ids.iter().rev());
        }
        Ok(())
    }
}

/// Quote `value` as a CSS string for attribute selectors
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\0' => out.push('\u{FFFD}'),
            c if c.is_control() => out.push_str(&format!("\\{:x} ", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Escape `ident` for use after `#` or `.` in a selector (`CSS.escape`)
pub fn escape_identifier(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let first = ident.chars().next();
    let single = ident.chars().count() == 1;

    for (index, ch) in ident.chars().enumerate() {
        let code = ch as u32;
        if ch == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (index == 0 && ch.is_ascii_digit())
            || (index == 1 && ch.is_ascii_digit() && first == Some('-'))
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if index == 0 && single && ch == '-' {
            out.push_str("\\-");
        } else if code >= 0x80 || ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::InvalidSelector {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<CompiledSelector> {
        let mut alternatives = vec![self.parse_complex()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            alternatives.push(self.parse_complex()?);
        }
        if let Some(ch) = self.peek() {
            return Err(self.error(format!("unexpected '{}' at {}", ch, self.pos)));
        }
        Ok(CompiledSelector { alternatives })
    }

    fn parse_complex(&mut self) -> Result<Complex> {
        self.skip_whitespace();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(ch) => {
                    return Err(self.error(format!("unexpected '{}' at {}", ch, self.pos)))
                }
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => {
                self.pos += 1;
            }
            Some(ch) if is_ident_start(ch) => {
                compound.tag = Some(self.parse_ident()?);
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.parse_ident()?;
                    if !pseudo.eq_ignore_ascii_case("nth-child") {
                        return Err(self.error(format!("unsupported pseudo-class :{}", pseudo)));
                    }
                    compound.nth_child = Some(self.parse_nth()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(ch) => {
                    self.error(format!("expected selector at {}, found '{}'", self.pos, ch))
                }
                None => self.error("expected selector, found end of input"),
            });
        }
        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<(String, Option<String>)> {
        self.skip_whitespace();
        let name = self.parse_ident()?;
        self.skip_whitespace();
        let value = match self.bump() {
            Some(']') => return Ok((name, None)),
            Some('=') => {
                self.skip_whitespace();
                match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        self.parse_string(quote)?
                    }
                    _ => self.parse_ident()?,
                }
            }
            _ => return Err(self.error(format!("malformed attribute selector [{}", name))),
        };
        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(self.error("expected ']' to close attribute selector"));
        }
        Ok((name, Some(value)))
    }

    fn parse_string(&mut self, quote: char) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => value.push(self.parse_escape()?),
                Some(ch) => value.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_nth(&mut self) -> Result<usize> {
        if self.bump() != Some('(') {
            return Err(self.error("expected '(' after :nth-child"));
        }
        self.skip_whitespace();
        let digits_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[digits_start..self.pos].iter().collect();
        self.skip_whitespace();
        if self.bump() != Some(')') {
            return Err(self.error("expected ')' after :nth-child index"));
        }
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.error(format!("invalid :nth-child index '{}'", digits))),
        }
    }

    fn parse_ident(&mut self) -> Result<String> {
        let mut ident = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.pos += 1;
                    ident.push(self.parse_escape()?);
                }
                Some(ch) if is_ident_char(ch) => {
                    self.pos += 1;
                    ident.push(ch);
                }
                _ => break,
            }
        }
        if ident.is_empty() {
            return Err(self.error(format!("expected identifier at {}", self.pos)));
        }
        Ok(ident)
    }

    fn parse_escape(&mut self) -> Result<char> {
        let start = self.pos;
        while self.pos - start < 6 && matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        if self.pos > start {
            let hex: String = self.chars[start..self.pos].iter().collect();
            // A single whitespace terminates a hex escape
            if matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.pos += 1;
            }
            let code = u32::from_str_radix(&hex, 16).unwrap_or(0);
            return Ok(match char::from_u32(code) {
                Some(ch) if code != 0 => ch,
                _ => '\u{FFFD}',
            });
        }
        self.bump()
            .ok_or_else(|| self.error("dangling escape at end of input"))
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '-' || ch == '\\' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || !ch.is_ascii()
}
