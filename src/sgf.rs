//! A small parser for SGF game records.
//!
//! Only the tree structure is interpreted here: nodes, property identifiers
//! and raw values. Meaning is given to properties by [`crate::replay`].
//!
//! ```text
//! Collection = GameTree { GameTree }
//! GameTree   = "(" Node { Node } { GameTree } ")"
//! Node       = ";" { PropIdent PropValue { PropValue } }
//! PropValue  = "[" text "]"
//! ```
//!
//! Identifiers keep only their uppercase letters, so old long forms like
//! `AddBlack` read as `AB`.

use std::fmt;

use crate::error::{Error, Result};

/// One node: properties in the order they appear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    props: Vec<(String, Vec<String>)>,
}

impl Node {
    /// Values of property `ident`, if present.
    pub fn get(&self, ident: &str) -> Option<&[String]> {
        self.props
            .iter()
            .find(|(id, _)| id == ident)
            .map(|(_, v)| v.as_slice())
    }

    /// First value of property `ident`, if present.
    pub fn first(&self, ident: &str) -> Option<&str> {
        self.get(ident)?.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.props.iter().map(|(id, v)| (id.as_str(), v.as_slice()))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(";")?;
        for (id, values) in &self.props {
            f.write_str(id)?;
            for v in values {
                write!(f, "[{}]", v.replace('\\', "\\\\").replace(']', "\\]"))?;
            }
        }
        Ok(())
    }
}

/// A sequence of nodes followed by its variations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameTree {
    pub nodes: Vec<Node>,
    pub variations: Vec<GameTree>,
}

impl GameTree {
    /// The root node, which carries the game header.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Nodes of the main line: this sequence, then always the first variation.
    pub fn main_line(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut tree = self;
        loop {
            out.extend(tree.nodes.iter());
            match tree.variations.first() {
                Some(v) => tree = v,
                None => break,
            }
        }
        out
    }
}

/// Parse every game tree in `text`.
pub fn parse_collection(text: &str) -> Result<Vec<GameTree>> {
    let mut p = Parser {
        src: text.as_bytes(),
        pos: 0,
    };
    let mut trees = Vec::new();
    loop {
        p.skip_ws();
        match p.peek() {
            None => break,
            Some(b'(') => trees.push(p.game_tree()?),
            Some(_) => return Err(p.error("expected '('")),
        }
    }
    if trees.is_empty() {
        return Err(p.error("no game tree found"));
    }
    Ok(trees)
}

/// Parse the first game tree in `text`.
pub fn parse(text: &str) -> Result<GameTree> {
    let mut trees = parse_collection(text)?;
    Ok(trees.swap_remove(0))
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> Error {
        Error::SgfSyntax {
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", b as char)))
        }
    }

    fn game_tree(&mut self) -> Result<GameTree> {
        self.expect(b'(')?;
        let mut tree = GameTree::default();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b';') => {
                    if !tree.variations.is_empty() {
                        return Err(self.error("node after variations"));
                    }
                    tree.nodes.push(self.node()?);
                }
                Some(b'(') => tree.variations.push(self.game_tree()?),
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return Err(self.error("expected ';', '(' or ')'")),
                None => return Err(self.error("unterminated game tree")),
            }
        }
        if tree.nodes.is_empty() {
            return Err(self.error("game tree without nodes"));
        }
        Ok(tree)
    }

    fn node(&mut self) -> Result<Node> {
        self.expect(b';')?;
        let mut node = Node::default();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    let ident = self.ident();
                    let mut values = Vec::new();
                    self.skip_ws();
                    while self.peek() == Some(b'[') {
                        values.push(self.value()?);
                        self.skip_ws();
                    }
                    if values.is_empty() {
                        return Err(self.error(&format!("property {ident} has no value")));
                    }
                    match node.props.iter_mut().find(|(id, _)| *id == ident) {
                        Some((_, v)) => v.extend(values),
                        None => node.props.push((ident, values)),
                    }
                }
                _ => return Ok(node),
            }
        }
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(b) = self.peek().filter(u8::is_ascii_alphabetic) {
            if b.is_ascii_uppercase() {
                ident.push(b as char);
            }
            self.pos += 1;
        }
        ident
    }

    fn value(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1; // '['
        let mut raw = Vec::new();
        loop {
            match self.peek() {
                None => {
                    self.pos = start;
                    return Err(self.error("unterminated property value"));
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        // Soft line break
                        Some(b'\n') => self.pos += 1,
                        Some(b) => {
                            raw.push(b);
                            self.pos += 1;
                        }
                        None => {}
                    }
                }
                Some(b) => {
                    raw.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}
