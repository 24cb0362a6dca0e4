//! Dotted/indexed field paths.
//!
//! Form values live in one `serde_json::Value` tree. A [`FieldPath`] such as
//! `customProperties.authIP[0].note` or `docs[2].url` addresses a node in it,
//! either as a whole array (`docs`) or a nested record field (`docs[2].url`).

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{FormsError, Result};

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// A single-key path. The key is taken verbatim, not parsed.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }

    /// Parse `a.b[0].c` style paths.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(FormsError::invalid_path(input, "path is empty"));
        }

        let mut segments = Vec::new();
        let mut chars = input.chars().peekable();
        let mut key = String::new();
        let mut after_index = false;

        while let Some(c) = chars.next() {
            let closed = std::mem::take(&mut after_index);
            match c {
                '.' => {
                    if key.is_empty() {
                        if closed && chars.peek().is_some_and(|next| !matches!(next, '.' | '[' | ']')) {
                            continue;
                        }
                        return Err(FormsError::invalid_path(input, "empty key"));
                    }
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                    if chars.peek().is_none() {
                        return Err(FormsError::invalid_path(input, "trailing '.'"));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    } else if segments.is_empty() {
                        return Err(FormsError::invalid_path(input, "path starts with an index"));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) => digits.push(d),
                            None => return Err(FormsError::invalid_path(input, "unclosed '['")),
                        }
                    }
                    let index = digits.parse::<usize>().map_err(|_| {
                        FormsError::invalid_path(input, format!("'{digits}' is not an index"))
                    })?;
                    segments.push(Segment::Index(index));
                    after_index = true;
                    if !matches!(chars.peek(), None | Some('.') | Some('[')) {
                        return Err(FormsError::invalid_path(input, "expected '.' or '[' after ']'"));
                    }
                }
                ']' => return Err(FormsError::invalid_path(input, "unmatched ']'")),
                other => key.push(other),
            }
        }

        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }

        Ok(Self { segments })
    }

    /// Append a key segment.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.into()));
        Self { segments }
    }

    /// Append an index segment.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// The path without its last segment, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The last index segment, i.e. the row of a field-array member.
    pub fn last_index(&self) -> Option<usize> {
        self.segments.iter().rev().find_map(|s| match s {
            Segment::Index(i) => Some(*i),
            Segment::Key(_) => None,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Read the node at this path.
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match segment {
                Segment::Key(k) => node.as_object()?.get(k),
                Segment::Index(i) => node.as_array()?.get(*i),
            })
    }

    /// Whether `set` can reach this path: every index is at most one past
    /// the end of the array it addresses, or 0 where no array exists yet.
    pub fn is_writable(&self, root: &Value) -> bool {
        let mut node = Some(root);
        for segment in &self.segments {
            node = match segment {
                Segment::Key(k) => node.and_then(Value::as_object).and_then(|m| m.get(k)),
                Segment::Index(i) => {
                    let items = node.and_then(Value::as_array);
                    if *i > items.map_or(0, Vec::len) {
                        return false;
                    }
                    items.and_then(|items| items.get(*i))
                }
            };
        }
        true
    }

    /// Write `value` at this path, creating intermediate objects and arrays.
    /// Returns `false`, leaving `root` untouched, when the path is not
    /// [writable](Self::is_writable).
    ///
    /// A node of the wrong shape along the way is replaced.
    pub fn set(&self, root: &mut Value, value: Value) -> bool {
        if !self.is_writable(root) {
            warn!(path = %self, "write ignored, index past the end of its array");
            return false;
        }
        let mut node = root;
        for segment in &self.segments {
            node = match segment {
                Segment::Key(k) => {
                    if !node.is_object() {
                        *node = Value::Object(Map::new());
                    }
                    match node {
                        Value::Object(map) => map.entry(k.clone()).or_insert(Value::Null),
                        _ => unreachable!("node was just made an object"),
                    }
                }
                Segment::Index(i) => {
                    if !node.is_array() {
                        *node = Value::Array(Vec::new());
                    }
                    match node {
                        Value::Array(items) => {
                            if items.len() == *i {
                                items.push(Value::Null);
                            }
                            &mut items[*i]
                        }
                        _ => unreachable!("node was just made an array"),
                    }
                }
            };
        }
        *node = value;
        true
    }
}

impl FromStr for FieldPath {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(k) if i == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
