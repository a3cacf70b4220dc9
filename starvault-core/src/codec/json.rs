//! JSON text for the transport form, without recursion per nesting level.
//!
//! A document nests one object per universe level, so both directions keep
//! their own work stacks on the heap. Leaf values (strings, numbers, a
//! node's own fields) still go through `serde_json`.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use super::transport::{TransportDoc, TransportNode, TransportUniverse};
use crate::constants::TRANSPORT_VERSION;
use crate::error::{Result, StarVaultError};

/// Nesting allowed inside a single scalar field before it is read as null.
const FIELD_DEPTH_LIMIT: usize = 64;

fn malformed(what: impl Into<String>) -> StarVaultError {
    StarVaultError::Malformed(what.into())
}

enum Emit<'a> {
    Text(&'static str),
    Universe(&'a TransportUniverse),
    Node(&'a TransportNode),
}

/// Serialize a transport document to JSON bytes.
pub fn write_doc(doc: &TransportDoc) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(b"{\"version\":");
    serde_json::to_writer(&mut out, &doc.version)?;
    out.extend_from_slice(b",\"wormholes\":");
    serde_json::to_writer(&mut out, &doc.wormholes)?;
    out.extend_from_slice(b",\"root\":");

    let mut work = vec![Emit::Text("]}")];
    push_nodes(&mut work, &doc.black_hole);
    work.push(Emit::Text(",\"blackHole\":["));
    work.push(Emit::Universe(&doc.root));

    while let Some(step) = work.pop() {
        match step {
            Emit::Text(text) => out.extend_from_slice(text.as_bytes()),
            Emit::Universe(universe) => {
                out.extend_from_slice(b"{\"name\":");
                serde_json::to_writer(&mut out, &universe.name)?;
                out.extend_from_slice(b",\"theme\":");
                serde_json::to_writer(&mut out, &universe.theme)?;
                out.extend_from_slice(b",\"links\":");
                serde_json::to_writer(&mut out, &universe.links)?;
                match &universe.nodes {
                    Some(nodes) => {
                        out.extend_from_slice(b",\"nodes\":[");
                        work.push(Emit::Text("]}"));
                        push_nodes(&mut work, nodes);
                    }
                    None => out.extend_from_slice(b",\"nodes\":null}"),
                }
            }
            Emit::Node(node) => {
                // The node's own fields, minus the closing brace.
                let fields = serde_json::to_vec(node)?;
                let open = fields
                    .strip_suffix(b"}")
                    .ok_or_else(|| StarVaultError::Serialization("node is not an object".to_string()))?;
                out.extend_from_slice(open);
                match &node.inner_universe {
                    Some(inner) => {
                        if open.len() > 1 {
                            out.push(b',');
                        }
                        out.extend_from_slice(b"\"innerUniverse\":");
                        work.push(Emit::Text("}"));
                        work.push(Emit::Universe(inner));
                    }
                    None => out.push(b'}'),
                }
            }
        }
    }
    Ok(out)
}

fn push_nodes<'a>(work: &mut Vec<Emit<'a>>, nodes: &'a [TransportNode]) {
    for (i, node) in nodes.iter().enumerate().rev() {
        work.push(Emit::Node(node));
        if i > 0 {
            work.push(Emit::Text(","));
        }
    }
}

/// A parsed JSON value whose children are indices into the arena.
enum Json {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<usize>),
    Object(Vec<(String, usize)>),
}

#[derive(Default)]
struct Arena {
    values: Vec<Json>,
}

impl Arena {
    fn push(&mut self, value: Json) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    fn get(&self, at: usize) -> &Json {
        &self.values[at]
    }

    fn append(&mut self, container: usize, key: Option<String>, child: usize) {
        match (&mut self.values[container], key) {
            (Json::Array(items), None) => items.push(child),
            (Json::Object(fields), Some(key)) => fields.push((key, child)),
            _ => {}
        }
    }

    /// Later duplicates of a key win, as in `serde_json::Value`.
    fn field(&self, at: usize, key: &str) -> Option<usize> {
        match self.get(at) {
            Json::Object(fields) => fields.iter().rev().find(|(k, _)| k == key).map(|(_, v)| *v),
            _ => None,
        }
    }

    fn to_value(&self, at: usize, depth: usize) -> Value {
        if depth > FIELD_DEPTH_LIMIT {
            return Value::Null;
        }
        match self.get(at) {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.clone()),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::Array(
                items.iter().map(|&item| self.to_value(item, depth + 1)).collect(),
            ),
            Json::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.to_value(*v, depth + 1)))
                    .collect(),
            ),
        }
    }

    /// An object's fields as a `Value`, leaving out `skip`.
    fn object_without(&self, at: usize, skip: &str) -> Value {
        let mut map = Map::new();
        if let Json::Object(fields) = self.get(at) {
            for (key, value) in fields.iter().filter(|(k, _)| k != skip) {
                map.insert(key.clone(), self.to_value(*value, 1));
            }
        }
        Value::Object(map)
    }

    /// A field decoded leniently: absent, null or mistyped becomes the default.
    fn lenient<T: DeserializeOwned + Default>(&self, at: usize, key: &str) -> T {
        self.field(at, key)
            .and_then(|v| serde_json::from_value(self.to_value(v, 0)).ok())
            .unwrap_or_default()
    }

    fn inner_universe(&self, node: usize) -> Result<Option<usize>> {
        match self.field(node, "innerUniverse").map(|at| (at, self.get(at))) {
            None | Some((_, Json::Null)) => Ok(None),
            Some((at, Json::Object(_))) => Ok(Some(at)),
            Some(_) => Err(malformed("innerUniverse is not an object")),
        }
    }

    fn node_list(&self, universe: usize) -> Result<Option<&[usize]>> {
        match self.field(universe, "nodes").map(|at| self.get(at)) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::Array(items)) => Ok(Some(items.as_slice())),
            Some(_) => Err(malformed("nodes is not a list")),
        }
    }
}

enum Start {
    Complete(usize),
    Array(usize),
    Object(usize),
}

enum Frame {
    Array(usize),
    Object(usize, String),
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, what: &str) -> StarVaultError {
        malformed(format!("not a document: {what} at byte {}", self.pos))
    }

    fn skip_ws(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b' ' | b'\n' | b'\r' | b'\t')) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Result<u8> {
        self.skip_ws();
        let byte = *self.bytes.get(self.pos).ok_or_else(|| self.error("unexpected end"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.bytes.get(self.pos) {
                Some(b'"') => break,
                Some(b'\\') => self.pos += 2,
                Some(_) => self.pos += 1,
                None => return Err(self.error("unterminated string")),
            }
        }
        self.pos += 1;
        serde_json::from_slice(&self.bytes[start..self.pos]).map_err(|_| self.error("bad string"))
    }

    fn key(&mut self) -> Result<String> {
        self.skip_ws();
        if self.bytes.get(self.pos) != Some(&b'"') {
            return Err(self.error("expected a key"));
        }
        let key = self.string()?;
        if self.next_token()? != b':' {
            return Err(self.error("expected ':'"));
        }
        Ok(key)
    }

    fn literal(&mut self, word: &[u8], value: Json, arena: &mut Arena) -> Result<Start> {
        if !self.bytes[self.pos..].starts_with(word) {
            return Err(self.error("unknown literal"));
        }
        self.pos += word.len();
        Ok(Start::Complete(arena.push(value)))
    }

    fn number(&mut self, arena: &mut Arena) -> Result<Start> {
        let start = self.pos;
        while matches!(
            self.bytes.get(self.pos),
            Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
        ) {
            self.pos += 1;
        }
        let number: Number = serde_json::from_slice(&self.bytes[start..self.pos])
            .map_err(|_| self.error("bad number"))?;
        Ok(Start::Complete(arena.push(Json::Number(number))))
    }

    fn value_start(&mut self, arena: &mut Arena) -> Result<Start> {
        self.skip_ws();
        match self.bytes.get(self.pos) {
            Some(b'{') => {
                self.pos += 1;
                Ok(Start::Object(arena.push(Json::Object(Vec::new()))))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(Start::Array(arena.push(Json::Array(Vec::new()))))
            }
            Some(b'"') => {
                let s = self.string()?;
                Ok(Start::Complete(arena.push(Json::String(s))))
            }
            Some(b't') => self.literal(b"true", Json::Bool(true), arena),
            Some(b'f') => self.literal(b"false", Json::Bool(false), arena),
            Some(b'n') => self.literal(b"null", Json::Null, arena),
            Some(b'-' | b'0'..=b'9') => self.number(arena),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end")),
        }
    }
}

/// Parse JSON text into an arena, returning the index of the top value.
fn parse(bytes: &[u8]) -> Result<(Arena, usize)> {
    let mut parser = Parser { bytes, pos: 0 };
    let mut arena = Arena::default();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let mut done = match parser.value_start(&mut arena)? {
            Start::Complete(at) => at,
            Start::Array(at) => {
                if parser.eat(b']') {
                    at
                } else {
                    stack.push(Frame::Array(at));
                    continue;
                }
            }
            Start::Object(at) => {
                if parser.eat(b'}') {
                    at
                } else {
                    let key = parser.key()?;
                    stack.push(Frame::Object(at, key));
                    continue;
                }
            }
        };

        // Hand the finished value to its container, closing containers
        // until one expects another value.
        loop {
            let Some(frame) = stack.pop() else {
                parser.skip_ws();
                if parser.pos != bytes.len() {
                    return Err(parser.error("trailing data"));
                }
                return Ok((arena, done));
            };
            let (container, closing) = match frame {
                Frame::Array(at) => {
                    arena.append(at, None, done);
                    (at, b']')
                }
                Frame::Object(at, key) => {
                    arena.append(at, Some(key), done);
                    (at, b'}')
                }
            };
            match parser.next_token()? {
                b',' => {
                    let frame = if closing == b']' {
                        Frame::Array(container)
                    } else {
                        Frame::Object(container, parser.key()?)
                    };
                    stack.push(frame);
                    break;
                }
                byte if byte == closing => done = container,
                _ => return Err(parser.error("expected ',' or a closing bracket")),
            }
        }
    }
}

/// Parse JSON bytes into a transport document.
///
/// Only the skeleton is strict: the top level and `root` must be objects,
/// and `nodes`, `blackHole` and `innerUniverse` must have the right shape
/// when present. Everything else is read leniently.
pub fn read_doc(bytes: &[u8]) -> Result<TransportDoc> {
    let (arena, top) = parse(bytes)?;
    if !matches!(arena.get(top), Json::Object(_)) {
        return Err(malformed("document is not an object"));
    }
    let root_at = match arena.field(top, "root") {
        Some(at) if matches!(arena.get(at), Json::Object(_)) => at,
        _ => return Err(malformed("document has no root universe")),
    };
    let banished: &[usize] = match arena.field(top, "blackHole").map(|at| arena.get(at)) {
        None | Some(Json::Null) => &[],
        Some(Json::Array(items)) => items.as_slice(),
        Some(_) => return Err(malformed("blackHole is not a list")),
    };

    // Owners are listed before the universes they own.
    let mut order = Vec::new();
    let mut pending = vec![root_at];
    for &node in banished {
        pending.extend(arena.inner_universe(node)?);
    }
    while let Some(at) = pending.pop() {
        order.push(at);
        for &node in arena.node_list(at)?.unwrap_or_default() {
            pending.extend(arena.inner_universe(node)?);
        }
    }

    let mut built: HashMap<usize, TransportUniverse> = HashMap::with_capacity(order.len());
    for &at in order.iter().rev() {
        let universe = build_universe(&arena, at, &mut built)?;
        built.insert(at, universe);
    }

    let root = built
        .remove(&root_at)
        .ok_or_else(|| malformed("root universe was not built"))?;
    let black_hole = banished
        .iter()
        .map(|&at| build_node(&arena, at, &mut built))
        .collect::<Result<Vec<_>>>()?;

    Ok(TransportDoc {
        version: arena
            .field(top, "version")
            .and_then(|v| serde_json::from_value(arena.to_value(v, 0)).ok())
            .unwrap_or(TRANSPORT_VERSION),
        root,
        wormholes: arena.lenient(top, "wormholes"),
        black_hole,
    })
}

fn build_universe(
    arena: &Arena,
    at: usize,
    built: &mut HashMap<usize, TransportUniverse>,
) -> Result<TransportUniverse> {
    let nodes = match arena.node_list(at)? {
        Some(items) => Some(
            items
                .iter()
                .map(|&node| build_node(arena, node, built))
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };
    Ok(TransportUniverse {
        name: arena.lenient(at, "name"),
        theme: arena.lenient(at, "theme"),
        nodes,
        links: arena.lenient(at, "links"),
    })
}

fn build_node(
    arena: &Arena,
    at: usize,
    built: &mut HashMap<usize, TransportUniverse>,
) -> Result<TransportNode> {
    if !matches!(arena.get(at), Json::Object(_)) {
        return Err(malformed("node is not an object"));
    }
    let mut node: TransportNode = serde_json::from_value(arena.object_without(at, "innerUniverse"))
        .map_err(|e| malformed(format!("unreadable node: {e}")))?;
    if let Some(inner) = arena.inner_universe(at)? {
        node.inner_universe = built.remove(&inner);
    }
    Ok(node)
}
