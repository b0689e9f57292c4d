//! The template grammar parser and the public [`Template`] type.
//!
//! Template text is JSON with the punctuation kept and most everything else
//! removed: objects list their keys (`{"a","b"}`), values reachable through
//! those keys are implied, and a bare slot (`:` value position, or an empty
//! array element) accepts any JSON. One parse builds two artifacts in
//! parallel: the key-tree that drives encoding and canonical text, and the
//! flat instruction program the record decoder replays.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::decode::decode_record;
use crate::encode::{encode_record, render_template};
use crate::error::{EncodeError, RecordError, TemplateError};
use crate::json::scan_string;
use crate::program::{self, Expect, Instruction, Parent};
use crate::scanner::Scanner;
use crate::tree::{self, KeyTree};

/// A compiled record template.
///
/// Compiling is the expensive step; a `Template` is immutable afterwards
/// and can encode and decode any number of records, from any number of
/// threads.
pub struct Template {
    tree: KeyTree,
    program: Vec<Instruction>,
    text: String,
}

impl Template {
    /// Compile template text.
    pub fn compile(source: &str) -> Result<Template, TemplateError> {
        let (tree, program) = Compiler::new(source).run()?;
        if matches!(tree, KeyTree::Any) {
            // A template with no keys anywhere elides nothing; every side
            // of the codec treats it as the wildcard.
            return Ok(Template::wildcard());
        }
        let text = render_template(&tree);
        Ok(Template {
            tree,
            program,
            text,
        })
    }

    /// Infer a template from a sample record. Keys come out sorted; a
    /// sample with no object keys anywhere yields the wildcard template,
    /// which passes any JSON value through verbatim.
    pub fn from_value(sample: &Value) -> Template {
        let tree = tree::from_sample(sample);
        if matches!(tree, KeyTree::Any) {
            return Template::wildcard();
        }
        match Template::compile(&render_template(&tree)) {
            Ok(template) => template,
            Err(_) => Template::wildcard(),
        }
    }

    fn wildcard() -> Template {
        Template {
            tree: KeyTree::Any,
            program: vec![Instruction::new(Expect::Value, Parent::None)],
            text: "{}".to_string(),
        }
    }

    /// The canonical text of this template. Equal templates render
    /// identically.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Encode a record, eliding every key the template lists.
    pub fn encode(&self, record: &Value) -> Result<String, EncodeError> {
        encode_record(&self.tree, record)
    }

    /// Decode a record, reattaching the elided keys.
    pub fn decode(&self, input: &str) -> Result<Value, RecordError> {
        decode_record(&self.program, input)
    }

    #[cfg(test)]
    pub(crate) fn instructions(&self) -> &[Instruction] {
        &self.program
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Template {}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Template").field(&self.text).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectArrayOrObject,
    ExpectArrayOrObjectOrArrayClose,
    ArrayNextOrClose,
    ObjectAfterKey,
    ObjectNextOrClose,
    ExpectQuote,
    Done,
}

struct Compiler {
    scanner: Scanner,
    program: Vec<Instruction>,
    /// Bookkeeping for arrays still open: `[start, elements.., (end)]`.
    open_arrays: Vec<Vec<usize>>,
    /// Bookkeeping for closed arrays, innermost first.
    closed_arrays: Vec<Vec<usize>>,
    parents: Vec<Parent>,
    nodes: Vec<KeyTree>,
    keys: Vec<String>,
    /// One flag per open container: did any object key appear at or below
    /// it? Keyless containers collapse to wildcard slots.
    has_keys: Vec<bool>,
    root: Option<KeyTree>,
}

impl Compiler {
    fn new(source: &str) -> Self {
        Compiler {
            scanner: Scanner::new(source),
            program: Vec::new(),
            open_arrays: Vec::new(),
            closed_arrays: Vec::new(),
            parents: Vec::new(),
            nodes: Vec::new(),
            keys: Vec::new(),
            has_keys: Vec::new(),
            root: None,
        }
    }

    fn run(mut self) -> Result<(KeyTree, Vec<Instruction>), TemplateError> {
        let mut state = State::ExpectArrayOrObject;
        while state != State::Done {
            let Some(c) = self.scanner.next() else {
                return Err(TemplateError::UnexpectedEnd {
                    column: self.scanner.column(),
                });
            };
            if c.is_whitespace() {
                continue;
            }
            state = self.step(state, c)?;
        }
        let tree = self.root.take().unwrap_or(KeyTree::Any);
        let mut program = self.program;
        program::optimize(&mut program, self.closed_arrays);
        Ok((tree, program))
    }

    fn step(&mut self, state: State, c: char) -> Result<State, TemplateError> {
        match state {
            State::ExpectArrayOrObject => match c {
                '{' => {
                    self.open_object();
                    Ok(State::ExpectQuote)
                }
                '[' => {
                    self.open_array();
                    Ok(State::ExpectArrayOrObjectOrArrayClose)
                }
                _ => self.unexpected("`{` or `[`"),
            },
            State::ExpectArrayOrObjectOrArrayClose => match c {
                '{' => {
                    self.open_object();
                    Ok(State::ExpectQuote)
                }
                '[' => {
                    self.open_array();
                    Ok(State::ExpectArrayOrObjectOrArrayClose)
                }
                ',' => {
                    // An empty element: an opaque slot.
                    self.mark_element();
                    self.program
                        .push(Instruction::new(Expect::Value, Parent::Array));
                    self.program
                        .push(Instruction::new(Expect::Comma, Parent::Array));
                    self.push_element(KeyTree::Any);
                    Ok(State::ExpectArrayOrObjectOrArrayClose)
                }
                ']' => Ok(self.close_array(true)),
                _ => self.unexpected("`{`, `[` or `]`"),
            },
            State::ArrayNextOrClose => match c {
                ',' => {
                    self.program
                        .push(Instruction::new(Expect::Comma, Parent::Array));
                    Ok(State::ExpectArrayOrObjectOrArrayClose)
                }
                ']' => Ok(self.close_array(false)),
                _ => self.unexpected("`,` or `]`"),
            },
            State::ObjectAfterKey => match c {
                ',' => {
                    self.emit_bare_field();
                    self.program
                        .push(Instruction::new(Expect::Comma, Parent::Object));
                    Ok(State::ExpectQuote)
                }
                ':' => Ok(State::ExpectArrayOrObject),
                '}' => {
                    self.emit_bare_field();
                    Ok(self.close_object())
                }
                _ => self.unexpected("`,`, `:`, or `}`"),
            },
            State::ObjectNextOrClose => match c {
                ',' => {
                    self.program
                        .push(Instruction::new(Expect::Comma, Parent::Object));
                    Ok(State::ExpectQuote)
                }
                '}' => Ok(self.close_object()),
                _ => self.unexpected("`,` or `}`"),
            },
            State::ExpectQuote => match c {
                '"' => {
                    let key = scan_string(&mut self.scanner)?;
                    self.keys.push(key);
                    for flag in self.has_keys.iter_mut() {
                        *flag = true;
                    }
                    Ok(State::ObjectAfterKey)
                }
                '}' => Err(TemplateError::EmptyObject {
                    column: self.scanner.column(),
                }),
                _ => self.unexpected("`\"`"),
            },
            State::Done => Ok(State::Done),
        }
    }

    fn unexpected(&self, expected: &'static str) -> Result<State, TemplateError> {
        Err(TemplateError::UnexpectedCharacter {
            expected,
            column: self.scanner.column(),
        })
    }

    fn parent(&self) -> Parent {
        self.parents.last().copied().unwrap_or(Parent::None)
    }

    /// The key an instruction emitted inside an object belongs to.
    fn pending_key(&self) -> Option<String> {
        self.keys.last().cloned()
    }

    fn mark_element(&mut self) {
        let at = self.program.len();
        if let Some(marks) = self.open_arrays.last_mut() {
            marks.push(at);
        }
    }

    fn push_element(&mut self, node: KeyTree) {
        if let Some(KeyTree::Array(items)) = self.nodes.last_mut() {
            items.push(node);
        }
    }

    fn insert_field(&mut self, key: String, node: KeyTree) {
        if let Some(KeyTree::Object(fields)) = self.nodes.last_mut() {
            fields.insert(key, node);
        }
    }

    fn open_object(&mut self) {
        let parent = self.parent();
        if parent == Parent::Array {
            self.mark_element();
        }
        let key = if parent == Parent::Object {
            self.pending_key()
        } else {
            None
        };
        self.program
            .push(Instruction::keyed(Expect::ObjectStart, parent, key));
        self.parents.push(Parent::Object);
        self.nodes.push(KeyTree::Object(IndexMap::new()));
        self.has_keys.push(false);
    }

    fn open_array(&mut self) {
        let start = self.program.len();
        let parent = self.parent();
        if parent == Parent::Array {
            self.mark_element();
        }
        self.open_arrays.push(vec![start]);
        let key = if parent == Parent::Object {
            self.pending_key()
        } else {
            None
        };
        self.program
            .push(Instruction::keyed(Expect::ArrayStart, parent, key));
        self.parents.push(Parent::Array);
        self.nodes.push(KeyTree::Array(Vec::new()));
        self.has_keys.push(false);
    }

    /// A key with no `:` value is an opaque slot.
    fn emit_bare_field(&mut self) {
        if let Some(key) = self.keys.pop() {
            self.program.push(Instruction::keyed(
                Expect::Value,
                Parent::Object,
                Some(key.clone()),
            ));
            self.insert_field(key, KeyTree::Any);
        }
    }

    fn close_array(&mut self, trailing_element: bool) -> State {
        if trailing_element {
            // `]` right after `[` or `,`: one more opaque element.
            self.mark_element();
            if let Some(marks) = self.open_arrays.last_mut() {
                marks.push(self.program.len() + 1);
            }
            self.program
                .push(Instruction::new(Expect::Value, Parent::Array));
            self.push_element(KeyTree::Any);
        } else if let Some(marks) = self.open_arrays.last_mut() {
            marks.push(self.program.len());
        }
        if let Some(marks) = self.open_arrays.pop() {
            self.closed_arrays.push(marks);
        }
        self.parents.pop();
        let keyed = self.has_keys.pop().unwrap_or(false);
        let node = match self.nodes.pop() {
            Some(KeyTree::Array(mut items)) if keyed => {
                tree::prune_trailing(&mut items);
                KeyTree::Array(items)
            }
            _ => KeyTree::Any,
        };
        self.attach(Expect::ArrayEnd, node)
    }

    fn close_object(&mut self) -> State {
        self.parents.pop();
        self.has_keys.pop();
        let node = match self.nodes.pop() {
            Some(KeyTree::Object(fields)) => KeyTree::Object(fields),
            _ => KeyTree::Any,
        };
        self.attach(Expect::ObjectEnd, node)
    }

    /// Emit the closing instruction for a finished container and hand its
    /// key-tree node to whatever encloses it.
    fn attach(&mut self, expect: Expect, node: KeyTree) -> State {
        match self.parent() {
            Parent::Array => {
                self.push_element(node);
                self.program.push(Instruction::new(expect, Parent::Array));
                State::ArrayNextOrClose
            }
            Parent::Object => {
                let key = self.keys.pop();
                if let Some(key) = &key {
                    self.insert_field(key.clone(), node);
                }
                self.program
                    .push(Instruction::keyed(expect, Parent::Object, key));
                State::ObjectNextOrClose
            }
            Parent::None => {
                self.root = Some(node);
                self.program.push(Instruction::new(expect, Parent::None));
                State::Done
            }
        }
    }
}
