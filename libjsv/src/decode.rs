//! The record decoder: flat-program replay.
//!
//! Decoding walks the instruction program with an index `j` and the input
//! with a scanner, building the output value on an explicit container
//! stack. Array instructions use their jump links to loop the last
//! templated element and to bail out of an array that ends early. A
//! templated object field whose slot is immediately followed by `,` or `}`
//! is omitted: the key is absent from the output, and for composite fields
//! the whole instruction span of the field is skipped.

use serde_json::{Map, Value};

use crate::error::{expected_set, RecordError};
use crate::json::{scan_string, scan_value};
use crate::program::{Expect, Instruction, Parent};
use crate::scanner::Scanner;

enum Container {
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

impl Container {
    fn finish(self) -> Value {
        match self {
            Container::Array(items) => Value::Array(items),
            Container::Object(fields) => Value::Object(fields),
        }
    }
}

pub(crate) fn decode_record(program: &[Instruction], input: &str) -> Result<Value, RecordError> {
    let mut sc = Scanner::new(input);
    let mut stack: Vec<Container> = Vec::new();
    let mut j = 0;
    loop {
        let ins = &program[j];
        match ins.expect {
            Expect::ObjectStart => {
                if ins.parent == Parent::Object && field_omitted(&mut sc) {
                    j = skip_field(program, j);
                    continue;
                }
                consume_one_of(&mut sc, &['{'])?;
                stack.push(Container::Object(Map::new()));
                j += 1;
            }
            Expect::ArrayStart => {
                if ins.parent == Parent::Object && field_omitted(&mut sc) {
                    j = skip_field(program, j);
                    continue;
                }
                consume_one_of(&mut sc, &['['])?;
                stack.push(Container::Array(Vec::new()));
                sc.skip_whitespace();
                if sc.peek() == Some(']') {
                    // Empty array: go straight to the close.
                    j = ins.target();
                } else {
                    j += 1;
                }
            }
            Expect::Value => {
                if ins.parent == Parent::Object && field_omitted(&mut sc) {
                    j += 1;
                    continue;
                }
                let value = scan_value(&mut sc)?;
                match attach(&mut stack, ins, value) {
                    Some(root) => return Ok(root),
                    None => j += 1,
                }
            }
            Expect::ObjectEnd => {
                match consume_one_of(&mut sc, &['}', ','])? {
                    ',' => {
                        // An untemplated key carried inline.
                        consume_one_of(&mut sc, &['"'])?;
                        let key = scan_string(&mut sc)?;
                        consume_one_of(&mut sc, &[':'])?;
                        let value = scan_value(&mut sc)?;
                        if let Some(Container::Object(fields)) = stack.last_mut() {
                            fields.insert(key, value);
                        }
                        // Stay: more pairs or the close may follow.
                    }
                    _ => {
                        let value = close(&mut stack);
                        match attach(&mut stack, ins, value) {
                            Some(root) => return Ok(root),
                            None => j += 1,
                        }
                    }
                }
            }
            Expect::ArrayEnd => match consume_one_of(&mut sc, &[']', ','])? {
                ']' => {
                    let value = close(&mut stack);
                    match attach(&mut stack, ins, value) {
                        Some(root) => return Ok(root),
                        None => j += 1,
                    }
                }
                // More elements: loop back to the last templated element.
                _ => j = ins.target(),
            },
            Expect::Comma => {
                let expected: &[char] = if ins.parent == Parent::Array {
                    &[',', ']']
                } else {
                    &[',']
                };
                match consume_one_of(&mut sc, expected)? {
                    ']' => {
                        // The array ended before its templated elements
                        // ran out; let the ARRAY_END instruction see it.
                        sc.retreat();
                        j = ins.target();
                    }
                    _ => j += 1,
                }
            }
        }
    }
}

/// Pop the finished container off the build stack.
fn close(stack: &mut Vec<Container>) -> Value {
    match stack.pop() {
        Some(container) => container.finish(),
        None => unreachable!("close instructions are balanced with starts"),
    }
}

/// Hand a finished value to its container, or out as the decoded root.
fn attach(stack: &mut Vec<Container>, ins: &Instruction, value: Value) -> Option<Value> {
    match ins.parent {
        Parent::Array => {
            if let Some(Container::Array(items)) = stack.last_mut() {
                items.push(value);
            }
            None
        }
        Parent::Object => {
            if let (Some(Container::Object(fields)), Some(key)) = (stack.last_mut(), &ins.key) {
                fields.insert(key.clone(), value);
            }
            None
        }
        Parent::None => Some(value),
    }
}

/// An object field slot directly followed by `,` or `}` holds nothing.
fn field_omitted(sc: &mut Scanner) -> bool {
    sc.skip_whitespace();
    matches!(sc.peek(), Some(',') | Some('}'))
}

/// Index just past the instruction span of the field starting at `j`.
fn skip_field(program: &[Instruction], j: usize) -> usize {
    match program[j].expect {
        Expect::ObjectStart | Expect::ArrayStart => {
            let mut depth = 0usize;
            let mut k = j;
            loop {
                match program[k].expect {
                    Expect::ObjectStart | Expect::ArrayStart => depth += 1,
                    Expect::ObjectEnd | Expect::ArrayEnd => {
                        depth -= 1;
                        if depth == 0 {
                            return k + 1;
                        }
                    }
                    _ => {}
                }
                k += 1;
            }
        }
        _ => j + 1,
    }
}

/// Consume the next non-whitespace character, requiring it to be one of
/// `expected`.
fn consume_one_of(sc: &mut Scanner, expected: &[char]) -> Result<char, RecordError> {
    loop {
        match sc.next() {
            None => {
                return Err(RecordError::UnexpectedEndAwaiting {
                    expected: expected_set(expected),
                    column: sc.column(),
                })
            }
            Some(c) if expected.contains(&c) => return Ok(c),
            Some(c) if c.is_whitespace() => continue,
            Some(_) => {
                return Err(RecordError::UnexpectedCharacter {
                    expected: expected_set(expected),
                    column: sc.column(),
                })
            }
        }
    }
}
