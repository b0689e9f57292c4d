//! The record program: a flat instruction list the decoder replays.
//!
//! The template compiler emits one instruction per structural token of a
//! conforming record, in record order. Array instructions are linked with
//! jump targets so the last templated element can repeat: the `ARRAY_END`
//! jumps back to the start of the last element, and each inter-element
//! comma can jump forward to the `ARRAY_END` when the record's array ends
//! early.
//!
//! Before linking, two collapsing passes normalize the raw emission:
//! trailing repeats of an array's last element are deleted (the repeat rule
//! makes them redundant), and a keyless nested array collapses to the
//! single opaque value slot its key-tree collapses to.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expect {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Value,
    Comma,
}

/// The container the expected token sits in. Start/end instructions carry
/// the container they open or close sits in, not the one they delimit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parent {
    None,
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Instruction {
    pub(crate) expect: Expect,
    pub(crate) parent: Parent,
    /// The field name, for instructions directly inside an object.
    pub(crate) key: Option<String>,
    /// Loop link, for array starts, ends, and inter-element commas.
    pub(crate) jump: Option<usize>,
}

impl Instruction {
    pub(crate) fn new(expect: Expect, parent: Parent) -> Self {
        Instruction {
            expect,
            parent,
            key: None,
            jump: None,
        }
    }

    pub(crate) fn keyed(expect: Expect, parent: Parent, key: Option<String>) -> Self {
        Instruction {
            expect,
            parent,
            key,
            jump: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_jump(mut self, jump: usize) -> Self {
        self.jump = Some(jump);
        self
    }

    /// Loop target of a linked array instruction.
    pub(crate) fn target(&self) -> usize {
        match self.jump {
            Some(index) => index,
            None => unreachable!("array loop instructions are linked at compile time"),
        }
    }
}

/// Run the collapsing passes and link array jumps.
///
/// `arrays` holds one bookkeeping record per array in the program, in close
/// order (innermost first): `[start_index, element_indices.., end_index]`,
/// where each element index is the first instruction of that element.
pub(crate) fn optimize(program: &mut Vec<Instruction>, mut arrays: Vec<Vec<usize>>) {
    collapse_repeats(program, &mut arrays);
    collapse_value_arrays(program, &mut arrays);
    link_jumps(program, &arrays);
}

/// Delete trailing array elements whose instruction span repeats the last
/// element's span. Processing in close order handles nested arrays: inner
/// duplicates are still present when the outer spans are compared, so equal
/// outer elements compare equal span-for-span.
fn collapse_repeats(program: &mut Vec<Instruction>, arrays: &mut Vec<Vec<usize>>) {
    let mut doomed: BTreeSet<usize> = BTreeSet::new();
    for marks in arrays.iter() {
        if marks.len() < 4 {
            // Fewer than two elements, nothing can repeat.
            continue;
        }
        let end = marks[marks.len() - 1];
        let elements = &marks[1..marks.len() - 1];
        let last = elements[elements.len() - 1];
        let mut reference = program[last..end].to_vec();
        reference.push(Instruction::new(Expect::Comma, Parent::Array));
        for k in (0..elements.len() - 1).rev() {
            let span = elements[k]..elements[k + 1];
            if program[span.clone()] == reference[..] {
                doomed.extend(span);
            } else {
                break;
            }
        }
    }
    if doomed.is_empty() {
        return;
    }
    // A doomed array start means the whole array sat inside a deleted
    // element; a doomed element mark means that element was deleted.
    arrays.retain(|marks| !doomed.contains(&marks[0]));
    for marks in arrays.iter_mut() {
        marks.retain(|m| !doomed.contains(m));
        for m in marks.iter_mut() {
            *m = shift(&doomed, *m);
        }
    }
    delete(program, &doomed);
}

/// Collapse a keyless array run (`ARRAY_START`s, one `VALUE`, `ARRAY_END`s)
/// into the single value slot its key-tree becomes. End of program closes a
/// window just as a following instruction does, so the collapse also fires
/// for a keyless array in tail position.
fn collapse_value_arrays(program: &mut Vec<Instruction>, arrays: &mut Vec<Vec<usize>>) {
    let mut doomed: BTreeSet<usize> = BTreeSet::new();
    let mut replacements: Vec<(usize, Instruction)> = Vec::new();
    let mut start: Option<usize> = None;
    let mut value: Option<usize> = None;
    // One step past the last instruction closes any window still open.
    for i in 0..=program.len() {
        let expect = program.get(i).map(|ins| ins.expect);
        match (start, value) {
            (None, _) => {
                if expect == Some(Expect::ArrayStart) {
                    start = Some(i);
                }
            }
            (Some(_), None) => match expect {
                Some(Expect::ArrayStart) => {}
                Some(Expect::Value) => value = Some(i),
                _ => start = None,
            },
            (Some(s), Some(v)) => {
                if expect != Some(Expect::ArrayEnd) {
                    // The trim is symmetric around the value slot, so an
                    // enclosing array's own start is never consumed.
                    let end = i - 1;
                    let radius = (v - s).min(end - v);
                    let outermost = &program[v + radius];
                    replacements.push((
                        v,
                        Instruction::keyed(Expect::Value, outermost.parent, outermost.key.clone()),
                    ));
                    for j in (v - radius)..=(v + radius) {
                        if j != v {
                            doomed.insert(j);
                        }
                    }
                    start = None;
                    value = None;
                }
            }
        }
    }
    if replacements.is_empty() {
        return;
    }
    for (i, ins) in replacements {
        program[i] = ins;
    }
    arrays.retain(|marks| !doomed.contains(&marks[0]));
    for marks in arrays.iter_mut() {
        // An element mark on a collapsed array start slides forward to the
        // value slot that replaced it.
        for m in marks.iter_mut() {
            *m = shift(&doomed, next_surviving(&doomed, *m));
        }
    }
    delete(program, &doomed);
}

fn link_jumps(program: &mut [Instruction], arrays: &[Vec<usize>]) {
    for marks in arrays {
        if marks.len() < 3 {
            continue;
        }
        let start = marks[0];
        let end = marks[marks.len() - 1];
        let last_element = marks[marks.len() - 2];
        program[start].jump = Some(end);
        program[end].jump = Some(last_element);
        for &element in &marks[2..marks.len() - 1] {
            // The comma directly before each element past the first.
            program[element - 1].jump = Some(end);
        }
    }
}

fn shift(doomed: &BTreeSet<usize>, index: usize) -> usize {
    index - doomed.range(..index).count()
}

fn next_surviving(doomed: &BTreeSet<usize>, mut index: usize) -> usize {
    while doomed.contains(&index) {
        index += 1;
    }
    index
}

fn delete(program: &mut Vec<Instruction>, doomed: &BTreeSet<usize>) {
    let mut index = 0;
    program.retain(|_| {
        let keep = !doomed.contains(&index);
        index += 1;
        keep
    });
}
