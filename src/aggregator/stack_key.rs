//! Deduplication keys for hang stacks.
//!
//! Two observations land in the same stack entry when their pseudo-stacks
//! are equal and their native stacks reference the same modules at the same
//! offsets. Module table rows a stack never indexes are not part of the key.

use crate::parser::{Frame, NativeStack};
use crate::utils::config::EMPTY_STACK_KEY;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A loaded module, as identified by the symbol server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Module {
    pub file_name: String,
    pub debug_id: String,
}

impl Module {
    pub fn new(file_name: impl Into<String>, debug_id: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            debug_id: debug_id.into(),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.file_name, self.debug_id)
    }
}

/// Native part of a stack key
///
/// `frames` index into `modules`; -1 marks a frame with no module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeKey {
    pub modules: Vec<Module>,
    pub frames: Vec<(i64, u64)>,
}

impl NativeKey {
    /// Module owning a frame, if any
    pub fn module_of(&self, index: i64) -> Option<&Module> {
        usize::try_from(index).ok().and_then(|i| self.modules.get(i))
    }
}

/// Full deduplication key of a stack entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackKey {
    pub pseudo_stack: Vec<Frame>,
    pub native: Option<NativeKey>,
}

impl StackKey {
    /// Build the key for one hang
    ///
    /// **Public** - used by the accumulator
    pub fn new(pseudo_stack: &[Frame], native_stack: Option<&NativeStack>) -> Self {
        Self {
            pseudo_stack: pseudo_stack.to_vec(),
            native: native_stack.map(narrow_native_stack),
        }
    }
}

/// Grouping key for a pseudo-stack: its last frame
///
/// **Public** - `library!name` when the frame carries both, otherwise its
/// display form. Empty stacks map to `EMPTY_STACK_KEY`, which is reserved:
/// a real frame spelled like it is keyed as `!empty_pseudo_stack`.
pub fn top_frame_key(pseudo_stack: &[Frame]) -> String {
    let Some(frame) = pseudo_stack.last() else {
        return EMPTY_STACK_KEY.to_string();
    };

    let key = match (&frame.library, &frame.name) {
        (Some(library), Some(name)) => format!("{}!{}", library, name),
        _ => frame.to_string(),
    };

    if key == EMPTY_STACK_KEY {
        format!("!{}", key)
    } else {
        key
    }
}

/// Reduce a native stack to the modules its first stack references
///
/// **Public** - kept modules stay in table order, frame indices are
/// renumbered to match; out-of-range indices become -1.
pub fn narrow_native_stack(native: &NativeStack) -> NativeKey {
    let frames = native.frames();
    let table_len = native.memory_map.len();

    let in_table = |index: i64| usize::try_from(index).ok().filter(|&i| i < table_len);

    let used: BTreeSet<usize> = frames
        .iter()
        .filter_map(|&(index, _)| in_table(index))
        .collect();

    let remap: BTreeMap<usize, i64> = used
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, new as i64))
        .collect();

    let modules = used
        .iter()
        .map(|&old| {
            let (file_name, debug_id) = &native.memory_map[old];
            Module::new(file_name.clone(), debug_id.clone())
        })
        .collect();

    let frames = frames
        .iter()
        .map(|&(index, offset)| {
            let narrowed = in_table(index)
                .and_then(|old| remap.get(&old).copied())
                .unwrap_or(-1);
            (narrowed, offset)
        })
        .collect();

    NativeKey { modules, frames }
}
