//! Human-readable struct dumps and the before/after record of one invocation.

use std::io::{self, Write};

use bytemuck::Pod;

use crate::layout::FixedLayout;

/// Writes every field of a bridged struct to a text stream.
pub trait StructDump {
    fn dump(&self, out: &mut dyn Write) -> io::Result<()>;

    fn dump_to_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.dump(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// The snapshots an invoker dumped: before the callback and, if it re-read
/// the struct, after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<T> {
    pub before: T,
    pub after: Option<T>,
}

impl<T: FixedLayout + Pod> Invocation<T> {
    /// Fields whose bytes differ between the two snapshots, in declaration
    /// order. Empty when there is no "after" snapshot.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let Some(after) = &self.after else {
            return Vec::new();
        };
        let before = bytemuck::bytes_of(&self.before);
        let after = bytemuck::bytes_of(after);
        T::LAYOUT
            .slots()
            .into_iter()
            .filter(|slot| before[slot.offset..slot.end()] != after[slot.offset..slot.end()])
            .map(|slot| slot.name())
            .collect()
    }

    pub fn is_unchanged(&self) -> bool {
        self.changed_fields().is_empty()
    }
}
