use crate::{CompiledFunction, ConstantPool, Ptr};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// A position in a source file
///
/// Lines and columns are 1-based, matching how positions are rendered in
/// runtime error messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourcePos {
    /// The source line
    pub line: u32,
    /// The source column
    pub column: u32,
}

impl SourcePos {
    /// Initializes a source position
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source position information for a compiled function
///
/// Positions are recorded as `(ip, position)` runs sorted by ip: a run
/// covers every instruction from its ip up to the next entry. Consecutive
/// instructions produced from the same position share a single run, which
/// keeps the map small relative to the byte stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DebugInfo {
    source_map: Vec<(u32, SourcePos)>,
}

impl DebugInfo {
    /// Records the source position for the instruction at the given ip
    ///
    /// Pushes must arrive in ip order. A new run only starts when the
    /// position differs from the most recently recorded one.
    pub fn push(&mut self, ip: u32, pos: SourcePos) {
        match self.source_map.last() {
            Some((_, last_pos)) if *last_pos == pos => {}
            _ => self.source_map.push((ip, pos)),
        }
    }

    /// Returns the source position of the run covering the given ip
    pub fn get_source_pos(&self, ip: u32) -> Option<SourcePos> {
        let runs_at_or_below = self
            .source_map
            .partition_point(|(run_ip, _)| *run_ip <= ip);
        runs_at_or_below
            .checked_sub(1)
            .map(|run| self.source_map[run].1)
    }
}

/// A compiled bytecode artifact, ready to be executed by the runtime
///
/// A chunk bundles the entry-point function with the constant pool shared by
/// every function reachable from it, along with the path of the program's
/// source file for use in error messages.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// The program's entry point
    ///
    /// The main function takes no parameters and declares no locals; its
    /// variables live in the globals array.
    pub main: Ptr<CompiledFunction>,
    /// The constant data referenced by the chunk's functions
    pub constants: ConstantPool,
    /// The path of the program's source file
    pub source_path: Option<PathBuf>,
}

impl Chunk {
    /// Initializes a Chunk
    pub fn new(
        main: Ptr<CompiledFunction>,
        constants: ConstantPool,
        source_path: Option<&Path>,
    ) -> Self {
        Self {
            main,
            constants,
            source_path: source_path.map(Path::to_path_buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_info_shares_entries_with_matching_positions() {
        let mut info = DebugInfo::default();
        info.push(0, SourcePos::new(1, 1));
        info.push(3, SourcePos::new(1, 1));
        info.push(6, SourcePos::new(2, 5));

        assert_eq!(info.get_source_pos(0), Some(SourcePos::new(1, 1)));
        assert_eq!(info.get_source_pos(5), Some(SourcePos::new(1, 1)));
        assert_eq!(info.get_source_pos(6), Some(SourcePos::new(2, 5)));
        assert_eq!(info.get_source_pos(100), Some(SourcePos::new(2, 5)));
    }

    #[test]
    fn debug_info_empty_map_has_no_positions() {
        let info = DebugInfo::default();
        assert_eq!(info.get_source_pos(0), None);
    }
}
