/// Source position of a token or node: the owning file is tracked by the
/// `SourceUnit`, so a location is just a line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Loc {
    pub line: u32,
}

impl Loc {
    pub fn new(line: u32) -> Self {
        Self { line }
    }
}
