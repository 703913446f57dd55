//! Definition list produced by the scanner.

use std::fmt;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A documentation tag such as `@stable` or `@since 1.4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Tag name without the leading `@`.
    pub name: String,
    /// Text following the name up to the end of the line (may be empty).
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "@{}", self.name)
        } else {
            write!(f, "@{} {}", self.name, self.value)
        }
    }
}

/// Kind of module-level definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    Testcase,
    Control,
    Function,
    Altstep,
}

/// One recognised definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub kind: DefKind,
    /// Name of the enclosing module.
    pub module: String,
    /// Definition identifier; `control` for control parts.
    pub name: String,
    pub span: Span,
    /// Tags from the documentation comments preceding the definition.
    pub tags: Vec<Tag>,
}

impl Definition {
    /// `<module>.<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

/// A module header.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub span: Span,
    pub tags: Vec<Tag>,
}

/// Everything the scanner found in one source file, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Definitions {
    pub modules: Vec<Module>,
    pub defs: Vec<Definition>,
}

impl Definitions {
    pub fn tests(&self) -> impl Iterator<Item = &Definition> {
        self.defs.iter().filter(|d| d.kind == DefKind::Testcase)
    }

    pub fn controls(&self) -> impl Iterator<Item = &Definition> {
        self.defs.iter().filter(|d| d.kind == DefKind::Control)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
