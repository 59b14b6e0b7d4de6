use std::fmt;

use super::source::ShaderStage;

/// Upper bound on stored diagnostic text, in bytes.
pub const MAX_LOG_LEN: usize = 512;

/// Bounded, human-readable compiler or linker output.
///
/// Never empty: when the backend produced no text, a fixed message naming the
/// failure is stored instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLog {
    text: String,
    truncated: bool,
}

impl DiagnosticLog {
    /// Builds a log from raw backend output.
    ///
    /// Output longer than [`MAX_LOG_LEN`] is cut on a UTF-8 character boundary.
    pub fn new(text: impl Into<String>, fallback: &str) -> Self {
        let text = text.into();
        let trimmed = text.trim_end();

        if trimmed.trim_start().is_empty() {
            return Self { text: fallback.to_owned(), truncated: false };
        }

        if trimmed.len() <= MAX_LOG_LEN {
            return Self { text: trimmed.to_owned(), truncated: false };
        }

        let mut end = MAX_LOG_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }

        Self { text: trimmed[..end].to_owned(), truncated: true }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Display for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if self.truncated {
            f.write_str("\n(log truncated)")?;
        }
        Ok(())
    }
}

/// A stage failed to compile. The stage must not be linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub stage: ShaderStage,
    pub label: String,
    pub log: DiagnosticLog,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to compile {} stage `{}`:\n{}", self.stage, self.label, self.log)
    }
}

impl std::error::Error for CompileError {}

/// A set of compiled stages could not be linked into a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkError {
    pub label: String,
    pub log: DiagnosticLog,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to link program `{}`:\n{}", self.label, self.log)
    }
}

impl std::error::Error for LinkError {}

/// Either half of a program build failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    Compile(CompileError),
    Link(LinkError),
}

impl ShaderError {
    pub fn log(&self) -> &DiagnosticLog {
        match self {
            ShaderError::Compile(e) => &e.log,
            ShaderError::Link(e) => &e.log,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile(e) => e.fmt(f),
            ShaderError::Link(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Compile(e) => Some(e),
            ShaderError::Link(e) => Some(e),
        }
    }
}

impl From<CompileError> for ShaderError {
    fn from(e: CompileError) -> Self {
        ShaderError::Compile(e)
    }
}

impl From<LinkError> for ShaderError {
    fn from(e: LinkError) -> Self {
        ShaderError::Link(e)
    }
}
