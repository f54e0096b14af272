use std::fmt;
use std::sync::Mutex;

use crate::model::TypeKey;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

impl DiagnosticLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
        }
    }
}

/// Diagnostic code for categorization and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    /// Numeric code (e.g., 1001, 3002)
    pub code: u16,
    /// Category prefix ("E" for error, "W" for warning)
    pub prefix: char,
    /// Stable kebab-case name, e.g. `singleton-depends-on-scoped`
    pub slug: &'static str,
}

impl DiagnosticCode {
    pub const fn new(prefix: char, code: u16, slug: &'static str) -> Self {
        Self { code, prefix, slug }
    }

    /// Format as string (e.g., "E1001", "W2004")
    pub fn as_str(&self) -> String {
        format!("{}{:04}", self.prefix, self.code)
    }

    /// Severity implied by the prefix
    pub fn level(&self) -> DiagnosticLevel {
        match self.prefix {
            'E' => DiagnosticLevel::Error,
            'W' => DiagnosticLevel::Warning,
            _ => DiagnosticLevel::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_str(), self.slug)
    }
}

/// Additional context pointing at another type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRelatedInformation {
    pub type_key: TypeKey,
    pub message: String,
}

/// Suggested fix for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSuggestion {
    pub replacement: String,
    pub message: String,
}

/// A diagnostic with severity, the types it concerns and optional metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub code: Option<DiagnosticCode>,
    /// Offending types, most relevant first
    pub types: Vec<TypeKey>,
    pub related_information: Vec<DiagnosticRelatedInformation>,
    pub suggestions: Vec<DiagnosticSuggestion>,
}

impl Diagnostic {
    fn with_level(level: DiagnosticLevel, types: Vec<TypeKey>, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            code: None,
            types,
            related_information: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(types: Vec<TypeKey>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, types, message)
    }

    pub fn warning(types: Vec<TypeKey>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warning, types, message)
    }

    pub fn info(types: Vec<TypeKey>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, types, message)
    }

    /// Create a diagnostic whose severity follows the code's prefix
    pub fn coded(code: DiagnosticCode, types: Vec<TypeKey>, message: impl Into<String>) -> Self {
        Self::with_level(code.level(), types, message).with_code(code)
    }

    /// Add related information to this diagnostic
    pub fn with_related(mut self, type_key: TypeKey, message: impl Into<String>) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            type_key,
            message: message.into(),
        });
        self
    }

    /// Add a suggestion to this diagnostic
    pub fn with_suggestion(mut self, replacement: String, message: impl Into<String>) -> Self {
        self.suggestions.push(DiagnosticSuggestion {
            replacement,
            message: message.into(),
        });
        self
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.code == Some(code)
    }

    pub fn concerns(&self, key: &TypeKey) -> bool {
        self.types.contains(key)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level.as_str())?;
        if let Some(code) = &self.code {
            write!(f, "[{}]", code.as_str())?;
        }
        if let Some(first) = self.types.first() {
            write!(f, " {}", first)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Sink every component reports into
///
/// Handlers are shared across phases behind an `Arc`, so reporting takes `&self`.
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    /// Number of reported diagnostics at `level`
    fn count(&self, level: DiagnosticLevel) -> usize;

    fn get_diagnostics(&self) -> Vec<Diagnostic>;

    fn error(&self, types: Vec<TypeKey>, message: &str) {
        self.report(Diagnostic::error(types, message));
    }

    fn warning(&self, types: Vec<TypeKey>, message: &str) {
        self.report(Diagnostic::warning(types, message));
    }

    fn info(&self, types: Vec<TypeKey>, message: &str) {
        self.report(Diagnostic::info(types, message));
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }
}

#[derive(Debug, Default)]
struct DiagnosticLog {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    fn push(&self, diagnostic: Diagnostic) {
        self.entries.lock().unwrap().push(diagnostic);
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.level == level)
            .count()
    }

    fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().unwrap().clone()
    }
}

/// Render one diagnostic and its notes as console lines
///
/// `pretty` adds ANSI styling: bold severity, cyan notes, green suggestions.
pub fn render(diagnostic: &Diagnostic, pretty: bool) -> String {
    let paint = |text: &str, style: &str| {
        if pretty {
            format!("\x1b[{}m{}\x1b[0m", style, text)
        } else {
            text.to_string()
        }
    };

    let code = diagnostic
        .code
        .map(|c| format!("[{}] ", c))
        .unwrap_or_default();
    let types = diagnostic
        .types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = format!(
        "{} {}({}): {}",
        paint(diagnostic.level.as_str(), "1"),
        code,
        types,
        diagnostic.message
    );
    for related in &diagnostic.related_information {
        out.push_str(&format!(
            "\n  {} at {}: {}",
            paint("Note", "36"),
            related.type_key,
            related.message
        ));
    }
    for suggestion in &diagnostic.suggestions {
        out.push_str(&format!(
            "\n  {}: {}",
            paint("Suggestion", "32"),
            suggestion.message
        ));
    }
    out
}

/// Prints each diagnostic to stderr as it arrives and keeps it for counting
pub struct ConsoleDiagnosticHandler {
    log: DiagnosticLog,
    pretty: bool,
}

impl ConsoleDiagnosticHandler {
    pub fn new(pretty: bool) -> Self {
        Self {
            log: DiagnosticLog::default(),
            pretty,
        }
    }
}

impl DiagnosticHandler for ConsoleDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        eprintln!("{}", render(&diagnostic, self.pretty));
        self.log.push(diagnostic);
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.log.count(level)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.log.snapshot()
    }
}

/// Diagnostic codes
///
/// Codes are organized by component:
/// - E1000-E1999: Structural (constructor generation targets)
/// - W2000-W2999: Binding (configuration keys, member shapes)
/// - E3000-E3999 / W3000-W3999: Graph safety (lifetimes, cycles)
/// - W4000-W4999: Registration policy
/// - E5000-E5999: Configuration
pub mod error_codes {
    use super::DiagnosticCode;

    // ========================================
    // Structural (E1000-E1999)
    // ========================================

    /// Type lacks the extensibility marker required to receive generated members
    pub const INVALID_GENERATION_TARGET: DiagnosticCode =
        DiagnosticCode::new('E', 1001, "invalid-generation-target");

    /// A hand-written constructor has the same signature as the generated one
    pub const CONFLICTING_CONSTRUCTOR: DiagnosticCode =
        DiagnosticCode::new('E', 1002, "conflicting-constructor");

    /// Base type chain loops back on itself
    pub const INHERITANCE_CYCLE: DiagnosticCode =
        DiagnosticCode::new('E', 1003, "inheritance-cycle");

    // ========================================
    // Binding (W2000-W2999)
    // ========================================

    /// Explicit configuration key is empty
    pub const EMPTY_BINDING_KEY: DiagnosticCode =
        DiagnosticCode::new('W', 2001, "empty-binding-key");

    /// No section name can be inferred from the bound type
    pub const AMBIGUOUS_BINDING_KEY: DiagnosticCode =
        DiagnosticCode::new('W', 2002, "ambiguous-binding-key");

    /// Same configuration key bound twice
    pub const DUPLICATE_BINDING_KEY: DiagnosticCode =
        DiagnosticCode::new('W', 2003, "duplicate-binding-key");

    /// Member shape cannot be bound the way it is declared
    pub const UNSUPPORTED_MEMBER_SHAPE: DiagnosticCode =
        DiagnosticCode::new('W', 2004, "unsupported-member-shape");

    /// Static members never take part in injection
    pub const STATIC_MEMBER_IGNORED: DiagnosticCode =
        DiagnosticCode::new('W', 2005, "static-member-ignored");

    // ========================================
    // Graph safety (3000-3999)
    // ========================================

    pub const SINGLETON_DEPENDS_ON_SCOPED: DiagnosticCode =
        DiagnosticCode::new('E', 3001, "singleton-depends-on-scoped");

    pub const SINGLETON_DEPENDS_ON_TRANSIENT: DiagnosticCode =
        DiagnosticCode::new('W', 3002, "singleton-depends-on-transient");

    pub const DEPENDENCY_CYCLE: DiagnosticCode =
        DiagnosticCode::new('W', 3003, "dependency-cycle");

    // ========================================
    // Registration (W4000-W4999)
    // ========================================

    /// Skip-list entry does not name anything the type exposes
    pub const UNKNOWN_SKIP_ENTRY: DiagnosticCode =
        DiagnosticCode::new('W', 4001, "unknown-skip-entry");

    /// Open generic types cannot share an instance through a factory
    pub const SHARED_OPEN_GENERIC: DiagnosticCode =
        DiagnosticCode::new('W', 4002, "shared-open-generic");

    // ========================================
    // Configuration (E5000-E5999)
    // ========================================

    /// Invalid compiler options
    pub const INVALID_CONFIG: DiagnosticCode = DiagnosticCode::new('E', 5001, "invalid-config");

    pub const ALL: &[DiagnosticCode] = &[
        INVALID_GENERATION_TARGET,
        CONFLICTING_CONSTRUCTOR,
        INHERITANCE_CYCLE,
        EMPTY_BINDING_KEY,
        AMBIGUOUS_BINDING_KEY,
        DUPLICATE_BINDING_KEY,
        UNSUPPORTED_MEMBER_SHAPE,
        STATIC_MEMBER_IGNORED,
        SINGLETON_DEPENDS_ON_SCOPED,
        SINGLETON_DEPENDS_ON_TRANSIENT,
        DEPENDENCY_CYCLE,
        UNKNOWN_SKIP_ENTRY,
        SHARED_OPEN_GENERIC,
        INVALID_CONFIG,
    ];
}

/// Silent handler that only records; what tests and embedding hosts use
#[derive(Debug, Default)]
pub struct CollectingDiagnosticHandler {
    log: DiagnosticLog,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics carrying the given code
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<Diagnostic> {
        self.log
            .snapshot()
            .into_iter()
            .filter(|d| d.has_code(code))
            .collect()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.log.push(diagnostic);
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.log.count(level)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.log.snapshot()
    }
}
