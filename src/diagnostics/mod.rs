use thiserror::Error;

/// Errors rejected while building the class table from loader declarations.
/// All of these are non-recoverable: the table is not usable afterwards.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cyclic hierarchy: {chain}")]
    CyclicHierarchy { chain: String },

    #[error("class '{name}' is already declared")]
    DuplicateClass { name: String },

    #[error("unknown parent class '{parent}' for class '{class}'")]
    UnknownParent { class: String, parent: String },

    #[error("unknown class '{referenced}' in declared type within class '{class}'")]
    UnknownTypeRef { class: String, referenced: String },

    #[error("duplicate field '{field}' in class '{class}'")]
    DuplicateField { class: String, field: String },

    #[error("duplicate method '{method}' in class '{class}'")]
    DuplicateMethod { class: String, method: String },

    #[error("duplicate parameter '{param}' in '{class}.{method}'")]
    DuplicateParam {
        class: String,
        method: String,
        param: String,
    },

    #[error(
        "method '{method}' in class '{class}' redeclares a {ancestor_kind} method of class '{ancestor}' as {kind}"
    )]
    MethodKindMismatch {
        class: String,
        method: String,
        kind: &'static str,
        ancestor: String,
        ancestor_kind: &'static str,
    },

    #[error("constructor of class '{class}' passes super arguments but the class has no parent")]
    SuperArgsWithoutParent { class: String },

    #[error(
        "static block position {position} in class '{class}' is past the end of the field list ({fields} fields)"
    )]
    StaticBlockOutOfRange {
        class: String,
        position: usize,
        fields: usize,
    },
}

/// Faults raised during execution. A fault aborts the current call and every
/// enclosing call; the engine offers no recovery construct. The `At` variant
/// wraps the innermost method context around a fault so uncaught faults can
/// name the class and method they escaped from.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("class '{class}' failed to initialize")]
    InitializationFailed { class: String },

    #[error("call depth exceeded {limit} frames")]
    StackOverflow { limit: usize },

    #[error("negative array length {len}")]
    NegativeArraySize { len: i32 },

    #[error("array index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i32, len: usize },

    #[error("unknown class '{name}'")]
    UnknownClass { name: String },

    #[error("unknown method '{method}' on class '{class}'")]
    UnknownMethod { class: String, method: String },

    #[error("unknown field '{field}' on class '{class}'")]
    UnknownField { class: String, field: String },

    #[error("method '{class}.{method}' is not static")]
    NotStatic { class: String, method: String },

    #[error("method '{class}.{method}' is static and cannot be dispatched on a receiver")]
    NotVirtual { class: String, method: String },

    #[error("null receiver for method '{method}'")]
    NullReceiver { method: String },

    #[error("null reference accessing field '{field}'")]
    NullFieldAccess { field: String },

    #[error("null array reference")]
    NullArray,

    #[error("undefined local '{name}'")]
    UndefinedLocal { name: String },

    #[error("'{method}' on class '{class}' expects {expected} arguments, found {found}")]
    ArityMismatch {
        class: String,
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("{kind} outside of a loop")]
    JumpOutsideLoop { kind: String },

    #[error("{source} (at {class}.{method})")]
    At {
        class: String,
        method: String,
        #[source]
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Attach the innermost method context. A fault that already carries a
    /// context keeps it: the first frame a fault escapes from wins.
    pub fn at(self, class: &str, method: &str) -> Self {
        match self {
            Self::At { .. } => self,
            other => Self::At {
                class: class.to_string(),
                method: method.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying fault, with any `At` context stripped.
    pub fn root(&self) -> &RuntimeError {
        match self {
            Self::At { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Either phase of running a whole program: building the table or executing.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("program has no entry point")]
    MissingEntry,
}
