//! Declarations handed to the engine by an external loader.
//!
//! The loader (out of scope here) is responsible for turning whatever its
//! input format is into these structures: class declarations with resolved
//! method bodies. Every field, call and receiver site already carries the
//! declared type the loader resolved for it; the engine never re-infers
//! static types, it only binds against them. The whole model derives serde
//! so programs can be read from JSON files.

use serde::{Deserialize, Serialize};

use crate::arith::Width;

/// A whole program: the class set plus an optional entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDecl {
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub entry: Option<EntryPoint>,
}

/// The static method executed by `charon run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPoint {
    pub class: String,
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Static initializer blocks, positioned among the field declarations:
    /// a block at position `p` runs before the initializer of field `p`.
    #[serde(default)]
    pub static_blocks: Vec<StaticBlock>,
    #[serde(default)]
    pub ctor: Option<ConstructorDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub kind: FieldKind,
    /// Initializer expression. Static fields run it in the class's
    /// initialization sequence; instance fields run it during the owning
    /// class's constructor step, before the constructor body.
    #[serde(default)]
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Static,
    #[default]
    Instance,
}

/// Declared type of a field, parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Byte,
    Short,
    Char,
    Int,
    Bool,
    IntArray,
    Class(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticBlock {
    #[serde(default)]
    pub position: usize,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorDecl {
    #[serde(default)]
    pub params: Vec<Param>,
    /// Arguments for the direct parent's constructor, evaluated in this
    /// constructor's frame before anything else runs. `None` means the
    /// default zero-argument chain.
    #[serde(default)]
    pub super_args: Option<Vec<Expr>>,
    #[serde(default)]
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub ret: Option<TypeExpr>,
    #[serde(default)]
    pub body: Block,
}

/// Fixed at declaration time; decides the binding rule for every call that
/// resolves to this method (declared-type for static, runtime-type for
/// virtual).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Static,
    Virtual,
}

impl MethodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Virtual => "virtual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Declare a local. Re-declaring a name in the same scope overwrites it.
    Local {
        name: String,
        #[serde(default)]
        ty: Option<TypeExpr>,
        value: Expr,
    },
    Assign {
        name: String,
        value: Expr,
    },
    /// `object.field = value`: the slot is bound through `declared`, the
    /// declared type of the receiver expression, never the runtime type.
    SetField {
        object: Expr,
        declared: String,
        field: String,
        value: Expr,
    },
    /// `Class.field = value`: bound through the named class, walking up to
    /// the nearest declaring ancestor.
    SetStatic {
        class: String,
        field: String,
        value: Expr,
    },
    SetIndex {
        array: Expr,
        index: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Block,
        #[serde(default, rename = "else")]
        els: Option<Block>,
    },
    While {
        #[serde(default)]
        label: Option<String>,
        cond: Expr,
        body: Block,
    },
    DoWhile {
        #[serde(default)]
        label: Option<String>,
        body: Block,
        cond: Expr,
    },
    /// C-style loop. `continue` targeting this loop resumes at `update`.
    For {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        init: Vec<Stmt>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        update: Vec<Stmt>,
        body: Block,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Return(Option<Expr>),
    /// Write a value to the engine's output sink.
    Emit(Expr),
    Expr(Expr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Int(i32),
    Bool(bool),
    Null,
    Local(String),
    This,
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Conditional expression; only the selected branch is evaluated.
    Cond {
        cond: Box<Expr>,
        then: Box<Expr>,
        #[serde(rename = "else")]
        els: Box<Expr>,
    },
    Convert {
        to: Width,
        value: Box<Expr>,
    },
    /// `object.field`: slot bound through the declared type of the
    /// receiver expression.
    GetField {
        object: Box<Expr>,
        declared: String,
        field: String,
    },
    GetStatic {
        class: String,
        field: String,
    },
    /// Call bound by the declared class only (hiding rule).
    CallStatic {
        class: String,
        method: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Call bound by the receiver's runtime class (overriding rule).
    /// `declared` is the receiver expression's declared type, carried for
    /// diagnostics and loader-side validation; it never affects binding.
    CallVirtual {
        object: Box<Expr>,
        declared: String,
        method: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    New {
        class: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    NewArray {
        len: Box<Expr>,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Length {
        array: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}
