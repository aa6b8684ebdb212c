// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node kinds.
//!
//! One closed enum covers declarations, statements and expressions. Child
//! layout per kind is fixed and documented on each variant; the accessor
//! helpers on `SyntaxTree` rely on it.

use std::fmt;

/// A written type, e.g. `DbSet<Product>` or `System.Threading.Tasks.Task`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeSyntax {
    /// Dotted name as written (may be qualified).
    pub name: String,
    pub args: Vec<TypeSyntax>,
}

impl TypeSyntax {
    pub fn simple(name: impl Into<String>) -> Self {
        Self { name: name.into(), args: Vec::new() }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeSyntax>) -> Self {
        Self { name: name.into(), args }
    }

    /// Last segment of the dotted name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Leading segments of a qualified name, if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(q, _)| q)
    }
}

impl fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Char(char),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Coalesce,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Coalesce => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Neg,
    Not,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// The kind of a syntax node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    // === Declarations ===
    /// Children: directives, namespaces, classes.
    CompilationUnit,
    /// `using System.Linq;` (no children)
    UsingDirective { path: String },
    /// Children: directives, classes.
    Namespace { name: String },
    /// Children: members.
    Class {
        name: String,
        type_params: Vec<String>,
        bases: Vec<TypeSyntax>,
    },
    /// Children: `[initializer]`.
    Field { name: String, ty: TypeSyntax },
    /// Children: `[initializer or expression body]`.
    Property { name: String, ty: TypeSyntax },
    /// Children: `Parameter`s then the body (`Block` or expression), if any.
    Method {
        name: String,
        ret: TypeSyntax,
        type_params: Vec<String>,
        is_async: bool,
    },
    /// Children: `Parameter`s then the body.
    Constructor { name: String },
    /// Lambda parameters may omit their type. No children.
    Parameter { name: String, ty: Option<TypeSyntax> },

    // === Statements ===
    /// Children: statements.
    Block,
    /// `var x = e;`, `Foo x;`, `using var x = e;`. Children: `[initializer]`.
    LocalDecl {
        name: String,
        ty: Option<TypeSyntax>,
        is_using: bool,
    },
    /// `using (resource) body`. Children: `[resource, body]` where resource is
    /// a `LocalDecl` or an expression.
    UsingStmt,
    /// Children: `[expr]`.
    ExprStmt,
    /// Children: `[expr]` or none.
    Return,
    /// Children: `[expr]`.
    Throw,
    /// Children: `[cond, then, else?]`.
    If,
    /// Children: `[iterable, body]`.
    ForEach { var: String, ty: Option<TypeSyntax> },
    /// Children: `[init, cond, step, body]`; absent parts are `Empty`.
    For,
    /// Children: `[cond, body]`.
    While,
    /// Children: `[block, catch..., finally?]`.
    Try,
    /// Children: `[block]`.
    Catch { var: Option<String>, ty: Option<TypeSyntax> },
    /// Placeholder for an omitted optional part. No children.
    Empty,

    // === Expressions ===
    /// A simple name, optionally generic (`GetService<T>`). No children.
    Ident { name: String, type_args: Vec<TypeSyntax> },
    This,
    Base,
    Literal(Literal),
    /// `receiver.name` (or `receiver?.name`). Children: `[receiver]`.
    MemberAccess {
        name: String,
        type_args: Vec<TypeSyntax>,
        conditional: bool,
    },
    /// Children: `[callee, args...]`.
    Invocation,
    /// `new T(args)`. Children: args.
    ObjectCreation { ty: TypeSyntax },
    /// Children: `[operand]`.
    Await,
    /// `x => body` / `(a, b) => body`. Children: `Parameter`s then the body.
    Lambda { is_async: bool, parenthesized: bool },
    /// `delegate (params) { ... }`. Children: `Parameter`s then the `Block`.
    AnonymousMethod { is_async: bool },
    /// Children: `[target, value]`. `op` is set for compound assignment.
    Assign { op: Option<BinOp> },
    /// Children: `[left, right]`.
    Binary { op: BinOp },
    /// Children: `[operand]`.
    Unary { op: UnaryOp },
    /// `a[i]`. Children: `[object, index...]`.
    ElementAccess,
    /// `(e)`. Children: `[inner]`.
    Paren,
    /// `c ? a : b`. Children: `[cond, then, else]`.
    Conditional,

    /// Unparseable input; skipped by every pass.
    Error,
}

impl NodeKind {
    pub fn is_lambda_like(&self) -> bool {
        matches!(self, NodeKind::Lambda { .. } | NodeKind::AnonymousMethod { .. })
    }

    /// Nodes that introduce parameters: methods, constructors and lambdas.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            NodeKind::Method { .. }
                | NodeKind::Constructor { .. }
                | NodeKind::Lambda { .. }
                | NodeKind::AnonymousMethod { .. }
        )
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::LocalDecl { .. }
                | NodeKind::UsingStmt
                | NodeKind::ExprStmt
                | NodeKind::Return
                | NodeKind::Throw
                | NodeKind::If
                | NodeKind::ForEach { .. }
                | NodeKind::For
                | NodeKind::While
                | NodeKind::Try
        )
    }

    /// Short label used by tree dumps.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "CompilationUnit",
            NodeKind::UsingDirective { .. } => "UsingDirective",
            NodeKind::Namespace { .. } => "Namespace",
            NodeKind::Class { .. } => "Class",
            NodeKind::Field { .. } => "Field",
            NodeKind::Property { .. } => "Property",
            NodeKind::Method { .. } => "Method",
            NodeKind::Constructor { .. } => "Constructor",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::Block => "Block",
            NodeKind::LocalDecl { .. } => "LocalDecl",
            NodeKind::UsingStmt => "UsingStmt",
            NodeKind::ExprStmt => "ExprStmt",
            NodeKind::Return => "Return",
            NodeKind::Throw => "Throw",
            NodeKind::If => "If",
            NodeKind::ForEach { .. } => "ForEach",
            NodeKind::For => "For",
            NodeKind::While => "While",
            NodeKind::Try => "Try",
            NodeKind::Catch { .. } => "Catch",
            NodeKind::Empty => "Empty",
            NodeKind::Ident { .. } => "Ident",
            NodeKind::This => "This",
            NodeKind::Base => "Base",
            NodeKind::Literal(_) => "Literal",
            NodeKind::MemberAccess { .. } => "MemberAccess",
            NodeKind::Invocation => "Invocation",
            NodeKind::ObjectCreation { .. } => "ObjectCreation",
            NodeKind::Await => "Await",
            NodeKind::Lambda { .. } => "Lambda",
            NodeKind::AnonymousMethod { .. } => "AnonymousMethod",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::ElementAccess => "ElementAccess",
            NodeKind::Paren => "Paren",
            NodeKind::Conditional => "Conditional",
            NodeKind::Error => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_syntax_display_and_names() {
        let ty = TypeSyntax::generic(
            "Microsoft.EntityFrameworkCore.DbSet",
            vec![TypeSyntax::simple("Product")],
        );
        assert_eq!(ty.to_string(), "Microsoft.EntityFrameworkCore.DbSet<Product>");
        assert_eq!(ty.simple_name(), "DbSet");
        assert_eq!(ty.qualifier(), Some("Microsoft.EntityFrameworkCore"));
        assert_eq!(TypeSyntax::simple("Task").qualifier(), None);
    }
}
