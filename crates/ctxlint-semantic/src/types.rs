// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Named types, their members, and generic instantiation.

use std::collections::HashMap;
use std::fmt;

use ctxlint_ast::NodeId;

use crate::symbol::SymbolId;

/// Index into the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// A closed type: a named type applied to its arguments (`DbSet<Product>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub id: TypeId,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn simple(id: TypeId) -> Self {
        Self { id, args: Vec::new() }
    }
}

/// A type in a member signature, possibly mentioning type parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(TypeId, Vec<TypeExpr>),
    /// The declaring type's n-th type parameter.
    Param(usize),
    /// The method's n-th type parameter.
    MethodParam(usize),
    Unknown,
}

impl TypeExpr {
    /// Substitute type parameters. `None` if any part stays open.
    pub fn instantiate(&self, type_args: &[TypeRef], method_args: &[TypeRef]) -> Option<TypeRef> {
        match self {
            TypeExpr::Named(id, args) => {
                let args = args
                    .iter()
                    .map(|a| a.instantiate(type_args, method_args))
                    .collect::<Option<Vec<_>>>()?;
                Some(TypeRef { id: *id, args })
            }
            TypeExpr::Param(i) => type_args.get(*i).cloned(),
            TypeExpr::MethodParam(i) => method_args.get(*i).cloned(),
            TypeExpr::Unknown => None,
        }
    }

    /// The closed type, if this expression has no parameters.
    pub fn closed(&self) -> Option<TypeRef> {
        self.instantiate(&[], &[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
    Method,
}

#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    /// Field or property type, or method return type.
    pub ty: TypeExpr,
    pub type_params: usize,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: String,
    /// Declaring namespace; empty for the global namespace.
    pub namespace: String,
    pub type_params: Vec<String>,
    pub base: Option<TypeExpr>,
    pub members: Vec<MemberInfo>,
    /// Declaring class node; `None` for framework types.
    pub decl: Option<NodeId>,
}

impl TypeInfo {
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn base_id(&self) -> Option<TypeId> {
        match self.base {
            Some(TypeExpr::Named(id, _)) => Some(id),
            _ => None,
        }
    }

    pub fn is_source(&self) -> bool {
        self.decl.is_some()
    }
}

/// All named types visible to one model.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<TypeInfo>,
    by_name: HashMap<(String, usize), Vec<TypeId>>,
}

/// Member lookups along a base chain give up past this depth.
const MAX_CHAIN_DEPTH: usize = 64;

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: TypeInfo) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.by_name
            .entry((info.name.clone(), info.type_params.len()))
            .or_default()
            .push(id);
        self.types.push(info);
        id
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.types.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut TypeInfo> {
        self.types.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeInfo)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }

    /// Find a type by possibly-qualified name and arity. Source types win
    /// over framework types of the same name.
    pub fn lookup(&self, name: &str, arity: usize) -> Option<TypeId> {
        let (qualifier, simple) = match name.rsplit_once('.') {
            Some((q, s)) => (Some(q), s),
            None => (None, name),
        };
        let candidates = self.by_name.get(&(simple.to_string(), arity))?;
        let matches_qualifier = |id: &&TypeId| match (qualifier, self.get(**id)) {
            (None, Some(_)) => true,
            (Some(q), Some(info)) => info.namespace == q || info.namespace.ends_with(&format!(".{q}")),
            (_, None) => false,
        };
        let mut matching = candidates.iter().filter(matches_qualifier);
        let first = matching.next().copied()?;
        let source = std::iter::once(first)
            .chain(matching.copied())
            .find(|id| self.get(*id).is_some_and(TypeInfo::is_source));
        Some(source.unwrap_or(first))
    }

    /// Find a member on `ty` or its bases. Returns the member together with
    /// the instantiation of the type that declares it.
    pub fn lookup_member(&self, ty: &TypeRef, name: &str) -> Option<(&MemberInfo, TypeRef)> {
        let mut current = ty.clone();
        for _ in 0..MAX_CHAIN_DEPTH {
            let info = self.get(current.id)?;
            if let Some(member) = info.member(name) {
                return Some((member, current));
            }
            current = info.base.as_ref()?.instantiate(&current.args, &[])?;
        }
        None
    }

    /// Walk `ty` and its bases looking for an instantiation of `target`.
    pub fn find_ancestor(&self, ty: &TypeRef, target: TypeId) -> Option<TypeRef> {
        let mut current = ty.clone();
        for _ in 0..MAX_CHAIN_DEPTH {
            if current.id == target {
                return Some(current);
            }
            let info = self.get(current.id)?;
            current = info.base.as_ref()?.instantiate(&current.args, &[])?;
        }
        None
    }

    /// Render a closed type as C# would write it.
    pub fn display(&self, ty: &TypeRef) -> String {
        DisplayType { table: self, ty }.to_string()
    }
}

struct DisplayType<'a> {
    table: &'a TypeTable,
    ty: &'a TypeRef,
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table.get(self.ty.id) {
            Some(info) => write!(f, "{}", info.name)?,
            None => write!(f, "?")?,
        }
        if !self.ty.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.ty.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", DisplayType { table: self.table, ty: arg })?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(ns: &str, name: &str, params: &[&str], base: Option<TypeExpr>) -> TypeInfo {
        TypeInfo {
            name: name.to_string(),
            namespace: ns.to_string(),
            type_params: params.iter().map(|p| p.to_string()).collect(),
            base,
            members: Vec::new(),
            decl: None,
        }
    }

    #[test]
    fn lookup_respects_arity_and_qualifier() {
        let mut table = TypeTable::new();
        let task = table.insert(info("System.Threading.Tasks", "Task", &[], None));
        let task_t = table.insert(info("System.Threading.Tasks", "Task", &["T"], None));
        assert_eq!(table.lookup("Task", 0), Some(task));
        assert_eq!(table.lookup("Task", 1), Some(task_t));
        assert_eq!(table.lookup("Tasks.Task", 0), Some(task));
        assert_eq!(table.lookup("System.Threading.Tasks.Task", 0), Some(task));
        assert_eq!(table.lookup("Other.Task", 0), None);
    }

    #[test]
    fn source_type_shadows_framework_type() {
        let mut table = TypeTable::new();
        table.insert(info("Microsoft.EntityFrameworkCore", "DbContext", &[], None));
        let mut local = info("MyApp", "DbContext", &[], None);
        local.decl = Some(NodeId(3));
        let local = table.insert(local);
        assert_eq!(table.lookup("DbContext", 0), Some(local));
    }

    #[test]
    fn instantiation_through_base() {
        let mut table = TypeTable::new();
        let int = table.insert(info("System", "int", &[], None));
        let seq = table.insert(info("System.Collections.Generic", "IEnumerable", &["T"], None));
        let set = table.insert(info(
            "Microsoft.EntityFrameworkCore",
            "DbSet",
            &["T"],
            Some(TypeExpr::Named(seq, vec![TypeExpr::Param(0)])),
        ));
        let set_of_int = TypeRef {
            id: set,
            args: vec![TypeRef::simple(int)],
        };
        let found = table.find_ancestor(&set_of_int, seq).unwrap();
        assert_eq!(found.args, vec![TypeRef::simple(int)]);
        assert_eq!(table.display(&set_of_int), "DbSet<int>");
    }

    #[test]
    fn member_lookup_stops_on_cycles() {
        let mut table = TypeTable::new();
        let a = table.insert(info("", "A", &[], None));
        let b = table.insert(info("", "B", &[], Some(TypeExpr::Named(a, vec![]))));
        table.get_mut(a).unwrap().base = Some(TypeExpr::Named(b, vec![]));
        assert!(table.lookup_member(&TypeRef::simple(a), "Missing").is_none());
        assert!(table.find_ancestor(&TypeRef::simple(a), TypeId(99)).is_none());
    }
}
