// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Framework types every model knows about.
//!
//! Only the surface the analyzer touches: task and parallel APIs, the EF Core
//! context/set/factory types, dependency-injection scopes, LINQ, and the
//! primitives needed to type their signatures. LINQ and DI extension methods
//! are modelled as members of the type they extend.

use ctxlint_ast::{Span, TypeSyntax};

use crate::symbol::{SymbolKind, SymbolTable};
use crate::types::{MemberInfo, MemberKind, TypeExpr, TypeInfo, TypeTable};

pub const EF_CORE: &str = "Microsoft.EntityFrameworkCore";
pub const TASKS: &str = "System.Threading.Tasks";

struct TypeDef {
    namespace: &'static str,
    name: &'static str,
    params: &'static [&'static str],
    base: Option<&'static str>,
    members: &'static [MemberDef],
}

struct MemberDef {
    name: &'static str,
    kind: MemberKind,
    ty: &'static str,
    type_params: &'static [&'static str],
}

const fn method(name: &'static str, ret: &'static str) -> MemberDef {
    MemberDef { name, kind: MemberKind::Method, ty: ret, type_params: &[] }
}

const fn generic(name: &'static str, type_params: &'static [&'static str], ret: &'static str) -> MemberDef {
    MemberDef { name, kind: MemberKind::Method, ty: ret, type_params }
}

const fn property(name: &'static str, ty: &'static str) -> MemberDef {
    MemberDef { name, kind: MemberKind::Property, ty, type_params: &[] }
}

const fn ty(
    namespace: &'static str,
    name: &'static str,
    params: &'static [&'static str],
    base: Option<&'static str>,
    members: &'static [MemberDef],
) -> TypeDef {
    TypeDef { namespace, name, params, base, members }
}

const SYSTEM: &str = "System";
const COLLECTIONS: &str = "System.Collections.Generic";
const LINQ: &str = "System.Linq";
const THREADING: &str = "System.Threading";
const DI: &str = "Microsoft.Extensions.DependencyInjection";

const LINQ_OPERATORS: &[MemberDef] = &[
    method("Where", "IEnumerable<T>"),
    method("OrderBy", "IEnumerable<T>"),
    method("OrderByDescending", "IEnumerable<T>"),
    method("Take", "IEnumerable<T>"),
    method("Skip", "IEnumerable<T>"),
    method("Distinct", "IEnumerable<T>"),
    method("AsEnumerable", "IEnumerable<T>"),
    generic("Select", &["TResult"], "IEnumerable<TResult>"),
    method("ToList", "List<T>"),
    method("ToArray", "IEnumerable<T>"),
    method("First", "T"),
    method("FirstOrDefault", "T"),
    method("Single", "T"),
    method("SingleOrDefault", "T"),
    method("Last", "T"),
    method("Count", "int"),
    method("Any", "bool"),
    method("All", "bool"),
    method("AsParallel", "ParallelQuery<T>"),
];

const PRELUDE: &[TypeDef] = &[
    // Primitives, by keyword.
    ty(SYSTEM, "object", &[], None, &[method("ToString", "string"), method("GetHashCode", "int")]),
    ty(SYSTEM, "string", &[], Some("object"), &[property("Length", "int")]),
    ty(SYSTEM, "int", &[], Some("object"), &[]),
    ty(SYSTEM, "long", &[], Some("object"), &[]),
    ty(SYSTEM, "bool", &[], Some("object"), &[]),
    ty(SYSTEM, "double", &[], Some("object"), &[]),
    ty(SYSTEM, "decimal", &[], Some("object"), &[]),
    ty(SYSTEM, "char", &[], Some("object"), &[]),
    ty(SYSTEM, "void", &[], None, &[]),
    ty(SYSTEM, "Exception", &[], Some("object"), &[property("Message", "string")]),
    ty(SYSTEM, "IDisposable", &[], None, &[method("Dispose", "void")]),
    ty(SYSTEM, "Console", &[], Some("object"), &[method("WriteLine", "void"), method("ReadLine", "string")]),
    ty(SYSTEM, "Guid", &[], Some("object"), &[method("NewGuid", "Guid")]),
    ty(SYSTEM, "DateTime", &[], Some("object"), &[property("Now", "DateTime"), property("UtcNow", "DateTime")]),
    ty(SYSTEM, "TimeSpan", &[], Some("object"), &[method("FromSeconds", "TimeSpan")]),
    ty(
        SYSTEM,
        "IServiceProvider",
        &[],
        None,
        &[
            generic("GetService", &["TService"], "TService"),
            generic("GetRequiredService", &["TService"], "TService"),
            method("CreateScope", "IServiceScope"),
            method("CreateAsyncScope", "IServiceScope"),
        ],
    ),
    // Collections and LINQ.
    ty(COLLECTIONS, "IEnumerable", &["T"], None, LINQ_OPERATORS),
    ty(
        COLLECTIONS,
        "List",
        &["T"],
        Some("IEnumerable<T>"),
        &[method("Add", "void"), method("AddRange", "void"), method("Remove", "bool"), method("Clear", "void"), property("Count", "int")],
    ),
    ty(
        COLLECTIONS,
        "Dictionary",
        &["TKey", "TValue"],
        Some("object"),
        &[method("Add", "void"), method("ContainsKey", "bool"), method("TryGetValue", "bool"), property("Count", "int")],
    ),
    ty(
        LINQ,
        "IQueryable",
        &["T"],
        Some("IEnumerable<T>"),
        &[
            method("Include", "IQueryable<T>"),
            method("AsNoTracking", "IQueryable<T>"),
            method("ToListAsync", "Task<List<T>>"),
            method("CountAsync", "Task<int>"),
            method("AnyAsync", "Task<bool>"),
            method("FirstOrDefaultAsync", "Task<T>"),
            method("SingleAsync", "Task<T>"),
        ],
    ),
    ty(
        LINQ,
        "ParallelQuery",
        &["T"],
        Some("IEnumerable<T>"),
        &[method("WithDegreeOfParallelism", "ParallelQuery<T>"), method("ForAll", "void")],
    ),
    ty(LINQ, "Enumerable", &[], Some("object"), &[method("Range", "IEnumerable<int>"), generic("Empty", &["TResult"], "IEnumerable<TResult>")]),
    // Threading.
    ty(
        THREADING,
        "CancellationToken",
        &[],
        Some("object"),
        &[property("IsCancellationRequested", "bool"), method("ThrowIfCancellationRequested", "void"), property("None", "CancellationToken")],
    ),
    ty(THREADING, "CancellationTokenSource", &[], Some("object"), &[property("Token", "CancellationToken"), method("Cancel", "void")]),
    ty(THREADING, "Thread", &[], Some("object"), &[method("Start", "void"), method("Join", "void"), method("Sleep", "void")]),
    ty(THREADING, "ThreadPool", &[], Some("object"), &[method("QueueUserWorkItem", "bool")]),
    ty(THREADING, "SemaphoreSlim", &[], Some("object"), &[method("WaitAsync", "Task"), method("Release", "int")]),
    ty(
        TASKS,
        "Task",
        &[],
        Some("object"),
        &[
            method("Run", "Task"),
            method("Delay", "Task"),
            method("WhenAll", "Task"),
            method("WhenAny", "Task"),
            method("WaitAll", "void"),
            method("WaitAny", "int"),
            generic("FromResult", &["TResult"], "Task<TResult>"),
            property("Factory", "TaskFactory"),
            property("CompletedTask", "Task"),
            method("Wait", "void"),
            method("ContinueWith", "Task"),
            method("ConfigureAwait", "Task"),
        ],
    ),
    ty(TASKS, "Task", &["TResult"], Some("Task"), &[property("Result", "TResult"), method("ConfigureAwait", "Task<TResult>")]),
    ty(TASKS, "ValueTask", &[], Some("object"), &[]),
    ty(TASKS, "ValueTask", &["TResult"], Some("object"), &[property("Result", "TResult")]),
    ty(TASKS, "TaskFactory", &[], Some("object"), &[method("StartNew", "Task")]),
    ty(
        TASKS,
        "Parallel",
        &[],
        Some("object"),
        &[
            method("For", "ParallelLoopResult"),
            method("ForEach", "ParallelLoopResult"),
            method("ForEachAsync", "Task"),
            method("Invoke", "void"),
        ],
    ),
    ty(TASKS, "ParallelLoopResult", &[], Some("object"), &[property("IsCompleted", "bool")]),
    ty(TASKS, "ParallelOptions", &[], Some("object"), &[property("MaxDegreeOfParallelism", "int")]),
    // Entity Framework Core.
    ty(
        EF_CORE,
        "DbContext",
        &[],
        Some("object"),
        &[
            method("SaveChanges", "int"),
            method("SaveChangesAsync", "Task<int>"),
            generic("Set", &["TEntity"], "DbSet<TEntity>"),
            method("Add", "void"),
            method("AddRange", "void"),
            method("Remove", "void"),
            method("Update", "void"),
            method("Attach", "void"),
            method("Find", "object"),
            method("Dispose", "void"),
            method("DisposeAsync", "ValueTask"),
            property("Database", "DatabaseFacade"),
        ],
    ),
    ty(
        EF_CORE,
        "DbSet",
        &["TEntity"],
        Some("IQueryable<TEntity>"),
        &[
            method("Add", "void"),
            method("AddAsync", "ValueTask"),
            method("AddRange", "void"),
            method("Remove", "void"),
            method("Update", "void"),
            method("Find", "TEntity"),
            method("FindAsync", "ValueTask<TEntity>"),
        ],
    ),
    ty(
        EF_CORE,
        "IDbContextFactory",
        &["TContext"],
        None,
        &[method("CreateDbContext", "TContext"), method("CreateDbContextAsync", "Task<TContext>")],
    ),
    ty(EF_CORE, "DbContextOptions", &[], Some("object"), &[]),
    ty(EF_CORE, "DbContextOptions", &["TContext"], Some("DbContextOptions"), &[]),
    ty(EF_CORE, "DatabaseFacade", &[], Some("object"), &[method("EnsureCreated", "bool"), method("Migrate", "void")]),
    // Dependency injection.
    ty(DI, "IServiceScope", &[], Some("IDisposable"), &[property("ServiceProvider", "IServiceProvider")]),
    ty(DI, "IServiceScopeFactory", &[], None, &[method("CreateScope", "IServiceScope")]),
];

/// Register every framework type and member.
pub fn install(types: &mut TypeTable, symbols: &mut SymbolTable) {
    // Declare first so signatures can refer to any type.
    let ids: Vec<_> = PRELUDE
        .iter()
        .map(|def| {
            let id = types.insert(TypeInfo {
                name: def.name.to_string(),
                namespace: def.namespace.to_string(),
                type_params: def.params.iter().map(|p| p.to_string()).collect(),
                base: None,
                members: Vec::new(),
                decl: None,
            });
            symbols.insert(def.name, SymbolKind::Type(id), None, None, None, Span::default());
            id
        })
        .collect();

    for (def, &id) in PRELUDE.iter().zip(&ids) {
        let base = def
            .base
            .map(|spec| type_expr(types, &parse_spec(spec), def.params, &[]));
        let members = def
            .members
            .iter()
            .map(|m| {
                let ty = type_expr(types, &parse_spec(m.ty), def.params, m.type_params);
                let kind = match m.kind {
                    MemberKind::Method => SymbolKind::Method { type_params: m.type_params.len() },
                    MemberKind::Property => SymbolKind::Property,
                    MemberKind::Field => SymbolKind::Field,
                };
                let symbol = symbols.insert(m.name, kind, ty.closed(), Some(id), None, Span::default());
                MemberInfo {
                    name: m.name.to_string(),
                    kind: m.kind,
                    ty,
                    type_params: m.type_params.len(),
                    symbol,
                }
            })
            .collect();
        if let Some(info) = types.get_mut(id) {
            info.base = base;
            info.members = members;
        }
    }
}

/// Lower written type syntax against the table. Names matching a method
/// type parameter shadow the declaring type's parameters.
pub(crate) fn type_expr<S: AsRef<str>>(
    types: &TypeTable,
    syntax: &TypeSyntax,
    type_params: &[S],
    method_params: &[S],
) -> TypeExpr {
    if syntax.args.is_empty() {
        if let Some(i) = method_params.iter().position(|p| p.as_ref() == syntax.name) {
            return TypeExpr::MethodParam(i);
        }
        if let Some(i) = type_params.iter().position(|p| p.as_ref() == syntax.name) {
            return TypeExpr::Param(i);
        }
    }
    match types.lookup(&syntax.name, syntax.args.len()) {
        Some(id) => TypeExpr::Named(
            id,
            syntax
                .args
                .iter()
                .map(|a| type_expr(types, a, type_params, method_params))
                .collect(),
        ),
        None => TypeExpr::Unknown,
    }
}

/// Parse `Name<Arg, Arg>` signature text.
fn parse_spec(spec: &str) -> TypeSyntax {
    fn parse(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> TypeSyntax {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '.' || c == '_' {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        let mut args = Vec::new();
        if chars.peek() == Some(&'<') {
            chars.next();
            loop {
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
                args.push(parse(chars));
                match chars.next() {
                    Some(',') => continue,
                    _ => break,
                }
            }
        }
        TypeSyntax::generic(name, args)
    }
    parse(&mut spec.chars().peekable())
}
