// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resource type matching over base-type chains.

use ctxlint_semantic::{base_type_chain, SemanticModel, TypeId, TypeRef};

use crate::config::TypeDescriptor;

/// True if `ty` or any of its bases is exactly `desc`.
pub fn type_matches(model: &dyn SemanticModel, ty: TypeId, desc: &TypeDescriptor) -> bool {
    base_type_chain(model, ty).any(|(_, info)| info.name == desc.name && info.namespace == desc.namespace)
}

/// `type_matches` for a possibly unknown type.
pub fn is_resource_type(model: &dyn SemanticModel, ty: Option<&TypeRef>, desc: &TypeDescriptor) -> bool {
    ty.is_some_and(|ty| type_matches(model, ty.id, desc))
}
