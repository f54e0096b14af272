//! Framework types the generated code refers to

use super::{OptionsKind, TypeRef};

pub const SYSTEM_NAMESPACE: &str = "System";
pub const COLLECTIONS_NAMESPACE: &str = "System.Collections.Generic";
pub const LINQ_NAMESPACE: &str = "System.Linq";
pub const CONFIGURATION_NAMESPACE: &str = "Microsoft.Extensions.Configuration";
pub const OPTIONS_NAMESPACE: &str = "Microsoft.Extensions.Options";
pub const DEPENDENCY_INJECTION_NAMESPACE: &str = "Microsoft.Extensions.DependencyInjection";

/// `IEnumerable<T>`
pub fn enumerable(element: TypeRef) -> TypeRef {
    TypeRef::interface(COLLECTIONS_NAMESPACE, "IEnumerable").with_args(vec![element])
}

/// `Func<T>`
pub fn func(result: TypeRef) -> TypeRef {
    TypeRef::class(SYSTEM_NAMESPACE, "Func").with_args(vec![result])
}

/// `IConfiguration`
pub fn configuration() -> TypeRef {
    TypeRef::interface(CONFIGURATION_NAMESPACE, "IConfiguration")
}

pub fn options(kind: OptionsKind, wrapped: TypeRef) -> TypeRef {
    TypeRef::interface(OPTIONS_NAMESPACE, kind.interface_name()).with_args(vec![wrapped])
}

/// `IServiceCollection`
pub fn service_collection() -> TypeRef {
    TypeRef::interface(DEPENDENCY_INJECTION_NAMESPACE, "IServiceCollection")
}
