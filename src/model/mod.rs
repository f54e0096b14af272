//! Type descriptor model
//!
//! The normalized metadata produced by the front-end for every type that takes part in a
//! compilation pass. Everything here is immutable once a [`ProgramModel`] is built; the
//! phases only derive data from it.

pub mod descriptor;
pub mod program;
pub mod type_ref;
pub mod well_known;

pub use descriptor::{
    ConfigKey, ConfigurationBinding, InjectableMember, InstanceSharing, Lifetime, MemberShape,
    RegistrationMode, RegistrationPolicy, TypeDescriptor,
};
pub use program::ProgramModel;
pub use type_ref::{NamedKind, OptionsKind, Primitive, TypeKey, TypeRef};
