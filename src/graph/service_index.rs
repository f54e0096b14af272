use rustc_hash::FxHashMap;

use crate::model::{
    well_known, Lifetime, OptionsKind, ProgramModel, TypeDescriptor, TypeKey, TypeRef,
};
use crate::skip_policy::SkipAssignablePolicy;
use crate::utils::type_formatter::format_qualified;

/// Which registered types provide each service, and with which lifetime
///
/// Closed services are keyed by their exact qualified text, so `IHandler<Order>` never finds an
/// implementor of `IHandler<User>`. Open registrations (`Repository<T>`, `IRepository<T>`) are
/// keyed by definition and answer every closed instantiation.
#[derive(Debug, Default)]
pub struct ServiceIndex {
    closed: FxHashMap<String, Vec<TypeKey>>,
    open: FxHashMap<TypeKey, Vec<TypeKey>>,
    lifetimes: FxHashMap<TypeKey, Lifetime>,
}

/// Whether the emitter registers `descriptor` at all
pub fn is_registrable(
    model: &ProgramModel,
    policy: &SkipAssignablePolicy,
    descriptor: &TypeDescriptor,
) -> bool {
    descriptor.lifetime.is_declared()
        && !descriptor.is_abstract
        && !policy.suppresses(model, descriptor)
}

impl ServiceIndex {
    pub fn build(model: &ProgramModel, policy: &SkipAssignablePolicy) -> Self {
        let mut index = Self::default();

        for kind in [OptionsKind::Static, OptionsKind::Snapshot, OptionsKind::Monitor] {
            if let Some(key) =
                well_known::options(kind, TypeRef::generic_parameter("T")).definition_key()
            {
                index.lifetimes.insert(key, kind.container_lifetime());
            }
        }

        for descriptor in model.iter() {
            if !is_registrable(model, policy, descriptor) {
                continue;
            }
            let key = descriptor.key();
            index.lifetimes.insert(key.clone(), descriptor.lifetime);
            let open_type = descriptor.is_open_generic();
            if !descriptor.skips_self() {
                index.add_provider(&descriptor.self_ref(), open_type, &key);
            }
            for interface in descriptor.registered_interfaces() {
                // the emitter drops closed interfaces of open generic types
                if open_type && !interface.is_open() {
                    continue;
                }
                index.add_provider(interface, open_type, &key);
            }
        }
        index
    }

    fn add_provider(&mut self, service: &TypeRef, open_type: bool, provider: &TypeKey) {
        let providers = if open_type || service.is_open() {
            match service.definition_key() {
                Some(definition) => self.open.entry(definition).or_default(),
                None => return,
            }
        } else {
            self.closed.entry(format_qualified(service)).or_default()
        };
        if !providers.contains(provider) {
            providers.push(provider.clone());
        }
    }

    pub fn is_registered(&self, key: &TypeKey) -> bool {
        self.lifetimes.contains_key(key)
    }

    /// Registered lifetime, `Lifetime::None` for anything the container does not know
    pub fn lifetime_of(&self, key: &TypeKey) -> Lifetime {
        self.lifetimes.get(key).copied().unwrap_or(Lifetime::None)
    }

    /// Graph nodes that satisfy a request for `service`
    ///
    /// `T?` is looked up as `T`. Options wrappers map to their framework node; unregistered
    /// model types map to themselves; unknown external services map to nothing.
    pub fn providers_of(&self, model: &ProgramModel, service: &TypeRef) -> Vec<TypeKey> {
        let service = service.strip_nullable();
        let Some(key) = service.definition_key() else {
            return Vec::new();
        };
        if service.options_kind().is_some() {
            return vec![key];
        }

        let mut providers = Vec::new();
        if !service.is_open() {
            if let Some(exact) = self.closed.get(&format_qualified(service)) {
                providers.extend(exact.iter().cloned());
            }
        }
        if let Some(generic) = self.open.get(&key) {
            for provider in generic {
                if !providers.contains(provider) {
                    providers.push(provider.clone());
                }
            }
        }

        if providers.is_empty() && model.contains(&key) {
            providers.push(key);
        }
        providers
    }
}
