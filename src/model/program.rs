use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{TypeDescriptor, TypeKey, TypeRef};
use crate::errors::{CompilationError, ModelError};

/// The immutable set of descriptors one compilation pass works on, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ProgramModel {
    types: IndexMap<TypeKey, TypeDescriptor>,
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    types: Vec<TypeDescriptor>,
}

impl ProgramModel {
    pub fn new(descriptors: Vec<TypeDescriptor>) -> Result<Self, ModelError> {
        let mut types = IndexMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if descriptor.name.trim().is_empty() {
                return Err(ModelError::EmptyTypeName {
                    namespace: descriptor.namespace,
                });
            }
            let key = descriptor.key();
            if types.contains_key(&key) {
                return Err(ModelError::DuplicateType(key));
            }
            types.insert(key, descriptor);
        }
        Ok(Self { types })
    }

    /// Load a model handed over as YAML (`types: [...]`)
    pub fn from_yaml_str(content: &str) -> Result<Self, CompilationError> {
        let file: ModelFile = serde_yaml::from_str(content)
            .map_err(|e| CompilationError::ModelFormat(e.to_string()))?;
        Ok(Self::new(file.types)?)
    }

    pub fn to_yaml(&self) -> Result<String, CompilationError> {
        let file = ModelFile {
            types: self.types.values().cloned().collect(),
        };
        serde_yaml::to_string(&file).map_err(|e| CompilationError::ModelFormat(e.to_string()))
    }

    pub fn get(&self, key: &TypeKey) -> Option<&TypeDescriptor> {
        self.types.get(key)
    }

    /// Descriptor declared for the type a reference names, if it is part of this model
    pub fn resolve_ref(&self, type_ref: &TypeRef) -> Option<&TypeDescriptor> {
        type_ref
            .definition_key()
            .and_then(|key| self.types.get(&key))
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.types.keys()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
