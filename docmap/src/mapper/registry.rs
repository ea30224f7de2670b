use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use crate::mapper::{Entity, EntityMapping};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::{Arc, LazyLock};

static REGISTRY: LazyLock<MappingRegistry> = LazyLock::new(MappingRegistry::new);

/// Process-wide cache of field-mapping tables, keyed by entity type.
///
/// A table is built at most once per type, under the shard lock of its key;
/// afterwards readers only clone the shared `Arc`.
pub(crate) struct MappingRegistry {
    tables: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl MappingRegistry {
    fn new() -> Self {
        MappingRegistry {
            tables: DashMap::new(),
        }
    }

    fn get_or_build<T: Entity>(&self) -> DocmapResult<Arc<EntityMapping<T>>> {
        let type_id = TypeId::of::<T>();

        // fast path, shared lock only
        if let Some(table) = self.tables.get(&type_id) {
            return downcast::<T>(table.value().clone());
        }

        match self.tables.entry(type_id) {
            Entry::Occupied(entry) => downcast::<T>(entry.get().clone()),
            Entry::Vacant(entry) => {
                let mapping = Arc::new(T::mapping()?);
                log::trace!(
                    "Built mapping table for {} with {} fields",
                    mapping.name(),
                    mapping.fields().len()
                );
                entry.insert(mapping.clone());
                Ok(mapping)
            }
        }
    }

    fn contains<T: Entity>(&self) -> bool {
        self.tables.contains_key(&TypeId::of::<T>())
    }
}

fn downcast<T: Entity>(table: Arc<dyn Any + Send + Sync>) -> DocmapResult<Arc<EntityMapping<T>>> {
    table.downcast::<EntityMapping<T>>().map_err(|_| {
        log::error!("Mapping table registered for {} has the wrong type", std::any::type_name::<T>());
        DocmapError::new(
            &format!(
                "Mapping table registered for {} has the wrong type",
                std::any::type_name::<T>()
            ),
            ErrorKind::InternalError,
        )
    })
}

/// Returns the field-mapping table of `T`, building and caching it on first
/// use.
///
/// A failed build is not cached; the error is returned to every caller until
/// the mapping is fixed.
pub fn mapping_of<T: Entity>() -> DocmapResult<Arc<EntityMapping<T>>> {
    REGISTRY.get_or_build::<T>()
}

/// Checks whether the table of `T` has already been built.
pub fn is_registered<T: Entity>() -> bool {
    REGISTRY.contains::<T>()
}
