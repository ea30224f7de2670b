//! Configuration management for the object mapper.

use crate::errors::{DocmapError, DocmapResult};
use crate::mapper::{mapping_of, Entity, Mapper};
use std::sync::Arc;

/// Public interface for mapper configuration.
///
/// Cloning is cheap; clones share the same settings.
///
/// # Examples
///
/// ```rust
/// use docmap::mapper::MapperConfig;
///
/// let config = MapperConfig::new();
/// assert!(config.skip_nulls());
/// assert!(!config.generate_ids());
/// ```
#[derive(Clone)]
pub struct MapperConfig {
    /// The pointer to implementation. Uses Arc for cheap cloning and thread safety.
    inner: Arc<MapperConfigInner>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperConfig {
    /// Creates a new configuration instance with default values.
    pub fn new() -> Self {
        MapperConfig {
            inner: Arc::new(MapperConfigInner::default()),
        }
    }

    /// Whether `Null` field values are left out of produced documents.
    pub fn skip_nulls(&self) -> bool {
        self.inner.skip_nulls
    }

    /// Whether produced documents without `_id` get a fresh object id.
    pub fn generate_ids(&self) -> bool {
        self.inner.generate_ids
    }
}

impl std::fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperConfig")
            .field("skip_nulls", &self.inner.skip_nulls)
            .field("generate_ids", &self.inner.generate_ids)
            .finish()
    }
}

struct MapperConfigInner {
    skip_nulls: bool,
    generate_ids: bool,
}

impl Default for MapperConfigInner {
    fn default() -> Self {
        MapperConfigInner {
            skip_nulls: true,
            generate_ids: false,
        }
    }
}

/// Builder for creating and configuring a [Mapper].
///
/// Entity types can be registered up front so their field-mapping tables are
/// built and validated eagerly. The first registration error is captured and
/// returned from [MapperBuilder::build].
///
/// # Examples
///
/// ```rust
/// use docmap::mapper::Mapper;
///
/// let mapper = Mapper::builder()
///     .skip_nulls(false)
///     .generate_ids(true)
///     .build()
///     .unwrap();
/// assert!(mapper.config().generate_ids());
/// ```
pub struct MapperBuilder {
    error: Option<DocmapError>,
    skip_nulls: bool,
    generate_ids: bool,
}

impl Default for MapperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperBuilder {
    pub fn new() -> Self {
        let defaults = MapperConfigInner::default();
        MapperBuilder {
            error: None,
            skip_nulls: defaults.skip_nulls,
            generate_ids: defaults.generate_ids,
        }
    }

    /// Leaves `Null` values out of produced documents (default `true`).
    pub fn skip_nulls(mut self, skip_nulls: bool) -> Self {
        self.skip_nulls = skip_nulls;
        self
    }

    /// Assigns a fresh object id to produced documents lacking `_id`
    /// (default `false`).
    pub fn generate_ids(mut self, generate_ids: bool) -> Self {
        self.generate_ids = generate_ids;
        self
    }

    /// Builds and caches the mapping table of `T` now instead of on first use.
    pub fn register<T: Entity>(mut self) -> Self {
        if self.error.is_none() {
            if let Err(e) = mapping_of::<T>() {
                self.error = Some(e);
            }
        }
        self
    }

    /// Returns the configuration without creating a mapper.
    pub fn build_config(self) -> DocmapResult<MapperConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }

        Ok(MapperConfig {
            inner: Arc::new(MapperConfigInner {
                skip_nulls: self.skip_nulls,
                generate_ids: self.generate_ids,
            }),
        })
    }

    pub fn build(self) -> DocmapResult<Mapper> {
        Ok(Mapper::new(self.build_config()?))
    }
}
