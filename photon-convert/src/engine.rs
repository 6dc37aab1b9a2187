//! Converter synthesis and caching.
//!
//! A converter for a `(source, target)` pair is synthesized on first use by
//! walking the strategy list below and is then cached for the lifetime of the
//! engine. The first applicable strategy wins:
//!
//! 1. **Cast**: identical types, a registered cast, boxing into [`AnyValue`],
//!    or re-resolution of a boxed source against its runtime type.
//! 2. **TryParse**: string source and a target with a fallible parser.
//! 3. **Parse**: string source and a target with an infallible parser.
//! 4. **Primitive**: both sides have a primitive kind; range-checked. An
//!    enumeration converting to a string skips this step so it renders its
//!    name instead of its ordinal.
//! 5. **Nullable**: unwrap a nullable source or wrap into a nullable target
//!    around the converter for the underlying types.
//! 6. **ToString**: string target; renders the source.
//! 7. **Identity**: a checked downcast that fails with
//!    [`Error::InvalidCast`] when the types differ.
//!
//! Synthesis is pure, so two threads racing on the same key may both build a
//! converter; only the first one published is ever handed out.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use photon_result::{Error, Result};
use rustc_hash::FxHashMap;

use crate::convertible::{Convertible, Parser};
use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::value::{AnyValue, ErasedValue};

/// A synthesized conversion routine producing `T` from an erased value.
pub type Converter<T> =
    Arc<dyn Fn(&ConversionEngine, &dyn ErasedValue) -> Result<T> + Send + Sync>;

type CacheKey = (TypeId, TypeId);
type CacheEntry = Box<dyn Any + Send + Sync>;

/// The strategy a converter was synthesized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Cast,
    Boxed,
    TryParse,
    Parse,
    Primitive,
    Nullable,
    ToString,
    Identity,
}

/// Synthesizes and caches converters between pairs of [`Convertible`] types.
///
/// # Thread Safety
///
/// The caches sit behind `RwLock`s; lookups take a read lock only and
/// synthesis runs outside any lock. The engine can be shared freely across
/// threads.
#[derive(Default)]
pub struct ConversionEngine {
    converters: RwLock<FxHashMap<CacheKey, CacheEntry>>,
    /// Converters keyed by the runtime type of boxed payloads.
    boxed: RwLock<FxHashMap<CacheKey, CacheEntry>>,
    casts: RwLock<FxHashMap<CacheKey, CacheEntry>>,
}

static GLOBAL: OnceLock<ConversionEngine> = OnceLock::new();

impl ConversionEngine {
    /// Create an isolated engine with its own caches and cast table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide engine used by column storage.
    pub fn global() -> &'static ConversionEngine {
        GLOBAL.get_or_init(ConversionEngine::new)
    }

    /// Convert `value` from `S` to `T`.
    pub fn convert<S: Convertible, T: Convertible>(&self, value: S) -> Result<T> {
        if TypeId::of::<S>() == TypeId::of::<T>() {
            return cast_identity::<S, T>(value)
                .ok_or_else(|| Error::internal("identity conversion lost its type"));
        }
        let converter = self.converter::<T>(S::descriptor())?;
        converter(self, &value)
    }

    /// Convert a borrowed, type-erased value to `T`.
    pub fn convert_ref<T: Convertible>(&self, value: &dyn ErasedValue) -> Result<T> {
        if let Some(native) = value.downcast_ref::<T>() {
            return Ok(native.clone());
        }
        let converter = self.converter::<T>(value.type_descriptor())?;
        converter(self, value)
    }

    /// Returns `true` if `value` is a null nullable value.
    ///
    /// Always `false` for non-nullable types.
    #[inline]
    pub fn is_null<T: Convertible>(&self, value: &T) -> bool {
        value.is_null()
    }

    /// Converter from `source` to `T`, synthesized and cached on first use.
    pub fn converter<T: Convertible>(&self, source: TypeDescriptor) -> Result<Converter<T>> {
        let key = (source.id(), TypeId::of::<T>());
        {
            let cache = self.converters.read().map_err(Error::internal)?;
            if let Some(entry) = cache.get(&key) {
                return downcast_entry::<T>(entry);
            }
        }

        let (strategy, converter) = self.synthesize::<T>(source)?;
        tracing::debug!(
            source = source.name(),
            target = type_name::<T>(),
            ?strategy,
            "synthesized converter"
        );

        let mut cache = self.converters.write().map_err(Error::internal)?;
        let entry = cache.entry(key).or_insert_with(|| Box::new(converter));
        downcast_entry::<T>(entry)
    }

    /// Convert a boxed value by resolving against its runtime type.
    ///
    /// `value` is expected to be an [`AnyValue`] or another boxed wrapper. A
    /// null box converts to the target's null value, or fails with
    /// [`Error::InvalidOperation`] if the target has none.
    pub fn convert_boxed<T: Convertible>(&self, value: &dyn ErasedValue) -> Result<T> {
        let Some(payload) = value.nested() else {
            return T::null_value().ok_or_else(|| {
                Error::null_to_non_nullable(value.type_descriptor().name(), type_name::<T>())
            });
        };
        let runtime = payload.type_descriptor();
        let key = (runtime.id(), TypeId::of::<T>());

        let cached = {
            let cache = self.boxed.read().map_err(Error::internal)?;
            cache.get(&key).map(downcast_entry::<T>).transpose()?
        };
        let converter = match cached {
            Some(converter) => converter,
            None => {
                tracing::trace!(
                    runtime = runtime.name(),
                    target = type_name::<T>(),
                    "re-resolving boxed value"
                );
                let converter = self.converter::<T>(runtime)?;
                let mut cache = self.boxed.write().map_err(Error::internal)?;
                let entry = cache.entry(key).or_insert_with(|| Box::new(converter));
                downcast_entry::<T>(entry)?
            }
        };
        converter(self, payload)
    }

    /// Register a user conversion from `S` to `T`.
    ///
    /// Registered casts take precedence over every other strategy except
    /// identity. Registration drops all cached converters so that composite
    /// converters built on an older entry are synthesized again.
    pub fn register_cast<S, T, F>(&self, cast: F) -> Result<()>
    where
        S: Convertible,
        T: Convertible,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        let converter = make_converter(move |_, value| downcast_clone::<S>(value).map(&cast));
        self.casts
            .write()
            .map_err(Error::internal)?
            .insert((TypeId::of::<S>(), TypeId::of::<T>()), Box::new(converter));
        self.converters.write().map_err(Error::internal)?.clear();
        self.boxed.write().map_err(Error::internal)?.clear();
        tracing::debug!(
            source = type_name::<S>(),
            target = type_name::<T>(),
            "registered cast"
        );
        Ok(())
    }

    /// Register the `From` implementation between `S` and `T` as a cast.
    pub fn register_from<S, T>(&self) -> Result<()>
    where
        S: Convertible,
        T: Convertible + From<S>,
    {
        self.register_cast::<S, T, _>(T::from)
    }

    /// Number of converters currently cached.
    pub fn cached_converters(&self) -> usize {
        self.converters.read().map(|cache| cache.len()).unwrap_or(0)
    }

    fn registered_cast<T: Convertible>(
        &self,
        source: TypeDescriptor,
    ) -> Result<Option<Converter<T>>> {
        let casts = self.casts.read().map_err(Error::internal)?;
        casts
            .get(&(source.id(), TypeId::of::<T>()))
            .map(downcast_entry::<T>)
            .transpose()
    }

    fn synthesize<T: Convertible>(
        &self,
        source: TypeDescriptor,
    ) -> Result<(Strategy, Converter<T>)> {
        let target = T::descriptor();

        if source == target {
            return Ok((Strategy::Cast, make_converter(|_, value| downcast_clone::<T>(value))));
        }
        if let Some(cast) = self.registered_cast::<T>(source)? {
            return Ok((Strategy::Cast, cast));
        }
        if target.is::<AnyValue>() {
            return Ok((
                Strategy::Cast,
                make_converter(|_, value| {
                    cast_identity::<AnyValue, T>(value.boxed())
                        .ok_or_else(|| Error::internal("boxed value lost its type"))
                }),
            ));
        }
        if matches!(source.kind(), TypeKind::Object) {
            return Ok((
                Strategy::Boxed,
                make_converter(|engine, value| engine.convert_boxed::<T>(value)),
            ));
        }

        if source.is_string() {
            match T::parser() {
                Some(Parser::Fallible(parse)) => {
                    return Ok((
                        Strategy::TryParse,
                        make_converter(move |_, value| {
                            let text = downcast_str(value)?;
                            parse(text).ok_or_else(|| Error::parse_failed(text, type_name::<T>()))
                        }),
                    ));
                }
                Some(Parser::Infallible(parse)) => {
                    return Ok((
                        Strategy::Parse,
                        make_converter(move |_, value| downcast_str(value).map(parse)),
                    ));
                }
                None => {}
            }
        }

        if source.primitive_kind().is_some()
            && target.primitive_kind().is_some()
            && !(source.is_enum() && target.is_string())
        {
            return Ok((
                Strategy::Primitive,
                make_converter(|_, value| {
                    let primitive = value.primitive_value().ok_or_else(|| {
                        Error::invalid_cast(value.type_descriptor().name(), type_name::<T>())
                    })?;
                    T::from_primitive(primitive)
                }),
            ));
        }

        if let TypeKind::Nullable(inner) = source.kind() {
            let inner_converter = self.converter::<T>(inner())?;
            return Ok((
                Strategy::Nullable,
                make_converter(move |engine, value| match value.nested() {
                    Some(payload) => inner_converter(engine, payload),
                    None => T::null_value().ok_or_else(|| {
                        Error::null_to_non_nullable(source.name(), type_name::<T>())
                    }),
                }),
            ));
        }
        if let Some(wrap) = T::wrap_converter(self, source) {
            return wrap.map(|converter| (Strategy::Nullable, converter));
        }

        if target.is_string() {
            return Ok((
                Strategy::ToString,
                make_converter(|_, value| {
                    cast_identity::<String, T>(value.display_string())
                        .ok_or_else(|| Error::internal("rendered value lost its type"))
                }),
            ));
        }

        Ok((Strategy::Identity, make_converter(|_, value| downcast_clone::<T>(value))))
    }
}

impl fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("cached_converters", &self.cached_converters())
            .finish_non_exhaustive()
    }
}

/// Convert `value` with the process-wide engine.
pub fn convert<S: Convertible, T: Convertible>(value: S) -> Result<T> {
    ConversionEngine::global().convert::<S, T>(value)
}

/// Returns `true` if `value` is a null nullable value.
pub fn is_null<T: Convertible>(value: &T) -> bool {
    ConversionEngine::global().is_null(value)
}

fn make_converter<T, F>(f: F) -> Converter<T>
where
    F: Fn(&ConversionEngine, &dyn ErasedValue) -> Result<T> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Move `value` into `T` when `S` and `T` are the same type.
fn cast_identity<S: Any, T: Any>(value: S) -> Option<T> {
    let mut slot = Some(value);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<T>>()
        .and_then(Option::take)
}

fn downcast_entry<T: Convertible>(entry: &CacheEntry) -> Result<Converter<T>> {
    entry
        .downcast_ref::<Converter<T>>()
        .cloned()
        .ok_or_else(|| {
            Error::internal(format!(
                "cached converter for {} has the wrong type",
                type_name::<T>()
            ))
        })
}

fn downcast_clone<T: Convertible>(value: &dyn ErasedValue) -> Result<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| Error::invalid_cast(value.type_descriptor().name(), type_name::<T>()))
}

fn downcast_str(value: &dyn ErasedValue) -> Result<&str> {
    value
        .downcast_ref::<String>()
        .map(String::as_str)
        .ok_or_else(|| Error::invalid_cast(value.type_descriptor().name(), "String"))
}
