//! Generation facade.
//!
//! One entity's pipeline is strictly sequential: discover, validate, compile
//! the entity class, emit accessors, emit property models, emit the entity
//! model, register. Independent entities run on a bounded worker pool in
//! [`Critter::generate_all`]; the registry is the only shared state.

use crate::{
    accessor::Backend,
    augment::EntityCompiler,
    discovery::Discovery,
    error::BuildError,
    model::{EntityModelGenerator, PropertyModelGenerator},
    source::{EmittedSource, SourceEmitter},
};
use critter_core::{
    model::{GeneratedEntityModel, ReflectiveEntityModel},
    registry::{ClassRegistry, GeneratedClassRecord, Registration},
    vm::Vm,
};
use critter_schema::prelude::*;
use std::{
    any::Any,
    fmt,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

///
/// GenerationMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum GenerationMode {
    /// The entity class is registered exactly as declared and every accessor
    /// binds to it through resolved references.
    Runtime,
    /// Synthetic reader/writer methods are injected into the entity and
    /// accessors are emitted by the chosen backend.
    SelfContained(Backend),
}

impl GenerationMode {
    #[must_use]
    pub const fn backend(self) -> Backend {
        match self {
            Self::Runtime => Backend::Resolved,
            Self::SelfContained(backend) => backend,
        }
    }

    #[must_use]
    pub const fn augments_entity(self) -> bool {
        matches!(self, Self::SelfContained(_))
    }
}

impl Default for GenerationMode {
    fn default() -> Self {
        Self::SelfContained(Backend::default())
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::SelfContained(backend) => write!(f, "self-contained/{backend}"),
        }
    }
}

///
/// GeneratedEntity
///
/// Everything one pass produced for an entity, in registration order:
/// entity class, accessors, property models, entity model.
///

#[derive(Clone, Debug)]
pub struct GeneratedEntity {
    pub descriptor: EntityDescriptor,
    pub mode: GenerationMode,
    pub entity_model_class: String,
    pub property_model_classes: Vec<String>,
    pub accessor_classes: Vec<String>,
    pub records: Vec<GeneratedClassRecord>,
}

impl GeneratedEntity {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Qualified names of every generated class.
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        self.records.iter().map(GeneratedClassRecord::name).collect()
    }
}

///
/// GenerationReport
///

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub successes: Vec<GeneratedEntity>,
    pub failures: Vec<(String, BuildError)>,
}

impl GenerationReport {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn success(&self, entity: &str) -> Option<&GeneratedEntity> {
        self.successes.iter().find(|g| g.name() == entity)
    }

    #[must_use]
    pub fn failure(&self, entity: &str) -> Option<&BuildError> {
        self.failures
            .iter()
            .find(|(name, _)| name == entity)
            .map(|(_, err)| err)
    }
}

///
/// Critter
///
/// Entry point of a build. Holds the registry generated classes land in and
/// the mapping configuration every generated entity model is built with.
///

#[derive(Clone)]
pub struct Critter {
    registry: Arc<ClassRegistry>,
    config: Arc<MappingConfig>,
    mode: GenerationMode,
}

impl Critter {
    #[must_use]
    pub fn new(config: MappingConfig) -> Self {
        Self::with_registry(Arc::new(ClassRegistry::new()), Arc::new(config))
    }

    #[must_use]
    pub const fn with_registry(registry: Arc<ClassRegistry>, config: Arc<MappingConfig>) -> Self {
        Self {
            registry,
            config,
            mode: GenerationMode::SelfContained(Backend::Direct),
        }
    }

    #[must_use]
    pub const fn mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn generation_mode(&self) -> GenerationMode {
        self.mode
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &Arc<MappingConfig> {
        &self.config
    }

    /// An interpreter over this build's registry.
    #[must_use]
    pub fn vm(&self) -> Vm {
        Vm::new(Arc::clone(&self.registry))
    }

    /// Discover and validate an entity without emitting anything.
    pub fn describe(&self, meta: &ClassMeta) -> Result<EntityDescriptor, BuildError> {
        let descriptor = Discovery::new(meta, &self.config).discover()?;
        descriptor.validate().map_err(|errors| BuildError::Invalid {
            entity: descriptor.name.clone(),
            errors,
        })?;

        Ok(descriptor)
    }

    /// Emit every class for `meta` without registering any of them.
    pub fn plan(&self, meta: &ClassMeta) -> Result<GeneratedEntity, BuildError> {
        let descriptor = self.describe(meta)?;
        let backend = self.mode.backend();
        let annotations = self.registry.annotations();

        let compiler = EntityCompiler::new(meta, &descriptor);
        let entity_class = if self.mode.augments_entity() {
            compiler.compile_augmented()?
        } else {
            compiler.compile()
        };

        let mut records = vec![GeneratedClassRecord::from_body(&entity_class)?];

        let mut accessor_classes = Vec::with_capacity(descriptor.properties.len());
        for property in &descriptor.properties {
            let record = backend.generate(&descriptor, property)?;
            accessor_classes.push(record.name().to_string());
            records.push(record);
        }

        let mut property_model_classes = Vec::with_capacity(descriptor.properties.len());
        for property in &descriptor.properties {
            let record =
                PropertyModelGenerator::new(&descriptor, property, annotations).generate()?;
            log::debug!("property model {}", record.name());
            property_model_classes.push(record.name().to_string());
            records.push(record);
        }

        let entity_model = EntityModelGenerator::new(&descriptor, annotations).generate()?;
        let entity_model_class = entity_model.name().to_string();
        records.push(entity_model);

        Ok(GeneratedEntity {
            descriptor,
            mode: self.mode,
            entity_model_class,
            property_model_classes,
            accessor_classes,
            records,
        })
    }

    /// Emit and register every class for `meta`. Registration is all or
    /// nothing: a conflict on any name leaves the registry as it was.
    pub fn generate(&self, meta: &ClassMeta) -> Result<GeneratedEntity, BuildError> {
        let generated = self.plan(meta)?;
        let outcomes = self.registry.register_all(generated.records.clone())?;

        let inserted = outcomes
            .iter()
            .filter(|o| **o == Registration::Inserted)
            .count();
        log::debug!(
            "generated {} [{}]: {inserted} of {} classes new",
            generated.name(),
            self.mode,
            outcomes.len()
        );

        Ok(generated)
    }

    /// Generate several entities on a bounded pool of workers. A failing
    /// entity is reported and skipped; the others still register. The report
    /// keeps input order.
    #[must_use]
    pub fn generate_all(&self, metas: &[ClassMeta]) -> GenerationReport {
        log::debug!("generating {} entities [{}]", metas.len(), self.generation_mode());

        let mut report = GenerationReport::default();
        for (meta, result) in metas.iter().zip(map_bounded(metas, |meta| self.generate(meta))) {
            let result = result.unwrap_or_else(|message| {
                Err(BuildError::Panicked {
                    entity: meta.name.clone(),
                    message,
                })
            });

            match result {
                Ok(generated) => report.successes.push(generated),
                Err(err) => {
                    log::warn!("{}: generation failed: {err}", meta.name);
                    report.failures.push((meta.name.clone(), err));
                }
            }
        }

        report
    }

    /// Instantiate a registered entity model with this build's configuration.
    pub fn entity_model(&self, generated: &GeneratedEntity) -> Result<GeneratedEntityModel, BuildError> {
        Ok(GeneratedEntityModel::instantiate(
            Arc::clone(&self.registry),
            &generated.entity_model_class,
            Arc::clone(&self.config),
        )?)
    }

    /// The hand-written reference model for a generated entity. Accessors
    /// bind to the registered entity class.
    pub fn reflective_model(
        &self,
        generated: &GeneratedEntity,
    ) -> Result<ReflectiveEntityModel, BuildError> {
        Ok(ReflectiveEntityModel::new(
            generated.descriptor.clone(),
            &self.config,
            self.vm(),
        )?)
    }

    /// Render a generated entity as a Rust module with a static model table.
    pub fn emit_source(&self, generated: &GeneratedEntity) -> Result<EmittedSource, BuildError> {
        SourceEmitter::new(
            &generated.descriptor,
            &self.config,
            self.registry.annotations(),
        )
        .emit()
    }

    /// Write every registered class body under `dir`.
    pub fn flush(&self, dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        Ok(self.registry.flush(dir)?)
    }
}

/// Runs `work` over `items` on at most `available_parallelism` threads that
/// pull the next index from a shared counter, or inline when no thread can be
/// spawned. Results come back in input order; an item whose work panics
/// yields the panic message instead.
fn map_bounded<T, R>(items: &[T], work: impl Fn(&T) -> R + Sync) -> Vec<Result<R, String>>
where
    T: Sync,
    R: Send,
{
    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(items.len());
    let next = AtomicUsize::new(0);

    let worker = || {
        let mut finished = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            let Some(item) = items.get(index) else {
                break finished;
            };
            let result = panic::catch_unwind(AssertUnwindSafe(|| work(item)))
                .map_err(|payload| panic_message(payload.as_ref()));
            finished.push((index, result));
        }
    };

    let finished: Vec<(usize, Result<R, String>)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .filter_map(|_| thread::Builder::new().spawn_scoped(scope, worker).ok())
            .collect();
        if handles.is_empty() && workers > 0 {
            log::warn!("no worker threads could be spawned, generating inline");
            return worker();
        }

        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_default())
            .collect()
    });

    let mut slots: Vec<Option<Result<R, String>>> = items.iter().map(|_| None).collect();
    for (index, result) in finished {
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err("worker exited early".to_string())))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
