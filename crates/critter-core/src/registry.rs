//! Dynamic class registry: an append-only store of generated class bodies
//! keyed by qualified name, plus the loader that links them on first use.

use crate::{
    annotation::AnnotationRegistry,
    class::{ClassBody, disassemble},
    error::InternalError,
    vm::LoadedClass,
};
use critter_schema::meta::{package_name, simple_name};
use log::{debug, trace};
use sha2::{Digest, Sha256};
use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

///
/// GeneratedClassRecord
///
/// One stored body with its SHA-256 digest. Records are immutable once
/// created.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneratedClassRecord {
    name: String,
    body: Arc<[u8]>,
    digest: [u8; 32],
}

impl GeneratedClassRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, body: Vec<u8>) -> Self {
        let digest = Sha256::digest(&body).into();

        Self {
            name: name.into(),
            body: body.into(),
            digest,
        }
    }

    /// Encode a class body into a record named after the class.
    pub fn from_body(body: &ClassBody) -> Result<Self, InternalError> {
        Ok(Self::new(body.name.clone(), body.encode()?))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub const fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Lowercase hex form of the digest.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        use std::fmt::Write;

        self.digest.iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
    }

    /// `<package path>/<Simple>.class` relative to an output root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in package_name(&self.name).split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(format!("{}.class", simple_name(&self.name)));

        path
    }
}

///
/// Registration
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Registration {
    Inserted,
    Unchanged,
}

///
/// ClassRegistry
///
/// Registering a name twice with the same bytes is a no-op; with different
/// bytes it is a `Conflict`. Loaded classes are cached, so every load of a
/// name returns the same `Arc`.
///

#[derive(Debug, Default)]
pub struct ClassRegistry {
    bodies: RwLock<BTreeMap<String, GeneratedClassRecord>>,
    loaded: RwLock<HashMap<String, Arc<LoadedClass>>>,
    annotations: AnnotationRegistry,
}

impl ClassRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_annotations(annotations: AnnotationRegistry) -> Self {
        Self {
            annotations,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn annotations(&self) -> &AnnotationRegistry {
        &self.annotations
    }

    pub fn register(&self, name: impl Into<String>, body: Vec<u8>) -> Result<Registration, InternalError> {
        let record = GeneratedClassRecord::new(name, body);
        let mut bodies = self.bodies.write().expect("class registry lock poisoned");

        let registration = Self::check(&bodies, &record)?;
        if registration == Registration::Inserted {
            trace!("registered {} ({})", record.name, record.digest_hex());
            bodies.insert(record.name.clone(), record);
        }

        Ok(registration)
    }

    /// Encode `body` and register it under its own name.
    pub fn register_body(&self, body: &ClassBody) -> Result<Registration, InternalError> {
        let record = GeneratedClassRecord::from_body(body)?;
        self.register_all(vec![record]).map(|mut r| r.remove(0))
    }

    /// Register several records at once. Every name is checked before any is
    /// inserted, so a conflict leaves the registry untouched.
    pub fn register_all(
        &self,
        records: Vec<GeneratedClassRecord>,
    ) -> Result<Vec<Registration>, InternalError> {
        let mut bodies = self.bodies.write().expect("class registry lock poisoned");

        let mut outcomes = Vec::with_capacity(records.len());
        let mut seen: HashMap<&str, &GeneratedClassRecord> = HashMap::new();
        for record in &records {
            if let Some(prev) = seen.insert(&record.name, record)
                && prev.digest != record.digest
            {
                return Err(InternalError::registry_conflict(&record.name));
            }
            outcomes.push(Self::check(&bodies, record)?);
        }

        for (record, outcome) in records.into_iter().zip(&outcomes) {
            if *outcome == Registration::Inserted {
                trace!("registered {} ({})", record.name, record.digest_hex());
                bodies.insert(record.name.clone(), record);
            }
        }

        Ok(outcomes)
    }

    fn check(
        bodies: &BTreeMap<String, GeneratedClassRecord>,
        record: &GeneratedClassRecord,
    ) -> Result<Registration, InternalError> {
        match bodies.get(&record.name) {
            None => Ok(Registration::Inserted),
            Some(existing) if existing.digest == record.digest => Ok(Registration::Unchanged),
            Some(_) => Err(InternalError::registry_conflict(&record.name)),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bodies
            .read()
            .expect("class registry lock poisoned")
            .contains_key(name)
    }

    #[must_use]
    pub fn record(&self, name: &str) -> Option<GeneratedClassRecord> {
        self.bodies
            .read()
            .expect("class registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.bodies
            .read()
            .expect("class registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.read().expect("class registry lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a registered body without linking it.
    pub fn body(&self, name: &str) -> Result<ClassBody, InternalError> {
        let record = self
            .record(name)
            .ok_or_else(|| InternalError::registry_not_found(name))?;

        Ok(ClassBody::decode(record.body())?)
    }

    /// Load, link and cache a class. Superclasses that are registered are
    /// loaded first; any other superclass is treated as a builtin.
    pub fn load_class(&self, name: &str) -> Result<Arc<LoadedClass>, InternalError> {
        if let Some(class) = self.cached(name) {
            return Ok(class);
        }

        self.load_chain(name, &mut Vec::new())
    }

    fn cached(&self, name: &str) -> Option<Arc<LoadedClass>> {
        self.loaded
            .read()
            .expect("class loader lock poisoned")
            .get(name)
            .cloned()
    }

    fn load_chain(
        &self,
        name: &str,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<LoadedClass>, InternalError> {
        if let Some(class) = self.cached(name) {
            return Ok(class);
        }
        if visiting.iter().any(|v| v == name) {
            return Err(InternalError::registry_invariant(format!(
                "superclass cycle through {name}"
            )));
        }
        visiting.push(name.to_string());

        let body = self.body(name)?;
        if body.name != name {
            return Err(InternalError::registry_invariant(format!(
                "body registered as '{name}' defines '{}'",
                body.name
            )));
        }

        let super_class = match body.super_name.as_deref() {
            Some(super_name) if self.contains(super_name) => {
                Some(self.load_chain(super_name, visiting)?)
            }
            _ => None,
        };
        let class = Arc::new(LoadedClass::link(body, super_class)?);

        // a racing loader may have finished first; keep its class
        let mut loaded = self.loaded.write().expect("class loader lock poisoned");
        let class = Arc::clone(loaded.entry(name.to_string()).or_insert(class));
        debug!("loaded {name} [{}]", class.kind());

        Ok(class)
    }

    /// Disassembly of a registered class, with optional class renames.
    pub fn dump(&self, name: &str, renames: &BTreeMap<String, String>) -> Result<String, InternalError> {
        let body = self.body(name)?;

        Ok(disassemble(&body, renames))
    }

    /// Write every body to `<dir>/<package path>/<Simple>.class`.
    pub fn flush(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let records: Vec<_> = self
            .bodies
            .read()
            .expect("class registry lock poisoned")
            .values()
            .cloned()
            .collect();

        let mut written = Vec::with_capacity(records.len());
        for record in records {
            let path = dir.join(record.relative_path());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, record.body())?;
            trace!("flushed {} to {}", record.name, path.display());
            written.push(path);
        }

        Ok(written)
    }
}
