//! Rust source emission.
//!
//! Renders a generated entity as a module holding a `StaticEntityModel`
//! table, for builds that compile the model ahead of time instead of loading
//! it through the registry.

use crate::{error::BuildError, model::replayable, names};
use critter_core::annotation::AnnotationRegistry;
use critter_schema::prelude::*;
use proc_macro2::TokenStream;
use quote::quote;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Where the model types live in the crate that compiles the output.
pub const DEFAULT_CRATE_PATH: &str = "::critter::core::model";

///
/// EmittedSource
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmittedSource {
    pub entity: String,
    pub module: String,
    pub code: String,
}

impl EmittedSource {
    /// `<package path>/<module>.rs`
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = critter_schema::meta::package_name(&self.entity)
            .split('.')
            .filter(|s| !s.is_empty())
            .collect();
        path.push(format!("{}.rs", self.module));
        path
    }
}

///
/// SourceEmitter
///

pub struct SourceEmitter<'a> {
    entity: &'a EntityDescriptor,
    config: &'a MappingConfig,
    annotations: &'a AnnotationRegistry,
    crate_path: String,
}

impl<'a> SourceEmitter<'a> {
    #[must_use]
    pub fn new(
        entity: &'a EntityDescriptor,
        config: &'a MappingConfig,
        annotations: &'a AnnotationRegistry,
    ) -> Self {
        Self {
            entity,
            config,
            annotations,
            crate_path: DEFAULT_CRATE_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_crate_path(mut self, path: impl Into<String>) -> Self {
        self.crate_path = path.into();
        self
    }

    /// Render and parse-check the module.
    pub fn emit(&self) -> Result<EmittedSource, BuildError> {
        let tokens = self.tokens()?;
        syn::parse2::<syn::File>(tokens.clone()).map_err(|e| BuildError::Source {
            entity: self.entity.name.clone(),
            message: e.to_string(),
        })?;

        Ok(EmittedSource {
            entity: self.entity.name.clone(),
            module: names::module_name(&self.entity.name),
            code: tokens.to_string(),
        })
    }

    fn annotations_json(&self, annotations: &[AnnotationMeta]) -> Result<String, BuildError> {
        let completed = replayable(&self.entity.name, self.annotations, annotations)?
            .into_iter()
            .map(|a| self.annotations.complete(a))
            .collect::<Result<Vec<_>, _>>()?;

        serde_json::to_string(&completed).map_err(|e| BuildError::Source {
            entity: self.entity.name.clone(),
            message: format!("annotation table: {e}"),
        })
    }

    fn tokens(&self) -> Result<TokenStream, BuildError> {
        let entity = self.entity;
        let path: syn::Path = syn::parse_str(&self.crate_path).map_err(|e| BuildError::Source {
            entity: entity.name.clone(),
            message: format!("crate path '{}': {e}", self.crate_path),
        })?;

        let mut rows = quote!();
        for property in &entity.properties {
            let name = property.name.as_str();
            let full_name = property.full_name(&entity.name);
            let mapped_name = property.mapped_name.as_str();
            let load_names = property.load_names.iter().map(String::as_str);
            let type_signature = property.type_descriptor.to_signature();
            let accessor_class = names::accessor_class(&entity.name, &property.name);
            let annotations_json = self.annotations_json(&property.annotations)?;
            let PropertyFlags {
                transient,
                final_,
                reference,
                array,
                map,
                set,
                collection,
                id,
                version,
            } = property.flags;

            rows.extend(quote! {
                #path::StaticPropertyModel {
                    name: #name,
                    full_name: #full_name,
                    mapped_name: #mapped_name,
                    load_names: &[#(#load_names),*],
                    type_signature: #type_signature,
                    accessor_class: #accessor_class,
                    is_array: #array,
                    is_map: #map,
                    is_set: #set,
                    is_collection: #collection,
                    is_final: #final_,
                    is_transient: #transient,
                    is_reference: #reference,
                    is_id: #id,
                    is_version: #version,
                    annotations_json: #annotations_json,
                },
            });
        }

        let name = entity.name.as_str();
        let simple_name = entity.simple_name.as_str();
        let collection_name = entity.collection_name(self.config);
        let discriminator = entity.discriminator(self.config);
        let discriminator_key = entity.discriminator_key(self.config);
        let use_discriminator = entity.entity.use_discriminator;
        let is_abstract = entity.is_abstract;
        let is_interface = entity.is_interface;
        let is_embedded = entity.entity.embedded;
        let annotations_json = self.annotations_json(&entity.annotations)?;
        let doc = format!(" Model table for `{name}`.");

        Ok(quote! {
            #![doc = #doc]

            pub const PROPERTIES: &[#path::StaticPropertyModel] = &[#rows];

            pub const MODEL: #path::StaticEntityModel = #path::StaticEntityModel {
                name: #name,
                simple_name: #simple_name,
                collection_name: #collection_name,
                discriminator: #discriminator,
                discriminator_key: #discriminator_key,
                use_discriminator: #use_discriminator,
                is_abstract: #is_abstract,
                is_interface: #is_interface,
                is_embedded: #is_embedded,
                annotations_json: #annotations_json,
                properties: PROPERTIES,
            };
        })
    }
}

/// Write each module to `<dir>/<package path>/<module>.rs`.
pub fn flush_sources(dir: &Path, sources: &[EmittedSource]) -> Result<Vec<PathBuf>, BuildError> {
    let mut written = Vec::with_capacity(sources.len());

    for source in sources {
        let path = dir.join(source.relative_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &source.code)?;
        log::trace!("wrote {} to {}", source.entity, path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use critter_schema::{annotation::names as annotation_names, descriptor::EntityAnnotation};

    fn entity() -> EntityDescriptor {
        EntityDescriptor {
            name: "com.example.BlogPost".to_string(),
            simple_name: "BlogPost".to_string(),
            package: "com.example".to_string(),
            properties: vec![PropertyDescriptor {
                name: "tags".to_string(),
                mapped_name: "tags".to_string(),
                load_names: vec!["labels".to_string()],
                type_descriptor: TypeDescriptor::class("java.util.List")
                    .with_args(vec![TypeDescriptor::class("java.lang.String")]),
                access: PropertyAccess::Field,
                annotations: vec![
                    AnnotationMeta::new(annotation_names::ALSO_LOAD).with("value", "labels"),
                ],
                flags: PropertyFlags {
                    collection: true,
                    ..PropertyFlags::default()
                },
            }],
            annotations: Vec::new(),
            is_abstract: false,
            is_interface: false,
            entity: EntityAnnotation::default(),
        }
    }

    #[test]
    fn emitted_module_parses_and_names_the_table() {
        let entity = entity();
        let config = MappingConfig::default();
        let registry = AnnotationRegistry::with_builtins();

        let source = SourceEmitter::new(&entity, &config, &registry).emit().unwrap();
        let file: syn::File = syn::parse_str(&source.code).unwrap();

        let consts: Vec<String> = file
            .items
            .iter()
            .filter_map(|item| match item {
                syn::Item::Const(c) => Some(c.ident.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(consts, vec!["PROPERTIES".to_string(), "MODEL".to_string()]);
        assert!(source.code.contains("\"blogPost\""));
        assert!(source.code.contains("com.example.__critter.BlogPost.tagsAccessor"));
        assert_eq!(source.relative_path(), PathBuf::from("com/example/BlogPost.rs"));
    }

    #[test]
    fn bad_crate_path_is_a_source_error() {
        let entity = entity();
        let config = MappingConfig::default();
        let registry = AnnotationRegistry::with_builtins();

        let err = SourceEmitter::new(&entity, &config, &registry)
            .with_crate_path("not a path")
            .emit()
            .unwrap_err();
        assert!(matches!(err, BuildError::Source { .. }));
    }

    #[test]
    fn flush_mirrors_the_package() {
        let entity = entity();
        let config = MappingConfig::default();
        let registry = AnnotationRegistry::with_builtins();
        let source = SourceEmitter::new(&entity, &config, &registry).emit().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = flush_sources(dir.path(), &[source.clone()]).unwrap();

        assert_eq!(written, vec![dir.path().join("com/example/BlogPost.rs")]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), source.code);
    }
}
