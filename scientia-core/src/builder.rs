//! Site building logic: collect and convert every module, then check.
//!
//! The build runs in two phases. [`SiteBuilder::collect`] converts every
//! document and registers its references without looking at other
//! documents. [`Collected::check`] then validates the whole store once and
//! only a passing check yields a [`Site`], which is read-only.

use crate::check::ConsistencyReport;
use crate::config::{Config, ConfigError, DirectoryConfig, ModuleConfig, CONFIG_FILE_NAME};
use crate::fingerprint::BuildFingerprint;
use crate::markdown::{ContentConverter, ConvertError};
use crate::models::Document;
use crate::navigation::Navigation;
use crate::registry::ReferenceRegistry;
use crate::store::{DocumentStore, DocumentationModule, StoreError};
use scientia_types::{DocId, IdError, Namespace};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to convert {path}: {source}")]
    Convert {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },

    #[error("invalid identifier for {path}: {source}")]
    InvalidId {
        path: PathBuf,
        #[source]
        source: IdError,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Inconsistent(#[from] ConsistencyReport),
}

/// A file found below a module directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFile {
    /// A Markdown document and its derived id
    Document { docid: DocId, path: PathBuf },
    /// A `config.yaml` of a subdirectory, with the directory's tree segments
    Directory {
        segments: Vec<String>,
        path: PathBuf,
    },
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run both phases
    pub fn build(self) -> Result<Site, BuildError> {
        self.collect()?.check()
    }

    /// Phase one: register every module, convert every document.
    ///
    /// Modules are processed in configured order and files sorted by
    /// (directory, file name), so the fingerprint is reproducible.
    pub fn collect(self) -> Result<Collected, BuildError> {
        let mut store = DocumentStore::new();
        let mut registry = ReferenceRegistry::new();
        let mut converter =
            ContentConverter::new().with_include_backlinks(self.config.include_backlinks);
        let mut index = 0;

        for (name, dir) in self.config.modules.iter().zip(self.config.module_dirs()) {
            let namespace = Namespace::new(name.as_str()).map_err(|source| BuildError::InvalidId {
                path: dir.clone(),
                source,
            })?;
            let module_config = ModuleConfig::from_file(dir.join(CONFIG_FILE_NAME))?;
            tracing::info!("processing module {namespace} from {}", dir.display());
            store.register_module(DocumentationModule::new(
                namespace.clone(),
                module_config,
                &dir,
            ))?;

            for source in discover_sources(&dir)? {
                match source {
                    SourceFile::Directory { segments, path } => {
                        let config = DirectoryConfig::from_file(&path)?;
                        if let Some(module) = store.module_mut(&namespace) {
                            module.set_directory(segments.iter().map(String::as_str), config);
                        }
                    }
                    SourceFile::Document { docid, path } => {
                        let raw = fs::read_to_string(&path).map_err(|source| BuildError::Io {
                            path: path.clone(),
                            source,
                        })?;
                        let mut document = Document::new(namespace.clone(), docid, raw, &path);
                        let converted = converter
                            .convert(&document, &self.config.remapping, &mut registry)
                            .map_err(|source| BuildError::Convert {
                                path: path.clone(),
                                source,
                            })?;
                        document.attach(converted.html, converted.meta);

                        store.register(document).map_err(|err| match err {
                            StoreError::DuplicateDocument(dup) => {
                                StoreError::DuplicateDocument(dup.with_path(&path).with_index(index))
                            }
                            other => other,
                        })?;
                        tracing::debug!("registered {namespace}/{}", path.display());
                        index += 1;
                    }
                }
            }
        }

        tracing::info!(
            "converted {} documents in {} modules",
            store.document_count(),
            self.config.modules.len()
        );

        Ok(Collected {
            config: self.config,
            store,
            registry,
            fingerprint: converter.into_fingerprint(),
        })
    }
}

/// Every module converted, references registered but not yet checked
pub struct Collected {
    config: Config,
    store: DocumentStore,
    registry: ReferenceRegistry,
    fingerprint: BuildFingerprint,
}

impl Collected {
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    /// Phase two: run the consistency check, then build navigation
    pub fn check(self) -> Result<Site, BuildError> {
        self.store.check_consistency(&self.registry)?;

        let mut store = self.store;
        let navigation = Navigation::build(&mut store);
        let fingerprint = self.fingerprint.hex();
        tracing::info!("site consistent, fingerprint {fingerprint}");

        Ok(Site {
            config: self.config,
            store,
            registry: self.registry,
            fingerprint,
            navigation,
        })
    }
}

/// A checked build, ready to render
#[derive(Debug)]
pub struct Site {
    config: Config,
    store: DocumentStore,
    registry: ReferenceRegistry,
    fingerprint: String,
    navigation: Navigation,
}

impl Site {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    /// Lowercase hex SHA-256 over every converted document
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }
}

/// List the documents and directory configs of a module directory, sorted
/// by (directory, file name). The module's own `config.yaml` is left out.
pub fn discover_sources(module_dir: &Path) -> Result<Vec<SourceFile>, BuildError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(module_dir) {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: module_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| (a.parent(), a.file_name()).cmp(&(b.parent(), b.file_name())));

    let mut sources = Vec::new();
    for path in files {
        let rel = path.strip_prefix(module_dir).unwrap_or(&path);
        let mut segments: Vec<String> = rel
            .parent()
            .into_iter()
            .flat_map(|p| p.iter())
            .flat_map(|c| c.to_string_lossy().split('.').map(String::from).collect::<Vec<_>>())
            .collect();

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if file_name == CONFIG_FILE_NAME {
            if !segments.is_empty() {
                sources.push(SourceFile::Directory { segments, path });
            }
            continue;
        }

        if path.extension().map_or(true, |ext| ext != "md") {
            tracing::warn!("skipping {}: not a Markdown document", path.display());
            continue;
        }

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        segments.push(stem.to_string());
        let docid = DocId::from_segments(&segments).map_err(|source| BuildError::InvalidId {
            path: path.clone(),
            source,
        })?;
        sources.push(SourceFile::Document { docid, path });
    }
    Ok(sources)
}
