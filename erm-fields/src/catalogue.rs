//! Catalogue of custom property definitions.
//!
//! [`Catalogue`] is the in-memory, ordered, closed set of definitions a form
//! session works against. [`CatalogueContext`] persists definitions as YAML
//! files under a `definitions/` directory and hands out catalogue snapshots.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::types::CustomPropertyDefinition;

/// Ordered set of definitions, indexed by `value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    definitions: Vec<CustomPropertyDefinition>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Build a catalogue, keeping the given order.
    pub fn new(definitions: Vec<CustomPropertyDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.value.clone(), i).is_some() {
                return Err(FieldsError::DuplicateDefinition {
                    value: def.value.clone(),
                });
            }
        }
        Ok(Self { definitions, index })
    }

    /// Look up a definition by its value.
    pub fn get(&self, value: &str) -> Option<&CustomPropertyDefinition> {
        self.index.get(value).map(|&i| &self.definitions[i])
    }

    /// Position of a definition in catalogue order.
    pub fn position(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn all(&self) -> &[CustomPropertyDefinition] {
        &self.definitions
    }

    /// Primary definitions, in catalogue order.
    pub fn primary(&self) -> impl Iterator<Item = &CustomPropertyDefinition> {
        self.definitions.iter().filter(|d| d.primary)
    }

    /// Optional definitions, in catalogue order.
    pub fn optional(&self) -> impl Iterator<Item = &CustomPropertyDefinition> {
        self.definitions.iter().filter(|d| d.is_optional())
    }

    pub fn has_primary(&self) -> bool {
        self.primary().next().is_some()
    }

    pub fn has_optional(&self) -> bool {
        self.optional().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Default definitions seeded into a fresh catalogue directory.
///
/// Consumers build this to pass to `CatalogueContextBuilder::with_defaults()`.
pub struct CatalogueDefaults {
    definitions: Vec<CustomPropertyDefinition>,
}

impl CatalogueDefaults {
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
        }
    }

    /// Add a default definition.
    pub fn definition(mut self, def: CustomPropertyDefinition) -> Self {
        self.definitions.push(def);
        self
    }

    pub fn definitions(&self) -> &[CustomPropertyDefinition] {
        &self.definitions
    }
}

impl Default for CatalogueDefaults {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CatalogueContext`. Created by `CatalogueContext::open()`.
pub struct CatalogueContextBuilder {
    root: PathBuf,
    defaults: Option<CatalogueDefaults>,
}

impl CatalogueContextBuilder {
    /// Provide default definitions.
    /// Defaults are seeded on first open; existing definitions are preserved.
    pub fn with_defaults(mut self, defaults: CatalogueDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Build the context: create directories, seed defaults, load from disk.
    pub async fn build(self) -> Result<CatalogueContext> {
        let root = self.root;
        fs::create_dir_all(root.join("definitions")).await?;

        if let Some(defaults) = self.defaults {
            seed_defaults(&root, &defaults).await?;
        }

        let mut ctx = CatalogueContext {
            root,
            definitions: Vec::new(),
        };
        ctx.load_definitions().await?;

        debug!(
            definitions = ctx.definitions.len(),
            "catalogue context opened"
        );

        Ok(ctx)
    }
}

/// Seed default definitions whose value is not already on disk.
async fn seed_defaults(root: &Path, defaults: &CatalogueDefaults) -> Result<()> {
    let defs_dir = root.join("definitions");
    let existing = collect_existing_values(&defs_dir).await?;

    for def in &defaults.definitions {
        if !existing.contains(&def.value) {
            let yaml = serde_yaml_ng::to_string(def)?;
            atomic_write(&definition_path(root, &def.value)?, yaml.as_bytes()).await?;
            debug!(value = %def.value, "seeded default custom property");
        }
    }

    Ok(())
}

/// Read every .yaml file in definitions/ and collect the stored values.
async fn collect_existing_values(defs_dir: &Path) -> Result<HashSet<String>> {
    let mut values = HashSet::new();
    if !defs_dir.exists() {
        return Ok(values);
    }
    let mut entries = fs::read_dir(defs_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path).await {
            if let Ok(def) = serde_yaml_ng::from_str::<CustomPropertyDefinition>(&content) {
                values.insert(def.value);
            }
        }
    }
    Ok(values)
}

/// File holding the definition with `value`. Values that could leave
/// `definitions/` or collide with temp files are rejected.
fn definition_path(root: &Path, value: &str) -> Result<PathBuf> {
    let unsafe_name = value.is_empty()
        || value.starts_with('.')
        || value.contains("..")
        || value.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(FieldsError::InvalidFileName {
            value: value.to_string(),
        });
    }
    Ok(root.join("definitions").join(format!("{value}.yaml")))
}

/// On-disk catalogue of custom property definitions.
///
/// ```text
/// catalogue/
///   definitions/    ← one .yaml per custom property
/// ```
pub struct CatalogueContext {
    root: PathBuf,
    definitions: Vec<CustomPropertyDefinition>,
}

impl CatalogueContext {
    /// Open or create a catalogue directory.
    ///
    /// ```rust,ignore
    /// let ctx = CatalogueContext::open(path)
    ///     .with_defaults(license_terms())
    ///     .build()
    ///     .await?;
    /// let catalogue = ctx.catalogue()?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> CatalogueContextBuilder {
        CatalogueContextBuilder {
            root: root.into(),
            defaults: None,
        }
    }

    pub fn get(&self, value: &str) -> Option<&CustomPropertyDefinition> {
        self.definitions.iter().find(|d| d.value == value)
    }

    /// All definitions, in catalogue order.
    pub fn all(&self) -> &[CustomPropertyDefinition] {
        &self.definitions
    }

    /// Snapshot the current definitions as an immutable catalogue.
    pub fn catalogue(&self) -> Result<Catalogue> {
        Catalogue::new(self.definitions.clone())
    }

    /// Write (create or update) a definition. Persists to YAML immediately.
    pub async fn write_definition(&mut self, def: &CustomPropertyDefinition) -> Result<()> {
        let path = definition_path(&self.root, &def.value)?;
        let yaml = serde_yaml_ng::to_string(def)?;
        atomic_write(&path, yaml.as_bytes()).await?;

        match self.definitions.iter_mut().find(|d| d.value == def.value) {
            Some(existing) => *existing = def.clone(),
            None => self.definitions.push(def.clone()),
        }
        self.sort();

        Ok(())
    }

    /// Delete a definition by value. A file already gone from disk is not an
    /// error; any other failure leaves the definition in place.
    pub async fn delete_definition(&mut self, value: &str) -> Result<()> {
        let idx = self
            .definitions
            .iter()
            .position(|d| d.value == value)
            .ok_or_else(|| FieldsError::DefinitionNotFound {
                value: value.to_string(),
            })?;

        match fs::remove_file(definition_path(&self.root, value)?).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(value, "definition file already removed");
            }
            Err(e) => return Err(e.into()),
        }
        self.definitions.remove(idx);

        Ok(())
    }

    /// The root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sort(&mut self) {
        self.definitions
            .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.value.cmp(&b.value)));
    }

    async fn load_definitions(&mut self) -> Result<()> {
        let defs_dir = self.root.join("definitions");
        if !defs_dir.is_dir() {
            return Err(FieldsError::NotInitialized { path: defs_dir });
        }
        let mut entries = fs::read_dir(&defs_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_yaml_ng::from_str::<CustomPropertyDefinition>(&content) {
                Ok(def) => self.definitions.push(def),
                Err(e) => {
                    tracing::warn!(?path, %e, "skipping invalid custom property definition");
                }
            }
        }
        self.sort();
        Ok(())
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PropertyType;
    use tempfile::TempDir;

    fn text(value: &str) -> CustomPropertyDefinition {
        CustomPropertyDefinition::new(value, value, PropertyType::Text)
    }

    fn sample_defaults() -> CatalogueDefaults {
        CatalogueDefaults::new()
            .definition(
                CustomPropertyDefinition::new("concurrentUsers", "Concurrent users", PropertyType::Number)
                    .primary()
                    .with_order(0),
            )
            .definition(text("authIP").with_order(1))
    }

    #[test]
    fn catalogue_rejects_duplicate_values() {
        let result = Catalogue::new(vec![text("a"), text("b"), text("a")]);
        assert!(matches!(
            result,
            Err(FieldsError::DuplicateDefinition { ref value }) if value == "a"
        ));
    }

    #[test]
    fn catalogue_partitions_primary_and_optional() {
        let catalogue = Catalogue::new(vec![
            text("a").primary(),
            text("b"),
            text("c").primary(),
        ])
        .unwrap();

        let primary: Vec<_> = catalogue.primary().map(|d| d.value.as_str()).collect();
        let optional: Vec<_> = catalogue.optional().map(|d| d.value.as_str()).collect();
        assert_eq!(primary, vec!["a", "c"]);
        assert_eq!(optional, vec!["b"]);
        assert!(catalogue.has_primary());
        assert!(catalogue.has_optional());
        assert_eq!(catalogue.position("c"), Some(2));
        assert_eq!(catalogue.get("b").unwrap().value, "b");
        assert!(catalogue.get("z").is_none());
    }

    #[test]
    fn empty_catalogue_has_no_groups() {
        let catalogue = Catalogue::default();
        assert!(catalogue.is_empty());
        assert!(!catalogue.has_primary());
        assert!(!catalogue.has_optional());
    }

    #[tokio::test]
    async fn open_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let ctx = CatalogueContext::open(&root).build().await.unwrap();
        assert!(root.join("definitions").is_dir());
        assert!(ctx.all().is_empty());
    }

    #[tokio::test]
    async fn write_and_read_definition() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        ctx.write_definition(&text("authIP")).await.unwrap();

        assert_eq!(ctx.all().len(), 1);
        assert_eq!(ctx.get("authIP").unwrap().type_, PropertyType::Text);
        assert!(root.join("definitions/authIP.yaml").exists());
    }

    #[tokio::test]
    async fn write_definition_update_replaces() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        ctx.write_definition(&text("authIP")).await.unwrap();
        ctx.write_definition(&text("authIP").with_description("Updated"))
            .await
            .unwrap();

        assert_eq!(ctx.all().len(), 1);
        assert_eq!(
            ctx.get("authIP").unwrap().description,
            Some("Updated".into())
        );
    }

    #[tokio::test]
    async fn delete_definition() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        ctx.write_definition(&text("authIP")).await.unwrap();
        ctx.delete_definition("authIP").await.unwrap();

        assert!(ctx.all().is_empty());
        assert!(!root.join("definitions/authIP.yaml").exists());
    }

    #[tokio::test]
    async fn delete_tolerates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        ctx.write_definition(&text("authIP")).await.unwrap();
        std::fs::remove_file(root.join("definitions/authIP.yaml")).unwrap();

        ctx.delete_definition("authIP").await.unwrap();
        assert!(ctx.all().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_keeps_definition() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        ctx.write_definition(&text("authIP")).await.unwrap();
        let file = root.join("definitions/authIP.yaml");
        std::fs::remove_file(&file).unwrap();
        std::fs::create_dir(&file).unwrap();

        let result = ctx.delete_definition("authIP").await;
        assert!(matches!(result, Err(FieldsError::Io(_))));
        assert!(ctx.get("authIP").is_some());
    }

    #[tokio::test]
    async fn values_that_leave_the_directory_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        for value in ["../escaped", "nested/name", "..", ".hidden", ""] {
            let result = ctx.write_definition(&text(value)).await;
            assert!(
                matches!(result, Err(FieldsError::InvalidFileName { .. })),
                "{value:?} accepted"
            );
        }
        assert!(!root.join("escaped.yaml").exists());
        assert!(!tmp.path().join("escaped.yaml").exists());
        assert!(ctx.all().is_empty());
    }

    #[tokio::test]
    async fn unsafe_default_fails_to_seed() {
        let tmp = TempDir::new().unwrap();
        let result = CatalogueContext::open(tmp.path().join("catalogue"))
            .with_defaults(CatalogueDefaults::new().definition(text("../escaped")))
            .build()
            .await;
        assert!(matches!(result, Err(FieldsError::InvalidFileName { .. })));
        assert!(!tmp.path().join("escaped.yaml").exists());
    }

    #[tokio::test]
    async fn delete_nonexistent_definition_errors() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        let result = ctx.delete_definition("missing").await;
        assert!(matches!(result, Err(FieldsError::DefinitionNotFound { .. })));
    }

    #[tokio::test]
    async fn definitions_sorted_by_order_then_value() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        let mut ctx = CatalogueContext::open(&root).build().await.unwrap();

        ctx.write_definition(&text("zeta").with_order(0)).await.unwrap();
        ctx.write_definition(&text("beta").with_order(1)).await.unwrap();
        ctx.write_definition(&text("alpha").with_order(1)).await.unwrap();

        let values: Vec<_> = ctx.all().iter().map(|d| d.value.as_str()).collect();
        assert_eq!(values, vec!["zeta", "alpha", "beta"]);

        let catalogue = ctx.catalogue().unwrap();
        assert_eq!(catalogue.position("alpha"), Some(1));
    }

    #[tokio::test]
    async fn invalid_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");
        std::fs::create_dir_all(root.join("definitions")).unwrap();
        std::fs::write(root.join("definitions/broken.yaml"), "value: [unclosed").unwrap();
        std::fs::write(root.join("definitions/notes.txt"), "ignored").unwrap();

        let ctx = CatalogueContext::open(&root)
            .with_defaults(sample_defaults())
            .build()
            .await
            .unwrap();
        assert_eq!(ctx.all().len(), 2);
    }

    #[tokio::test]
    async fn first_open_seeds_all_defaults() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");

        let ctx = CatalogueContext::open(&root)
            .with_defaults(sample_defaults())
            .build()
            .await
            .unwrap();

        assert_eq!(ctx.all().len(), 2);
        assert_eq!(ctx.all()[0].value, "concurrentUsers");
        assert!(root.join("definitions/concurrentUsers.yaml").exists());
        assert!(root.join("definitions/authIP.yaml").exists());
    }

    #[tokio::test]
    async fn user_modified_definitions_preserved() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");

        let mut ctx = CatalogueContext::open(&root)
            .with_defaults(sample_defaults())
            .build()
            .await
            .unwrap();

        let mut auth = ctx.get("authIP").unwrap().clone();
        auth.label = "Authorised IP ranges".into();
        ctx.write_definition(&auth).await.unwrap();
        drop(ctx);

        let ctx = CatalogueContext::open(&root)
            .with_defaults(sample_defaults())
            .build()
            .await
            .unwrap();

        assert_eq!(ctx.all().len(), 2);
        assert_eq!(ctx.get("authIP").unwrap().label, "Authorised IP ranges");
    }

    #[tokio::test]
    async fn new_defaults_added_on_reopen() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("catalogue");

        let _ctx = CatalogueContext::open(&root)
            .with_defaults(CatalogueDefaults::new().definition(text("authIP")))
            .build()
            .await
            .unwrap();

        let ctx = CatalogueContext::open(&root)
            .with_defaults(
                CatalogueDefaults::new()
                    .definition(text("authIP"))
                    .definition(text("walkInAccess")),
            )
            .build()
            .await
            .unwrap();

        assert_eq!(ctx.all().len(), 2);
        assert!(ctx.get("walkInAccess").is_some());
    }
}
