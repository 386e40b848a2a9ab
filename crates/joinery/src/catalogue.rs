//! Stores of serialized components keyed by search criteria.
//!
//! A catalogue holds `{id, criteria, obj}` items where `obj` is a
//! [`ComponentRecord`]. [`JsonCatalogue`] keeps items in one JSON document
//! on disk, with a `dbinfo` block written when the catalogue is created.

use std::path::{Path, PathBuf};

use joinery_ir::{criteria_match, CatalogueDocument, CatalogueItem, Criteria, DbInfo, LibInfo};
use tracing::debug;

use crate::component::{Component, LIB_NAME};
use crate::registry::{single_match, Registry};
use crate::{Error, Result};

/// Format version written into new JSON catalogues.
pub const JSON_CATALOGUE_VERSION: &str = "0.1";

/// Read access to a catalogue.
pub trait Catalogue {
    /// Every item, in insertion order.
    fn items(&self) -> &[CatalogueItem];

    /// Items whose criteria contain every pair of `query`.
    fn search(&self, query: &Criteria) -> Vec<&CatalogueItem> {
        self.items()
            .iter()
            .filter(|item| criteria_match(&item.criteria, query))
            .collect()
    }

    /// The single item matching `query`.
    fn find(&self, query: &Criteria) -> Result<&CatalogueItem> {
        single_match(self.search(query), query)
    }

    /// Item with the given id.
    fn item(&self, id: &str) -> Option<&CatalogueItem> {
        self.items().iter().find(|item| item.id == id)
    }

    /// Find the single item matching `query` and rebuild its component.
    fn get(&self, query: &Criteria, registry: &Registry) -> Result<Component> {
        registry.deserialize(&self.find(query)?.obj)
    }
}

/// Catalogue stored as a single JSON document.
///
/// Changes stay in memory until [`JsonCatalogue::save`].
///
/// ```no_run
/// use joinery::{Catalogue, Component, JsonCatalogue, Registry};
/// use joinery::primitives::{register_primitives, Cube};
/// use joinery_params::ParametricObject;
///
/// let mut catalogue = JsonCatalogue::open("parts.json")?;
/// let cube = Component::part(Cube::new([("size", 5.0)])?);
/// catalogue.add("cube_5", &cube, [("size".to_string(), 5.into())], false)?;
/// catalogue.save()?;
///
/// let mut registry = Registry::new();
/// register_primitives(&mut registry);
/// let query: joinery::Criteria = [("size".to_string(), 5.into())].into_iter().collect();
/// let again = catalogue.get(&query, &registry)?;
/// assert_eq!(again.params(), cube.params());
/// # Ok::<(), joinery::Error>(())
/// ```
#[derive(Debug)]
pub struct JsonCatalogue {
    path: Option<PathBuf>,
    doc: CatalogueDocument,
}

impl JsonCatalogue {
    fn fresh_document() -> CatalogueDocument {
        let lib = LibInfo {
            name: LIB_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        CatalogueDocument::new(DbInfo {
            name: "JsonCatalogue".to_string(),
            ver: JSON_CATALOGUE_VERSION.to_string(),
            lib,
        })
    }

    /// Open the catalogue at `path`, or start a new one there if the file
    /// does not exist. Nothing is written until [`save`](Self::save).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            CatalogueDocument::from_json(&std::fs::read_to_string(&path)?)?
        } else {
            Self::fresh_document()
        };
        debug!(path = %path.display(), items = doc.items.len(), "catalogue opened");
        Ok(Self {
            path: Some(path),
            doc,
        })
    }

    /// A catalogue with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: Self::fresh_document(),
        }
    }

    /// Provenance block written at creation.
    pub fn dbinfo(&self) -> &DbInfo {
        &self.doc.dbinfo
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serialize `component` and add it under `id`.
    ///
    /// An existing item with the same id is an error unless `force` is set,
    /// in which case it is removed and the new item appended. Returns the
    /// new item's index.
    pub fn add<I>(&mut self, id: &str, component: &Component, criteria: I, force: bool) -> Result<usize>
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(pos) = self.doc.items.iter().position(|item| item.id == id) {
            if !force {
                return Err(Error::DuplicateCatalogueId(id.to_string()));
            }
            self.doc.items.remove(pos);
        }
        self.doc.items.push(CatalogueItem {
            id: id.to_string(),
            criteria: criteria.into_iter().collect(),
            obj: component.serialize(),
        });
        Ok(self.doc.items.len() - 1)
    }

    /// Write the document to its file; a no-op for in-memory catalogues.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        std::fs::write(path, self.doc.to_json()?)?;
        debug!(path = %path.display(), items = self.doc.items.len(), "catalogue saved");
        Ok(())
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.doc.items.len()
    }

    /// Returns true if the catalogue has no items.
    pub fn is_empty(&self) -> bool {
        self.doc.items.is_empty()
    }
}

impl Catalogue for JsonCatalogue {
    fn items(&self) -> &[CatalogueItem] {
        &self.doc.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{register_primitives, Block, Cube};
    use joinery_params::ParametricObject;
    use serde_json::json;

    fn criteria(pairs: &[(&str, serde_json::Value)]) -> Vec<(String, serde_json::Value)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn query(pairs: &[(&str, serde_json::Value)]) -> Criteria {
        criteria(pairs).into_iter().collect()
    }

    #[test]
    fn duplicate_ids_need_force() {
        let mut cat = JsonCatalogue::in_memory();
        let a = Component::part(Cube::with_defaults().unwrap());
        let b = Component::part(Block::with_defaults().unwrap());
        assert_eq!(cat.add("x", &a, criteria(&[("n", json!(1))]), false).unwrap(), 0);
        cat.add("y", &a, criteria(&[]), false).unwrap();
        assert!(matches!(
            cat.add("x", &b, criteria(&[]), false),
            Err(Error::DuplicateCatalogueId(ref id)) if id == "x"
        ));
        assert_eq!(cat.add("x", &b, criteria(&[]), true).unwrap(), 1);
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.item("x").unwrap().obj.class, "Block");
        assert_eq!(cat.items()[0].id, "y");
    }

    #[test]
    fn search_and_find() {
        let mut cat = JsonCatalogue::in_memory();
        let cube = Component::part(Cube::with_defaults().unwrap());
        cat.add("a", &cube, criteria(&[("type", json!("cube")), ("size", json!(1))]), false)
            .unwrap();
        cat.add("b", &cube, criteria(&[("type", json!("cube")), ("size", json!(2))]), false)
            .unwrap();
        assert_eq!(cat.search(&query(&[("type", json!("cube"))])).len(), 2);
        assert_eq!(cat.find(&query(&[("size", json!(2))])).unwrap().id, "b");
        assert!(matches!(
            cat.find(&query(&[("type", json!("cube"))])),
            Err(Error::SearchMultipleFound { count: 2, .. })
        ));
        assert!(matches!(
            cat.find(&query(&[("size", json!(3))])),
            Err(Error::SearchNoneFound { .. })
        ));
    }

    #[test]
    fn save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parts.json");

        let mut cat = JsonCatalogue::open(&path).unwrap();
        assert!(cat.is_empty());
        assert!(!path.exists());
        let block = Component::part(Block::new([("length", 12.0), ("width", 3.0)]).unwrap());
        cat.add("plank", &block, criteria(&[("kind", json!("plank"))]), false)
            .unwrap();
        cat.save().unwrap();

        let reopened = JsonCatalogue::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.dbinfo().name, "JsonCatalogue");
        assert_eq!(reopened.dbinfo().ver, JSON_CATALOGUE_VERSION);
        assert_eq!(reopened.dbinfo().lib.name, "joinery");

        let mut registry = Registry::new();
        register_primitives(&mut registry);
        let rebuilt = reopened
            .get(&query(&[("kind", json!("plank"))]), &registry)
            .unwrap();
        assert_eq!(rebuilt.params(), block.params());
        assert!(rebuilt.world().is_none());
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonCatalogue::open(&path), Err(Error::Json(_))));
    }
}
