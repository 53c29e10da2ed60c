//! PDF composition utilities for merging documents.
//!
//! This crate provides low-level PDF manipulation using lopdf:
//! - Deep object copying with cycle detection
//! - Appending the pages of one document to another, in page order
//! - Merging a list of documents (or files) into one

mod error;

pub use error::ComposerError;

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guards against malformed page trees whose `Parent` chain loops.
const MAX_TREE_DEPTH: usize = 64;

/// Tracks the state of copying objects from one document into another.
struct ObjectCopier<'a> {
    source_doc: &'a Document,
    target_doc: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source_doc: &'a Document, target_doc: &'a mut Document) -> Self {
        Self { source_doc, target_doc, id_map: HashMap::new() }
    }

    /// Deep copies an object and everything it references, copying each
    /// source object at most once.
    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }
        let obj = self.source_doc.get_object(source_id)?.clone();
        self.copy_as(source_id, obj)
    }

    /// Copies `obj` as the target counterpart of `source_id`.
    ///
    /// The new ID is registered before recursing so that reference cycles
    /// (annotation -> page -> annotation) resolve to the same target object.
    fn copy_as(&mut self, source_id: ObjectId, obj: Object) -> Result<ObjectId, lopdf::Error> {
        let new_id = self.target_doc.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let new_obj = self.remap_references(obj)?;
        let slot = self
            .target_doc
            .objects
            .get_mut(&new_id)
            .ok_or(lopdf::Error::ObjectNotFound(new_id))?;
        *slot = new_obj;

        Ok(new_id)
    }

    /// Replaces every `Object::Reference` with the ID of its copy.
    fn remap_references(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(arr) => {
                let new_arr = arr
                    .into_iter()
                    .map(|o| self.remap_references(o))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Object::Array(new_arr))
            }
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Stream(stream))
            }
            _ => Ok(obj),
        }
    }

    /// Copies one page without its `Parent` link, so the source page tree
    /// is not dragged along. Inherited attributes are made explicit first.
    fn copy_page(&mut self, page_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        let mut page = self.source_doc.get_dictionary(page_id)?.clone();
        for (key, value) in inherited_attributes(self.source_doc, &page)?.into_iter() {
            if !page.has(&key) {
                page.set(key, value);
            }
        }
        page.remove(b"Parent");
        self.copy_as(page_id, Object::Dictionary(page))
    }
}

/// Collects the inheritable attributes found on the ancestors of `page`,
/// nearest ancestor first.
fn inherited_attributes(doc: &Document, page: &Dictionary) -> Result<Dictionary, lopdf::Error> {
    let mut inherited = Dictionary::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(parent_id) = parent else { break };
        let node = doc.get_dictionary(parent_id)?;
        for key in INHERITABLE_KEYS {
            if !inherited.has(key) {
                if let Ok(value) = node.get(key) {
                    inherited.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(inherited)
}

/// Appends every page of `source` to the end of `target`, in page order.
///
/// Pages and all objects they reference (content streams, resources,
/// fonts, images) are deep-copied under fresh object IDs. Returns the
/// number of pages appended.
pub fn append_document(target: &mut Document, source: Document) -> Result<usize, ComposerError> {
    let source_pages = source.get_pages();
    if source_pages.is_empty() {
        return Ok(0);
    }

    let mut copier = ObjectCopier::new(&source, target);
    let mut copied_page_ids = Vec::with_capacity(source_pages.len());

    // `get_pages` is keyed by page number, so iteration is already in order.
    for page_id in source_pages.values() {
        copied_page_ids.push(copier.copy_page(*page_id)?);
    }

    let root_id = target.trailer.get(b"Root")?.as_reference()?;
    let root_dict = target.get_object_mut(root_id)?.as_dict_mut()?;
    let pages_id = root_dict.get(b"Pages")?.as_reference()?;
    let pages_dict = target.get_object_mut(pages_id)?.as_dict_mut()?;

    let mut kids = pages_dict.get(b"Kids")?.as_array()?.clone();
    let original_count = pages_dict.get(b"Count")?.as_i64()?;

    kids.extend(copied_page_ids.iter().copied().map(Object::Reference));
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", original_count + copied_page_ids.len() as i64);

    for page_id in &copied_page_ids {
        if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(*page_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(copied_page_ids.len())
}

/// Merges documents into one, preserving document order and the page order
/// within each. The first document is used as the base.
pub fn merge_documents(documents: Vec<Document>) -> Result<Document, ComposerError> {
    let mut documents = documents.into_iter();
    let mut merged = documents.next().ok_or(ComposerError::NothingToMerge)?;

    for (position, source) in documents.enumerate() {
        let appended = append_document(&mut merged, source)?;
        debug!("Appended document {} ({} page(s))", position + 2, appended);
    }

    Ok(merged)
}

/// Loads each file and merges them in the given order.
pub fn merge_files<P: AsRef<Path>>(paths: &[P]) -> Result<Document, ComposerError> {
    let documents = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            Document::load(path).map_err(|source| ComposerError::Load {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    merge_documents(documents)
}

/// Compresses and serializes a document.
pub fn save_document<W: Write>(doc: &mut Document, writer: &mut W) -> Result<(), ComposerError> {
    doc.compress();
    doc.save_to(writer).map_err(|e| ComposerError::Save(e.to_string()))?;
    Ok(())
}
