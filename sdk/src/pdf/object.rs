// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! The narrow slice of a PDF object model the DSS builder needs.
//!
//! Embedders adapt their own document model by implementing
//! [`ObjectStore`]. [`MemoryObjectStore`] is a self-contained
//! implementation used in tests and by callers that serialize the objects
//! themselves.

use indexmap::IndexMap;

/// A dictionary with keys kept in insertion order. Keys are stored without
/// the leading `/`.
pub type PdfDictionary = IndexMap<String, PdfObject>;

/// An indirect object reference (`12 0 R`).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectRef {
    /// Object number.
    pub number: u32,

    /// Generation number.
    pub generation: u16,
}

impl ObjectRef {
    /// Create a reference to generation 0 of `number`.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            generation: 0,
        }
    }
}

/// A stream: a dictionary plus decoded data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PdfStream {
    /// The stream dictionary, without `/Length`.
    pub dict: PdfDictionary,

    /// The decoded stream data.
    pub data: Vec<u8>,
}

/// PDF objects, as far as this crate needs them.
#[derive(Clone, Debug, PartialEq)]
pub enum PdfObject {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// An integer.
    Integer(i64),
    /// A name, without the leading `/`.
    Name(String),
    /// A literal or hex string.
    String(Vec<u8>),
    /// An array.
    Array(Vec<PdfObject>),
    /// A dictionary.
    Dictionary(PdfDictionary),
    /// A stream.
    Stream(PdfStream),
    /// An indirect reference.
    Reference(ObjectRef),
}

impl PdfObject {
    /// The dictionary, if this is one.
    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            Self::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// The elements, if this is an array.
    pub fn as_array(&self) -> Option<&[PdfObject]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The reference, if this is one.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Self::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// The stream, if this is one.
    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            Self::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Object registry of a document being saved.
pub trait ObjectStore {
    /// Register `object` as a new indirect object and return its reference.
    fn register(&mut self, object: PdfObject) -> ObjectRef;

    /// Resolve an indirect reference.
    fn resolve(&self, reference: ObjectRef) -> Option<&PdfObject>;

    /// Look up an entry of the document catalog, e.g. `DSS`.
    fn catalog_entry(&self, key: &str) -> Option<&PdfObject>;
}

/// An [`ObjectStore`] that keeps everything in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryObjectStore {
    objects: Vec<PdfObject>,
    catalog: PdfDictionary,
}

impl MemoryObjectStore {
    /// Set a catalog entry.
    pub fn set_catalog_entry(&mut self, key: &str, value: PdfObject) {
        self.catalog.insert(key.to_owned(), value);
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn register(&mut self, object: PdfObject) -> ObjectRef {
        self.objects.push(object);
        // object numbers start at 1
        ObjectRef::new(self.objects.len() as u32)
    }

    fn resolve(&self, reference: ObjectRef) -> Option<&PdfObject> {
        if reference.generation != 0 {
            return None;
        }
        let index = (reference.number as usize).checked_sub(1)?;
        self.objects.get(index)
    }

    fn catalog_entry(&self, key: &str) -> Option<&PdfObject> {
        self.catalog.get(key)
    }
}
