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

//! Document Security Store (DSS) with per-signature Validation-Related
//! Information (VRI), as defined by ETSI EN 319 142-1 (PAdES) and
//! ISO 32000-2 section 12.8.4.3.

use indexmap::IndexMap;
use thiserror::Error;

use super::object::{ObjectRef, ObjectStore, PdfDictionary, PdfObject, PdfStream};
use crate::{crypto::hash::sha1, ltv::LtvData};

/// Describes errors that can occur while loading or writing a DSS.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum DssError {
    /// The catalog's `DSS` entry is not a dictionary.
    #[error("DSS is not a dictionary")]
    NotADictionary,

    /// A reference in the DSS does not resolve.
    #[error("DSS references missing object {} {} R", .0.number, .0.generation)]
    UnresolvedReference(ObjectRef),
}

/// Key of a VRI entry: uppercase hex SHA-1 of `bytes`.
///
/// For a signature, `bytes` is the `/Contents` value exactly as it sits in
/// the file, trailing zero padding included.
pub fn compute_vri_key(bytes: &[u8]) -> String {
    hex::encode_upper(sha1(bytes))
}

/// Content-addressed blobs, each persisted at most once.
#[derive(Debug, Default)]
struct Pool {
    entries: IndexMap<String, PoolEntry>,
}

#[derive(Debug)]
struct PoolEntry {
    data: Vec<u8>,
    reference: Option<ObjectRef>,
}

impl Pool {
    /// Add `data` if new and return its key. The first reference seen for
    /// a blob is the one kept.
    fn add(&mut self, data: &[u8], reference: Option<ObjectRef>) -> String {
        let key = hex::encode(sha1(data));

        let entry = self.entries.entry(key.clone()).or_insert_with(|| PoolEntry {
            data: data.to_vec(),
            reference: None,
        });
        if entry.reference.is_none() {
            entry.reference = reference;
        }

        key
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Register streams for new blobs and return every reference, in pool
    /// order.
    fn persist(&mut self, store: &mut dyn ObjectStore) -> Vec<PdfObject> {
        self.entries
            .values_mut()
            .map(|entry| {
                let reference = *entry.reference.get_or_insert_with(|| {
                    store.register(PdfObject::Stream(PdfStream {
                        dict: PdfDictionary::new(),
                        data: entry.data.clone(),
                    }))
                });
                PdfObject::Reference(reference)
            })
            .collect()
    }

    fn references(&self, keys: &[String]) -> Vec<PdfObject> {
        keys.iter()
            .filter_map(|key| self.entries.get(key))
            .filter_map(|entry| entry.reference)
            .map(PdfObject::Reference)
            .collect()
    }
}

#[derive(Debug)]
enum VriEntry {
    /// Loaded from the document and written back untouched, under the key
    /// as the document spells it.
    Existing { key: String, value: PdfObject },

    New {
        certs: Vec<String>,
        ocsps: Vec<String>,
        crls: Vec<String>,
        time: String,
    },
}

/// Accumulates LTV data into a DSS dictionary.
///
/// Certificates, OCSP responses and CRLs are pooled document-wide and
/// stored once each. A VRI entry, once present, is never replaced: the
/// first validation context recorded for a signature wins.
#[derive(Debug, Default)]
pub struct DssBuilder {
    certs: Pool,
    ocsps: Pool,
    crls: Pool,
    vri: IndexMap<String, VriEntry>,
    other: PdfDictionary,
}

impl DssBuilder {
    /// An empty DSS.
    pub fn create() -> Self {
        Self::default()
    }

    /// Load the DSS referenced from the document catalog, or start empty if
    /// there is none.
    ///
    /// Existing objects keep their references, so content already in the
    /// document is never written twice.
    pub fn from_catalog(store: &dyn ObjectStore) -> Result<Self, DssError> {
        let mut builder = Self::create();

        let Some(entry) = store.catalog_entry("DSS") else {
            return Ok(builder);
        };

        let dss = resolve(store, entry)?
            .as_dict()
            .ok_or(DssError::NotADictionary)?;

        for (key, value) in dss {
            match key.as_str() {
                "Certs" => load_pool(store, value, &mut builder.certs)?,
                "OCSPs" => load_pool(store, value, &mut builder.ocsps)?,
                "CRLs" => load_pool(store, value, &mut builder.crls)?,
                "VRI" => {
                    let vri = resolve(store, value)?
                        .as_dict()
                        .ok_or(DssError::NotADictionary)?;
                    for (vri_key, vri_value) in vri {
                        builder.vri.insert(
                            vri_key.to_uppercase(),
                            VriEntry::Existing {
                                key: vri_key.clone(),
                                value: vri_value.clone(),
                            },
                        );
                    }
                }
                "Type" => {}
                _ => {
                    builder.other.insert(key.clone(), value.clone());
                }
            }
        }

        log::debug!(
            "loaded DSS with {} certificates, {} OCSP responses, {} CRLs, {} VRI entries",
            builder.certs.len(),
            builder.ocsps.len(),
            builder.crls.len(),
            builder.vri.len()
        );

        Ok(builder)
    }

    /// Merge one signature's validation data.
    pub fn add_ltv_data(&mut self, ltv: &LtvData) -> &mut Self {
        let certs: Vec<String> = ltv
            .certificates
            .iter()
            .map(|der| self.certs.add(der, None))
            .collect();
        let ocsps: Vec<String> = ltv
            .ocsp_responses
            .iter()
            .map(|der| self.ocsps.add(der, None))
            .collect();
        let crls: Vec<String> = ltv.crls.iter().map(|der| self.crls.add(der, None)).collect();

        let time = ltv.gathered_at.format("D:%Y%m%d%H%M%SZ").to_string();

        let keys = std::iter::once(compute_vri_key(&ltv.cms_bytes))
            .chain(ltv.embedded_timestamps.iter().map(|t| compute_vri_key(t)));

        for key in keys {
            if self.vri.contains_key(&key) {
                log::debug!("VRI {key} already present, keeping it");
                continue;
            }

            self.vri.insert(
                key,
                VriEntry::New {
                    certs: certs.clone(),
                    ocsps: ocsps.clone(),
                    crls: crls.clone(),
                    time: time.clone(),
                },
            );
        }

        self
    }

    /// Number of pooled certificates.
    pub fn certificate_count(&self) -> usize {
        self.certs.len()
    }

    /// Number of pooled OCSP responses.
    pub fn ocsp_count(&self) -> usize {
        self.ocsps.len()
    }

    /// Number of pooled CRLs.
    pub fn crl_count(&self) -> usize {
        self.crls.len()
    }

    /// `true` if a VRI entry exists for `key`.
    pub fn has_vri(&self, key: &str) -> bool {
        self.vri.contains_key(&key.to_uppercase())
    }

    /// Write the DSS dictionary to `store` and return its reference, for the
    /// caller to set as the catalog's `DSS` entry.
    pub fn build(mut self, store: &mut dyn ObjectStore) -> Result<ObjectRef, DssError> {
        let mut dss = PdfDictionary::new();
        dss.insert("Type".into(), PdfObject::Name("DSS".into()));

        let certs = self.certs.persist(store);
        let ocsps = self.ocsps.persist(store);
        let crls = self.crls.persist(store);

        if !certs.is_empty() {
            dss.insert("Certs".into(), PdfObject::Array(certs));
        }
        if !ocsps.is_empty() {
            dss.insert("OCSPs".into(), PdfObject::Array(ocsps));
        }
        if !crls.is_empty() {
            dss.insert("CRLs".into(), PdfObject::Array(crls));
        }

        let mut vri = PdfDictionary::new();
        for (key, entry) in &self.vri {
            let (key, value) = match entry {
                VriEntry::Existing { key, value } => (key, value.clone()),
                VriEntry::New {
                    certs,
                    ocsps,
                    crls,
                    time,
                } => {
                    let mut dict = PdfDictionary::new();
                    for (name, pool, keys) in [
                        ("Cert", &self.certs, certs),
                        ("OCSP", &self.ocsps, ocsps),
                        ("CRL", &self.crls, crls),
                    ] {
                        let refs = pool.references(keys);
                        if !refs.is_empty() {
                            dict.insert(name.into(), PdfObject::Array(refs));
                        }
                    }
                    dict.insert("TU".into(), PdfObject::String(time.clone().into_bytes()));
                    (key, PdfObject::Dictionary(dict))
                }
            };
            vri.insert(key.clone(), value);
        }

        if !vri.is_empty() {
            dss.insert("VRI".into(), PdfObject::Dictionary(vri));
        }

        dss.extend(std::mem::take(&mut self.other));

        Ok(store.register(PdfObject::Dictionary(dss)))
    }
}

fn resolve<'a>(
    store: &'a dyn ObjectStore,
    object: &'a PdfObject,
) -> Result<&'a PdfObject, DssError> {
    match object.as_reference() {
        Some(reference) => store
            .resolve(reference)
            .ok_or(DssError::UnresolvedReference(reference)),
        None => Ok(object),
    }
}

fn load_pool(store: &dyn ObjectStore, value: &PdfObject, pool: &mut Pool) -> Result<(), DssError> {
    let Some(items) = resolve(store, value)?.as_array() else {
        log::warn!("ignoring DSS pool that is not an array");
        return Ok(());
    };

    for item in items {
        let Some(reference) = item.as_reference() else {
            log::warn!("ignoring direct object in DSS pool");
            continue;
        };

        let stream = store
            .resolve(reference)
            .ok_or(DssError::UnresolvedReference(reference))?
            .as_stream();

        match stream {
            Some(stream) => {
                pool.add(&stream.data, Some(reference));
            }
            None => log::warn!("ignoring DSS pool entry that is not a stream"),
        }
    }

    Ok(())
}
