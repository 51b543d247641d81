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

//! The PDF side of signing: placeholders in the serialized file and the
//! Document Security Store.

mod dss;
mod object;
mod placeholder;

pub use dss::{compute_vri_key, DssBuilder, DssError};
pub use object::{
    MemoryObjectStore, ObjectRef, ObjectStore, PdfDictionary, PdfObject, PdfStream,
};
pub use placeholder::{
    byte_range_placeholder, contents_placeholder, patch_byte_range, patch_contents,
    read_contents, ByteRangeValues, PlaceholderError, PlaceholderInfo, BYTE_RANGE_WIDTH,
};
