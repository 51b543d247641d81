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

//! The `/ByteRange` + `/Contents` placeholder protocol.
//!
//! A signature dictionary is serialized with a fixed-width `/ByteRange`
//! array and a `/Contents` hex string full of zeros. Once the rest of the
//! file is final, the byte range is patched in place, the covered bytes are
//! hashed and signed, and the signature is written over the zeros. No byte
//! offset anywhere in the file moves.

use thiserror::Error;

/// Width of the reserved `/ByteRange` array, brackets included.
pub const BYTE_RANGE_WIDTH: usize = 36;

const BYTE_RANGE_KEY: &[u8] = b"/ByteRange";
const CONTENTS_KEY: &[u8] = b"/Contents";

/// Describes errors raised while locating or patching placeholders.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum PlaceholderError {
    /// No `/ByteRange` array was found.
    #[error("no /ByteRange placeholder found")]
    MissingByteRange,

    /// No `/Contents` hex string follows the last `/ByteRange`.
    #[error("no /Contents placeholder found after /ByteRange")]
    MissingContents,

    /// A placeholder was found but is not well formed.
    #[error("malformed placeholder: {0}")]
    Malformed(String),

    /// The patched `/ByteRange` would not occupy exactly the reserved width.
    #[error("/ByteRange must be exactly {expected} bytes wide, got {actual}")]
    ByteRangeWidth {
        /// Reserved width in the buffer.
        expected: usize,
        /// Width of the formatted value.
        actual: usize,
    },

    /// The signature does not fit in the reserved `/Contents` space.
    ///
    /// Retry with a placeholder of at least `requested` bytes.
    #[error("signature needs {requested} bytes but only {available} are reserved")]
    SignatureTooLarge {
        /// Size of the signature in bytes.
        requested: usize,
        /// Size of the placeholder in bytes.
        available: usize,
    },

    /// A byte range points outside the buffer.
    #[error("byte range [0 {length1} {offset2} {length2}] exceeds buffer of {buffer_len} bytes")]
    OutOfBounds {
        /// Length of the first range.
        length1: usize,
        /// Start of the second range.
        offset2: usize,
        /// Length of the second range.
        length2: usize,
        /// Buffer length.
        buffer_len: usize,
    },
}

/// Buffer offsets of the placeholders found by [`PlaceholderInfo::locate`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlaceholderInfo {
    /// Offset of the `[` that opens the `/ByteRange` array.
    pub byte_range_start: usize,

    /// Length of the `/ByteRange` array, brackets included.
    pub byte_range_len: usize,

    /// Offset of the first hex digit of `/Contents`, just past the `<`.
    pub contents_start: usize,

    /// Number of hex digits between `<` and `>`.
    pub contents_len: usize,
}

/// The four numbers of a `/ByteRange` array. The first offset is always 0.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByteRangeValues {
    /// Length of the range before `/Contents`, excluding the `<`.
    pub length1: usize,

    /// Start of the range after `/Contents`, just past the `>`.
    pub offset2: usize,

    /// Length of the range after `/Contents`.
    pub length2: usize,
}

/// The `/ByteRange` value to serialize before the final offsets are known.
pub fn byte_range_placeholder() -> String {
    format_byte_range(0, 0, 0)
}

/// The `/Contents` value reserving `placeholder_size` signature bytes.
pub fn contents_placeholder(placeholder_size: usize) -> String {
    format!("<{}>", "0".repeat(placeholder_size * 2))
}

fn format_byte_range(length1: usize, offset2: usize, length2: usize) -> String {
    format!("[0 {length1:<10} {offset2:<10} {length2:<10}]")
}

fn find_forward(buf: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    buf.get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

fn skip_whitespace(buf: &[u8], mut pos: usize) -> usize {
    while pos < buf.len() && matches!(buf[pos], b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\0') {
        pos += 1;
    }
    pos
}

impl PlaceholderInfo {
    /// Locate the placeholders of the newest signature in `buf`.
    ///
    /// The *last* `/ByteRange` wins, so a document that already carries
    /// signatures in earlier incremental updates patches the newest one.
    pub fn locate(buf: &[u8]) -> Result<Self, PlaceholderError> {
        let key_pos = buf
            .windows(BYTE_RANGE_KEY.len())
            .rposition(|w| w == BYTE_RANGE_KEY)
            .ok_or(PlaceholderError::MissingByteRange)?;

        let byte_range_start = skip_whitespace(buf, key_pos + BYTE_RANGE_KEY.len());
        if buf.get(byte_range_start) != Some(&b'[') {
            return Err(PlaceholderError::Malformed(
                "/ByteRange is not followed by an array".into(),
            ));
        }

        let byte_range_end = find_forward(buf, byte_range_start, b"]").ok_or_else(|| {
            PlaceholderError::Malformed("/ByteRange array is not terminated".into())
        })?;

        let contents_key = find_forward(buf, byte_range_end, CONTENTS_KEY)
            .ok_or(PlaceholderError::MissingContents)?;

        let open = skip_whitespace(buf, contents_key + CONTENTS_KEY.len());
        if buf.get(open) != Some(&b'<') {
            return Err(PlaceholderError::Malformed(
                "/Contents is not followed by a hex string".into(),
            ));
        }

        let close = find_forward(buf, open, b">").ok_or_else(|| {
            PlaceholderError::Malformed("/Contents hex string is not terminated".into())
        })?;

        let contents_start = open + 1;
        let contents_len = close - contents_start;

        if contents_len % 2 != 0 {
            return Err(PlaceholderError::Malformed(
                "/Contents has an odd number of hex digits".into(),
            ));
        }

        Ok(Self {
            byte_range_start,
            byte_range_len: byte_range_end + 1 - byte_range_start,
            contents_start,
            contents_len,
        })
    }

    /// Number of signature bytes the `/Contents` placeholder can hold.
    pub fn available(&self) -> usize {
        self.contents_len / 2
    }

    /// Compute the byte range for a buffer of `buffer_len` bytes.
    pub fn byte_range(&self, buffer_len: usize) -> ByteRangeValues {
        let offset2 = self.contents_start + self.contents_len + 1;
        ByteRangeValues {
            length1: self.contents_start - 1,
            offset2,
            length2: buffer_len.saturating_sub(offset2),
        }
    }
}

impl ByteRangeValues {
    /// `[0, length1, offset2, length2]`
    pub fn as_array(&self) -> [usize; 4] {
        [0, self.length1, self.offset2, self.length2]
    }

    /// Concatenate the two covered ranges of `buf`.
    pub fn signed_bytes(&self, buf: &[u8]) -> Result<Vec<u8>, PlaceholderError> {
        let end2 = self.offset2 + self.length2;
        if self.length1 > self.offset2 || end2 > buf.len() {
            return Err(PlaceholderError::OutOfBounds {
                length1: self.length1,
                offset2: self.offset2,
                length2: self.length2,
                buffer_len: buf.len(),
            });
        }

        let mut signed = Vec::with_capacity(self.length1 + self.length2);
        signed.extend_from_slice(&buf[..self.length1]);
        signed.extend_from_slice(&buf[self.offset2..end2]);
        Ok(signed)
    }
}

/// Write `values` into the reserved `/ByteRange` array.
pub fn patch_byte_range(
    buf: &mut [u8],
    info: &PlaceholderInfo,
    values: &ByteRangeValues,
) -> Result<(), PlaceholderError> {
    let formatted = format_byte_range(values.length1, values.offset2, values.length2);

    if formatted.len() != info.byte_range_len || info.byte_range_len != BYTE_RANGE_WIDTH {
        return Err(PlaceholderError::ByteRangeWidth {
            expected: info.byte_range_len,
            actual: formatted.len(),
        });
    }

    let end = info.byte_range_start + info.byte_range_len;
    buf.get_mut(info.byte_range_start..end)
        .ok_or(PlaceholderError::Malformed(
            "/ByteRange lies outside the buffer".into(),
        ))?
        .copy_from_slice(formatted.as_bytes());

    Ok(())
}

/// Write `signature` into the `/Contents` placeholder as uppercase hex,
/// right-padded with `0`.
pub fn patch_contents(
    buf: &mut [u8],
    info: &PlaceholderInfo,
    signature: &[u8],
) -> Result<(), PlaceholderError> {
    if signature.len() > info.available() {
        return Err(PlaceholderError::SignatureTooLarge {
            requested: signature.len(),
            available: info.available(),
        });
    }

    let mut hex = hex::encode_upper(signature).into_bytes();
    hex.resize(info.contents_len, b'0');

    buf.get_mut(info.contents_start..info.contents_start + info.contents_len)
        .ok_or(PlaceholderError::Malformed(
            "/Contents lies outside the buffer".into(),
        ))?
        .copy_from_slice(&hex);

    Ok(())
}

/// Decode the `/Contents` hex string exactly as it sits in the buffer,
/// trailing zero padding included.
pub fn read_contents(buf: &[u8], info: &PlaceholderInfo) -> Result<Vec<u8>, PlaceholderError> {
    let hex = buf
        .get(info.contents_start..info.contents_start + info.contents_len)
        .ok_or(PlaceholderError::Malformed(
            "/Contents lies outside the buffer".into(),
        ))?;

    hex::decode(hex).map_err(|e| PlaceholderError::Malformed(e.to_string()))
}
