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

//! The PKCS#12 key derivation function ([RFC 7292] appendix B) and the MAC
//! that protects the authenticated safe.
//!
//! [RFC 7292]: https://www.rfc-editor.org/rfc/rfc7292#appendix-B

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::crypto::hash::DigestAlgorithm;

/// Diversifier byte selecting what the derived material is used for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub(crate) enum KdfPurpose {
    Key = 1,
    Iv = 2,
    Mac = 3,
}

/// Encode a password as a NUL-terminated big-endian `BMPString`.
pub(crate) fn bmp_password(password: &str) -> Vec<u8> {
    let mut out: Vec<u8> = password
        .encode_utf16()
        .flat_map(|unit| unit.to_be_bytes())
        .collect();
    out.extend_from_slice(&[0, 0]);
    out
}

fn block_len(alg: DigestAlgorithm) -> usize {
    match alg {
        DigestAlgorithm::Sha1 | DigestAlgorithm::Sha256 => 64,
        DigestAlgorithm::Sha384 | DigestAlgorithm::Sha512 => 128,
    }
}

fn fill(input: &[u8], v: usize) -> Vec<u8> {
    if input.is_empty() {
        return Vec::new();
    }
    let len = v * input.len().div_ceil(v);
    input.iter().copied().cycle().take(len).collect()
}

/// Derive `len` bytes from a `BMPString` password.
pub(crate) fn derive(
    alg: DigestAlgorithm,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    purpose: KdfPurpose,
    len: usize,
) -> Vec<u8> {
    let v = block_len(alg);
    let d = vec![purpose as u8; v];

    let mut i = fill(salt, v);
    i.extend(fill(password, v));

    let mut out = Vec::with_capacity(len + alg.output_len());

    while out.len() < len {
        let mut a = alg.digest(&[d.as_slice(), i.as_slice()].concat());
        for _ in 1..iterations.max(1) {
            a = alg.digest(&a);
        }

        let b = fill(&a, v);
        for block in i.chunks_mut(v) {
            let mut carry = 1u16;
            for (x, y) in block.iter_mut().zip(b.iter()).rev() {
                let sum = *x as u16 + *y as u16 + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
        }

        out.extend_from_slice(&a);
    }

    out.truncate(len);
    out
}

fn hmac<M: Mac + hmac::digest::KeyInit>(key: &[u8], data: &[u8]) -> Vec<u8> {
    match <M as Mac>::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

/// Compute the PKCS#12 MAC over `data`.
pub(crate) fn compute_mac(
    alg: DigestAlgorithm,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    data: &[u8],
) -> Vec<u8> {
    let key = derive(
        alg,
        password,
        salt,
        iterations,
        KdfPurpose::Mac,
        alg.output_len(),
    );

    match alg {
        DigestAlgorithm::Sha1 => hmac::<Hmac<Sha1>>(&key, data),
        DigestAlgorithm::Sha256 => hmac::<Hmac<Sha256>>(&key, data),
        DigestAlgorithm::Sha384 => hmac::<Hmac<Sha384>>(&key, data),
        DigestAlgorithm::Sha512 => hmac::<Hmac<Sha512>>(&key, data),
    }
}
