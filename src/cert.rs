// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Certificate identity extraction and identifier matching.
//!
//! Certificates are identified on the command line either by their simple
//! subject name or by their serial number. This module decodes the DER
//! certificate just far enough to answer both questions.
//!
//! The simple name follows the platform's "simple display name" rule: the
//! first Common Name, falling back to Organizational Unit, Organization and
//! finally the PKCS#9 e-mail address attribute.

use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519::{CN, O, OU};
use der::asn1::Any;
use der::{Decode, Tag, Tagged};
use x509_cert::Certificate;
use x509_cert::name::Name;

use crate::error::{CertPurgeError, Result};

/// PKCS#9 emailAddress (1.2.840.113549.1.9.1).
const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// Attributes consulted, in order, when deriving the simple name.
const SIMPLE_NAME_ATTRIBUTES: [ObjectIdentifier; 4] = [CN, OU, O, EMAIL_ADDRESS];

/// Identity of a certificate found in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Full subject distinguished name (e.g. `CN=TEST1,O=Example`).
    pub subject: String,
    /// Simple display name used for name matching. Empty if the subject
    /// carries none of the attributes it is derived from.
    pub simple_name: String,
    /// Serial number as upper-case hex, exactly as encoded.
    pub serial_number: String,
}

impl CertificateRecord {
    /// Decode a DER certificate and extract its identity.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let cert = Certificate::from_der(der)
            .map_err(|e| CertPurgeError::certificate(format!("invalid certificate: {e}")))?;
        Ok(Self::from_certificate(&cert))
    }

    /// Extract the identity of an already decoded certificate.
    pub fn from_certificate(cert: &Certificate) -> Self {
        let tbs = &cert.tbs_certificate;
        Self {
            subject: tbs.subject.to_string(),
            simple_name: simple_name(&tbs.subject).unwrap_or_default(),
            serial_number: hex::encode_upper(tbs.serial_number.as_bytes()),
        }
    }

    /// Case-insensitive comparison of the simple name with `identifier`.
    pub fn matches_name(&self, identifier: &str) -> bool {
        !self.simple_name.is_empty() && eq_ignore_case(&self.simple_name, identifier)
    }

    /// Case-insensitive comparison of the serial number with `identifier`.
    ///
    /// Whitespace and colon separators are ignored and leading zeros are not
    /// significant. Identifiers that are not hexadecimal never match.
    pub fn matches_serial(&self, identifier: &str) -> bool {
        match (
            normalize_serial(&self.serial_number),
            normalize_serial(identifier),
        ) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => false,
        }
    }
}

/// Derive the simple display name of a distinguished name.
pub fn simple_name(name: &Name) -> Option<String> {
    SIMPLE_NAME_ATTRIBUTES
        .iter()
        .find_map(|oid| first_attribute(name, oid))
}

fn first_attribute(name: &Name, oid: &ObjectIdentifier) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter(|atv| atv.oid == *oid)
        .find_map(|atv| decode_directory_string(&atv.value))
}

fn decode_directory_string(value: &Any) -> Option<String> {
    let bytes = value.value();
    match value.tag() {
        Tag::BmpString => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        // T61 names in the wild are Latin-1.
        Tag::TeletexString => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        _ => std::str::from_utf8(bytes).ok().map(str::to_string),
    }
}

/// Normalize a hex serial number for comparison.
///
/// Returns `None` when the input contains anything other than hex digits and
/// the separators `' '` and `':'`.
pub fn normalize_serial(serial: &str) -> Option<String> {
    let digits: String = serial
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        Some("0".to_string())
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
