//! Distinguished names.
//!
//! String forms follow RFC 4514: the most significant RDN comes last, so
//! `"CN=Leaf, O=Acme, C=US"` encodes `C` first. Parsing trims whitespace
//! around separators and accepts the short names in [`ATTRIBUTE_NAMES`] or
//! dotted OIDs.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use der::asn1::{Any, Ia5StringRef, ObjectIdentifier, PrintableStringRef, SetOfVec, Utf8StringRef};
use der::{Decode, Encode, Tag, Tagged};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RelativeDistinguishedName};

use crate::error::{Error, Result};
use crate::oids;

/// Short attribute names understood by the string parser and printer.
pub const ATTRIBUTE_NAMES: &[(&str, ObjectIdentifier)] = &[
    ("CN", oids::CN),
    ("SURNAME", oids::SURNAME),
    ("SERIALNUMBER", oids::SERIAL_NUMBER),
    ("C", oids::C),
    ("L", oids::L),
    ("ST", oids::ST),
    ("STREET", oids::STREET),
    ("O", oids::O),
    ("OU", oids::OU),
    ("T", oids::T),
    ("GIVENNAME", oids::GIVEN_NAME),
    ("E", oids::E),
    ("DC", oids::DC),
    ("UID", oids::UID),
];

fn oid_for_short_name(key: &str) -> Option<ObjectIdentifier> {
    let upper = key.to_ascii_uppercase();
    let upper = match upper.as_str() {
        "EMAILADDRESS" => "E",
        other => other,
    };
    ATTRIBUTE_NAMES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, oid)| *oid)
}

fn short_name_for_oid(oid: &ObjectIdentifier) -> Option<&'static str> {
    ATTRIBUTE_NAMES
        .iter()
        .find(|(_, o)| o == oid)
        .map(|(name, _)| *name)
}

/// Text of a directory string attribute value, if it is one.
pub fn attribute_value_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::TeletexString
        | Tag::VisibleString => std::str::from_utf8(value.value()).ok().map(str::to_string),
        Tag::BmpString => {
            let units: Vec<u16> = value
                .value()
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16(&units).ok()
        },
        _ => None,
    }
}

/// An X.500 distinguished name with equality and hashing on its DER form.
#[derive(Clone)]
pub struct X500Name {
    name: Name,
    encoded: Vec<u8>,
}

impl X500Name {
    /// Wrap a decoded `Name`.
    pub fn new(name: Name) -> Result<Self> {
        let encoded = name.to_der()?;
        Ok(Self { name, encoded })
    }

    /// Decode from DER.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::new(Name::from_der(der)?)
    }

    /// Parse an RFC 4514 string such as `"CN=Test, O=Acme, C=US"`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut rdns = Vec::new();
        for rdn in split_unescaped(s, ',') {
            let rdn = rdn.trim();
            if rdn.is_empty() {
                continue;
            }
            let mut atvs = Vec::new();
            for atv in split_unescaped(rdn, '+') {
                atvs.push(parse_attribute(atv.trim())?);
            }
            let set = SetOfVec::try_from(atvs)?;
            rdns.push(RelativeDistinguishedName::from(set));
        }
        rdns.reverse();
        Self::new(x509_cert::name::RdnSequence(rdns))
    }

    /// The underlying `Name`.
    pub fn as_name(&self) -> &Name {
        &self.name
    }

    /// DER encoding.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// True when the name has no RDNs.
    pub fn is_empty(&self) -> bool {
        self.name.0.is_empty()
    }

    /// Every value of the attribute `key` ("CN", "O", ... or a dotted OID),
    /// most significant first.
    pub fn values(&self, key: &str) -> Vec<String> {
        let oid = match oid_for_short_name(key).or_else(|| ObjectIdentifier::new(key).ok()) {
            Some(oid) => oid,
            None => return Vec::new(),
        };
        self.name
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .filter(|atv| atv.oid == oid)
            .filter_map(|atv| attribute_value_string(&atv.value))
            .collect()
    }

    /// First value of the attribute `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values(key).into_iter().next()
    }

    /// The common name.
    pub fn common_name(&self) -> Option<String> {
        self.get("CN")
    }

    /// True when `base` is a prefix of this name, RDN by RDN.
    pub fn is_within(&self, base: &X500Name) -> bool {
        let ours = &self.name.0;
        let theirs = &base.name.0;
        theirs.len() <= ours.len() && ours.iter().zip(theirs.iter()).all(|(a, b)| a == b)
    }
}

impl TryFrom<Name> for X500Name {
    type Error = Error;

    fn try_from(name: Name) -> Result<Self> {
        Self::new(name)
    }
}

impl FromStr for X500Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for X500Name {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for X500Name {}

impl Hash for X500Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Display for X500Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.name.0.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            for (j, atv) in rdn.0.iter().enumerate() {
                if j > 0 {
                    f.write_str("+")?;
                }
                match short_name_for_oid(&atv.oid) {
                    Some(short) => f.write_str(short)?,
                    None => write!(f, "{}", atv.oid)?,
                }
                f.write_str("=")?;
                match attribute_value_string(&atv.value) {
                    Some(text) => f.write_str(&escape_value(&text))?,
                    None => {
                        f.write_str("#")?;
                        let der = atv.value.to_der().map_err(|_| fmt::Error)?;
                        f.write_str(&hex::encode(der))?;
                    },
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for X500Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X500Name({})", self)
    }
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let special = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (i == 0 && (c == '#' || c == ' '))
            || (i == value.chars().count() - 1 && c == ' ');
        if special {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn split_unescaped(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_attribute(atv: &str) -> Result<AttributeTypeAndValue> {
    let (key, value) = atv
        .split_once('=')
        .ok_or_else(|| Error::InvalidArgument(format!("badly formatted name component: {}", atv)))?;
    let key = key.trim();
    let oid = oid_for_short_name(key)
        .or_else(|| ObjectIdentifier::new(key.trim_start_matches("OID.")).ok())
        .ok_or_else(|| Error::InvalidArgument(format!("unknown attribute type: {}", key)))?;
    let text = unescape_value(value.trim());

    let value = if oid == oids::C || oid == oids::SERIAL_NUMBER {
        Any::encode_from(&PrintableStringRef::new(&text)?)?
    } else if oid == oids::E || oid == oids::DC {
        Any::encode_from(&Ia5StringRef::new(&text)?)?
    } else {
        Any::encode_from(&Utf8StringRef::new(&text)?)?
    };
    Ok(AttributeTypeAndValue { oid, value })
}
