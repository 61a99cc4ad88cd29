//! PKI status codes and failure bits reported in time-stamp responses.

use std::fmt;

use der::asn1::BitString;

use crate::error::{Error, Result};

/// `PKIStatus` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PkiStatus {
    /// The token is present as requested.
    Granted = 0,
    /// The token is present with modifications.
    GrantedWithMods = 1,
    /// The request was refused.
    Rejection = 2,
    /// The request is not yet processed.
    Waiting = 3,
    /// A revocation is imminent.
    RevocationWarning = 4,
    /// A revocation has occurred.
    RevocationNotification = 5,
}

impl PkiStatus {
    /// Status for an encoded value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Granted),
            1 => Some(Self::GrantedWithMods),
            2 => Some(Self::Rejection),
            3 => Some(Self::Waiting),
            4 => Some(Self::RevocationWarning),
            5 => Some(Self::RevocationNotification),
            _ => None,
        }
    }

    /// True for `Granted` and `GrantedWithMods`.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted | Self::GrantedWithMods)
    }
}

/// `PKIFailureInfo` named bit set. Bit 0 is the most significant bit of the
/// first encoded byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PkiFailureInfo(u32);

const NAMES: [&str; 27] = [
    "badAlg",
    "badMessageCheck",
    "badRequest",
    "badTime",
    "badCertId",
    "badDataFormat",
    "wrongAuthority",
    "incorrectData",
    "missingTimeStamp",
    "badPOP",
    "certRevoked",
    "certConfirmed",
    "wrongIntegrity",
    "badRecipientNonce",
    "timeNotAvailable",
    "unacceptedPolicy",
    "unacceptedExtension",
    "addInfoNotAvailable",
    "badSenderNonce",
    "badCertTemplate",
    "signerNotTrusted",
    "transactionIdInUse",
    "unsupportedVersion",
    "notAuthorized",
    "systemUnavail",
    "systemFailure",
    "duplicateCertReq",
];

impl PkiFailureInfo {
    /// Unrecognized or unsupported algorithm identifier.
    pub const BAD_ALG: Self = Self::bit(0);
    /// Transaction not permitted or supported.
    pub const BAD_REQUEST: Self = Self::bit(2);
    /// The data submitted has the wrong format.
    pub const BAD_DATA_FORMAT: Self = Self::bit(5);
    /// The TSA's time source is not available.
    pub const TIME_NOT_AVAILABLE: Self = Self::bit(14);
    /// The requested TSA policy is not supported.
    pub const UNACCEPTED_POLICY: Self = Self::bit(15);
    /// The requested extension is not supported.
    pub const UNACCEPTED_EXTENSION: Self = Self::bit(16);
    /// The additional information requested is not available.
    pub const ADD_INFO_NOT_AVAILABLE: Self = Self::bit(17);
    /// The request cannot be handled due to system failure.
    pub const SYSTEM_FAILURE: Self = Self::bit(25);

    const fn bit(index: u32) -> Self {
        Self(1 << index)
    }

    /// No bits set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// True when no bit is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set here.
    pub fn contains(&self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Union of both bit sets.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Indexes of the set bits.
    pub fn bits(&self) -> impl Iterator<Item = u32> + '_ {
        (0..32).filter(move |i| self.0 & (1 << i) != 0)
    }

    /// DER named bit string: trailing zero bits are dropped.
    pub fn to_bit_string(&self) -> Result<BitString> {
        let highest = match self.bits().last() {
            Some(highest) => highest,
            None => return Ok(BitString::new(0, Vec::new())?),
        };
        let len = (highest / 8 + 1) as usize;
        let mut bytes = vec![0u8; len];
        for i in self.bits() {
            bytes[(i / 8) as usize] |= 0x80 >> (i % 8);
        }
        let unused = (7 - highest % 8) as u8;
        Ok(BitString::new(unused, bytes)?)
    }

    /// Decode from a bit string; bits beyond 31 are rejected.
    pub fn from_bit_string(bits: &BitString) -> Result<Self> {
        let mut value = 0u32;
        for (i, set) in bits.bits().enumerate() {
            if !set {
                continue;
            }
            if i >= 32 {
                return Err(Error::InvalidTsp(format!("unknown failure bit {}", i)));
            }
            value |= 1 << i;
        }
        Ok(Self(value))
    }
}

impl fmt::Display for PkiFailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for i in self.bits() {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            match NAMES.get(i as usize) {
                Some(name) => f.write_str(name)?,
                None => write!(f, "bit{}", i)?,
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}
