// thai-idcard/src/card/fields.rs
//! Field table: where each text field lives and how its bytes decode.

use crate::constants::{self, PART_SEPARATOR};
use crate::types::FieldName;
use crate::utils::decode_fixed_field;

/// How the raw bytes of a field turn into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// Trimmed TIS-620 text.
    Text,
    /// `title#first#middle#last`.
    Name,
    /// `#`-separated parts joined with single spaces.
    Address,
}

/// Fixed-width field read with a single READ BINARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub field: FieldName,
    pub offset: u16,
    pub len: u8,
    pub rule: DecodeRule,
}

impl FieldLayout {
    const fn new(field: FieldName, layout: (u16, u8), rule: DecodeRule) -> Self {
        Self {
            field,
            offset: layout.0,
            len: layout.1,
            rule,
        }
    }

    /// Layout of `field`; `None` for the chunked photo.
    pub fn of(field: FieldName) -> Option<Self> {
        use DecodeRule::*;
        let layout = match field {
            FieldName::Cid => Self::new(field, constants::CID_LAYOUT, Text),
            FieldName::NameTh => Self::new(field, constants::NAME_TH_LAYOUT, Name),
            FieldName::NameEn => Self::new(field, constants::NAME_EN_LAYOUT, Name),
            FieldName::Birthdate => Self::new(field, constants::BIRTHDATE_LAYOUT, Text),
            FieldName::Gender => Self::new(field, constants::GENDER_LAYOUT, Text),
            FieldName::Issuer => Self::new(field, constants::ISSUER_LAYOUT, Text),
            FieldName::IssueDate => Self::new(field, constants::ISSUE_DATE_LAYOUT, Text),
            FieldName::ExpireDate => Self::new(field, constants::EXPIRE_DATE_LAYOUT, Text),
            FieldName::Address => Self::new(field, constants::ADDRESS_LAYOUT, Address),
            FieldName::Photo => return None,
        };
        Some(layout)
    }

    pub fn decode(&self, bytes: &[u8]) -> FieldValue {
        let text = decode_fixed_field(bytes);
        match self.rule {
            DecodeRule::Text => FieldValue::Text(text),
            DecodeRule::Name => FieldValue::Name(PersonName::parse(&text)),
            DecodeRule::Address => FieldValue::Text(join_address(&text)),
        }
    }
}

/// Name split into its card parts. Missing parts are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    pub title: String,
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl PersonName {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(PART_SEPARATOR).map(|p| p.trim().to_string());
        Self {
            title: parts.next().unwrap_or_default(),
            first: parts.next().unwrap_or_default(),
            middle: parts.next().unwrap_or_default(),
            last: parts.next().unwrap_or_default(),
        }
    }

    /// Parts joined by single spaces, empty ones skipped.
    pub fn full_name(&self) -> String {
        [&self.title, &self.first, &self.middle, &self.last]
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn join_address(raw: &str) -> String {
    raw.split(PART_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decoded value of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Name(PersonName),
    Bytes(Vec<u8>),
}
