// thai-idcard/src/card/record.rs

use std::collections::BTreeSet;

use crate::Error;
use crate::card::fields::{FieldValue, PersonName};
use crate::types::FieldName;

/// Citizen data read from one card. Fields that were not requested, or
/// whose read failed, stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardRecord {
    pub cid: Option<String>,
    pub name_th: Option<PersonName>,
    pub name_en: Option<PersonName>,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
    pub issuer: Option<String>,
    pub issue_date: Option<String>,
    pub expire_date: Option<String>,
    pub address: Option<String>,
    pub photo: Option<Vec<u8>>,
}

impl CardRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded value. A value of the wrong shape for `field` is
    /// ignored.
    pub fn apply(&mut self, field: FieldName, value: FieldValue) {
        match (field, value) {
            (FieldName::NameTh, FieldValue::Name(n)) => self.name_th = Some(n),
            (FieldName::NameEn, FieldValue::Name(n)) => self.name_en = Some(n),
            (FieldName::Photo, FieldValue::Bytes(b)) => self.photo = Some(b),
            (FieldName::Cid, FieldValue::Text(t)) => self.cid = Some(t),
            (FieldName::Birthdate, FieldValue::Text(t)) => self.birthdate = Some(t),
            (FieldName::Gender, FieldValue::Text(t)) => self.gender = Some(t),
            (FieldName::Issuer, FieldValue::Text(t)) => self.issuer = Some(t),
            (FieldName::IssueDate, FieldValue::Text(t)) => self.issue_date = Some(t),
            (FieldName::ExpireDate, FieldValue::Text(t)) => self.expire_date = Some(t),
            (FieldName::Address, FieldValue::Text(t)) => self.address = Some(t),
            (field, value) => log::warn!("value {:?} does not fit field {}", value, field),
        }
    }

    pub fn has(&self, field: FieldName) -> bool {
        match field {
            FieldName::Cid => self.cid.is_some(),
            FieldName::NameTh => self.name_th.is_some(),
            FieldName::NameEn => self.name_en.is_some(),
            FieldName::Birthdate => self.birthdate.is_some(),
            FieldName::Gender => self.gender.is_some(),
            FieldName::Issuer => self.issuer.is_some(),
            FieldName::IssueDate => self.issue_date.is_some(),
            FieldName::ExpireDate => self.expire_date.is_some(),
            FieldName::Address => self.address.is_some(),
            FieldName::Photo => self.photo.is_some(),
        }
    }

    /// Fields holding a value.
    pub fn fields(&self) -> BTreeSet<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|f| self.has(*f))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CardRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        if let Some(cid) = &self.cid {
            map.serialize_entry("cid", cid)?;
        }
        for (suffix, name) in [("TH", &self.name_th), ("EN", &self.name_en)] {
            if let Some(n) = name {
                map.serialize_entry(&format!("title{}", suffix), &n.title)?;
                map.serialize_entry(&format!("firstname{}", suffix), &n.first)?;
                map.serialize_entry(&format!("middlename{}", suffix), &n.middle)?;
                map.serialize_entry(&format!("lastname{}", suffix), &n.last)?;
            }
        }
        let texts = [
            ("birthdate", &self.birthdate),
            ("gender", &self.gender),
            ("issuer", &self.issuer),
            ("issueDate", &self.issue_date),
            ("expireDate", &self.expire_date),
            ("address", &self.address),
        ];
        for (key, value) in texts {
            if let Some(v) = value {
                map.serialize_entry(key, v)?;
            }
        }
        if let Some(photo) = &self.photo {
            map.serialize_entry("photo", photo)?;
        }
        map.end()
    }
}

/// A field that could not be read.
#[derive(Debug)]
pub struct FieldFailure {
    pub field: FieldName,
    pub error: Error,
}

/// Result of a read: the fields that decoded plus what failed.
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub record: CardRecord,
    pub failures: Vec<FieldFailure>,
}

impl ReadOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, field: FieldName) -> Option<&Error> {
        self.failures
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.error)
    }
}
