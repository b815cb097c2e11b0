// thai-idcard/src/card/mod.rs
//! Thai national ID applet: selection, field reads and photo reassembly.

use std::marker::PhantomData;

use log::debug;

use crate::constants::THAI_ID_AID;
use crate::protocol::{Command, GetResponseVariant};
use crate::reader::ReaderSession;
use crate::types::FieldName;
use crate::{Error, Result};

pub mod fields;
pub mod operations;
pub mod photo;
pub mod record;

pub use fields::{DecodeRule, FieldLayout, FieldValue, PersonName};
pub use photo::{Chunk, ChunkLayout, PhotoAssembler};
pub use record::{CardRecord, FieldFailure, ReadOutcome};

/// Type-state markers
pub struct Unselected;
pub struct Selected;

/// A powered card on the session's reader. Field reads only exist once the
/// applet has been selected.
pub struct ThaiIdCard<'s, State = Unselected> {
    session: &'s mut ReaderSession,
    variant: GetResponseVariant,
    _state: PhantomData<State>,
}

impl<'s> ThaiIdCard<'s, Unselected> {
    /// Power the card and negotiate the protocol if that has not happened
    /// for the current handle yet.
    pub fn connect(session: &'s mut ReaderSession) -> Result<Self> {
        let atr = session.ensure_ready()?;
        let variant = GetResponseVariant::from_atr(&atr);
        debug!("GET RESPONSE variant {:?}", variant);
        Ok(Self {
            session,
            variant,
            _state: PhantomData,
        })
    }

    /// SELECT the Thai ID applet. Any status other than success means this
    /// is not a Thai ID card.
    pub fn select(self) -> Result<ThaiIdCard<'s, Selected>> {
        let cmd = Command::SelectApplet {
            aid: THAI_ID_AID.to_vec(),
        };
        let resp = operations::exchange(self.session, self.variant, &cmd)?;
        if !resp.is_success() {
            return Err(Error::CardNotRecognized {
                status_word: resp.status_word,
            });
        }
        Ok(ThaiIdCard {
            session: self.session,
            variant: self.variant,
            _state: PhantomData,
        })
    }

    pub fn variant(&self) -> GetResponseVariant {
        self.variant
    }
}

impl ThaiIdCard<'_, Selected> {
    pub fn read_field(&mut self, field: FieldName) -> Result<FieldValue> {
        operations::read_field(self.session, self.variant, field)
    }

    pub fn read_photo(&mut self) -> Result<Vec<u8>> {
        let layout = self.session.config().photo.clone();
        operations::read_photo(self.session, self.variant, &layout)
    }

    /// Every field. Only a failing citizen ID (or a lost device) aborts.
    pub fn read_all(&mut self) -> Result<ReadOutcome> {
        operations::read_fields(self, &FieldName::ALL, true)
    }

    /// The named fields. Unknown names are ignored, duplicates read once.
    pub fn read_specific<S: AsRef<str>>(&mut self, names: &[S]) -> Result<ReadOutcome> {
        let fields = operations::parse_field_names(names);
        operations::read_fields(self, &fields, false)
    }
}

/// Connect, select and read every field.
pub fn read_all(session: &mut ReaderSession) -> Result<ReadOutcome> {
    ThaiIdCard::connect(session)?.select()?.read_all()
}

/// Connect, select and read the named fields.
pub fn read_specific<S: AsRef<str>>(session: &mut ReaderSession, names: &[S]) -> Result<ReadOutcome> {
    ThaiIdCard::connect(session)?.select()?.read_specific(names)
}
