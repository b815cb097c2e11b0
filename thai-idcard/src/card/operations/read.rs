use log::{debug, warn};

use crate::card::fields::{FieldLayout, FieldValue};
use crate::card::photo::{ChunkLayout, PhotoAssembler};
use crate::card::record::{FieldFailure, ReadOutcome};
use crate::card::{Selected, ThaiIdCard};
use crate::protocol::{Command, GetResponseVariant};
use crate::reader::ReaderSession;
use crate::types::FieldName;
use crate::{Error, Result};

use super::exchange;

fn read_binary(
    session: &mut ReaderSession,
    variant: GetResponseVariant,
    field: FieldName,
    offset: u16,
    length: u8,
) -> Result<Vec<u8>> {
    let resp = exchange(session, variant, &Command::ReadBinary { offset, length })?;
    if !resp.is_success() {
        return Err(Error::CardRejected {
            field,
            status_word: resp.status_word,
        });
    }
    if resp.payload.len() != usize::from(length) {
        return Err(Error::MalformedResponse(format!(
            "{} at {:#06x}: expected {} bytes, got {}",
            field,
            offset,
            length,
            resp.payload.len()
        )));
    }
    Ok(resp.payload)
}

/// Read and decode one field. The photo goes through the chunked path with
/// the session's configured layout.
pub fn read_field(
    session: &mut ReaderSession,
    variant: GetResponseVariant,
    field: FieldName,
) -> Result<FieldValue> {
    match FieldLayout::of(field) {
        Some(layout) => {
            let bytes = read_binary(session, variant, field, layout.offset, layout.len)?;
            Ok(layout.decode(&bytes))
        }
        None => {
            let layout = session.config().photo.clone();
            read_photo(session, variant, &layout).map(FieldValue::Bytes)
        }
    }
}

/// Read the photo chunk by chunk. Any failing chunk fails the whole photo;
/// a partial image is never returned.
pub fn read_photo(
    session: &mut ReaderSession,
    variant: GetResponseVariant,
    layout: &ChunkLayout,
) -> Result<Vec<u8>> {
    let chunks = layout.chunks()?;
    let mut photo = PhotoAssembler::new(layout);
    for chunk in &chunks {
        let bytes = read_binary(session, variant, FieldName::Photo, chunk.offset, chunk.len)?;
        photo.push(chunk, &bytes)?;
    }
    debug!("photo assembled from {} chunks ({} bytes)", chunks.len(), photo.len());
    photo.finish()
}

/// Resolve host-supplied names to fields, in request order, once each.
pub fn parse_field_names<S: AsRef<str>>(names: &[S]) -> Vec<FieldName> {
    let mut fields = Vec::with_capacity(names.len());
    for name in names {
        match FieldName::from_wire_name(name.as_ref()) {
            Some(f) if !fields.contains(&f) => fields.push(f),
            Some(_) => {}
            None => debug!("ignoring unknown field {:?}", name.as_ref()),
        }
    }
    fields
}

/// Read `fields` into one outcome. A lost device always aborts; with
/// `abort_on_mandatory` a failing mandatory field aborts too. Every other
/// failure is recorded and the read moves on.
pub fn read_fields(
    card: &mut ThaiIdCard<'_, Selected>,
    fields: &[FieldName],
    abort_on_mandatory: bool,
) -> Result<ReadOutcome> {
    let mut outcome = ReadOutcome::default();
    for &field in fields {
        match read_field(card.session, card.variant, field) {
            Ok(value) => outcome.record.apply(field, value),
            Err(e) if e.is_device_lost() => return Err(e),
            Err(e) if abort_on_mandatory && field.is_mandatory() => return Err(e),
            Err(e) => {
                warn!("reading {} failed: {}", field, e);
                outcome.failures.push(FieldFailure { field, error: e });
            }
        }
    }
    Ok(outcome)
}
