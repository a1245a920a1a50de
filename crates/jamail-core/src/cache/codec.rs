//! Envelope ⇄ JSON document.

use jamail_codec::charset;
use jamail_codec::json::{self, Value};
use jamail_imap::{Address, Envelope};

use crate::Result;

const CHARSET: &str = "UTF-8";

fn addresses_to_value(list: &[Address]) -> json::Result<Value> {
    let mut array = Value::empty_array();
    for address in list {
        let mut item = Value::object();
        item.insert("name", address.name.as_str())?;
        item.insert("email", address.email.as_str())?;
        array.push_back(item)?;
    }
    Ok(array)
}

/// Builds the cache document for an envelope.
///
/// # Errors
///
/// Does not fail in practice; the error type comes from the value
/// mutators.
pub fn envelope_to_value(envelope: &Envelope) -> json::Result<Value> {
    let mut doc = Value::object();
    doc.insert("sender", addresses_to_value(&envelope.sender)?)?;
    doc.insert("from", addresses_to_value(&envelope.from)?)?;
    doc.insert("to", addresses_to_value(&envelope.to)?)?;
    doc.insert("cc", addresses_to_value(&envelope.cc)?)?;
    doc.insert("bcc", addresses_to_value(&envelope.bcc)?)?;
    doc.insert("reply_to", addresses_to_value(&envelope.reply_to)?)?;
    doc.insert("subject", envelope.subject.as_str())?;
    doc.insert("date", envelope.date.as_str())?;
    doc.insert("parent_id", envelope.parent_id.as_str())?;
    doc.insert("message_id", envelope.message_id.as_str())?;
    Ok(doc)
}

// Missing (null) strings read as empty.
fn string_field(value: &Value, key: &str) -> json::Result<String> {
    match value.get(key)? {
        Value::Null => Ok(String::new()),
        other => other.into_string(),
    }
}

fn address_field(value: &Value, key: &str) -> json::Result<Vec<Address>> {
    let list = value.get(key)?;
    if list.is_null() {
        return Ok(Vec::new());
    }
    list.array()?
        .iter()
        .map(|item| {
            Ok(Address {
                name: string_field(item, "name")?,
                email: string_field(item, "email")?,
            })
        })
        .collect()
}

/// Reads an envelope back from its cache document. The id is left at 0.
///
/// # Errors
///
/// Returns a type error if the document is not an object or a key holds
/// the wrong kind of value.
pub fn envelope_from_value(value: &Value) -> json::Result<Envelope> {
    Ok(Envelope {
        id: 0,
        date: string_field(value, "date")?,
        subject: string_field(value, "subject")?,
        from: address_field(value, "from")?,
        sender: address_field(value, "sender")?,
        reply_to: address_field(value, "reply_to")?,
        to: address_field(value, "to")?,
        cc: address_field(value, "cc")?,
        bcc: address_field(value, "bcc")?,
        parent_id: string_field(value, "parent_id")?,
        message_id: string_field(value, "message_id")?,
    })
}

/// Serializes an envelope to UTF-8 document bytes.
///
/// # Errors
///
/// Returns an error if the text cannot be encoded.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>> {
    let text = envelope_to_value(envelope)?.serialize(0);
    Ok(charset::encode(&text, CHARSET)?)
}

/// Parses UTF-8 document bytes back into an envelope.
///
/// # Errors
///
/// Returns an error for invalid UTF-8, invalid JSON or a document of the
/// wrong shape.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope> {
    let text = charset::decode(bytes, CHARSET)?;
    let value: Value = text.parse()?;
    Ok(envelope_from_value(&value)?)
}
