// SPDX-License-Identifier: GPL-3.0-or-later

//! The module contains functions to serialize entries into a JSON array.
//!
//! The main objective is to serialize entries from an iterator into a JSON
//! array, without loading everything into memory at once. The layout of the
//! array (indentation width and key order) is driven by the format argument.
//!
//! The format these methods are producing is a JSON array of objects.
//! It's *not* JSON lines format, which is a sequence of JSON objects
//! separated by newlines.

use std::io;

use serde::ser::{SerializeSeq, Serializer};
use serde_json::ser::PrettyFormatter;

use super::{Entry, EntryFormat};

/// Serialize entries from an iterator into a JSON array.
pub(super) fn write_array<W>(
    writer: W,
    entries: impl Iterator<Item = Entry>,
    format: &EntryFormat,
) -> Result<(), serde_json::Error>
where
    W: io::Write,
{
    let indent = " ".repeat(format.indent);
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    let mut seq = ser.serialize_seq(None)?;
    for entry in entries {
        if format.sort_keys {
            // The generic JSON object is backed by an ordered map,
            // the keys come out alphabetically.
            let value = serde_json::to_value(&entry)?;
            seq.serialize_element(&value)?;
        } else {
            seq.serialize_element(&entry)?;
        }
    }
    seq.end()
}
