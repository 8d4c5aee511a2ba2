// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian control file primitives.

See <https://www.debian.org/doc/debian-policy/ch-controlfields.html>
for the canonical source of truth for how control files work.

A control file is a sequence of *paragraphs* separated by blank lines. A
paragraph is an ordered sequence of `Name: value` fields where continuation
lines begin with whitespace. Unknown fields round-trip verbatim.
*/

use {
    crate::error::{FaptlyError, Result},
    std::io::{BufRead, Write},
};

/// A field in a control paragraph.
///
/// The value is stored with its original formatting: continuation lines
/// keep their embedded newline and leading space.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ControlField {
    name: String,
    value: String,
}

impl ControlField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The name of this field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value as stored, including any continuation formatting.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Iterate over the lines of the value, leading whitespace stripped.
    pub fn iter_lines(&self) -> impl Iterator<Item = &str> {
        self.value.lines().map(|l| l.trim_start())
    }

    /// Iterate over whitespace separated words in the value.
    pub fn iter_words(&self) -> impl Iterator<Item = &str> {
        self.value.split_ascii_whitespace()
    }

    /// Write `Name: value\n` to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.name.as_bytes())?;
        writer.write_all(b": ")?;
        writer.write_all(self.value.as_bytes())?;
        writer.write_all(b"\n")
    }
}

/// A paragraph in a control file.
///
/// Field names are case insensitive on read and case preserving on set.
/// Setting a field that already exists replaces the previous value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ControlParagraph {
    fields: Vec<ControlField>,
}

impl ControlParagraph {
    /// Whether the paragraph has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set a field, replacing any existing field of the same name.
    pub fn set_field(&mut self, field: ControlField) {
        self.fields
            .retain(|f| !f.name.eq_ignore_ascii_case(&field.name));
        self.fields.push(field);
    }

    /// Set a field from name and value strings.
    pub fn set_field_from_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_field(ControlField::new(name, value));
    }

    /// Set a multiline field from an iterable of rows.
    ///
    /// Rows are emitted as continuation lines following an empty first
    /// line, the form hash manifests take in `Release` files.
    pub fn set_multiline_field(
        &mut self,
        name: impl Into<String>,
        rows: impl Iterator<Item = String>,
    ) {
        let value = rows.map(|row| format!("\n {}", row)).collect::<String>();
        self.set_field(ControlField::new(name, value));
    }

    /// Obtain the field with the given name.
    pub fn field(&self, name: &str) -> Option<&ControlField> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Whether a named field is present.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Obtain the raw string value of the named field.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value())
    }

    /// Obtain the value of a field parsed as a [u64].
    pub fn field_u64(&self, name: &str) -> Option<Result<u64>> {
        self.field_str(name)
            .map(|v| v.parse::<u64>().map_err(FaptlyError::from))
    }

    /// Obtain the non-empty lines of the named field, whitespace trimmed.
    ///
    /// Multiline fields carry one entry per continuation line; the empty
    /// first line is skipped.
    pub fn field_lines(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.field(name)
            .map(|f| f.iter_lines().map(|l| l.trim()).filter(|l| !l.is_empty()))
    }

    /// Obtain the whitespace separated words of the named field.
    pub fn field_words(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.field(name).map(|f| f.iter_words())
    }

    /// Iterate over fields in insertion order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &ControlField> {
        self.fields.iter()
    }

    /// Serialize the paragraph to a writer.
    ///
    /// A trailing newline is written as part of the final field, but no
    /// blank paragraph separator is emitted.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for field in &self.fields {
            field.write(writer)?;
        }

        Ok(())
    }
}

impl std::fmt::Display for ControlParagraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for field in &self.fields {
            writeln!(f, "{}: {}", field.name, field.value)?;
        }

        Ok(())
    }
}

/// Holds parsing state for control files.
///
/// Instances are fed lines of text and emit a [ControlParagraph] whenever
/// a blank line (or end of input) completes one.
#[derive(Clone, Debug, Default)]
pub struct ControlParser {
    paragraph: ControlParagraph,
    field: Option<String>,
}

impl ControlParser {
    /// Feed a line (including its line terminator) to the parser.
    ///
    /// Returns a completed paragraph when the line terminates one.
    pub fn write_line(&mut self, line: &str) -> Result<Option<ControlParagraph>> {
        let is_empty_line = line.trim().is_empty();
        let is_continuation = line.starts_with(' ') || line.starts_with('\t');

        let current = self.field.take();

        if is_empty_line {
            if let Some(field) = current {
                self.flush_field(field)?;
            }

            return Ok(if self.paragraph.is_empty() {
                None
            } else {
                Some(std::mem::take(&mut self.paragraph))
            });
        }

        match (current, is_continuation) {
            // A new field begins; flush the one on the stack.
            (Some(field), false) => {
                self.flush_field(field)?;
                self.field = Some(line.to_string());
            }
            // Continuation line; accumulate into the current field.
            (Some(field), true) => {
                self.field = Some(field + line);
            }
            (None, false) => {
                self.field = Some(line.to_string());
            }
            (None, true) => {
                return Err(FaptlyError::ControlParse(format!(
                    "continuation line without a field: {:?}",
                    line
                )));
            }
        }

        Ok(None)
    }

    /// Finish parsing, returning a final paragraph if one is in progress.
    pub fn finish(mut self) -> Result<Option<ControlParagraph>> {
        if let Some(field) = self.field.take() {
            self.flush_field(field)?;
        }

        Ok(if self.paragraph.is_empty() {
            None
        } else {
            Some(self.paragraph)
        })
    }

    fn flush_field(&mut self, raw: String) -> Result<()> {
        let (name, value) = raw.split_once(':').ok_or_else(|| {
            FaptlyError::ControlParse(format!("error parsing line {:?}; missing colon", raw))
        })?;

        self.paragraph
            .set_field_from_string(name.to_string(), value.trim().to_string());

        Ok(())
    }
}

/// An iterator of [ControlParagraph] read from a buffered reader.
pub struct ControlParagraphReader<R: BufRead> {
    reader: R,
    parser: Option<ControlParser>,
}

impl<R: BufRead> ControlParagraphReader<R> {
    /// Create a new instance bound to a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parser: Some(ControlParser::default()),
        }
    }

    fn get_next(&mut self) -> Result<Option<ControlParagraph>> {
        let mut parser = self.parser.take().expect("parser present when iterating");

        loop {
            let mut line = String::new();

            if self.reader.read_line(&mut line)? == 0 {
                return parser.finish();
            }

            if let Some(paragraph) = parser.write_line(&line)? {
                self.parser.replace(parser);
                return Ok(Some(paragraph));
            }
        }
    }
}

impl<R: BufRead> Iterator for ControlParagraphReader<R> {
    type Item = Result<ControlParagraph>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.parser.is_none() {
            None
        } else {
            match self.get_next() {
                Ok(Some(paragraph)) => Some(Ok(paragraph)),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            }
        }
    }
}
