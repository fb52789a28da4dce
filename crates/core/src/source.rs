//! Record sources: sequential, restartable access to catchment layers

use crate::error::{Error, Result};
use crate::vector::ShapeRecord;
use std::borrow::Cow;

/// Iterator over the records of a source, borrowed or owned
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Cow<'a, ShapeRecord>>> + 'a>;

/// A catchment layer that can be scanned from the start any number of times.
///
/// Every call to [`RecordSource::records`] must yield the same records in
/// the same order.
pub trait RecordSource {
    /// Attribute field names, in the order used by `ShapeRecord::record`
    fn fields(&self) -> &[String];

    /// Total number of records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a fresh scan over all records
    fn records(&self) -> Result<RecordIter<'_>>;

    /// Position of a field name in each record
    fn field_index(&self, name: &str) -> Result<usize> {
        self.fields()
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| Error::UnknownField {
                name: name.to_string(),
                available: self.fields().join(", "),
            })
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn fields(&self) -> &[String] {
        (**self).fields()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn records(&self) -> Result<RecordIter<'_>> {
        (**self).records()
    }
}

/// In-memory record source
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fields: Vec<String>,
    records: Vec<ShapeRecord>,
}

impl MemorySource {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            records: Vec::new(),
        }
    }

    /// Build a source from field names and records, checking record widths
    pub fn from_records(fields: Vec<String>, records: Vec<ShapeRecord>) -> Result<Self> {
        let mut source = Self::new(fields);
        for record in records {
            source.push(record)?;
        }
        Ok(source)
    }

    /// Append a record; its attribute count must match the field count
    pub fn push(&mut self, record: ShapeRecord) -> Result<()> {
        if record.record.len() != self.fields.len() {
            return Err(Error::MalformedRecord {
                record: self.records.len(),
                reason: format!(
                    "{} attribute values for {} fields",
                    record.record.len(),
                    self.fields.len()
                ),
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&ShapeRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeRecord> {
        self.records.iter()
    }
}

impl RecordSource for MemorySource {
    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn records(&self) -> Result<RecordIter<'_>> {
        Ok(Box::new(self.records.iter().map(|r| Ok(Cow::Borrowed(r)))))
    }
}
