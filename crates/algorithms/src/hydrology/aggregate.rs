//! Basin aggregation: repaired polygon accumulation and area sums

use crate::vector::{cascaded_union, polygon_parts, repair_polygon};
use geo::MultiPolygon;
use ottobasin_core::{AttributeValue, Error, Result, Shape};

/// Read a number stored either natively or as text with a comma or point
/// decimal separator
pub fn parse_number(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        other => other.as_f64(),
    }
}

/// Parse an area attribute.
///
/// Numbers are taken as-is. Strings may use a comma as decimal separator
/// (`"12,5"` is 12.5). Anything else is an `Error::AreaParse`.
pub fn parse_area(value: &AttributeValue, record: usize) -> Result<f64> {
    parse_number(value).ok_or_else(|| Error::AreaParse {
        record,
        value: value.to_string(),
    })
}

/// Accumulates matched catchments for one delineation
#[derive(Debug, Default)]
pub struct BasinAggregator {
    polygons: Vec<MultiPolygon<f64>>,
    area: Option<f64>,
    records: usize,
}

impl BasinAggregator {
    /// Create an aggregator; `sum_area` enables the area accumulator
    pub fn new(sum_area: bool) -> Self {
        Self {
            polygons: Vec::new(),
            area: sum_area.then_some(0.0),
            records: 0,
        }
    }

    /// Add one matched record.
    ///
    /// Every part is repaired and kept. The area attribute, when summing,
    /// is added once for the record regardless of its part count.
    ///
    /// # Errors
    /// `Error::MalformedRecord` for inconsistent part offsets,
    /// `Error::AreaParse` for an unreadable area, and
    /// `Error::MissingAttribute` when summing without an area value. On
    /// error the aggregator is left unchanged.
    pub fn add(&mut self, shape: &Shape, area: Option<&AttributeValue>, record: usize) -> Result<()> {
        let parts = polygon_parts(shape, record)?;

        let contribution = match (self.area, area) {
            (Some(_), Some(value)) => Some(parse_area(value, record)?),
            (Some(_), None) => {
                return Err(Error::MissingAttribute {
                    record,
                    field: "area".to_string(),
                })
            }
            (None, _) => None,
        };

        self.polygons.extend(parts.map(|p| repair_polygon(&p)));
        if let (Some(total), Some(v)) = (self.area.as_mut(), contribution) {
            *total += v;
        }
        self.records += 1;
        Ok(())
    }

    /// Number of records added so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Running area sum, `None` when not summing
    pub fn area(&self) -> Option<f64> {
        self.area
    }

    /// Union every accumulated polygon and return it with the area sum
    pub fn finish(self) -> (MultiPolygon<f64>, Option<f64>) {
        (cascaded_union(self.polygons), self.area)
    }
}
