//! Basin delineation over an ottobacia catchment layer
//!
//! Two full scans of the record source:
//! 1. find the first catchment whose polygon contains the outlet (the seed);
//! 2. rescan every catchment, keep those upstream of the seed by reach and
//!    basin code, and union their polygons.
//!
//! The source only needs sequential, restartable iteration; no random
//! access or index is required.

use super::aggregate::{parse_area, BasinAggregator};
use super::basin_code::SeedMatch;
use crate::vector::contains;
use geo::{MultiPolygon, Point};
use ottobasin_core::{Algorithm, Error, MemorySource, RecordSource, Result, ShapeRecord};
use std::borrow::Cow;
use tracing::{debug, info};

/// Parameters for basin delineation
#[derive(Debug, Clone)]
pub struct FindBasinParams {
    /// Field holding the watercourse (reach) code
    pub reach_field: String,
    /// Field holding the hierarchical basin code
    pub basin_field: String,
    /// Optional field holding each catchment's area, summed over the basin
    pub area_field: Option<String>,
    /// Copy the seed reach code into the result
    pub return_reach: bool,
}

impl Default for FindBasinParams {
    fn default() -> Self {
        Self {
            reach_field: "cocursodag".to_string(),
            basin_field: "cobacia".to_string(),
            area_field: None,
            return_reach: false,
        }
    }
}

/// A delineated basin
#[derive(Debug, Clone)]
pub struct BasinResult {
    /// Union of all matched catchments
    pub polygon: MultiPolygon<f64>,
    /// Sum of the area attribute over matched catchments
    pub area: Option<f64>,
    /// Seed reach code, when `return_reach` was set
    pub reach_code: Option<String>,
    /// The catchment containing the outlet
    pub seed: SeedMatch,
    /// Number of catchments aggregated
    pub matched: usize,
}

/// Basin delineation algorithm
#[derive(Debug, Clone, Default)]
pub struct FindBasin;

impl Algorithm for FindBasin {
    type Input = (MemorySource, Point<f64>);
    type Output = Option<BasinResult>;
    type Params = FindBasinParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "FindBasin"
    }

    fn description(&self) -> &'static str {
        "Delineate the ottobacia basin upstream of an outlet point"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (layer, outlet) = input;
        find_basin(&layer, &outlet, &params, None)
    }
}

/// Coarse progress reporter: forwards strictly increasing percentages only
struct Progress<'a> {
    callback: Option<&'a mut dyn FnMut(u8)>,
    current: u8,
}

impl<'a> Progress<'a> {
    fn new(callback: Option<&'a mut dyn FnMut(u8)>) -> Self {
        Self { callback, current: 0 }
    }

    /// Report `processed` of `total` records within a 50-point band at `base`
    fn pass(&mut self, base: u8, processed: usize, total: usize) {
        let within = (processed * 50 / total.max(1)).min(50);
        self.report(base + within as u8);
    }

    fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.current {
            self.current = percent;
            if let Some(callback) = self.callback.as_deref_mut() {
                callback(percent);
            }
        }
    }
}

/// Field positions resolved once per call
struct FieldIndices {
    reach: usize,
    basin: usize,
    area: Option<usize>,
}

impl FieldIndices {
    fn resolve<S: RecordSource + ?Sized>(source: &S, params: &FindBasinParams) -> Result<Self> {
        Ok(Self {
            reach: source.field_index(&params.reach_field)?,
            basin: source.field_index(&params.basin_field)?,
            area: params
                .area_field
                .as_deref()
                .map(|name| source.field_index(name))
                .transpose()?,
        })
    }
}

fn code_at(record: &ShapeRecord, index: usize, field: &str, position: usize) -> Result<String> {
    record
        .attribute(index)
        .and_then(|v| v.as_code())
        .ok_or_else(|| Error::MissingAttribute {
            record: position,
            field: field.to_string(),
        })
}

/// Delineate the basin draining to `outlet`.
///
/// Returns `Ok(None)` when no catchment contains the outlet. The progress
/// callback, if given, receives strictly increasing percentages: 0-50
/// while searching for the seed, 50-100 while aggregating, and always ends
/// at 100.
///
/// # Arguments
/// * `source` - Catchment layer, scanned once or twice from the start
/// * `outlet` - Pour point in the layer's coordinates
/// * `params` - Field names and output options
/// * `progress` - Optional percentage callback
///
/// # Errors
/// Unknown field names, missing or invalid codes, malformed shapes and
/// unreadable area values abort the call.
pub fn find_basin<S>(
    source: &S,
    outlet: &Point<f64>,
    params: &FindBasinParams,
    progress: Option<&mut dyn FnMut(u8)>,
) -> Result<Option<BasinResult>>
where
    S: RecordSource + ?Sized,
{
    let mut progress = Progress::new(progress);
    let fields = FieldIndices::resolve(source, params)?;
    let total = source.len();

    // Pass 1: first catchment containing the outlet
    let mut found: Option<(usize, Cow<'_, ShapeRecord>)> = None;
    for (i, item) in source.records()?.enumerate() {
        let record = item?;
        if contains(outlet, &record.shape, i)? {
            found = Some((i, record));
            break;
        }
        progress.pass(0, i + 1, total);
    }

    let Some((seed_index, seed_record)) = found else {
        debug!(
            "Outlet ({}, {}) is outside all {} catchments",
            outlet.x(),
            outlet.y(),
            total
        );
        progress.report(100);
        return Ok(None);
    };

    let reach = code_at(&seed_record, fields.reach, &params.reach_field, seed_index)?;
    let basin = code_at(&seed_record, fields.basin, &params.basin_field, seed_index)?;
    let seed_area = match fields.area {
        Some(k) => seed_record
            .attribute(k)
            .map(|v| parse_area(v, seed_index))
            .transpose()?,
        None => None,
    };
    let seed = SeedMatch::new(seed_index, reach, basin)?.with_area(seed_area);
    drop(seed_record);

    debug!(
        "Seed catchment {}: reach {} basin {} (length {})",
        seed.record, seed.reach_code, seed.basin_code, seed.code_length
    );

    // Pass 2: fresh scan, aggregate everything upstream of the seed
    let mut aggregator = BasinAggregator::new(fields.area.is_some());
    for (i, item) in source.records()?.enumerate() {
        let record = item?;
        let candidate_reach = code_at(&record, fields.reach, &params.reach_field, i)?;
        if candidate_reach.starts_with(seed.reach_code.as_str()) {
            let candidate_basin = code_at(&record, fields.basin, &params.basin_field, i)?;
            if seed.matches(&candidate_reach, &candidate_basin, i)? {
                let area = fields.area.and_then(|k| record.attribute(k));
                aggregator.add(&record.shape, area, i)?;
            }
        }
        progress.pass(50, i + 1, total);
    }
    progress.report(100);

    let matched = aggregator.records();
    let (polygon, area) = aggregator.finish();

    info!(
        "Basin for reach {} from catchment {}: {} catchments, {} polygons",
        seed.reach_code,
        seed.record,
        matched,
        polygon.0.len()
    );

    Ok(Some(BasinResult {
        polygon,
        area,
        reach_code: params.return_reach.then(|| seed.reach_code.clone()),
        seed,
        matched,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, Coord};
    use ottobasin_core::{AttributeValue, Shape};

    fn square(x0: f64, y0: f64) -> Shape {
        Shape::from_rings(vec![vec![
            Coord { x: x0, y: y0 },
            Coord { x: x0 + 1.0, y: y0 },
            Coord { x: x0 + 1.0, y: y0 + 1.0 },
            Coord { x: x0, y: y0 + 1.0 },
            Coord { x: x0, y: y0 },
        ]])
    }

    fn layer(rows: &[(f64, f64, &str, &str, AttributeValue)]) -> MemorySource {
        let fields = vec![
            "cocursodag".to_string(),
            "cobacia".to_string(),
            "nuareacont".to_string(),
        ];
        let records = rows
            .iter()
            .map(|(x, y, reach, basin, area)| {
                ShapeRecord::new(
                    square(*x, *y),
                    vec![AttributeValue::from(*reach), AttributeValue::from(*basin), area.clone()],
                )
            })
            .collect();
        MemorySource::from_records(fields, records).unwrap()
    }

    fn chain() -> MemorySource {
        // Main stem 76 with a tributary 761 entering from the east
        layer(&[
            (0.0, 0.0, "76", "7611", AttributeValue::Float(1.0)),
            (1.0, 0.0, "76", "7613", AttributeValue::Float(2.0)),
            (2.0, 0.0, "761", "7615", AttributeValue::Float(4.0)),
            (3.0, 0.0, "76", "7605", AttributeValue::Float(8.0)),
            (4.0, 0.0, "77", "7700", AttributeValue::Float(16.0)),
        ])
    }

    #[test]
    fn test_find_basin_upstream_chain() {
        let params = FindBasinParams {
            area_field: Some("nuareacont".to_string()),
            return_reach: true,
            ..Default::default()
        };
        let result = find_basin(&chain(), &Point::new(1.5, 0.5), &params, None)
            .unwrap()
            .unwrap();

        assert_eq!(result.seed.record, 1);
        assert_eq!(result.seed.area, Some(2.0));
        assert_eq!(result.reach_code.as_deref(), Some("76"));
        assert_eq!(result.matched, 2);
        assert_relative_eq!(result.area.unwrap(), 6.0);
        assert_relative_eq!(result.polygon.unsigned_area(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reach_not_returned_unless_requested() {
        let result = find_basin(&chain(), &Point::new(0.5, 0.5), &FindBasinParams::default(), None)
            .unwrap()
            .unwrap();
        assert!(result.reach_code.is_none());
        assert!(result.area.is_none());
        assert_eq!(result.matched, 3);
    }

    #[test]
    fn test_outlet_outside_layer() {
        let mut calls = Vec::new();
        let mut cb = |p: u8| calls.push(p);
        let result = find_basin(
            &chain(),
            &Point::new(50.0, 50.0),
            &FindBasinParams::default(),
            Some(&mut cb),
        )
        .unwrap();
        assert!(result.is_none());
        assert_eq!(calls.iter().filter(|&&p| p == 100).count(), 1);
        assert_eq!(calls.last(), Some(&100));
    }

    #[test]
    fn test_unknown_field() {
        let params = FindBasinParams {
            reach_field: "COCURSODAG".to_string(),
            ..Default::default()
        };
        let err = find_basin(&chain(), &Point::new(0.5, 0.5), &params, None).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn test_area_parse_error_aborts() {
        let source = layer(&[
            (0.0, 0.0, "76", "7611", AttributeValue::from("1,5")),
            (1.0, 0.0, "76", "7613", AttributeValue::from("dois")),
        ]);
        let params = FindBasinParams {
            area_field: Some("nuareacont".to_string()),
            ..Default::default()
        };
        let err = find_basin(&source, &Point::new(0.5, 0.5), &params, None).unwrap_err();
        assert!(matches!(err, Error::AreaParse { record: 1, .. }));
    }

    #[test]
    fn test_missing_reach_code() {
        let source = layer(&[(0.0, 0.0, "76", "7611", AttributeValue::Null)]);
        let mut broken = source.get(0).unwrap().clone();
        broken.record[0] = AttributeValue::Null;
        let source = MemorySource::from_records(source.fields().to_vec(), vec![broken]).unwrap();

        let err = find_basin(&source, &Point::new(0.5, 0.5), &FindBasinParams::default(), None)
            .unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { record: 0, .. }));
    }

    #[test]
    fn test_algorithm_trait() {
        let algo = FindBasin;
        assert_eq!(algo.name(), "FindBasin");
        let result = algo
            .execute_default((chain(), Point::new(3.5, 0.5)))
            .unwrap()
            .unwrap();
        assert_eq!(result.seed.basin_code, "7605");
        // 7605 is the most downstream code on reach 76: the whole 76 system
        assert_eq!(result.matched, 4);
    }
}
