//! Grant criticality for water-use outlets
//!
//! For every outlet (a withdrawal or discharge point with a granted flow),
//! delineate its basin independently, sum the granted flows of all outlets
//! that fall inside that basin, and compare the sum with half of the
//! basin's Q95 reference flow:
//!
//! ```text
//! Qmax = Q95 / 2
//! capacity factor = sum(granted flows in basin) / Qmax
//! ```
//!
//! A capacity factor above 1 means the basin is over-allocated.

use super::aggregate::parse_number;
use super::delineation::{find_basin, FindBasinParams};
use geo::{Geometry, Intersects, MultiPolygon, Point};
use ottobasin_core::{AttributeValue, Error, FeatureCollection, RecordSource, Result};
use std::collections::HashMap;
use tracing::{info, warn};

/// A water-use point
#[derive(Debug, Clone, PartialEq)]
pub struct Outlet {
    pub id: String,
    pub point: Point<f64>,
    /// Declared flow, in the units the conversion factor expects
    pub flow: f64,
    /// Basin code used to look up the reference flow
    pub basin_ref: String,
}

/// Parameters for the criticality batch
#[derive(Debug, Clone)]
pub struct CriticalityParams {
    /// Delineation settings applied to every outlet
    pub basin: FindBasinParams,
    /// Declared flows are divided by this factor (3.6 converts m3/h to l/s)
    pub conversion_factor: f64,
}

impl Default for CriticalityParams {
    fn default() -> Self {
        Self {
            basin: FindBasinParams {
                area_field: Some("nuareacont".to_string()),
                return_reach: true,
                ..Default::default()
            },
            conversion_factor: 3.6,
        }
    }
}

/// Summary for one outlet whose basin was delineated
#[derive(Debug, Clone)]
pub struct CriticalityRow {
    pub outlet_id: String,
    pub x: f64,
    pub y: f64,
    pub reach_code: String,
    /// Sum of converted flows of all outlets inside the basin, 2 decimals
    pub granted_flow: f64,
    /// Reference flow of the outlet's basin, 2 decimals
    pub q95: f64,
    pub q_max: f64,
    pub capacity_factor: f64,
    /// Summed area attribute of the basin, when requested
    pub drainage_area: Option<f64>,
    pub basin: MultiPolygon<f64>,
}

/// Why an outlet produced no row
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    /// The outlet lies outside every catchment
    OutsideLayer,
    /// No reference flow for the outlet's basin code
    MissingReference(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedOutlet {
    pub outlet_id: String,
    pub reason: UnresolvedReason,
}

/// Result of the batch
#[derive(Debug, Clone, Default)]
pub struct CriticalityReport {
    pub rows: Vec<CriticalityRow>,
    pub unresolved: Vec<UnresolvedOutlet>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compute grant criticality for every outlet.
///
/// Each outlet is delineated on its own; results are not shared between
/// outlets. The optional progress callback receives `(done, total)` after
/// each outlet.
///
/// # Arguments
/// * `source` - Catchment layer
/// * `outlets` - Water-use points
/// * `reference` - Q95 reference flow by basin code
/// * `params` - Delineation fields and flow conversion factor
/// * `progress` - Optional outlet counter
///
/// # Errors
/// Delineation errors abort the batch; a non-positive conversion factor is
/// an `Error::InvalidParameter`.
pub fn grant_criticality<S>(
    source: &S,
    outlets: &[Outlet],
    reference: &HashMap<String, f64>,
    params: &CriticalityParams,
    mut progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Result<CriticalityReport>
where
    S: RecordSource + ?Sized,
{
    if !(params.conversion_factor > 0.0) {
        return Err(Error::InvalidParameter {
            name: "conversion_factor",
            value: params.conversion_factor.to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let basin_params = FindBasinParams {
        return_reach: true,
        ..params.basin.clone()
    };
    let converted: Vec<f64> = outlets
        .iter()
        .map(|o| o.flow / params.conversion_factor)
        .collect();

    let mut report = CriticalityReport::default();
    for (done, outlet) in outlets.iter().enumerate() {
        info!("Outlet {} ({} of {})", outlet.id, done + 1, outlets.len());

        let resolved = match find_basin(source, &outlet.point, &basin_params, None)? {
            None => Err(UnresolvedReason::OutsideLayer),
            Some(basin) => match reference.get(outlet.basin_ref.trim()) {
                None => Err(UnresolvedReason::MissingReference(outlet.basin_ref.clone())),
                Some(&q95) => {
                    let granted: f64 = outlets
                        .iter()
                        .zip(&converted)
                        .filter(|(other, _)| basin.polygon.intersects(&other.point))
                        .map(|(_, flow)| flow)
                        .sum();
                    let granted_flow = round2(granted);
                    let q95 = round2(q95);
                    let q_max = q95 / 2.0;
                    Ok(CriticalityRow {
                        outlet_id: outlet.id.clone(),
                        x: outlet.point.x(),
                        y: outlet.point.y(),
                        reach_code: basin.reach_code.unwrap_or_default(),
                        granted_flow,
                        q95,
                        q_max,
                        capacity_factor: granted_flow / q_max,
                        drainage_area: basin.area,
                        basin: basin.polygon,
                    })
                }
            },
        };

        match resolved {
            Ok(row) => report.rows.push(row),
            Err(reason) => {
                warn!("Outlet {} skipped: {:?}", outlet.id, reason);
                report.unresolved.push(UnresolvedOutlet {
                    outlet_id: outlet.id.clone(),
                    reason,
                });
            }
        }

        if let Some(callback) = progress.as_deref_mut() {
            callback(done + 1, outlets.len());
        }
    }

    Ok(report)
}

/// Build outlets from point features.
///
/// The id comes from `id_field` when given, else from the feature id, else
/// from the feature's position. Flows may use a comma decimal separator.
pub fn outlets_from_features(
    features: &FeatureCollection,
    id_field: Option<&str>,
    flow_field: &str,
    basin_field: &str,
) -> Result<Vec<Outlet>> {
    features
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let point = match &f.geometry {
                Some(Geometry::Point(p)) => *p,
                _ => {
                    return Err(Error::MalformedRecord {
                        record: i,
                        reason: "outlet geometry is not a point".to_string(),
                    })
                }
            };
            let id = id_field
                .and_then(|name| f.get_property(name))
                .filter(|v| !v.is_null())
                .map(|v| v.to_string())
                .or_else(|| f.id.clone())
                .unwrap_or_else(|| i.to_string());
            let flow = f
                .get_property(flow_field)
                .and_then(parse_number)
                .ok_or_else(|| Error::MissingAttribute {
                    record: i,
                    field: flow_field.to_string(),
                })?;
            let basin_ref = f
                .get_property(basin_field)
                .and_then(AttributeValue::as_code)
                .ok_or_else(|| Error::MissingAttribute {
                    record: i,
                    field: basin_field.to_string(),
                })?;
            Ok(Outlet {
                id,
                point,
                flow,
                basin_ref,
            })
        })
        .collect()
}

/// Read a reference-flow table (basin code -> flow) from a record source
pub fn reference_flows<S>(source: &S, key_field: &str, flow_field: &str) -> Result<HashMap<String, f64>>
where
    S: RecordSource + ?Sized,
{
    let key = source.field_index(key_field)?;
    let flow = source.field_index(flow_field)?;

    let mut table = HashMap::with_capacity(source.len());
    for (i, item) in source.records()?.enumerate() {
        let record = item?;
        let code = record
            .attribute(key)
            .and_then(AttributeValue::as_code)
            .ok_or_else(|| Error::MissingAttribute {
                record: i,
                field: key_field.to_string(),
            })?;
        let value = record
            .attribute(flow)
            .and_then(parse_number)
            .ok_or_else(|| Error::MissingAttribute {
                record: i,
                field: flow_field.to_string(),
            })?;
        table.insert(code, value);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Coord;
    use ottobasin_core::{Feature, MemorySource, Shape, ShapeRecord};

    fn square(x0: f64) -> Shape {
        Shape::from_rings(vec![vec![
            Coord { x: x0, y: 0.0 },
            Coord { x: x0 + 1.0, y: 0.0 },
            Coord { x: x0 + 1.0, y: 1.0 },
            Coord { x: x0, y: 1.0 },
            Coord { x: x0, y: 0.0 },
        ]])
    }

    fn layer() -> MemorySource {
        let fields = vec![
            "cocursodag".to_string(),
            "cobacia".to_string(),
            "nuareacont".to_string(),
        ];
        let rows = [(0.0, "76", "7611", 1.0), (1.0, "76", "7613", 2.0), (2.0, "76", "7615", 4.0)];
        let records = rows
            .iter()
            .map(|&(x, reach, basin, area)| {
                ShapeRecord::new(
                    square(x),
                    vec![reach.into(), basin.into(), AttributeValue::Float(area)],
                )
            })
            .collect();
        MemorySource::from_records(fields, records).unwrap()
    }

    fn outlet(id: &str, x: f64, flow: f64, basin_ref: &str) -> Outlet {
        Outlet {
            id: id.to_string(),
            point: Point::new(x, 0.5),
            flow,
            basin_ref: basin_ref.to_string(),
        }
    }

    #[test]
    fn test_capacity_factor() {
        let outlets = vec![
            outlet("a", 0.5, 36.0, "7611"),
            outlet("b", 1.5, 18.0, "7613"),
            outlet("c", 2.5, 7.2, "7615"),
        ];
        let reference = HashMap::from([
            ("7611".to_string(), 40.0),
            ("7613".to_string(), 10.0),
            ("7615".to_string(), 4.0),
        ]);

        let report =
            grant_criticality(&layer(), &outlets, &reference, &CriticalityParams::default(), None)
                .unwrap();
        assert!(report.unresolved.is_empty());
        assert_eq!(report.rows.len(), 3);

        // Outlet a drains the whole chain: 10 + 5 + 2 l/s against Qmax 20
        let a = &report.rows[0];
        assert_eq!(a.reach_code, "76");
        assert_relative_eq!(a.granted_flow, 17.0);
        assert_relative_eq!(a.q_max, 20.0);
        assert_relative_eq!(a.capacity_factor, 0.85);
        assert_relative_eq!(a.drainage_area.unwrap(), 7.0);

        // Outlet c only sees itself
        let c = &report.rows[2];
        assert_relative_eq!(c.granted_flow, 2.0);
        assert_relative_eq!(c.capacity_factor, 1.0);
    }

    #[test]
    fn test_unresolved_outlets() {
        let outlets = vec![outlet("out", 10.0, 1.0, "7611"), outlet("noref", 0.5, 1.0, "9999")];
        let mut seen = Vec::new();
        let mut cb = |done: usize, total: usize| seen.push((done, total));
        let report = grant_criticality(
            &layer(),
            &outlets,
            &HashMap::new(),
            &CriticalityParams::default(),
            Some(&mut cb),
        )
        .unwrap();

        assert!(report.rows.is_empty());
        assert_eq!(report.unresolved[0].reason, UnresolvedReason::OutsideLayer);
        assert_eq!(
            report.unresolved[1].reason,
            UnresolvedReason::MissingReference("9999".to_string())
        );
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_invalid_conversion_factor() {
        let params = CriticalityParams {
            conversion_factor: 0.0,
            ..Default::default()
        };
        let err = grant_criticality(&layer(), &[], &HashMap::new(), &params, None).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "conversion_factor", .. }));
    }

    #[test]
    fn test_outlets_from_features() {
        let mut features = FeatureCollection::new();
        let mut f = Feature::new(Geometry::Point(Point::new(0.5, 0.5)));
        f.id = Some("12".to_string());
        f.set_property("VAZAO_OUTO", AttributeValue::from("3,6"));
        f.set_property("COD_OTTO", AttributeValue::Int(7611));
        features.push(f);

        let outlets = outlets_from_features(&features, None, "VAZAO_OUTO", "COD_OTTO").unwrap();
        assert_eq!(outlets[0].id, "12");
        assert_relative_eq!(outlets[0].flow, 3.6);
        assert_eq!(outlets[0].basin_ref, "7611");

        let err = outlets_from_features(&features, None, "EFLO_OT_E1", "COD_OTTO").unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { record: 0, .. }));
    }

    #[test]
    fn test_reference_flows() {
        let source = MemorySource::from_records(
            vec!["cobacia".to_string(), "areamont_Q".to_string()],
            vec![ShapeRecord::new(square(0.0), vec!["7611".into(), "12,5".into()])],
        )
        .unwrap();
        let table = reference_flows(&source, "cobacia", "areamont_Q").unwrap();
        assert_relative_eq!(table["7611"], 12.5);
    }
}
