//! I/O operations for reading catchment layers and writing basin polygons

mod geojson_io;

pub use geojson_io::{
    polygons_to_geojson, read_layer, read_layer_from_str, read_points, read_points_from_str,
    write_polygons,
};
