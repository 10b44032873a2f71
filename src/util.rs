mod geometry;
mod io;

pub use geometry::{line_parts, open_endpoints};
pub use io::{
    parse_line_layer, parse_polygon_layer, read_line_layer, read_polygon_layer,
    snap_layer_to_geojson, write_snap_layer,
};
