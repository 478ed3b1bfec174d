//! CSV I/O for the shape-detection collaborator: point clouds with normals
//! in, per-shape summaries out.

use std::fs;
use std::path::Path;

use nalgebra::{Point3, Vector3};

use super::{DetectedShape, PointWithNormal};
use crate::error::Error;
use crate::segments::io::parse_floats;

/// Reads `x,y,z,nx,ny,nz` records, one per line. Malformed records fail
/// loudly with [`Error::MalformedRecord`]; an empty file is an empty cloud.
pub fn read_points_csv(path: &Path) -> Result<Vec<PointWithNormal>, Error> {
    let data = fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_points(&data)
}

/// Parses point-with-normal records from in-memory text.
pub fn parse_points(data: &str) -> Result<Vec<PointWithNormal>, Error> {
    let mut points = Vec::new();
    for (idx, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let v = parse_floats(line, idx + 1, 6)?;
        points.push(PointWithNormal {
            position: Point3::new(v[0], v[1], v[2]),
            normal: Vector3::new(v[3], v[4], v[5]),
        });
    }
    Ok(points)
}

/// Writes one summary row per detected shape:
/// `Shape,Parameters,Average Distance`.
pub fn write_shape_summary(
    path: &Path,
    shapes: &[DetectedShape],
    points: &[PointWithNormal],
) -> Result<(), Error> {
    let mut out = String::from("Shape,Parameters,Average Distance\n");
    for detected in shapes {
        let avg = detected
            .average_distance(points)
            .map(|d| d.to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{}\n",
            detected.shape.kind(),
            detected.shape.parameters_string(),
            avg
        ));
    }
    fs::write(path, out).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points_with_normals() {
        let points = parse_points("0,0,1,0,0,1\n2,0,0, 1,0,0\n").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].normal.x, 1.0);
    }

    #[test]
    fn malformed_point_record_names_the_line() {
        let err = parse_points("0,0,1,0,0\n").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 1, .. }));
    }
}
