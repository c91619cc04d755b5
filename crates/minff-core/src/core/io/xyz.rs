use crate::core::io::traits::PointFile;
use crate::core::models::point::{LabeledPoint, Point};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Expected {expected} point(s), found {found}")]
    CountMismatch { expected: usize, found: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum XyzParseErrorKind {
    #[error("Invalid point count '{0}'")]
    InvalidCount(String),
    #[error("Invalid coordinate '{0}'")]
    InvalidFloat(String),
    #[error("Point line has no coordinates")]
    MissingCoordinates,
    #[error("Point has {found} coordinate(s), previous points have {expected}")]
    InconsistentDimension { expected: usize, found: usize },
    #[error("File ended before the comment line")]
    MissingComment,
}

/// Comment line of an XYZ file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzMetadata {
    pub comment: String,
}

impl XyzMetadata {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
        }
    }
}

/// Plain XYZ: a count line, a comment line, then `label c1 c2 ...` per point.
///
/// Any number of coordinates per point is accepted as long as every point
/// has the same number.
pub struct XyzFile;

fn parse_error(line: usize, kind: XyzParseErrorKind) -> XyzError {
    XyzError::Parse { line, kind }
}

impl PointFile for XyzFile {
    type Metadata = XyzMetadata;
    type Error = XyzError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(Vec<LabeledPoint>, Self::Metadata), Self::Error> {
        let mut lines = reader.lines().enumerate();

        let expected = loop {
            match lines.next() {
                Some((idx, line)) => {
                    let line = line?;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    break trimmed.parse::<usize>().map_err(|_| {
                        parse_error(idx + 1, XyzParseErrorKind::InvalidCount(trimmed.to_string()))
                    })?;
                }
                None => return Ok((Vec::new(), XyzMetadata::default())),
            }
        };

        let comment = match lines.next() {
            Some((_, line)) => line?.trim_end().to_string(),
            None if expected == 0 => String::new(),
            None => return Err(parse_error(2, XyzParseErrorKind::MissingComment)),
        };

        let mut points = Vec::with_capacity(expected);
        let mut dimension = None;
        for (idx, line) in lines {
            if points.len() == expected {
                break;
            }
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(label) = fields.next() else {
                continue;
            };
            let coords = fields
                .map(|f| {
                    f.parse::<f64>().map_err(|_| {
                        parse_error(idx + 1, XyzParseErrorKind::InvalidFloat(f.to_string()))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if coords.is_empty() {
                return Err(parse_error(idx + 1, XyzParseErrorKind::MissingCoordinates));
            }
            match dimension {
                None => dimension = Some(coords.len()),
                Some(expected_dim) if expected_dim != coords.len() => {
                    return Err(parse_error(
                        idx + 1,
                        XyzParseErrorKind::InconsistentDimension {
                            expected: expected_dim,
                            found: coords.len(),
                        },
                    ));
                }
                Some(_) => {}
            }
            points.push(LabeledPoint {
                label: label.to_string(),
                coords: Point::from_vec(coords),
            });
        }

        if points.len() != expected {
            return Err(XyzError::CountMismatch {
                expected,
                found: points.len(),
            });
        }
        Ok((points, XyzMetadata { comment }))
    }

    fn write_to(
        points: &[LabeledPoint],
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "{}", points.len())?;
        writeln!(writer, "{}", metadata.comment.replace('\n', " "))?;
        for point in points {
            write!(writer, "{:<4}", point.label)?;
            for c in point.coords.iter() {
                write!(writer, " {c:>15.8}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn read(text: &str) -> Result<(Vec<LabeledPoint>, XyzMetadata), XyzError> {
        XyzFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_count_comment_and_points() {
        let (points, meta) = read("2\nwater fragment\nO 0.0 0.0 0.1\nH 0.75 0.0 -0.5\n").unwrap();
        assert_eq!(meta.comment, "water fragment");
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].label, "H");
        assert_eq!(points[1].coords.as_slice(), &[0.75, 0.0, -0.5]);
    }

    #[test]
    fn empty_input_reads_as_no_points() {
        let (points, meta) = read("").unwrap();
        assert!(points.is_empty());
        assert_eq!(meta, XyzMetadata::default());
    }

    #[test]
    fn invalid_count_reports_the_line() {
        let err = read("two\n\nC 0 0 0\n").unwrap_err();
        assert!(matches!(
            err,
            XyzError::Parse {
                line: 1,
                kind: XyzParseErrorKind::InvalidCount(_)
            }
        ));
    }

    #[test]
    fn invalid_coordinate_reports_the_line() {
        let err = read("1\n\nC 0.0 abc 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            XyzError::Parse {
                line: 3,
                kind: XyzParseErrorKind::InvalidFloat(_)
            }
        ));
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let err = read("2\n\nC 0 0 0\nC 0 0\n").unwrap_err();
        assert!(matches!(
            err,
            XyzError::Parse {
                kind: XyzParseErrorKind::InconsistentDimension {
                    expected: 3,
                    found: 2
                },
                ..
            }
        ));
    }

    #[test]
    fn truncated_file_is_a_count_mismatch() {
        let err = read("3\ncomment\nC 0 0 0\n").unwrap_err();
        assert!(matches!(
            err,
            XyzError::CountMismatch {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn two_dimensional_points_are_supported() {
        let (points, _) = read("1\n\nP 1.5 -2.0\n").unwrap();
        assert_eq!(points[0].coords.len(), 2);
    }

    #[test]
    fn written_file_can_be_read_back_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xyz");
        let points = vec![
            LabeledPoint::new("C", &[0.0, 1.25, -3.5]),
            LabeledPoint::new("N", &[2.0, 0.0, 0.125]),
        ];
        XyzFile::write_to_path(&points, &XyzMetadata::new("E = -1.0"), &path).unwrap();

        let (read_back, meta) = XyzFile::read_from_path(&path).unwrap();
        assert_eq!(meta.comment, "E = -1.0");
        assert_eq!(read_back, points);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = XyzFile::read_from_path(dir.path().join("missing.xyz"));
        assert!(matches!(result, Err(XyzError::Io(_))));
    }
}
