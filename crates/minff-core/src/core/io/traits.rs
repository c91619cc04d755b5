use crate::core::models::point::LabeledPoint;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Common interface for point file formats.
pub trait PointFile {
    /// Format-specific data that is not part of the points, e.g. a comment line.
    type Metadata;

    type Error: Error + From<io::Error>;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(Vec<LabeledPoint>, Self::Metadata), Self::Error>;

    fn write_to(
        points: &[LabeledPoint],
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Vec<LabeledPoint>, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(
        points: &[LabeledPoint],
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(points, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
