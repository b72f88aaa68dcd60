use crate::error::Result;
use crate::remote::RemoteSource;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One ground-truth box as it appears in the labels file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub frame: String,
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
    pub label: String,
}

/// A box scoped to a single frame. Ground truth and detections share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
    pub label: String,
}

impl From<&Annotation> for BoundingBox {
    fn from(row: &Annotation) -> Self {
        Self {
            xmin: row.xmin,
            ymin: row.ymin,
            xmax: row.xmax,
            ymax: row.ymax,
            label: row.label.clone(),
        }
    }
}

/// The full annotation table, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    rows: Vec<Annotation>,
}

impl Metadata {
    pub fn from_rows(rows: Vec<Annotation>) -> Self {
        Self { rows }
    }

    /// Fetch and parse the labels CSV at `url`.
    pub fn load(source: &dyn RemoteSource, url: &str) -> Result<Self> {
        let _span = tracing::debug_span!("load_metadata").entered();

        let bytes = source.open(url)?.read_all()?;
        let metadata = Self::from_csv_bytes(&bytes)?;

        tracing::info!(
            "Loaded {} annotations across {} frames from {}",
            metadata.len(),
            metadata.frames().len(),
            url
        );
        Ok(metadata)
    }

    /// Parse CSV bytes, gunzipping first when they carry the gzip magic number.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&GZIP_MAGIC) {
            Self::from_reader(GzDecoder::new(bytes))
        } else {
            Self::from_reader(bytes)
        }
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<Annotation>, _>>()?;

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Annotation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct frames in order of first appearance.
    pub fn frames(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|row| row.frame.as_str())
            .filter(|frame| seen.insert(*frame))
            .collect()
    }

    /// Every box of `frame`, in table order, without the frame column.
    pub fn boxes_for_frame(&self, frame: &str) -> Vec<BoundingBox> {
        self.rows
            .iter()
            .filter(|row| row.frame == frame)
            .map(BoundingBox::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const CSV: &str = "frame,xmin,ymin,xmax,ymax,label\n\
        a.jpg,1,2,3,4,car\n\
        b.jpg,5,6,7,8,pedestrian\n\
        a.jpg,9,10,11,12,truck\n";

    #[test]
    fn parses_plain_csv() {
        let metadata = Metadata::from_csv_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.rows()[1].label, "pedestrian");
        assert_eq!(metadata.frames(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn gzip_and_plain_parse_identically() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(CSV.as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();

        let plain = Metadata::from_csv_bytes(CSV.as_bytes()).unwrap();
        let zipped = Metadata::from_csv_bytes(&gz).unwrap();
        assert_eq!(plain, zipped);
    }

    #[test]
    fn boxes_for_frame_keeps_table_order() {
        let metadata = Metadata::from_csv_bytes(CSV.as_bytes()).unwrap();
        let boxes = metadata.boxes_for_frame("a.jpg");
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].label, "car");
        assert_eq!(boxes[1].xmin, 9);
        assert!(metadata.boxes_for_frame("missing.jpg").is_empty());
    }

    #[test]
    fn malformed_row_is_an_error() {
        let bad = "frame,xmin,ymin,xmax,ymax,label\na.jpg,one,2,3,4,car\n";
        assert!(Metadata::from_csv_bytes(bad.as_bytes()).is_err());
    }

    #[test]
    fn oversized_content_length_header_is_ignored() {
        let mut source = crate::remote::MemorySource::new();
        source.insert_with_length("labels.csv", CSV.as_bytes().to_vec(), Some(u64::MAX / 2));

        let metadata = Metadata::load(&source, "labels.csv").unwrap();
        assert_eq!(metadata.len(), 3);
    }
}
