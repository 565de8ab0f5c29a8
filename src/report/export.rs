//! CSV export of priced reports

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

use super::{ResourceCosts, ResourceKind};

/// Write `rows` under `header` to any writer.
///
/// The header is always written, so an empty report still yields a valid file.
pub fn write_rows<W, R, I>(writer: W, header: &[&str], rows: I) -> Result<usize>
where
    W: io::Write,
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    out.write_record(header)?;
    let mut written = 0;
    for row in rows {
        out.serialize(row)?;
        written += 1;
    }
    out.flush()?;

    Ok(written)
}

/// Write one kind's report to `path`, replacing any existing file.
///
/// Rows follow the report's resource order, then each resource's bucket order.
pub fn write_report<K: ResourceKind>(
    path: &Path,
    kind: &K,
    report: &[ResourceCosts<K::Record>],
) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let rows = report.iter().flat_map(|resource| {
        resource
            .records
            .iter()
            .map(|record| kind.to_row(&resource.name, record))
    });

    let written = write_rows(io::BufWriter::new(file), kind.header(), rows)?;
    info!("Wrote {} {} row(s) to {}", written, kind.kind(), path.display());
    Ok(written)
}

/// Parse an exported file back into typed rows
pub fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<R>, csv::Error>>()?;
    Ok(rows)
}
