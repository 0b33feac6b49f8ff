//! Incremental reader for a top-level JSON array of city records.
//!
//! Elements are deserialised one at a time, so memory use is bounded by a
//! single record no matter how large the file is.

use crate::domain::model::CityRecord;
use crate::utils::error::{EtlError, Result};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct ArrayVisitor<'a, F> {
    sink: &'a mut F,
    sink_error: &'a mut Option<EtlError>,
}

impl<'de, F> Visitor<'de> for ArrayVisitor<'_, F>
where
    F: FnMut(CityRecord) -> Result<()>,
{
    type Value = usize;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON array of city records")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<usize, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while let Some(record) = seq.next_element::<CityRecord>()? {
            if let Err(e) = (self.sink)(record) {
                *self.sink_error = Some(e);
                return Err(de::Error::custom("record sink stopped the stream"));
            }
            count += 1;
        }
        Ok(count)
    }
}

/// Feeds every array element to `sink` and returns how many were read.
/// The first error from `sink` ends the walk and is returned as is.
pub fn stream_array<R, F>(reader: R, mut sink: F) -> Result<usize>
where
    R: Read,
    F: FnMut(CityRecord) -> Result<()>,
{
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut sink_error = None;

    let result = deserializer.deserialize_seq(ArrayVisitor {
        sink: &mut sink,
        sink_error: &mut sink_error,
    });

    if let Some(e) = sink_error {
        return Err(e);
    }
    let count = result?;
    deserializer.end()?;
    Ok(count)
}

/// Reads `path` on a blocking thread and hands records over a bounded
/// channel. The join handle yields the number of records read.
pub fn spawn_reader(
    path: PathBuf,
    capacity: usize,
) -> (mpsc::Receiver<CityRecord>, JoinHandle<Result<usize>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::task::spawn_blocking(move || {
        tracing::debug!("Opening data file: {}", path.display());
        let file = File::open(&path)?;
        stream_array(BufReader::new(file), |record| {
            tx.blocking_send(record)
                .map_err(|_| EtlError::processing("record receiver closed before end of input"))
        })
    });

    (rx, handle)
}
