//! Stream selection
//!
//! Without an explicit quality rank from the resolver, the declared size is
//! the quality proxy: the largest stream wins.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{MediaInfo, StreamDescriptor};

/// Streams ordered by declared size, largest first
///
/// The sort is stable over the map's key order, so equal sizes always
/// resolve the same way.
pub fn sorted_streams(streams: &BTreeMap<String, StreamDescriptor>) -> Vec<&StreamDescriptor> {
    let mut sorted: Vec<&StreamDescriptor> = streams.values().collect();
    sorted.sort_by(|a, b| b.size.cmp(&a.size));
    sorted
}

/// Pick the stream to download for `media`
///
/// Fails with [`Error::NoStreams`] when there is nothing to fetch (no
/// streams, or the chosen one has no parts), and with
/// [`Error::StreamMissing`] when the chosen stream's id is not a key of the
/// stream map.
pub fn select_stream(media: &MediaInfo) -> Result<&StreamDescriptor> {
    let no_streams = || Error::NoStreams {
        title: media.title.clone(),
    };

    let best = sorted_streams(&media.streams)
        .into_iter()
        .next()
        .ok_or_else(no_streams)?;

    let stream = media
        .streams
        .get(&best.id)
        .ok_or_else(|| Error::StreamMissing {
            name: best.id.clone(),
        })?;

    if stream.parts.is_empty() {
        return Err(no_streams());
    }
    Ok(stream)
}
