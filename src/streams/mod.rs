//! Live stream catalog, primary selection and failover

pub mod failover;
pub mod selector;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub use failover::{FailoverController, FailoverOutcome, FailoverState};
pub use selector::{initial_stream, select_primary, SelectionPolicy};

/// Opaque stream identifier, unique within a catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How a stream is put on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackTechnology {
    /// HLS playlist decoded in-process
    #[serde(rename = "hls")]
    AdaptiveStreaming,
    /// Third-party web player, opaque to the host
    #[serde(rename = "iframe")]
    EmbeddedPlayer,
}

/// Content category of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StreamKind {
    #[default]
    News,
    Traffic,
    Weather,
}

/// Immutable description of one selectable stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    id: StreamId,
    title: String,
    #[serde(default)]
    kind: StreamKind,
    #[serde(rename = "source")]
    source_locator: String,
    #[serde(rename = "player_type")]
    technology: PlaybackTechnology,
    #[serde(default)]
    is_primary: bool,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl StreamDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source_locator: impl Into<String>,
        technology: PlaybackTechnology,
    ) -> Self {
        Self {
            id: StreamId::new(id),
            title: title.into(),
            kind: StreamKind::News,
            source_locator: source_locator.into(),
            technology,
            is_primary: false,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_kind(mut self, kind: StreamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Copy of this descriptor with the primary flag set to `primary`
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.is_primary = primary;
        self
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn source_locator(&self) -> &str {
        &self.source_locator
    }

    pub fn technology(&self) -> PlaybackTechnology {
        self.technology
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Both coordinates, if the descriptor carries them
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Ordered, validated list of streams. Order is the failover rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamCatalog {
    streams: Vec<StreamDescriptor>,
}

impl StreamCatalog {
    pub fn new(streams: Vec<StreamDescriptor>) -> Result<Self, CatalogError> {
        if streams.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(streams.len());
        let mut primary: Option<&StreamId> = None;
        for stream in &streams {
            if !seen.insert(stream.id()) {
                return Err(CatalogError::DuplicateId(stream.id().to_string()));
            }
            if stream.is_primary() {
                if let Some(first) = primary {
                    return Err(CatalogError::MultiplePrimaries {
                        first: first.to_string(),
                        second: stream.id().to_string(),
                    });
                }
                primary = Some(stream.id());
            }
        }

        Ok(Self { streams })
    }

    /// Built-in news channels, first one pre-marked primary
    pub fn default_news() -> Self {
        use PlaybackTechnology::AdaptiveStreaming;

        Self {
            streams: vec![
                StreamDescriptor::new(
                    "1",
                    "CBC News (Toronto)",
                    "https://cbclive.akamaized.net/hls/live/2042858/LS_TO/master.m3u8",
                    AdaptiveStreaming,
                )
                .with_coordinates(43.6532, -79.3832)
                .with_primary(true),
                StreamDescriptor::new(
                    "2",
                    "Sky News (UK)",
                    "https://video.news.sky.com/snc/live/v2/event/live-3/master.m3u8",
                    AdaptiveStreaming,
                )
                .with_coordinates(51.5072, -0.1276),
                StreamDescriptor::new(
                    "3",
                    "Al Jazeera (EN)",
                    "https://live-hls-web-aje.getaj.net/AJE/01.m3u8",
                    AdaptiveStreaming,
                )
                .with_coordinates(25.2854, 51.5310),
                StreamDescriptor::new(
                    "4",
                    "ABC News (AU)",
                    "https://abc-iview-mediapackagestreams.akamaized.net/out/v1/6e1cc6d25ec0480ea099a5399d73bc4b/index.m3u8",
                    AdaptiveStreaming,
                )
                .with_coordinates(-33.8688, 151.2093),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter()
    }

    pub fn get(&self, index: usize) -> Option<&StreamDescriptor> {
        self.streams.get(index)
    }

    pub fn position(&self, id: &StreamId) -> Option<usize> {
        self.streams.iter().position(|s| s.id() == id)
    }

    pub fn find(&self, id: &StreamId) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.id() == id)
    }

    /// The descriptor currently flagged primary, if any
    pub fn primary(&self) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.is_primary())
    }

    /// Derive a copy where only `id` is flagged primary.
    /// Passing `None` clears every flag.
    pub fn with_primary(&self, id: Option<&StreamId>) -> Self {
        let streams = self
            .streams
            .iter()
            .map(|s| s.clone().with_primary(Some(s.id()) == id))
            .collect();
        Self { streams }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hls(id: &str) -> StreamDescriptor {
        StreamDescriptor::new(
            id,
            format!("Stream {}", id),
            format!("https://example.com/{}.m3u8", id),
            PlaybackTechnology::AdaptiveStreaming,
        )
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = StreamCatalog::default_news();
        let rebuilt = StreamCatalog::new(catalog.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt.len(), 4);
        assert_eq!(rebuilt.primary().unwrap().id().as_str(), "1");
        assert!(rebuilt.iter().all(|s| s.coordinates().is_some()));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert_eq!(StreamCatalog::new(Vec::new()), Err(CatalogError::Empty));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = StreamCatalog::new(vec![hls("a"), hls("b"), hls("a")]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("a".to_string()));
    }

    #[test]
    fn test_rejects_multiple_primaries() {
        let err = StreamCatalog::new(vec![hls("a").with_primary(true), hls("b").with_primary(true)])
            .unwrap_err();
        assert!(matches!(err, CatalogError::MultiplePrimaries { .. }));
    }

    #[test]
    fn test_with_primary_marks_exactly_one() {
        let streams = vec![hls("a").with_primary(true), hls("b"), hls("c")];
        let catalog = StreamCatalog::new(streams).unwrap();
        let marked = catalog.with_primary(Some(&StreamId::from("c")));
        let primaries: Vec<_> = marked.iter().filter(|s| s.is_primary()).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id().as_str(), "c");
        // Source catalog is untouched
        assert_eq!(catalog.primary().unwrap().id().as_str(), "a");
    }

    #[test]
    fn test_descriptor_deserializes_player_type_tags() {
        let json = r#"[
            {"id": "cam", "title": "Downtown", "source": "https://www.youtube.com/embed/x", "player_type": "iframe", "kind": "Traffic"},
            {"id": "n1", "title": "News", "source": "https://example.com/a.m3u8", "player_type": "hls", "is_primary": true, "latitude": 1.0, "longitude": 2.0}
        ]"#;
        let streams: Vec<StreamDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(streams[0].technology(), PlaybackTechnology::EmbeddedPlayer);
        assert_eq!(streams[0].kind(), StreamKind::Traffic);
        assert_eq!(streams[1].technology(), PlaybackTechnology::AdaptiveStreaming);
        assert!(streams[1].is_primary());
        assert_eq!(streams[1].coordinates(), Some((1.0, 2.0)));
    }
}
