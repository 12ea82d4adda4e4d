use std::collections::BTreeMap;

use tessera_core::{CatalogDiagnostic, Chunk, ChunkIndex, SessionId, StreamGroup};
use tessera_events::{CatalogEvent, EventBus};
use tracing::{debug, warn};
use url::Url;

use crate::{
    CatalogResult, ChunkSource, GroupSignal, RawListing, RawRecord, classify::classify,
};

/// Ordered chunks of one stream group plus the findings made while
/// building it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkList {
    pub group: StreamGroup,
    /// Ascending by index, no duplicates.
    pub chunks: Vec<Chunk>,
    pub diagnostics: Vec<CatalogDiagnostic>,
}

impl ChunkList {
    pub fn empty(group: StreamGroup) -> Self {
        Self {
            group,
            chunks: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn indices(&self) -> impl Iterator<Item = ChunkIndex> + '_ {
        self.chunks.iter().map(|c| c.index)
    }

    /// `(after, before)` pairs of indices that bracket missing chunks.
    pub fn gaps(&self) -> impl Iterator<Item = (ChunkIndex, ChunkIndex)> + '_ {
        self.diagnostics.iter().filter_map(|d| match d {
            CatalogDiagnostic::Gap { after, before, .. } => Some((*after, *before)),
            _ => None,
        })
    }
}

/// Every group of a session from a single listing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogListing {
    pub session: SessionId,
    pub webcam: ChunkList,
    pub screenshare: ChunkList,
    /// Findings about chunks that could not be assigned to any group.
    pub unassigned: Vec<CatalogDiagnostic>,
}

impl CatalogListing {
    pub fn group(&self, group: StreamGroup) -> &ChunkList {
        match group {
            StreamGroup::Webcam => &self.webcam,
            StreamGroup::Screenshare => &self.screenshare,
        }
    }

    pub fn into_group(self, group: StreamGroup) -> ChunkList {
        match group {
            StreamGroup::Webcam => self.webcam,
            StreamGroup::Screenshare => self.screenshare,
        }
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &CatalogDiagnostic> {
        self.unassigned
            .iter()
            .chain(&self.webcam.diagnostics)
            .chain(&self.screenshare.diagnostics)
    }
}

type GroupAccumulator = (BTreeMap<ChunkIndex, Chunk>, Vec<CatalogDiagnostic>);

/// Classify, resolve, de-duplicate and order a raw listing.
///
/// Pure: no I/O. Records that did not decode, belong to another session,
/// have no group signal or have an unresolvable locator are dropped with a
/// diagnostic; nothing here is fatal.
pub fn normalize(session: &SessionId, raw: RawListing, base: Option<&Url>) -> CatalogListing {
    let base = base.map(directory_base);
    let RawListing { records, rejected } = raw;
    let mut unassigned: Vec<CatalogDiagnostic> = rejected
        .into_iter()
        .map(|r| CatalogDiagnostic::MalformedRecord {
            bucket: r.bucket,
            position: r.position,
            reason: r.reason,
        })
        .collect();
    let mut groups: BTreeMap<StreamGroup, GroupAccumulator> = BTreeMap::new();

    for RawRecord { bucket, chunk: raw } in records {
        let index = ChunkIndex::new(raw.chunk_index);
        if let Some(other) = raw.session_id.as_deref().filter(|id| *id != session.as_str()) {
            unassigned.push(CatalogDiagnostic::ForeignSession {
                index,
                session: SessionId::from(other),
            });
            continue;
        }
        let locator = raw.locator().unwrap_or_default().to_string();
        let mut signals = Vec::with_capacity(3);
        let mut pending = Vec::new();

        if let Some(tag) = raw.stream_type.as_deref() {
            match StreamGroup::from_tag(tag) {
                Some(group) => signals.push(GroupSignal::Explicit(group)),
                None => pending.push(CatalogDiagnostic::UnknownGroupTag {
                    index,
                    tag: tag.to_string(),
                }),
            }
        }
        if let Some(group) = bucket.as_deref().and_then(StreamGroup::from_tag) {
            signals.push(GroupSignal::Bucket(group));
        }
        if let Some(group) = StreamGroup::infer_from_locator(&locator) {
            signals.push(GroupSignal::Locator(group));
        }

        let Some(classification) = classify(signals) else {
            unassigned.extend(pending);
            unassigned.push(CatalogDiagnostic::Unclassified { index, locator });
            continue;
        };

        let (chunks, diagnostics) = groups.entry(classification.group).or_default();
        diagnostics.append(&mut pending);
        for conflict in &classification.conflicts {
            diagnostics.push(CatalogDiagnostic::GroupMismatch {
                index,
                resolved: classification.group,
                resolved_by: classification.resolved_by,
                conflicting: conflict.group(),
                conflicting_from: conflict.source(),
            });
        }

        let url = match resolve_locator(&locator, base.as_ref()) {
            Ok(url) => url,
            Err(reason) => {
                diagnostics.push(CatalogDiagnostic::InvalidLocator {
                    index,
                    locator,
                    reason,
                });
                continue;
            }
        };

        let mut chunk = Chunk::new(session.clone(), index, classification.group, url);
        chunk.size_bytes = raw.size_bytes;

        if chunks.insert(index, chunk).is_some() {
            diagnostics.push(CatalogDiagnostic::DuplicateIndex {
                group: classification.group,
                index,
            });
        }
    }

    let mut finish = |group: StreamGroup| {
        let (chunks, mut diagnostics) = groups.remove(&group).unwrap_or_default();
        let chunks: Vec<Chunk> = chunks.into_values().collect();
        for pair in chunks.windows(2) {
            let (after, before) = (pair[0].index, pair[1].index);
            if after.next() != Some(before) {
                diagnostics.push(CatalogDiagnostic::Gap {
                    group,
                    after,
                    before,
                });
            }
        }
        ChunkList {
            group,
            chunks,
            diagnostics,
        }
    };

    CatalogListing {
        session: session.clone(),
        webcam: finish(StreamGroup::Webcam),
        screenshare: finish(StreamGroup::Screenshare),
        unassigned,
    }
}

fn directory_base(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn resolve_locator(locator: &str, base: Option<&Url>) -> Result<Url, String> {
    if locator.is_empty() {
        return Err("empty locator".to_string());
    }
    match Url::parse(locator) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(locator).map_err(|e| e.to_string()),
            None => Err("relative locator and no base URL".to_string()),
        },
        Err(e) => Err(e.to_string()),
    }
}

/// Fetches listings from a [`ChunkSource`] and normalizes them.
pub struct ChunkCatalog<S> {
    source: S,
    locator_base: Option<Url>,
    events: Option<EventBus>,
}

impl<S: ChunkSource> ChunkCatalog<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            locator_base: None,
            events: None,
        }
    }

    /// Resolve relative locators against `base` instead of the source's
    /// own base URL.
    pub fn with_locator_base(mut self, base: Url) -> Self {
        self.locator_base = Some(base);
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// List every group of `session` with one backend call.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`](crate::CatalogError) when the listing cannot
    /// be fetched or decoded. Per-chunk problems are diagnostics, not errors.
    pub async fn fetch_all(&self, session: &SessionId) -> CatalogResult<CatalogListing> {
        let raw = self.source.list(session).await?;
        let base = self
            .locator_base
            .as_ref()
            .or_else(|| self.source.locator_base());
        let listing = normalize(session, raw, base);

        for diagnostic in listing.diagnostics() {
            warn!(%session, %diagnostic, "chunk listing diagnostic");
            self.publish(CatalogEvent::Diagnostic {
                session: session.clone(),
                diagnostic: diagnostic.clone(),
            });
        }
        for group in StreamGroup::ALL {
            let chunks = listing.group(group).len();
            debug!(%session, %group, chunks, "chunk listing normalized");
            self.publish(CatalogEvent::Listed {
                session: session.clone(),
                group,
                chunks,
            });
        }

        Ok(listing)
    }

    /// Ordered chunks of one group. An empty list means "nothing to play".
    ///
    /// # Errors
    ///
    /// Same as [`fetch_all`](Self::fetch_all).
    pub async fn fetch_chunks(
        &self,
        session: &SessionId,
        group: StreamGroup,
    ) -> CatalogResult<ChunkList> {
        Ok(self.fetch_all(session).await?.into_group(group))
    }

    fn publish(&self, event: CatalogEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use rstest::{fixture, rstest};
    use tessera_events::Event;

    use super::*;
    use crate::{CatalogError, RawChunk};

    fn raw(index: u64, locator: &str, tag: Option<&str>) -> RawChunk {
        RawChunk {
            chunk_index: index,
            url: Some(locator.to_string()),
            stream_type: tag.map(str::to_string),
            ..RawChunk::default()
        }
    }

    fn bucketed(bucket: &str, chunk: RawChunk) -> RawRecord {
        RawRecord {
            bucket: Some(bucket.to_string()),
            chunk,
        }
    }

    #[fixture]
    fn session() -> SessionId {
        SessionId::new("s1")
    }

    #[fixture]
    fn base() -> Url {
        Url::parse("https://cdn.test/recordings").unwrap()
    }

    fn indices(list: &ChunkList) -> Vec<u64> {
        list.indices().map(ChunkIndex::get).collect()
    }

    #[rstest]
    fn orders_by_index_regardless_of_arrival(session: SessionId, base: Url) {
        let listing = RawListing::from_chunks([
            raw(2, "s1/webcam/2.webm", None),
            raw(0, "s1/webcam/0.webm", None),
            raw(1, "s1/webcam/1.webm", None),
        ]);

        let out = normalize(&session, listing, Some(&base));

        assert_eq!(indices(&out.webcam), vec![0, 1, 2]);
        assert!(out.screenshare.is_empty());
        assert_eq!(
            out.webcam.chunks[0].locator.as_str(),
            "https://cdn.test/recordings/s1/webcam/0.webm"
        );
        assert!(out.diagnostics().next().is_none());
    }

    #[rstest]
    fn explicit_tag_beats_locator_and_records_mismatch(session: SessionId, base: Url) {
        let listing = RawListing::from_chunks([raw(4, "s1/screen/4.webm", Some("webcam"))]);

        let out = normalize(&session, listing, Some(&base));

        assert_eq!(indices(&out.webcam), vec![4]);
        assert!(out.screenshare.is_empty());
        assert_eq!(
            out.webcam.diagnostics,
            vec![CatalogDiagnostic::GroupMismatch {
                index: ChunkIndex::new(4),
                resolved: StreamGroup::Webcam,
                resolved_by: tessera_core::SignalSource::Explicit,
                conflicting: StreamGroup::Screenshare,
                conflicting_from: tessera_core::SignalSource::Locator,
            }]
        );
    }

    #[rstest]
    fn bucket_beats_locator(session: SessionId, base: Url) {
        let listing = RawListing {
            records: vec![bucketed("screenshare", raw(0, "s1/camera/0.webm", None))],
            ..RawListing::default()
        };

        let out = normalize(&session, listing, Some(&base));

        assert_eq!(indices(&out.screenshare), vec![0]);
        assert!(matches!(
            out.screenshare.diagnostics.as_slice(),
            [CatalogDiagnostic::GroupMismatch { conflicting: StreamGroup::Webcam, .. }]
        ));
    }

    #[rstest]
    fn duplicate_index_keeps_last_seen(session: SessionId, base: Url) {
        let listing = RawListing::from_chunks([
            raw(0, "s1/webcam/0-old.webm", None),
            raw(0, "s1/webcam/0-new.webm", None),
        ]);

        let out = normalize(&session, listing, Some(&base));

        assert_eq!(out.webcam.len(), 1);
        assert!(out.webcam.chunks[0].locator.path().ends_with("0-new.webm"));
        assert_eq!(
            out.webcam.diagnostics,
            vec![CatalogDiagnostic::DuplicateIndex {
                group: StreamGroup::Webcam,
                index: ChunkIndex::new(0),
            }]
        );
    }

    #[rstest]
    fn gaps_are_reported_but_kept(session: SessionId, base: Url) {
        let listing = RawListing::from_chunks([
            raw(0, "s1/webcam/0.webm", None),
            raw(3, "s1/webcam/3.webm", None),
            raw(4, "s1/webcam/4.webm", None),
        ]);

        let out = normalize(&session, listing, Some(&base));

        assert_eq!(indices(&out.webcam), vec![0, 3, 4]);
        let gaps: Vec<_> = out.webcam.gaps().collect();
        assert_eq!(gaps, vec![(ChunkIndex::new(0), ChunkIndex::new(3))]);
    }

    #[rstest]
    fn unclassifiable_chunk_is_dropped(session: SessionId, base: Url) {
        let listing = RawListing::from_chunks([
            raw(0, "s1/misc/0.webm", Some("audio")),
            raw(1, "s1/webcam/1.webm", None),
        ]);

        let out = normalize(&session, listing, Some(&base));

        assert_eq!(indices(&out.webcam), vec![1]);
        assert_eq!(
            out.unassigned,
            vec![
                CatalogDiagnostic::UnknownGroupTag {
                    index: ChunkIndex::new(0),
                    tag: "audio".into(),
                },
                CatalogDiagnostic::Unclassified {
                    index: ChunkIndex::new(0),
                    locator: "s1/misc/0.webm".into(),
                },
            ]
        );
    }

    #[rstest]
    #[case::no_base(None, "s1/webcam/0.webm")]
    #[case::empty(Some("https://cdn.test/"), "")]
    fn unresolvable_locator_is_dropped(
        session: SessionId,
        #[case] base: Option<&str>,
        #[case] locator: &str,
    ) {
        let base = base.map(|b| Url::parse(b).unwrap());
        let listing = RawListing::from_chunks([raw(0, locator, Some("webcam"))]);

        let out = normalize(&session, listing, base.as_ref());

        assert!(out.webcam.is_empty());
        assert!(matches!(
            out.webcam.diagnostics.as_slice(),
            [CatalogDiagnostic::InvalidLocator { .. }]
        ));
    }

    #[rstest]
    fn absolute_locators_ignore_base(session: SessionId) {
        let listing =
            RawListing::from_chunks([raw(0, "https://other.test/x/screen/0.webm", None)]);

        let out = normalize(&session, listing, None);

        assert_eq!(
            out.screenshare.chunks[0].locator.as_str(),
            "https://other.test/x/screen/0.webm"
        );
        assert_eq!(out.screenshare.chunks[0].session, session);
    }

    #[rstest]
    fn record_from_another_session_is_dropped(session: SessionId, base: Url) {
        let mut foreign = raw(1, "s2/webcam/1.webm", None);
        foreign.session_id = Some("s2".into());
        let mut own = raw(0, "s1/webcam/0.webm", None);
        own.session_id = Some("s1".into());
        let listing = RawListing::from_chunks([own, foreign]);

        let out = normalize(&session, listing, Some(&base));

        assert_eq!(indices(&out.webcam), vec![0]);
        assert_eq!(
            out.unassigned,
            vec![CatalogDiagnostic::ForeignSession {
                index: ChunkIndex::new(1),
                session: SessionId::new("s2"),
            }]
        );
    }

    struct StaticSource {
        body: &'static [u8],
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChunkSource for StaticSource {
        async fn list(&self, _session: &SessionId) -> CatalogResult<RawListing> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RawListing::from_slice(self.body)
        }
    }

    #[rstest]
    #[tokio::test]
    async fn fetch_chunks_publishes_listing_events(session: SessionId, base: Url) {
        let calls = Arc::new(AtomicUsize::new(0));
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let catalog = ChunkCatalog::new(StaticSource {
            body: br#"{"webcam": [{"index": 1, "url": "w/1"}, {"index": 0, "url": "w/0"}]}"#,
            calls: Arc::clone(&calls),
        })
        .with_locator_base(base)
        .with_events(events);

        let list = catalog
            .fetch_chunks(&session, StreamGroup::Webcam)
            .await
            .unwrap();

        assert_eq!(indices(&list), vec![0, 1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::Catalog(CatalogEvent::Listed {
                session: session.clone(),
                group: StreamGroup::Webcam,
                chunks: 2,
            })
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::Catalog(CatalogEvent::Listed {
                session,
                group: StreamGroup::Screenshare,
                chunks: 0,
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_record_does_not_sink_the_listing(session: SessionId, base: Url) {
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let catalog = ChunkCatalog::new(StaticSource {
            body: br#"{
                "sessionId": "s1",
                "webcam": [{"index": 0, "url": "w/0"}, {"index": null, "url": "w/1"}],
                "screenshare": [{"index": 0, "url": "s/0"}]
            }"#,
            calls: Arc::default(),
        })
        .with_locator_base(base)
        .with_events(events);

        let listing = catalog.fetch_all(&session).await.unwrap();

        assert_eq!(indices(&listing.webcam), vec![0]);
        assert_eq!(indices(&listing.screenshare), vec![0]);
        assert!(matches!(
            listing.unassigned.as_slice(),
            [CatalogDiagnostic::MalformedRecord { bucket: Some(bucket), position: 1, .. }]
                if bucket == "webcam"
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::Catalog(CatalogEvent::Diagnostic {
                diagnostic: CatalogDiagnostic::MalformedRecord { .. },
                ..
            })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn decode_failure_is_an_error(session: SessionId) {
        let catalog = ChunkCatalog::new(StaticSource {
            body: b"<html>",
            calls: Arc::default(),
        });

        let err = catalog.fetch_all(&session).await.unwrap_err();

        assert!(matches!(err, CatalogError::Decode(_)));
    }
}
