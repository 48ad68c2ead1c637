//! Range sampling: positivity across an inclusive coordinate range.

use tracing::debug;

use super::resolver::{resolve_last_event, ProbeConfig};
use crate::models::{is_same_pair, normalize_relation, Coordinate, NormalizedRelation, RelationSample};
use crate::source::EventSource;

/// The pair's normalized relation at a coordinate, if present and valid.
/// Fetch failures read as "not here".
pub(crate) async fn pair_relation_at(
    source: &dyn EventSource,
    id1: i64,
    id2: i64,
    chapter: u32,
    event: u32,
) -> Option<NormalizedRelation> {
    match source.fetch_event(chapter, event).await {
        Ok(envelope) => envelope
            .result
            .relations
            .iter()
            .filter_map(normalize_relation)
            .find(|rel| is_same_pair(rel, id1, id2)),
        Err(e) => {
            debug!("Fetch ch{}/e{} failed during collection: {}", chapter, event, e);
            None
        }
    }
}

/// Sample the pair's positivity at every coordinate in `from..=to`, in order.
///
/// The two source kinds emit deliberately different series:
/// - Manifest sources are dense: every coordinate yields a sample, with
///   positivity 0 standing in where the pair's relation is not found.
/// - Probe sources are sparse: a coordinate where the pair is not provably
///   present yields nothing at all.
pub async fn collect(
    source: &dyn EventSource,
    id1: i64,
    id2: i64,
    from: Coordinate,
    to: Coordinate,
    config: &ProbeConfig,
) -> Vec<RelationSample> {
    let mut samples = Vec::new();
    if from > to {
        return samples;
    }
    let dense = source.manifest().is_some();

    for chapter in from.chapter..=to.chapter {
        let start = if chapter == from.chapter { from.event } else { 1 };
        let end = if chapter == to.chapter {
            to.event
        } else {
            resolve_last_event(source, chapter, config).await
        };

        for event in start..=end {
            let coordinate = Coordinate::new(chapter, event);
            match pair_relation_at(source, id1, id2, chapter, event).await {
                Some(rel) => samples.push(RelationSample {
                    coordinate,
                    positivity: rel.positivity,
                    label: format!("E{}", event),
                    relation_labels: rel.relation,
                }),
                None if dense => samples.push(RelationSample {
                    coordinate,
                    positivity: Some(0.0),
                    label: format!("E{}", event),
                    relation_labels: Vec::new(),
                }),
                None => {}
            }
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::manifest::{BookData, ManifestSource};
    use serde_json::json;

    fn sample_source() -> ManifestSource {
        let data: BookData = serde_json::from_value(json!({
            "bookId": "b",
            "chapters": [
                { "events": [
                    { "relations": [] },
                    { "relations": [{ "id1": 3, "id2": 7, "positivity": 0.2, "relation": ["allies"] }] },
                    { "relations": [{ "id1": 7, "id2": 3, "positivity": 0.4 }] }
                ] }
            ]
        }))
        .unwrap();
        ManifestSource::new(data)
    }

    #[tokio::test]
    async fn test_dense_series_fills_gaps_with_zero() {
        let source = sample_source();
        let samples = collect(
            &source,
            3,
            7,
            Coordinate::new(1, 1),
            Coordinate::new(1, 3),
            &ProbeConfig::default(),
        )
        .await;
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].positivity, Some(0.0));
        assert_eq!(samples[0].label, "E1");
        assert!(samples[0].relation_labels.is_empty());
        assert_eq!(samples[1].positivity, Some(0.2));
        assert_eq!(samples[1].relation_labels, vec!["allies"]);
        assert_eq!(samples[2].positivity, Some(0.4));
        assert_eq!(samples[2].label, "E3");
    }

    #[tokio::test]
    async fn test_coordinates_strictly_increasing() {
        let source = sample_source();
        let samples = collect(
            &source,
            3,
            7,
            Coordinate::new(1, 1),
            Coordinate::new(1, 3),
            &ProbeConfig::default(),
        )
        .await;
        assert!(samples.windows(2).all(|w| w[0].coordinate < w[1].coordinate));
    }

    #[tokio::test]
    async fn test_inverted_range_is_empty() {
        let source = sample_source();
        let samples = collect(
            &source,
            3,
            7,
            Coordinate::new(1, 3),
            Coordinate::new(1, 1),
            &ProbeConfig::default(),
        )
        .await;
        assert!(samples.is_empty());
    }
}
