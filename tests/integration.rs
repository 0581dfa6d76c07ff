//! Integration tests for the search mapper.
//!
//! Drives the public API end to end against an in-process transport that
//! answers like the index service, and a data accessor that counts bulk loads.
//!
//! # Test Organization
//! - `facet_*` - facet row ordering, bucketing and lazy population
//! - `multiselect_*` - filter tagging and facet exclusion
//! - `hits_*` - hit parsing, highlights and lazy instances
//! - `failure_*` - errors raised before anything is sent

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use search_mapper::search::HighlightOptions;
use search_mapper::{
    DataAccessor, DateFacetOptions, FacetSort, FacetValue, FieldFacetOptions, FieldOptions,
    FieldType, FieldValue, Instance, KeywordOptions, MapperError, QueryFacetOptions,
    RegistryBuilder, RequestParams, RestrictionArg, RestrictionOptions, Session, SessionConfig,
    Transport,
};

// =============================================================================
// Test doubles
// =============================================================================

type Responder = Box<dyn Fn(&RequestParams) -> Value + Send + Sync>;

struct MockIndex {
    respond: Responder,
    sent: Mutex<Vec<RequestParams>>,
}

impl MockIndex {
    fn new(respond: impl Fn(&RequestParams) -> Value + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Transport for MockIndex {
    async fn select(&self, params: &RequestParams) -> search_mapper::Result<Value> {
        self.sent.lock().push(params.clone());
        Ok((self.respond)(params))
    }
}

#[derive(Debug)]
struct Record {
    id: String,
}

struct CountingAccessor {
    loads: Mutex<Vec<(String, Vec<String>)>>,
}

impl CountingAccessor {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            loads: Mutex::new(Vec::new()),
        })
    }

    fn load_count(&self) -> usize {
        self.loads.lock().len()
    }
}

#[async_trait]
impl DataAccessor for CountingAccessor {
    async fn load_all(&self, reference_type: &str, keys: &[String]) -> search_mapper::Result<Vec<Instance>> {
        self.loads
            .lock()
            .push((reference_type.to_string(), keys.to_vec()));
        // Returned out of order; "999" no longer exists
        Ok(keys
            .iter()
            .rev()
            .filter(|k| k.as_str() != "999")
            .map(|k| Arc::new(Record { id: k.clone() }) as Instance)
            .collect())
    }

    fn identity_of(&self, instance: &Instance) -> Option<String> {
        instance.downcast_ref::<Record>().map(|r| r.id.clone())
    }
}

fn session(index: Arc<MockIndex>, accessor: Arc<CountingAccessor>) -> Session {
    let mut builder = RegistryBuilder::new();
    builder
        .setup("Post")
        .field("title", FieldType::String, FieldOptions::new().stored())
        .field("rating", FieldType::Integer, FieldOptions::new())
        .field("blog_id", FieldType::Integer, FieldOptions::new().references("Blog"))
        .field("category_ids", FieldType::Integer, FieldOptions::new().multiple())
        .field("published_at", FieldType::Time, FieldOptions::new())
        .text("body", FieldOptions::new());
    builder
        .setup("Comment")
        .field("title", FieldType::String, FieldOptions::new().stored())
        .field("rating", FieldType::Float, FieldOptions::new())
        .text("body", FieldOptions::new());
    builder.setup("BlogPost").family(["Post"]);
    builder
        .accessor("Blog", accessor.clone())
        .accessor("Post", accessor.clone())
        .accessor("Comment", accessor);
    Session::new(Arc::new(builder.build().unwrap()), index, SessionConfig::default())
}

fn empty_response() -> Value {
    json!({"response": {"numFound": 0, "start": 0, "docs": []}})
}

fn labels(rows: &[search_mapper::FacetRow]) -> Vec<String> {
    rows.iter().map(|r| r.value().to_string()).collect()
}

// =============================================================================
// Facets
// =============================================================================

async fn abc_facet(options: QueryFacetOptions) -> Vec<String> {
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 6, "start": 0, "docs": []},
            "facet_counts": {"facet_queries": {"ratings:0": 1, "ratings:1": 3, "ratings:2": 2}}
        })
    });
    let session = session(index, CountingAccessor::new());
    let mut query = session.new_query(&["Post"]).unwrap();
    query
        .add_query_facet("ratings", options, |facet| {
            facet.row("C", |s| s.with("rating", 1).map(|_| ()))?;
            facet.row("A", |s| s.with("rating", 2).map(|_| ()))?;
            facet.row("B", |s| s.with("rating", 3).map(|_| ()))?;
            Ok(())
        })
        .unwrap();
    let results = session.execute(query).await.unwrap();
    labels(results.facet("ratings").unwrap().rows().unwrap())
}

#[tokio::test]
async fn facet_query_rows_follow_sort_policy() {
    assert_eq!(abc_facet(QueryFacetOptions::default()).await, ["C", "A", "B"]);
    assert_eq!(
        abc_facet(QueryFacetOptions::default().sort(FacetSort::Count)).await,
        ["A", "B", "C"]
    );
    assert_eq!(
        abc_facet(QueryFacetOptions::default().sort(FacetSort::Count).limit(2)).await,
        ["A", "B"]
    );
    assert_eq!(
        abc_facet(QueryFacetOptions::default().sort(FacetSort::Lexical)).await,
        ["A", "B", "C"]
    );
}

#[tokio::test]
async fn facet_query_rows_registered_a_b_c() {
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 6, "start": 0, "docs": []},
            "facet_counts": {"facet_queries": {"abc:0": 1, "abc:1": 3, "abc:2": 2}}
        })
    });
    let session = session(index, CountingAccessor::new());
    for (options, expected) in [
        (QueryFacetOptions::default(), vec!["A", "B", "C"]),
        (QueryFacetOptions::default().sort(FacetSort::Count), vec!["B", "C", "A"]),
        (
            QueryFacetOptions::default().sort(FacetSort::Count).limit(2),
            vec!["B", "C"],
        ),
    ] {
        let mut query = session.new_query(&["Post"]).unwrap();
        query
            .add_query_facet("abc", options, |facet| {
                facet.row("A", |s| s.with("rating", 1).map(|_| ()))?;
                facet.row("B", |s| s.with("rating", 2).map(|_| ()))?;
                facet.row("C", |s| s.with("rating", 3).map(|_| ()))?;
                Ok(())
            })
            .unwrap();
        let results = session.execute(query).await.unwrap();
        assert_eq!(labels(results.facet("abc").unwrap().rows().unwrap()), expected);
    }
}

#[tokio::test]
async fn facet_name_with_space_is_quoted() {
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 4, "start": 0, "docs": []},
            "facet_counts": {"facet_queries": {"price range:0": 4}}
        })
    });
    let session = session(index.clone(), CountingAccessor::new());
    let mut query = session.new_query(&["Post"]).unwrap();
    query
        .add_query_facet("price range", QueryFacetOptions::default(), |facet| {
            facet.row("cheap", |s| s.with("rating", 1..=2).map(|_| ()))?;
            Ok(())
        })
        .unwrap();
    let results = session.execute(query).await.unwrap();

    assert_eq!(
        index.sent.lock()[0].get("facet.query"),
        Some("{!key='price range:0'}rating_i:[1 TO 2]")
    );
    let rows = results.facet("price range").unwrap().rows().unwrap();
    assert_eq!(labels(rows), ["cheap"]);
    assert_eq!(rows[0].count(), 4);
}

#[tokio::test]
async fn facet_date_range_two_buckets() {
    let t0 = Utc.with_ymd_and_hms(2009, 6, 18, 0, 0, 0).unwrap();
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 5, "start": 0, "docs": []},
            "facet_counts": {"facet_dates": {"published_at_d": {
                "2009-06-18T00:00:00Z": 3,
                "2009-06-19T00:00:00Z": 2,
                "gap": "+86400SECONDS",
                "end": "2009-06-20T00:00:00Z"
            }}}
        })
    });
    let session = session(index.clone(), CountingAccessor::new());
    let mut query = session.new_query(&["Post"]).unwrap();
    query
        .add_date_facet(
            "published_at",
            DateFacetOptions::new(t0, t0 + Duration::days(2), Duration::days(1)),
        )
        .unwrap();
    let results = session.execute(query).await.unwrap();

    let sent = index.sent.lock()[0].clone();
    assert_eq!(
        sent.get("f.published_at_d.facet.date.gap"),
        Some("+86400SECONDS")
    );

    let rows = results.facet("published_at").unwrap().rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].value(),
        &FacetValue::Interval {
            start: t0,
            end: t0 + Duration::days(1)
        }
    );
    assert_eq!(rows[0].count(), 3);
    assert_eq!(
        rows[1].value(),
        &FacetValue::Interval {
            start: t0 + Duration::days(1),
            end: t0 + Duration::days(2)
        }
    );
    assert_eq!(rows[1].count(), 2);
}

#[tokio::test]
async fn facet_rows_share_one_bulk_load() {
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 5, "start": 0, "docs": []},
            "facet_counts": {"facet_fields": {"blog_id_i": ["1", 3, "2", 2, "999", 1]}}
        })
    });
    let accessor = CountingAccessor::new();
    let session = session(index, accessor.clone());
    let mut query = session.new_query(&["Post"]).unwrap();
    query
        .add_field_facet("blog_id", FieldFacetOptions::default())
        .unwrap();
    let results = session.execute(query).await.unwrap();
    let rows = results.facet("blog_id").unwrap().rows().unwrap();
    assert_eq!(accessor.load_count(), 0);

    let first = rows[0].instance_as::<Record>().await.unwrap().unwrap();
    assert_eq!(first.id, "1");
    assert_eq!(accessor.load_count(), 1);
    assert_eq!(
        accessor.loads.lock()[0],
        ("Blog".to_string(), vec!["1".to_string(), "2".to_string(), "999".to_string()])
    );

    let second = rows[1].instance_as::<Record>().await.unwrap().unwrap();
    assert_eq!(second.id, "2");
    assert!(rows[2].instance().await.unwrap().is_none());
    assert_eq!(accessor.load_count(), 1);
}

#[tokio::test]
async fn facet_without_reference_has_no_instances() {
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 1, "start": 0, "docs": []},
            "facet_counts": {"facet_fields": {"rating_i": ["5", 1]}}
        })
    });
    let accessor = CountingAccessor::new();
    let session = session(index, accessor.clone());
    let mut query = session.new_query(&["Post"]).unwrap();
    query.add_field_facet("rating", FieldFacetOptions::default()).unwrap();
    let results = session.execute(query).await.unwrap();
    let rows = results.facet("rating").unwrap().rows().unwrap();
    assert_eq!(rows[0].value().as_field_value(), Some(&FieldValue::Int(5)));
    assert!(rows[0].instance().await.unwrap().is_none());
    assert_eq!(accessor.load_count(), 0);
}

// =============================================================================
// Multiselect
// =============================================================================

/// Answers like an index holding five posts rated 5: three in category 1,
/// two in category 2. Counts ignore the category filter only when the facet
/// request excludes its tag.
fn category_index() -> Arc<MockIndex> {
    MockIndex::new(|params| {
        let facet_field = params.get("facet.field").unwrap_or_default().to_string();
        let rating_applied = params.get_all("fq").contains(&"rating_i:5");
        assert!(rating_applied, "unrelated filter must stay applied");
        let counts = if facet_field.starts_with("{!ex=f1}") {
            json!(["1", 3, "2", 2])
        } else {
            json!(["2", 2])
        };
        json!({
            "response": {"numFound": 2, "start": 0, "docs": []},
            "facet_counts": {"facet_fields": {"category_ids_im": counts}}
        })
    })
}

async fn category_counts(exclude: bool) -> (Vec<u64>, RequestParams) {
    let session = session(category_index(), CountingAccessor::new());
    let mut query = session.new_query(&["Post"]).unwrap();
    let mut args = vec![RestrictionArg::Value(2.into())];
    if exclude {
        args.push(RestrictionArg::Options(
            RestrictionOptions::default().exclude_from("category_ids"),
        ));
    }
    query.with_args("category_ids", args).unwrap();
    query.with("rating", 5).unwrap();
    query
        .add_field_facet("category_ids", FieldFacetOptions::default())
        .unwrap();
    let results = session.execute(query).await.unwrap();
    let counts = results
        .facet("category_ids")
        .unwrap()
        .rows()
        .unwrap()
        .iter()
        .map(|r| r.count())
        .collect();
    (counts, results.params().clone())
}

#[tokio::test]
async fn multiselect_excluded_filter_is_ignored_by_facet() {
    let (excluded, params) = category_counts(true).await;
    assert!(params.get_all("fq").contains(&"{!tag=f1}category_ids_im:2"));
    assert_eq!(params.get("facet.field"), Some("{!ex=f1}category_ids_im"));

    let (plain, params) = category_counts(false).await;
    assert!(params.get_all("fq").contains(&"category_ids_im:2"));
    assert_eq!(params.get("facet.field"), Some("category_ids_im"));

    assert_eq!(excluded, vec![3, 2]);
    assert_eq!(plain, vec![2]);
    assert_ne!(excluded, plain);
}

// =============================================================================
// Hits
// =============================================================================

#[tokio::test]
async fn hits_batch_instances_per_type() {
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 3, "start": 0, "docs": [
                {"id": "Post 1", "class_name": "Post", "score": 2.0, "title_ss": "Pizza"},
                {"id": "Comment 7", "class_name": "Comment", "score": 1.0},
                {"id": "Post 2", "class_name": "Post", "score": 0.5}
            ]},
            "highlighting": {"Post 1": {"body_text": ["best @@@hl@@@pizza@@@endhl@@@ ever"]}}
        })
    });
    let accessor = CountingAccessor::new();
    let session = session(index.clone(), accessor.clone());
    let mut query = session.new_query(&["Post", "Comment"]).unwrap();
    query
        .keywords(
            "pizza",
            KeywordOptions::default().highlight(HighlightOptions::default()),
        )
        .unwrap();
    let results = session.execute(query).await.unwrap();

    let sent = index.sent.lock()[0].clone();
    assert_eq!(sent.get("q"), Some("pizza"));
    assert_eq!(sent.get("hl"), Some("on"));
    assert_eq!(sent.get("fq"), Some("type:(Post OR Comment)"));

    let hits = results.hits();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].score(), Some(2.0));
    assert_eq!(
        hits[0].stored_value("title").unwrap(),
        Some(FieldValue::Str("Pizza".into()))
    );
    assert_eq!(
        hits[0].highlights("body")[0].format(|w| format!("*{}*", w)),
        "best *pizza* ever"
    );

    let post = hits[2].instance_as::<Record>().await.unwrap().unwrap();
    assert_eq!(post.id, "2");
    assert!(hits[0].instance().await.unwrap().is_some());
    assert_eq!(accessor.load_count(), 1);

    hits[1].instance().await.unwrap();
    assert_eq!(accessor.load_count(), 2);
    let loads = accessor.loads.lock();
    assert_eq!(loads[0], ("Post".to_string(), vec!["1".to_string(), "2".to_string()]));
    assert_eq!(loads[1], ("Comment".to_string(), vec!["7".to_string()]));
}

#[tokio::test]
async fn hits_descendant_type_uses_ancestor_accessor() {
    let index = MockIndex::new(|_| {
        json!({
            "response": {"numFound": 2, "start": 0, "docs": [
                {"id": "BlogPost 3", "class_name": "BlogPost"},
                {"id": "BlogPost 4", "class_name": "BlogPost"}
            ]}
        })
    });
    let accessor = CountingAccessor::new();
    let session = session(index, accessor.clone());
    let results = session.execute(session.new_query(&["Post"]).unwrap()).await.unwrap();

    let hits = results.hits();
    let first = hits[0].instance_as::<Record>().await.unwrap().unwrap();
    assert_eq!(first.id, "3");
    assert!(hits[1].instance().await.unwrap().is_some());
    assert_eq!(accessor.load_count(), 1);
    assert_eq!(
        accessor.loads.lock()[0],
        ("BlogPost".to_string(), vec!["3".to_string(), "4".to_string()])
    );
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn failure_incompatible_field_before_any_request() {
    let index = MockIndex::new(|_| empty_response());
    let session = session(index.clone(), CountingAccessor::new());
    let mut query = session.new_query(&["Post", "Comment"]).unwrap();
    match query.with("rating", 3).unwrap_err() {
        MapperError::UnrecognizedField { field, types } => {
            assert_eq!(field, "rating");
            assert_eq!(types, vec!["Comment".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(query
        .add_field_facet("rating", FieldFacetOptions::default())
        .is_err());
    assert_eq!(index.calls(), 0);
}

#[tokio::test]
async fn failure_rows_before_execution() {
    let index = MockIndex::new(|_| empty_response());
    let session = session(index, CountingAccessor::new());
    let mut query = session.new_query(&["Post"]).unwrap();
    query.add_field_facet("rating", FieldFacetOptions::default()).unwrap();
    assert!(matches!(
        query.facet("rating").unwrap().rows().unwrap_err(),
        MapperError::FacetNotYetExecuted { .. }
    ));
}

#[tokio::test]
async fn failure_wrong_argument_count() {
    let index = MockIndex::new(|_| empty_response());
    let session = session(index.clone(), CountingAccessor::new());
    let mut query = session.new_query(&["Post"]).unwrap();
    let err = query
        .with_args(
            "rating",
            vec![RestrictionArg::Value(1.into()), RestrictionArg::Value(2.into())],
        )
        .unwrap_err();
    assert!(matches!(err, MapperError::Argument { .. }));
    assert_eq!(index.calls(), 0);
}
