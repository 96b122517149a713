//! Tests for work unit sources

use std::io::Write;

use shared::{CampaignId, ClusterId};

use crate::error::PipelineError;
use crate::services::work_units::{parse_clusters, FileWorkUnitSource, StaticWorkUnitSource};
use crate::traits::WorkUnitSource;

const CLUSTERS_JSON: &str = r#"{
  "clusters": [
    {
      "cluster_id": 0,
      "personas": [
        {
          "persona_id": "p-001",
          "name": "Meera",
          "description": "34, Chennai, school librarian",
          "tone": {
            "temperament": "calm",
            "key_reaction_triggers": { "positive": ["family"], "negative": ["pushy sales"] }
          }
        },
        { "persona_id": "p-002", "name": "Arjun", "description": "22, Delhi, student" }
      ]
    },
    { "cluster_id": 4, "personas": [] }
  ]
}"#;

#[test]
fn test_parse_wrapped_and_bare_layouts() {
    let wrapped = parse_clusters(CLUSTERS_JSON).unwrap();
    assert_eq!(wrapped.len(), 2);
    assert_eq!(wrapped[0].personas.len(), 2);
    assert_eq!(wrapped[1].cluster_id, ClusterId::new(4));

    let tone = wrapped[0].personas[0].tone.as_ref().unwrap();
    assert_eq!(tone.temperament.as_deref(), Some("calm"));
    assert!(tone.communication_style.is_none());

    let bare = parse_clusters(r#"[{"cluster_id": 1, "personas": []}]"#).unwrap();
    assert_eq!(bare.len(), 1);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(matches!(parse_clusters("{\"nope\": true}"), Err(PipelineError::Json(_))));
}

#[tokio::test]
async fn test_file_source_reads_clusters() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CLUSTERS_JSON.as_bytes()).unwrap();

    let source = FileWorkUnitSource::new(file.path());
    let clusters = source.load_work_units(&CampaignId::new("c1")).await.unwrap();
    assert_eq!(clusters[0].personas[1].name, "Arjun");
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileWorkUnitSource::new(dir.path().join("clusters.json"));
    let err = source.load_work_units(&CampaignId::new("c1")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[tokio::test]
async fn test_static_source_returns_clusters() {
    let clusters = parse_clusters(CLUSTERS_JSON).unwrap();
    let source = StaticWorkUnitSource::new(clusters.clone());
    assert_eq!(source.load_work_units(&CampaignId::new("any")).await.unwrap(), clusters);
}
