//! Pipeline runs against canned atlas responses.
//!
//! Run with: cargo test --package brainmap-ingestion --test test_pipeline

use std::io;
use std::sync::{Arc, Mutex};

use brainmap_ingestion::pipeline::{ExpressionPipeline, GeneOutcome};
use brainmap_ingestion::repository::{ExpressionStore, JsonFileStore};
use brainmap_ingestion::sources::{AllenClient, AtlasTransport, MockTransport};
use pretty_assertions::assert_eq;
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;

const CONNECTION: &str = "structure_graph_download/1.json";

fn gene_query(symbol: &str) -> String {
    format!("data/Gene/query.json?criteria=[acronym$eq'{}']", symbol)
}

fn dataset_query(gene_id: u64) -> String {
    format!("data/SectionDataSet/query.json?criteria=genes[id$eq{}]", gene_id)
}

fn dataset_detail(experiment_id: u64) -> String {
    format!("data/SectionDataSet/{}.json?include=structure_unionizes", experiment_id)
}

/// APP resolves fully, MAPT has no experiments, SNCA's detail is malformed.
fn atlas() -> MockTransport {
    MockTransport::new()
        .with(CONNECTION, json!({"msg": []}))
        .with(&gene_query("APP"), json!({"msg": [{"id": 11, "acronym": "APP", "entrez_id": 351}]}))
        .with(&dataset_query(11), json!({"msg": [{"id": 100}]}))
        .with(
            &dataset_detail(100),
            json!({"success": true, "msg": [{
                "id": 100,
                "gene": "APP",
                "structure_unionizes": [
                    {"structure_id": 315, "expression_density": 0.02, "expression_energy": 1.1, "volume": 4.0},
                    {"structure_id": 698, "expression_density": 0.07},
                    42
                ]
            }]}),
        )
        .with(&gene_query("MAPT"), json!({"msg": [{"id": 12, "acronym": "MAPT"}]}))
        .with(&dataset_query(12), json!({"msg": []}))
        .with(&gene_query("SNCA"), json!({"msg": [{"id": 13, "acronym": "SNCA"}]}))
        .with(&dataset_query(13), json!({"msg": [{"id": 300}]}))
        .with(&dataset_detail(300), json!({"success": false, "msg": []}))
}

fn genes(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_pipeline_saves_and_skips_per_gene() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path()).unwrap();
    let client = AllenClient::new(Arc::new(atlas()));
    let pipeline = ExpressionPipeline::new(client, store, tracing::info_span!("test_pipeline"));

    let report = pipeline.run(&genes(&["APP", "MAPT", "SNCA", "NOPE"])).await.unwrap();

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.n_saved(), 1);
    assert_eq!(report.n_skipped(), 3);

    let order: Vec<&str> = report.outcomes.iter().map(GeneOutcome::gene).collect();
    assert_eq!(order, vec!["APP", "MAPT", "SNCA", "NOPE"]);

    match &report.outcomes[0] {
        GeneOutcome::Saved { path, record, .. } => {
            assert_eq!(path, &dir.path().join("APP_expression.json"));
            assert_eq!(record.experiment_id, Some(100u64.into()));
            assert_eq!(record.structures.len(), 2);
            assert_eq!(record.structures[1].structure_id, Some(698u64.into()));
        }
        other => panic!("APP should be saved, got {other:?}"),
    }

    match &report.outcomes[2] {
        GeneOutcome::Skipped { reason, .. } => assert_eq!(reason, "empty result"),
        other => panic!("SNCA should be skipped, got {other:?}"),
    }

    // NOPE has no canned response: the 404 is a per-gene failure, not a fatal one.
    assert!(matches!(&report.outcomes[3], GeneOutcome::Skipped { .. }));

    let stored = pipeline.store().load_record("APP").unwrap().unwrap();
    let (_, saved) = report.saved().next().unwrap();
    assert_eq!(&stored, saved);
    assert!(dir.path().join("APP_info.json").exists());
    assert!(dir.path().join("MAPT_info.json").exists());
    assert!(!dir.path().join("MAPT_expression.json").exists());
}

/// Collects formatted log lines for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_pipeline_logs_gene_info() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = tempfile::tempdir().unwrap();
    let mock = atlas().with(
        &gene_query("APP"),
        json!({"msg": [{"id": 11, "acronym": "APP", "name": "amyloid beta precursor protein",
                        "entrez_id": 351, "chromosome_id": 21}]}),
    );
    let pipeline = ExpressionPipeline::new(
        AllenClient::new(Arc::new(mock)),
        JsonFileStore::new(dir.path()).unwrap(),
        tracing::info_span!("test_pipeline"),
    );
    pipeline.run(&genes(&["APP"])).await.unwrap();

    let out = logs.contents();
    let line = out.lines().find(|l| l.contains("Gene info")).expect("no gene info line");
    assert!(line.contains("gene=APP"), "{line}");
    assert!(line.contains("amyloid beta precursor protein"), "{line}");
    assert!(line.contains("entrez_id=Some(351)"), "{line}");
    assert!(line.contains("chromosome_id=Some(21)"), "{line}");
}

#[tokio::test]
async fn test_pipeline_aborts_when_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path()).unwrap();
    let mock = Arc::new(MockTransport::new().with_status(CONNECTION, 503));
    let client = AllenClient::new(mock.clone() as Arc<dyn AtlasTransport>);
    let pipeline = ExpressionPipeline::new(client, store, tracing::Span::none());

    assert!(pipeline.run(&genes(&["APP"])).await.is_err());
    assert_eq!(mock.requests(), vec![CONNECTION]);
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_live_atlas_app() {
    use brainmap_ingestion::sources::{HttpTransport, ALLEN_API_URL};

    let transport = HttpTransport::new(ALLEN_API_URL, std::time::Duration::from_secs(30)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ExpressionPipeline::new(
        AllenClient::new(Arc::new(transport)),
        JsonFileStore::new(dir.path()).unwrap(),
        tracing::info_span!("live"),
    );

    let report = pipeline.run(&genes(&["APP"])).await.expect("atlas unreachable");
    println!("{:#?}", report.outcomes);
    assert_eq!(report.outcomes.len(), 1);
}
