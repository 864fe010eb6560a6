//! Article-to-graph flow over the ingestion fixtures and a mock PubMed.

use std::path::PathBuf;
use std::time::Duration;

use pubkg_common::{PubkgError, RelationType};
use pubkg_ingestion::sources::pubmed::PmcMirrorSource;
use pubkg_ingestion::{PubMedDownloader, XmlSource};
use pubkg_kg::{
    answer_question, load_knowledge_graph, process_pubmed_id, KgBuilder, KnowledgeGraph, ProcessOptions,
};
use pubkg_ner::{EntityDictionary, EntityExtractor};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../pubkg-ingestion/tests/fixtures")
        .join(name)
}

fn builder() -> KgBuilder {
    KgBuilder::new(EntityExtractor::with_dictionary(&EntityDictionary::default()).unwrap())
}

fn has_edge(kg: &KnowledgeGraph, source: &str, relation: RelationType, target: &str) -> bool {
    kg.out_edges(source)
        .any(|e| e.target == target && e.data.relation_type == relation)
}

#[tokio::test]
async fn test_build_from_pubmed_fixture() {
    let mut kg = KnowledgeGraph::new();
    let (report, article) = builder()
        .build_from_xml_file(&mut kg, &fixture("pubmed_32133153.xml"))
        .await
        .unwrap();

    assert_eq!(report.pmid, "32133153");
    assert_eq!(article.metadata.pmid.as_deref(), Some("32133153"));
    assert!(report.entity_count > 0);
    assert!(has_edge(&kg, "DRUG:metformin", RelationType::Treats, "DISEASE:diabetes"));
    assert!(kg.contains_node("ORGANISM:sars-cov-2"));

    let stats = kg.statistics();
    assert_eq!(stats.sources, vec!["32133153"]);
    assert_eq!(stats.node_count, kg.node_count());
}

#[tokio::test]
async fn test_process_pubmed_id_creates_then_extends() {
    let server = MockServer::start().await;
    let body = std::fs::read_to_string(fixture("pubmed_32133153.xml")).unwrap();
    Mock::given(method("GET"))
        .and(path("/pmc/32133153/xml/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let sources: Vec<Box<dyn XmlSource>> = vec![Box::new(PmcMirrorSource::new(format!("{}/pmc", server.uri())))];
    let downloader = PubMedDownloader::with_sources(sources, Duration::from_secs(5)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut options = ProcessOptions {
        xml_dir: dir.path().join("xml"),
        output_dir: dir.path().join("kg"),
        kg_file: Some(dir.path().join("does-not-exist.json")),
    };

    let first = process_pubmed_id("32133153", &downloader, &builder(), &options).await.unwrap();
    assert_eq!(first.output_path, dir.path().join("kg").join("kg_32133153.json"));
    assert_eq!(first.download.path, dir.path().join("xml").join("pubmed_32133153.xml"));
    let saved = load_knowledge_graph(&first.output_path).unwrap();
    assert_eq!(saved.node_count(), first.kg.node_count());
    assert_eq!(saved.edge_count(), first.kg.edge_count());

    // Re-processing into the saved graph keeps nodes and adds parallel edges
    options.kg_file = Some(first.output_path.clone());
    let second = process_pubmed_id("32133153", &downloader, &builder(), &options).await.unwrap();
    assert_eq!(second.kg.node_count(), first.kg.node_count());
    assert_eq!(second.kg.edge_count(), 2 * first.kg.edge_count());

    let answer = answer_question("Which drug treats diabetes?", &second.output_path, 1).await;
    assert!(answer.answer.contains("RELATION (TREATS) metformin -> diabetes"));
    assert!(answer.citations.iter().all(|c| c.pubmed_id == "32133153"));
}

#[tokio::test]
async fn test_process_rejects_invalid_pmid() {
    let downloader = PubMedDownloader::with_sources(Vec::new(), Duration::from_secs(1)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let options = ProcessOptions {
        xml_dir: dir.path().join("xml"),
        output_dir: dir.path().join("kg"),
        kg_file: None,
    };
    let err = process_pubmed_id("PMC123", &downloader, &builder(), &options).await.unwrap_err();
    assert!(matches!(err, PubkgError::InvalidPubmedId(_)));
    assert!(!dir.path().join("xml").exists());
}
