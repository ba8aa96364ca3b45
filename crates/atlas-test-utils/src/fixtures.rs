//! Catalogs, payload builders and a pre-populated mock source.
//!
//! Every study served by [`mock_source`] gets heatmap values tagged with the
//! study's record id, so a test can tell which study's data a view shows.

use std::future::Future;
use std::time::Duration;

use atlas_catalog::Catalog;
use atlas_client::MockAtlasSource;
use atlas_common::{
    DatasetRecord, EntitySize, HeatmapData, MatrixPayload, MatrixRow, StudyMetadata, Subject,
    TimeSeriesData, TimeSeriesPoint,
};

pub const TIME_POINTS: [&str; 3] = ["0", "10", "20"];

pub fn record(id: i64, subject_a: &str, subject_b: &str, source: &str) -> DatasetRecord {
    DatasetRecord {
        id,
        source: source.to_string(),
        subject_a: subject_a.to_string(),
        subject_b: subject_b.to_string(),
        group: Some("Enterobacteria".to_string()),
        normalization: "TPM_means".to_string(),
        study: StudyMetadata {
            journal: Some("Nucleic Acids Research".to_string()),
            year: Some(2020 + id as i32),
            author: Some(format!("Author{id}")),
            pubmed_id: Some(format!("3{id:07}")),
            description: Some(format!("{subject_a} infecting {subject_b}")),
            doi: Some(format!("https://doi.org/10.1000/{source}")),
        },
        matrix: None,
    }
}

/// Two T4 records that differ in host and study.
pub fn scenario_records() -> Vec<DatasetRecord> {
    vec![
        record(1, "T4", "E.coli-K12", "Study1"),
        record(2, "T4", "E.coli-B", "Study2"),
    ]
}

pub fn scenario_catalog() -> Catalog {
    Catalog::new(scenario_records())
}

/// Several phages, a host with two studies and whitespace in labels.
pub fn multi_study_records() -> Vec<DatasetRecord> {
    vec![
        record(1, "T4", "E. coli K12", "Study1"),
        record(2, "T4", "E.coli-B", "Study2"),
        record(3, "T7", "E.coli-B", "Study2"),
        record(4, "T4", "E. coli K12", "Study4"),
        record(5, "phi KZ", "P. aeruginosa PAO1", "Study3"),
    ]
}

pub fn multi_study_catalog() -> Catalog {
    Catalog::new(multi_study_records())
}

pub fn phage_symbols() -> Vec<String> {
    ["gp23", "gp24", "gp32", "denB", "alt"].map(String::from).to_vec()
}

pub fn host_symbols() -> Vec<String> {
    ["thrL", "dnaK", "rpoB", "lacZ"].map(String::from).to_vec()
}

pub fn matrix(phage: &[String], host: &[String]) -> MatrixPayload {
    let rows = phage
        .iter()
        .map(|s| (s, Subject::A))
        .chain(host.iter().map(|s| (s, Subject::B)))
        .enumerate()
        .map(|(i, (symbol, entity))| MatrixRow {
            gene_id: format!("gene-{i}"),
            symbol: symbol.clone(),
            entity,
            class_threshold: Some("early".to_string()),
            class_max: Some("middle".to_string()),
            variance: Some(i as f64),
            values: TIME_POINTS.iter().enumerate().map(|(j, _)| Some((i * 10 + j) as f64)).collect(),
        })
        .collect();
    MatrixPayload {
        columns: TIME_POINTS.map(String::from).to_vec(),
        data: rows,
    }
}

/// Heatmap whose every value equals `tag`.
pub fn heatmap(symbols: &[String], tag: f64) -> HeatmapData {
    HeatmapData {
        x: TIME_POINTS.map(String::from).to_vec(),
        y: symbols.to_vec(),
        z: symbols.iter().map(|_| vec![Some(tag); TIME_POINTS.len()]).collect(),
    }
}

pub fn time_series(phage: &[String], host: &[String]) -> TimeSeriesData {
    let side = |symbols: &[String]| -> Vec<TimeSeriesPoint> {
        symbols
            .iter()
            .flat_map(|symbol| {
                TIME_POINTS.iter().enumerate().map(move |(j, t)| TimeSeriesPoint {
                    symbol: symbol.clone(),
                    time: t.to_string(),
                    value: Some(j as f64),
                    class_max: Some("middle".to_string()),
                    class_threshold: Some("early".to_string()),
                })
            })
            .collect()
    };
    TimeSeriesData { subject_a: side(phage), subject_b: side(host) }
}

/// Mock serving `records` as the catalog and full data for every study.
/// Per study: 50 phage genes, 400 host genes; heatmaps tagged with the
/// record id (phage) and the negated id (host).
pub fn mock_source(records: Vec<DatasetRecord>) -> MockAtlasSource {
    let (phage, host) = (phage_symbols(), host_symbols());
    let mut mock = MockAtlasSource::new().with_catalog(records.clone());
    for rec in records {
        let tag = rec.id as f64;
        let study = rec.source.clone();
        let detail = DatasetRecord { matrix: Some(matrix(&phage, &host)), ..rec };
        mock = mock
            .with_detail(detail)
            .with_size(&study, EntitySize { subject_a_count: 50, subject_b_count: 400 })
            .with_heatmap(&study, Subject::A, heatmap(&phage, tag))
            .with_heatmap(&study, Subject::B, heatmap(&host, -tag))
            .with_time_series(&study, time_series(&phage, &host));
    }
    mock
}

/// Await `future`, failing the test if it takes longer than five seconds.
pub async fn within<F: Future>(future: F) -> F::Output {
    match tokio::time::timeout(Duration::from_secs(5), future).await {
        Ok(output) => output,
        Err(_) => panic!("timed out waiting for test future"),
    }
}
