//! Domain records exchanged with the data service.
//!
//! Field names on the wire follow the service's JSON (`phage_name`,
//! `host_name`, `pubmedID`, ...). Payloads that the service ships as
//! JSON-encoded strings (`matrix_data`, time series sides) are accepted both
//! as strings and as inline JSON.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Subjects ──────────────────────────────────────────────────────────────────

/// The two cross-referenced entity types of a record.
/// Subject A is the phage, subject B the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "phage", alias = "subject_a")]
    A,
    #[serde(rename = "host", alias = "subject_b")]
    B,
}

impl Subject {
    pub const ALL: [Subject; 2] = [Subject::A, Subject::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::A => "phage",
            Subject::B => "host",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Dataset records ───────────────────────────────────────────────────────────

/// Publication metadata of the study a record belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyMetadata {
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(rename = "first_author", default)]
    pub author: Option<String>,
    #[serde(rename = "pubmedID", default, deserialize_with = "lenient_string")]
    pub pubmed_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
}

/// One dataset of the catalog. Held read-only for the whole session.
///
/// No two records share `(subject_a, subject_b, source)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: i64,
    /// Study identifier, e.g. `Sprenger_2024`.
    pub source: String,
    #[serde(rename = "phage_name")]
    pub subject_a: String,
    #[serde(rename = "host_name")]
    pub subject_b: String,
    #[serde(rename = "host_group", default)]
    pub group: Option<String>,
    #[serde(default)]
    pub normalization: String,
    #[serde(flatten)]
    pub study: StudyMetadata,
    #[serde(
        rename = "matrix_data",
        default,
        deserialize_with = "optional_json_or_embedded",
        skip_serializing_if = "Option::is_none"
    )]
    pub matrix: Option<MatrixPayload>,
}

impl DatasetRecord {
    pub fn subject(&self, subject: Subject) -> &str {
        match subject {
            Subject::A => &self.subject_a,
            Subject::B => &self.subject_b,
        }
    }
}

/// Expression matrix of a study: one row per gene, one value per time point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixPayload {
    /// Time point labels.
    pub columns: Vec<String>,
    pub data: Vec<MatrixRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    #[serde(rename = "geneID")]
    pub gene_id: String,
    pub symbol: String,
    pub entity: Subject,
    #[serde(rename = "classThresholds", default)]
    pub class_threshold: Option<String>,
    #[serde(rename = "classMax", default)]
    pub class_max: Option<String>,
    #[serde(default)]
    pub variance: Option<f64>,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

impl MatrixPayload {
    /// Gene symbols of one subject in payload order.
    pub fn symbols(&self, subject: Subject) -> Vec<String> {
        self.data
            .iter()
            .filter(|row| row.entity == subject)
            .map(|row| row.symbol.clone())
            .collect()
    }
}

// ── Derived view data ─────────────────────────────────────────────────────────

/// Gene counts per subject for one study; the range slider domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySize {
    #[serde(rename = "phages", alias = "subject_a_count")]
    pub subject_a_count: u32,
    #[serde(rename = "hosts", alias = "subject_b_count")]
    pub subject_b_count: u32,
}

impl EntitySize {
    pub fn count(&self, subject: Subject) -> u32 {
        match subject {
            Subject::A => self.subject_a_count,
            Subject::B => self.subject_b_count,
        }
    }
}

/// Heatmap grid: `z[i][j]` is the value of gene `y[i]` at time point `x[j]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<Option<f64>>>,
}

impl HeatmapData {
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Keep only rows whose gene is in `genes`, preserving row order and
    /// y/z alignment.
    pub fn restricted_to(&self, genes: &[String]) -> HeatmapData {
        let (y, z) = self
            .y
            .iter()
            .zip(self.z.iter())
            .filter(|(gene, _)| genes.contains(gene))
            .map(|(gene, row)| (gene.clone(), row.clone()))
            .unzip();
        HeatmapData { x: self.x.clone(), y, z }
    }
}

/// One long-format time series sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Value", default)]
    pub value: Option<f64>,
    #[serde(rename = "ClassMax", default)]
    pub class_max: Option<String>,
    #[serde(rename = "ClassThreshold", default)]
    pub class_threshold: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesData {
    #[serde(rename = "phages", deserialize_with = "json_or_embedded")]
    pub subject_a: Vec<TimeSeriesPoint>,
    #[serde(rename = "hosts", deserialize_with = "json_or_embedded")]
    pub subject_b: Vec<TimeSeriesPoint>,
}

impl TimeSeriesData {
    pub fn side(&self, subject: Subject) -> &[TimeSeriesPoint] {
        match subject {
            Subject::A => &self.subject_a,
            Subject::B => &self.subject_b,
        }
    }

    /// Samples of one subject restricted to the given gene symbols.
    pub fn restricted_to(&self, subject: Subject, genes: &[String]) -> Vec<TimeSeriesPoint> {
        self.side(subject)
            .iter()
            .filter(|point| genes.contains(&point.symbol))
            .cloned()
            .collect()
    }
}

// ── Serde helpers ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Embedded<T> {
    Encoded(String),
    Inline(T),
}

impl<T: DeserializeOwned> Embedded<T> {
    fn decode<E: serde::de::Error>(self) -> Result<T, E> {
        match self {
            Embedded::Inline(value) => Ok(value),
            Embedded::Encoded(text) => serde_json::from_str(&text).map_err(E::custom),
        }
    }
}

fn json_or_embedded<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Embedded::<T>::deserialize(deserializer)?.decode()
}

fn optional_json_or_embedded<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Embedded<T>>::deserialize(deserializer)? {
        Some(Embedded::Encoded(text)) if text.trim().is_empty() || text == "null" => Ok(None),
        Some(raw) => raw.decode().map(Some),
        None => Ok(None),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected string or number, got {other}"))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overview_record_without_matrix() {
        let raw = json!({
            "source": "Sprenger_2024",
            "id": 7,
            "phage_id": 3,
            "phage_name": "T4",
            "host_id": 1,
            "host_name": "E. coli K12",
            "host_group": "Enterobacteria",
            "matrix_data": null,
            "normalization": "TPM_means",
            "journal": "Nature",
            "year": 2024,
            "first_author": "Sprenger",
            "pubmedID": 38123456,
            "description": "Infection time course",
            "doi": "https://doi.org/10.1000/xyz"
        });
        let record: DatasetRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.subject_a, "T4");
        assert_eq!(record.subject(Subject::B), "E. coli K12");
        assert_eq!(record.study.pubmed_id.as_deref(), Some("38123456"));
        assert!(record.matrix.is_none());
    }

    #[test]
    fn test_matrix_data_as_embedded_string() {
        let matrix = json!({
            "columns": ["0", "5"],
            "data": [
                {"geneID": "g1", "symbol": "gp23", "entity": "phage", "classThresholds": "late",
                 "classMax": "late", "variance": 1.5, "values": [0.1, null]},
                {"geneID": "b1", "symbol": "thrL", "entity": "host", "classThresholds": null,
                 "classMax": null, "variance": 0.2, "values": [1.0, 2.0]}
            ]
        });
        let raw = json!({
            "source": "S1", "id": 1, "phage_name": "T4", "host_name": "K12",
            "normalization": "TPM_means",
            "matrix_data": matrix.to_string()
        });
        let record: DatasetRecord = serde_json::from_value(raw).unwrap();
        let payload = record.matrix.unwrap();
        assert_eq!(payload.symbols(Subject::A), vec!["gp23".to_string()]);
        assert_eq!(payload.symbols(Subject::B), vec!["thrL".to_string()]);
        assert_eq!(payload.data[0].values, vec![Some(0.1), None]);
    }

    #[test]
    fn test_time_series_sides_as_strings() {
        let side = json!([{"Symbol": "gp23", "ClassMax": "late", "ClassThreshold": "late",
                           "Time": "5", "Value": 0.4}]);
        let raw = json!({"phages": side.to_string(), "hosts": []});
        let series: TimeSeriesData = serde_json::from_value(raw).unwrap();
        assert_eq!(series.subject_a.len(), 1);
        assert_eq!(series.subject_a[0].symbol, "gp23");
        assert!(series.subject_b.is_empty());
    }

    #[test]
    fn test_heatmap_restriction_keeps_rows_aligned() {
        let data = HeatmapData {
            x: vec!["0".into(), "5".into()],
            y: vec!["a".into(), "b".into(), "c".into()],
            z: vec![
                vec![Some(1.0), Some(2.0)],
                vec![Some(3.0), Some(4.0)],
                vec![Some(5.0), None],
            ],
        };
        let restricted = data.restricted_to(&["c".to_string(), "a".to_string()]);
        assert_eq!(restricted.y, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(restricted.z, vec![vec![Some(1.0), Some(2.0)], vec![Some(5.0), None]]);
        assert_eq!(restricted.x, data.x);
    }

    #[test]
    fn test_entity_size_wire_names() {
        let size: EntitySize = serde_json::from_value(json!({"phages": 50, "hosts": 4300})).unwrap();
        assert_eq!(size.count(Subject::A), 50);
        assert_eq!(size.count(Subject::B), 4300);
    }

    #[test]
    fn test_subject_wire_names() {
        assert_eq!(serde_json::from_value::<Subject>(json!("host")).unwrap(), Subject::B);
        assert_eq!(serde_json::from_value::<Subject>(json!("subject_a")).unwrap(), Subject::A);
        assert!(serde_json::from_value::<Subject>(json!("virus")).is_err());
    }
}
