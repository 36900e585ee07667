// Hosted dataset access
//
// Rows are streamed from the HuggingFace datasets-server rows API page by
// page and normalized into the single {input, target} shape. Each dataset
// names up to two alternative source fields per side; the first non-empty
// one wins and missing fields floor to the empty string.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::TrainingExample;
use crate::config::constants::ROWS_PAGE_SIZE;

/// A hosted dataset plus the field names its schema uses.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// Dataset id on the Hub, e.g. "lavita/MedQuAD"
    pub dataset: &'static str,
    /// Dataset config name ("default" when the dataset has only one)
    pub config: &'static str,
    pub split: &'static str,
    /// Alternative field names for the prompt side, in priority order
    pub input_fields: &'static [&'static str],
    /// Alternative field names for the answer side, in priority order
    pub target_fields: &'static [&'static str],
}

/// Instruction/response dataset with two alternative names per side.
pub const MEDICAL_O1_SFT: DatasetSpec = DatasetSpec {
    dataset: "FreedomIntelligence/medical-o1-reasoning-SFT",
    config: "en",
    split: "train",
    input_fields: &["instruction", "prompt"],
    target_fields: &["response", "completion"],
};

/// Q/A dataset with a single name per side.
pub const MEDQUAD: DatasetSpec = DatasetSpec {
    dataset: "lavita/MedQuAD",
    config: "default",
    split: "train",
    input_fields: &["question"],
    target_fields: &["answer"],
};

/// One page of the rows API response.
#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: u64,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: Value,
}

/// Fetch every row of a dataset split and normalize it.
pub async fn fetch_dataset(
    client: &Client,
    base_url: &str,
    spec: &DatasetSpec,
    token: Option<&str>,
) -> Result<Vec<TrainingExample>> {
    let mut examples = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let page = fetch_page(client, base_url, spec, token, offset).await?;
        let fetched = page.rows.len() as u64;

        for entry in &page.rows {
            examples.push(normalize(&entry.row, spec));
        }

        offset += fetched;
        if offset >= page.num_rows_total || fetched == 0 {
            break;
        }
    }

    tracing::info!(dataset = spec.dataset, rows = examples.len(), "Dataset fetched");
    Ok(examples)
}

async fn fetch_page(
    client: &Client,
    base_url: &str,
    spec: &DatasetSpec,
    token: Option<&str>,
    offset: u64,
) -> Result<RowsPage> {
    let offset = offset.to_string();
    let length = ROWS_PAGE_SIZE.to_string();
    let mut request = client.get(format!("{base_url}/rows")).query(&[
        ("dataset", spec.dataset),
        ("config", spec.config),
        ("split", spec.split),
        ("offset", offset.as_str()),
        ("length", length.as_str()),
    ]);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let page = request
        .send()
        .await
        .with_context(|| format!("Request to rows API failed for {}", spec.dataset))?
        .error_for_status()
        .with_context(|| format!("Rows API returned an error for {}", spec.dataset))?
        .json::<RowsPage>()
        .await
        .with_context(|| format!("Malformed rows API response for {}", spec.dataset))?;

    Ok(page)
}

/// Normalize one raw row. Never produces a null field: a missing or non-string
/// field reads as the empty string, and both sides are whitespace-trimmed.
pub fn normalize(row: &Value, spec: &DatasetSpec) -> TrainingExample {
    TrainingExample::new(
        first_non_empty(row, spec.input_fields),
        first_non_empty(row, spec.target_fields),
    )
}

fn first_non_empty(row: &Value, fields: &[&str]) -> String {
    for field in fields {
        let text = row.get(field).and_then(Value::as_str).unwrap_or("").trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_sft_primary_fields() {
        let row = json!({"instruction": " What causes asthma? ", "response": " Airway inflammation. "});
        let ex = normalize(&row, &MEDICAL_O1_SFT);
        assert_eq!(ex.input, "What causes asthma?");
        assert_eq!(ex.target, "Airway inflammation.");
    }

    #[test]
    fn test_normalize_sft_falls_back_to_alternative_fields() {
        let row = json!({"prompt": "Define hypertension", "completion": "High blood pressure."});
        let ex = normalize(&row, &MEDICAL_O1_SFT);
        assert_eq!(ex.input, "Define hypertension");
        assert_eq!(ex.target, "High blood pressure.");
    }

    #[test]
    fn test_normalize_prefers_first_non_empty_alternative() {
        // instruction present but blank: the prompt alternative wins
        let row = json!({"instruction": "   ", "prompt": "fallback", "response": "r"});
        let ex = normalize(&row, &MEDICAL_O1_SFT);
        assert_eq!(ex.input, "fallback");
    }

    #[test]
    fn test_normalize_never_produces_null_fields() {
        // All four schema variants, including fully missing and explicit null
        let rows = [
            json!({}),
            json!({"question": null, "answer": null}),
            json!({"instruction": null}),
            json!({"question": 42}),
        ];
        for row in &rows {
            for spec in [&MEDICAL_O1_SFT, &MEDQUAD] {
                let ex = normalize(row, spec);
                assert_eq!(ex.input, "");
                assert_eq!(ex.target, "");
            }
        }
    }

    #[test]
    fn test_normalize_medquad() {
        let row = json!({"question": "What is Lyme disease?", "answer": "A tick-borne illness."});
        let ex = normalize(&row, &MEDQUAD);
        assert_eq!(ex.input, "What is Lyme disease?");
        assert_eq!(ex.target, "A tick-borne illness.");
    }

    #[tokio::test]
    async fn test_fetch_dataset_paginates() {
        let mut server = mockito::Server::new_async().await;

        let page1 = json!({
            "rows": [
                {"row_idx": 0, "row": {"question": "q0", "answer": "a0"}},
                {"row_idx": 1, "row": {"question": "q1", "answer": "a1"}}
            ],
            "num_rows_total": 3
        });
        let page2 = json!({
            "rows": [
                {"row_idx": 2, "row": {"question": "q2", "answer": "a2"}}
            ],
            "num_rows_total": 3
        });

        let _m1 = server
            .mock("GET", "/rows")
            .match_query(mockito::Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_header("content-type", "application/json")
            .with_body(page1.to_string())
            .create_async()
            .await;
        let _m2 = server
            .mock("GET", "/rows")
            .match_query(mockito::Matcher::UrlEncoded("offset".into(), "2".into()))
            .with_header("content-type", "application/json")
            .with_body(page2.to_string())
            .create_async()
            .await;

        let client = Client::new();
        let examples = fetch_dataset(&client, &server.url(), &MEDQUAD, None)
            .await
            .unwrap();

        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0].input, "q0");
        assert_eq!(examples[2].target, "a2");
    }

    #[tokio::test]
    async fn test_fetch_dataset_aborts_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/rows")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = Client::new();
        let result = fetch_dataset(&client, &server.url(), &MEDQUAD, None).await;
        assert!(result.is_err());
    }
}
