pub mod amount;
pub mod types;

pub use amount::parse_amount;
pub use types::{
    EnrichedCustomerRecord, FactorContribution, RawCustomerRecord, ScoreBreakdown,
};

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read a JSON array of customer rows from a file, or from stdin when the
/// path is `-`.
pub fn load_records(path: &Path) -> Result<Vec<RawCustomerRecord>> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read records from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records file at {}", path.display()))?
    };

    parse_records(&content)
        .with_context(|| format!("Failed to parse records from {}", path.display()))
}

/// Parse a JSON array of customer rows. Also accepts the paginated envelope
/// `{ "itens": [...], "proximaPagina": ... }` returned by the API.
pub fn parse_records(content: &str) -> Result<Vec<RawCustomerRecord>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Payload {
        List(Vec<RawCustomerRecord>),
        Page { itens: Vec<RawCustomerRecord> },
    }

    let payload: Payload = serde_json::from_str(content).context("Invalid records JSON")?;
    Ok(match payload {
        Payload::List(records) => records,
        Payload::Page { itens } => itens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_plain_list() {
        let records = parse_records(r#"[{"clienteId": 1}, {"clienteId": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].customer_id, 2);
    }

    #[test]
    fn test_parse_paginated_envelope() {
        let records =
            parse_records(r#"{"itens": [{"clienteId": 9}], "proximaPagina": null}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].customer_id, 9);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_records("not json").is_err());
    }

    #[test]
    fn test_load_records_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"clienteId": 3, "saldoDevedor": "R$ 10,00"}}]"#).unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records[0].outstanding_balance, 10.0);
    }

    #[test]
    fn test_load_records_missing_file() {
        let err = load_records(Path::new("/nonexistent/records.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read records file"));
    }
}
