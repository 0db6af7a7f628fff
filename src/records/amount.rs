use serde::{Deserialize, Deserializer};

/// Parse a numeric or pt-BR currency string ("R$ 1.234,56") into a number.
///
/// Anything that cannot be read as a finite number becomes `0.0`.
/// Without a decimal comma a single `.` followed by exactly three digits is
/// read as a thousands separator ("1.000" is one thousand).
pub fn parse_amount(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        match cleaned.matches('.').count() {
            0 => cleaned,
            1 => {
                let decimals = cleaned.rsplit('.').next().map_or(0, str::len);
                if decimals == 3 {
                    cleaned.replace('.', "")
                } else {
                    cleaned
                }
            }
            _ => cleaned.replace('.', ""),
        }
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Accept a JSON number, a numeric string or a currency string. Null and
/// anything else read as zero.
pub fn lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Number(n) if n.is_finite() => n,
        Lenient::Number(_) => 0.0,
        Lenient::Text(s) => parse_amount(&s),
        Lenient::Other(_) => 0.0,
    })
}

/// Like [`lenient`], rounded to a non-negative count.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient(deserializer)?;
    if value > 0.0 {
        Ok(value.round().min(u32::MAX as f64) as u32)
    } else {
        Ok(0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Integer(i64),
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Customer id from a number or a numeric string. Anything else reads as 0 so
/// one odd row does not reject the whole portfolio.
pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Integer(n) => n,
        Scalar::Number(n) if n.is_finite() => n.round() as i64,
        Scalar::Text(s) => s
            .trim()
            .parse::<i64>()
            .unwrap_or_else(|_| parse_amount(&s).round() as i64),
        Scalar::Number(_) | Scalar::Other(_) => 0,
    })
}

/// Null-tolerant string. Numbers are kept as their decimal text.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Integer(n) => n.to_string(),
        Scalar::Number(n) => n.to_string(),
        Scalar::Other(_) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_amount("1500"), 1500.0);
        assert_eq!(parse_amount("12.5"), 12.5);
        assert_eq!(parse_amount("-3"), -3.0);
    }

    #[test]
    fn test_parse_brazilian_currency() {
        assert_eq!(parse_amount("R$ 1.234,56"), 1234.56);
        assert_eq!(parse_amount("R$ 1.234.567,89"), 1234567.89);
        assert_eq!(parse_amount("1.000"), 1000.0);
        assert_eq!(parse_amount("0,5"), 0.5);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("N/A"), 0.0);
        assert_eq!(parse_amount("1,2,3"), 0.0);
        assert_eq!(parse_amount("--"), 0.0);
    }

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "id")]
        id: i64,
        #[serde(default, deserialize_with = "lenient")]
        amount: f64,
        #[serde(default, deserialize_with = "count")]
        count: u32,
        #[serde(default, deserialize_with = "text")]
        name: String,
    }

    #[test]
    fn test_lenient_accepts_numbers_strings_and_null() {
        let row: Row =
            serde_json::from_str(r#"{"amount": "R$ 2.500,00", "count": 3, "name": null}"#)
                .unwrap();
        assert_eq!(row.amount, 2500.0);
        assert_eq!(row.count, 3);
        assert_eq!(row.name, "");

        let row: Row =
            serde_json::from_str(r#"{"amount": null, "count": "-2", "name": "x"}"#).unwrap();
        assert_eq!(row.amount, 0.0);
        assert_eq!(row.count, 0);
    }

    #[test]
    fn test_lenient_ignores_unexpected_shapes() {
        let row: Row = serde_json::from_str(r#"{"amount": [1, 2], "count": true}"#).unwrap();
        assert_eq!(row.amount, 0.0);
        assert_eq!(row.count, 0);
    }

    #[test]
    fn test_id_accepts_numbers_and_numeric_strings() {
        let row: Row = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(row.id, 42);
        let row: Row = serde_json::from_str(r#"{"id": " 42 "}"#).unwrap();
        assert_eq!(row.id, 42);
        let row: Row = serde_json::from_str(r#"{"id": 7.0}"#).unwrap();
        assert_eq!(row.id, 7);
        let row: Row = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(row.id, 0);
        let row: Row = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(row.id, 0);
    }

    #[test]
    fn test_text_keeps_numbers_as_text() {
        let row: Row = serde_json::from_str(r#"{"name": 1234}"#).unwrap();
        assert_eq!(row.name, "1234");
        let row: Row = serde_json::from_str(r#"{"name": {"nested": true}}"#).unwrap();
        assert_eq!(row.name, "");
    }

    #[test]
    fn test_count_rounds_fractions() {
        let row: Row = serde_json::from_str(r#"{"count": 2.6}"#).unwrap();
        assert_eq!(row.count, 3);
    }
}
