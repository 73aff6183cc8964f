//! `KEY=VALUE` line format of the persisted top score.
//!
//! Only `TOP_SCORE` is understood today. Other keys and lines without `=` are
//! skipped so that newer files still load.

use super::error::RecordError;

pub const TOP_SCORE_KEY: &str = "TOP_SCORE";

/// Extract the top score from a record. Missing key means no score yet.
pub fn parse_record(contents: &str) -> Result<Option<u32>, RecordError> {
    let mut top_score = None;

    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != TOP_SCORE_KEY {
            continue;
        }

        let value = value.trim();
        let parsed = value.parse::<u32>().map_err(|_| RecordError::InvalidValue {
            value: value.to_string(),
        })?;
        top_score = Some(parsed);
    }

    Ok(top_score)
}

/// Encode a top score as a single record line
pub fn format_record(top_score: u32) -> String {
    format!("{TOP_SCORE_KEY}={top_score}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_record(42), "TOP_SCORE=42\n");
    }

    #[test]
    fn test_parse_single_line() {
        assert_eq!(parse_record("TOP_SCORE=17\n"), Ok(Some(17)));
        assert_eq!(parse_record("TOP_SCORE=17"), Ok(Some(17)));
    }

    #[test]
    fn test_unknown_keys_and_noise_are_ignored() {
        let contents = "# saved by an older build\nPLAYER=ana\nTOP_SCORE=9\nLEVEL=3\n\n";
        assert_eq!(parse_record(contents), Ok(Some(9)));
    }

    #[test]
    fn test_missing_key() {
        assert_eq!(parse_record(""), Ok(None));
        assert_eq!(parse_record("LEVEL=3\n"), Ok(None));
    }

    #[test]
    fn test_invalid_value() {
        assert_eq!(
            parse_record("TOP_SCORE=lots\n"),
            Err(RecordError::InvalidValue {
                value: "lots".to_string()
            })
        );
        assert!(parse_record("TOP_SCORE=-4\n").is_err());
    }

    #[test]
    fn test_last_value_wins() {
        assert_eq!(parse_record("TOP_SCORE=3\nTOP_SCORE=8\n"), Ok(Some(8)));
    }
}
