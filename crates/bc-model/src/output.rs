//! Parsing of the simulation's timeseries output files.
//!
//! A file starts with `*`-prefixed header lines. `*FieldNames:` lists the
//! column names separated by commas and `*EndOfHeader` ends the header.
//! Each following non-blank line is one whitespace-separated row of finite
//! numbers.

use std::fs;
use std::path::Path;

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesTable {
    fields: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TimeseriesTable {
    #[cfg(test)]
    pub(crate) fn from_rows(fields: &[&str], rows: Vec<Vec<f64>>) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            rows,
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column.
    pub fn column(&self, field: &str) -> ModelResult<Vec<f64>> {
        let index = self
            .fields
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| ModelError::MissingField {
                field: field.to_string(),
            })?;
        Ok(self.rows.iter().map(|row| row[index]).collect())
    }
}

pub fn parse_timeseries(text: &str) -> ModelResult<TimeseriesTable> {
    let mut fields: Option<Vec<String>> = None;
    let mut lines = text.lines().enumerate();
    let mut header_ended = false;

    for (_, line) in lines.by_ref() {
        let line = line.trim();
        if let Some(names) = line.strip_prefix("*FieldNames:") {
            fields = Some(names.split(',').map(|n| n.trim().to_string()).collect());
        } else if line.starts_with("*EndOfHeader") {
            header_ended = true;
            break;
        }
    }
    if !header_ended {
        return Err(ModelError::Timeseries {
            detail: "no *EndOfHeader line".to_string(),
        });
    }
    let fields = fields.ok_or_else(|| ModelError::Timeseries {
        detail: "no *FieldNames line".to_string(),
    })?;

    let mut rows = Vec::new();
    for (number, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(parse_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|detail| ModelError::Timeseries {
                detail: format!("line {}: {detail}", number + 1),
            })?;
        if row.len() != fields.len() {
            return Err(ModelError::Timeseries {
                detail: format!(
                    "line {}: {} values for {} fields",
                    number + 1,
                    row.len(),
                    fields.len()
                ),
            });
        }
        rows.push(row);
    }

    Ok(TimeseriesTable { fields, rows })
}

fn parse_value(token: &str) -> Result<f64, String> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("non-finite value '{token}'")),
        Err(e) => Err(format!("'{token}': {e}")),
    }
}

pub fn read_timeseries(path: &Path) -> ModelResult<TimeseriesTable> {
    let text = fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    parse_timeseries(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
*RunDateTime: 2012-02-21 06:12:00
*FieldNames: time, 3 m avg nitrate concentration, 3 m avg micro phytoplankton biomass
*FieldUnits: hr since 2011-09-19 00:00:00, uM N, uM N
*EndOfHeader
0.25 25.0 0.5
0.50   24.5   0.6

0.75 24.0 0.7
";

    #[test]
    fn parses_header_and_rows() {
        let table = parse_timeseries(SAMPLE).unwrap();
        assert_eq!(table.fields().len(), 3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("time").unwrap(), vec![0.25, 0.5, 0.75]);
        assert_eq!(
            table.column("3 m avg micro phytoplankton biomass").unwrap(),
            vec![0.5, 0.6, 0.7]
        );
    }

    #[test]
    fn unknown_field_is_an_error() {
        let table = parse_timeseries(SAMPLE).unwrap();
        assert!(matches!(
            table.column("salinity"),
            Err(ModelError::MissingField { .. })
        ));
    }

    #[test]
    fn truncated_header_is_an_error() {
        assert!(parse_timeseries("*FieldNames: time\n1.0\n").is_err());
    }

    #[test]
    fn ragged_row_is_an_error() {
        let text = "*FieldNames: a, b\n*EndOfHeader\n1.0 2.0\n3.0\n";
        let err = parse_timeseries(text).unwrap_err();
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn non_numeric_value_is_an_error() {
        let text = "*FieldNames: a\n*EndOfHeader\nNaN?\n";
        assert!(parse_timeseries(text).is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for bad in ["NaN", "inf", "-inf"] {
            let text = format!("*FieldNames: a, b\n*EndOfHeader\n0.25 1.0\n0.50 {bad}\n");
            let err = parse_timeseries(&text).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("line 4"), "{bad}: {msg}");
            assert!(msg.contains("non-finite"), "{bad}: {msg}");
        }
    }

    #[test]
    fn truncated_last_line_is_an_error() {
        // Output cut off part way through a number, then part way through a row.
        let cut_number = format!("{SAMPLE}1.00 23.5 0.8e");
        assert!(parse_timeseries(&cut_number).is_err());
        let cut_row = format!("{SAMPLE}1.00 23.5");
        let err = parse_timeseries(&cut_row).unwrap_err();
        assert!(err.to_string().contains("2 values for 3 fields"));
    }
}
