use crate::annotation::{csv_reader, upload_error};
use crate::error::{Result, TreeError};
use crate::tree::NodeId;
use std::collections::HashMap;

/// Parse a two-column CSV of per-node values. One column must be named
/// `node_id`; the other holds the value. The whole file is rejected on the
/// first bad row.
pub fn parse_user_annotations(text: &str) -> Result<HashMap<NodeId, f64>> {
    let mut reader = csv_reader(text);
    let headers = reader.headers().map_err(upload_error)?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(TreeError::InvalidUploadFormat("file is empty".to_string()));
    }
    if headers.len() != 2 {
        return Err(TreeError::InvalidUploadFormat(format!(
            "expected 2 columns, found {}",
            headers.len()
        )));
    }
    let id_col = headers
        .iter()
        .position(|c| c == "node_id")
        .ok_or_else(|| TreeError::InvalidUploadFormat("no node_id column".to_string()))?;
    let value_col = 1 - id_col;

    let mut values = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(upload_error)?;
        let line_no = record.position().map_or(0, |p| p.line());
        let id: NodeId = record[id_col].parse().map_err(|_| {
            TreeError::InvalidUploadFormat(format!(
                "line {}: '{}' is not a node id",
                line_no, &record[id_col]
            ))
        })?;
        let value: f64 = record[value_col].parse().map_err(|_| {
            TreeError::InvalidUploadFormat(format!(
                "line {}: '{}' is not a number",
                line_no, &record[value_col]
            ))
        })?;
        values.insert(id, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_values_by_node_id() {
        let values = parse_user_annotations("score,node_id\n0.5,3\n1.25,7\n").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[&NodeId(3)], 0.5);
        assert_eq!(values[&NodeId(7)], 1.25);
    }

    #[test]
    fn quoted_fields_and_padding_are_accepted() {
        let values = parse_user_annotations("\"node_id\",\"score\"\n\"4\", 2.5\n").unwrap();
        assert_eq!(values[&NodeId(4)], 2.5);
    }

    #[test]
    fn bad_row_reports_its_line() {
        match parse_user_annotations("node_id,value\n1,2\n2,oops\n") {
            Err(TreeError::InvalidUploadFormat(msg)) => assert!(msg.contains("line 3"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_wrong_shapes() {
        for text in [
            "",
            "node_id,a,b\n1,2,3\n",
            "id,value\n1,2\n",
            "node_id,value\n1\n",
            "node_id,value\nx,2\n",
            "node_id,value\n1,high\n",
        ] {
            assert!(
                matches!(parse_user_annotations(text), Err(TreeError::InvalidUploadFormat(_))),
                "accepted {:?}",
                text
            );
        }
    }
}
