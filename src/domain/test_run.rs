use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Request body for `add_run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRun {
    pub name: String,
    pub assignedto_id: u64,
    pub case_ids: Vec<u64>,
    pub include_all: bool,
}

/// `"<name> MM/DD/YYYY hh:mm AM"`, using the wall clock of the report's own offset.
pub fn format_run_name(name: &str, start_time: &DateTime<FixedOffset>) -> String {
    let stamp = start_time.format("%m/%d/%Y %I:%M %p").to_string();
    let name = name.trim();
    if name.is_empty() {
        stamp
    } else {
        format!("{} {}", name, stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_run_name() {
        let start = DateTime::parse_from_rfc3339("2019-03-26T20:30:21Z").unwrap();
        assert_eq!(
            format_run_name("Nightly", &start),
            "Nightly 03/26/2019 08:30 PM"
        );

        let morning = DateTime::parse_from_rfc3339("2021-11-02T07:05:00+02:00").unwrap();
        assert_eq!(format_run_name("", &morning), "11/02/2021 07:05 AM");
    }

    #[test]
    fn test_new_run_field_names() {
        let run = NewRun {
            name: "Nightly".to_string(),
            assignedto_id: 4,
            case_ids: vec![10, 11],
            include_all: false,
        };
        assert_eq!(
            serde_json::to_value(run).unwrap(),
            serde_json::json!({
                "name": "Nightly",
                "assignedto_id": 4,
                "case_ids": [10, 11],
                "include_all": false
            })
        );
    }
}
