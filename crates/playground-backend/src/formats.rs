use serde::{Deserialize, Serialize};

/// A conversion output carried in the uplift archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpliftOutputFormat {
    pub value: &'static str,
    pub title: &'static str,
    pub file_name: &'static str,
}

pub const UPLIFT_OUTPUT_FORMATS: [UpliftOutputFormat; 2] = [
    UpliftOutputFormat {
        value: "ttl",
        title: "Turtle",
        file_name: "ttl.ttl",
    },
    UpliftOutputFormat {
        value: "json",
        title: "Uplifted JSON-LD",
        file_name: "uplifted.jsonld",
    },
];

pub fn output_formats() -> &'static [UpliftOutputFormat] {
    &UPLIFT_OUTPUT_FORMATS
}

pub fn find_output_format(value: &str) -> Option<&'static UpliftOutputFormat> {
    UPLIFT_OUTPUT_FORMATS
        .iter()
        .find(|format| format.value == value)
}

/// Value of the `output` part of a `/json-uplift` request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSelector {
    #[default]
    All,
    Uplifted,
    Expanded,
    Ttl,
}

impl OutputSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Uplifted => "uplifted",
            Self::Expanded => "expanded",
            Self::Ttl => "ttl",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_output_format_known_value_expected_archive_member() {
        let format = find_output_format("json").expect("json format should exist");
        assert_eq!(format.file_name, "uplifted.jsonld");
        assert_eq!(format.title, "Uplifted JSON-LD");
        assert!(find_output_format("expanded").is_none());
    }

    #[test]
    fn output_selector_serde_expected_snake_case_values() {
        let encoded = serde_json::to_string(&OutputSelector::Ttl).expect("selector should encode");
        assert_eq!(encoded, "\"ttl\"");
        assert_eq!(OutputSelector::default().as_str(), "all");
    }
}
