//! End-to-end tests: raw export text through normalization into tabulation

use rstest::rstest;
use serde_json::json;

use surveykit::domain::{
    normalize, tabulate, AccessConfig, AccessFilter, TabulateOptions,
};

fn filter(config: serde_json::Value) -> AccessFilter {
    let config: AccessConfig = serde_json::from_value(config).unwrap();
    AccessFilter::from_config(&config)
}

#[test]
fn given_export_with_blank_trailer_when_normalizing_then_two_records() {
    // Act
    let records = normalize("\"id\",\"Q1\"\n1,\"Y\"\n2,\"N\"\n,", None).unwrap();

    // Assert
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id(), Some("1"));
    assert_eq!(records[1].get("Q1"), Some("N"));
}

#[test]
fn given_export_when_tabulating_then_yes_no_split() {
    // Arrange
    let text = "\"id\",\"Q1\"\n1,Y\n2,Y\n3,N\n";
    let records = normalize(text, None).unwrap();

    // Act
    let tabulation = tabulate(
        &records,
        &filter(json!({"blocked": ["id"]})),
        TabulateOptions::default(),
    )
    .unwrap();

    // Assert
    assert_eq!(
        serde_json::to_value(&tabulation).unwrap(),
        json!({"Q1": {"count": 3, "vals": {
            "Y": {"count": 2, "percent": 66.67},
            "N": {"count": 1, "percent": 33.33}
        }}})
    );
}

#[rstest]
#[case(json!({"allowed": ["Q1"]}), vec!["Q1[SQ001]", "Q1[SQ002]"])]
#[case(json!({"allowed": "^Q"}), vec!["Q1[SQ001]", "Q1[SQ002]", "Q2"])]
#[case(json!({"blocked": ["id", "Q1"]}), vec!["Q2"])]
#[case(json!({"allowed": "/^q/i", "blocked": ["Q2"]}), vec!["Q1[SQ001]", "Q1[SQ002]"])]
fn given_access_rules_when_tabulating_then_base_name_decides(
    #[case] rules: serde_json::Value,
    #[case] expected: Vec<&str>,
) {
    let text = "\"id\";\"Q1[SQ001]\";\"Q1[SQ002]\";\"Q2\"\n1;Y;N;free text\n";
    let records = normalize(text, None).unwrap();

    let tabulation = tabulate(&records, &filter(rules), TabulateOptions::default()).unwrap();

    assert_eq!(tabulation.columns().collect::<Vec<_>>(), expected);
}

#[test]
fn given_sort_option_when_tabulating_then_columns_in_natural_order() {
    let text = "\"id\",\"Q10\",\"Q2\",\"Q1\"\n1,a,b,c\n";
    let records = normalize(text, None).unwrap();
    let options = TabulateOptions {
        sort: true,
        ..Default::default()
    };

    let tabulation = tabulate(&records, &filter(json!({"blocked": ["id"]})), options).unwrap();

    assert_eq!(tabulation.columns().collect::<Vec<_>>(), vec!["Q1", "Q2", "Q10"]);
}
