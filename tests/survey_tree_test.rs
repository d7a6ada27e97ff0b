//! Tests for building and navigating question trees

use rstest::{fixture, rstest};
use serde_json::json;

use surveykit::domain::{
    AnswerDef, Child, DefinitionData, DefinitionPayload, DomainError, Parent, QuestionDef,
    QuestionSet, TreeBuilder,
};
use surveykit::util::testing;

#[fixture]
fn survey() -> QuestionSet {
    testing::init_test_setup();
    let definitions = vec![
        QuestionDef::new("30", "Q10", "L")
            .with_field("question", json!("Tenth"))
            .with_answer(AnswerDef::new("302", "A10"))
            .with_answer(AnswerDef::new("301", "A2").with_field("answer", json!("Two")))
            .with_answer(AnswerDef::new("300", "A1")),
        QuestionDef::new("10", "Q1", "M")
            .with_field("strings", json!([{"question": "Pick colours"}]))
            .with_subquestion(QuestionDef::new("12", "SQ002", "T"))
            .with_subquestion(
                QuestionDef::new("11", "SQ001", "T").with_field("question", json!("Red")),
            ),
        QuestionDef::new("20", "q2", "1")
            .with_answer(AnswerDef::new("201", "B").with_scale("1"))
            .with_answer(AnswerDef::new("200", "A").with_scale("0")),
    ];
    TreeBuilder::new().build(definitions).unwrap()
}

fn titles(set: &QuestionSet) -> Vec<&str> {
    set.iter().map(|q| q.title()).collect()
}

// ============================================================
// Ordering
// ============================================================

#[rstest]
fn given_unordered_definitions_when_building_then_top_level_is_natural_order(survey: QuestionSet) {
    assert_eq!(titles(&survey), vec!["Q1", "q2", "Q10"]);
}

#[rstest]
fn given_sub_questions_when_building_then_each_level_is_sorted(survey: QuestionSet) {
    let q1 = survey.get("Q1").unwrap();
    let subs: Vec<&str> = q1.subquestions().map(|q| q.title()).collect();
    assert_eq!(subs, vec!["SQ001", "SQ002"]);
}

#[rstest]
#[case("Q10", vec!["A1", "A2", "A10"])]
#[case("q2", vec!["A", "B"])]
fn given_answers_when_building_then_sorted_by_code_or_scale(
    survey: QuestionSet,
    #[case] key: &str,
    #[case] expected: Vec<&str>,
) {
    let codes: Vec<&str> = survey.get(key).unwrap().answers().map(|a| a.code()).collect();
    assert_eq!(codes, expected);
}

// ============================================================
// Lookup
// ============================================================

#[rstest]
fn given_built_tree_when_looking_up_by_qid_or_title_then_same_node(survey: QuestionSet) {
    let by_qid = survey.get("10").unwrap();
    let by_title = survey.get("Q1").unwrap();
    assert_eq!(by_qid, by_title);
    assert!(survey.get("nope").is_none());
}

#[rstest]
fn given_question_when_getting_child_then_resolves_sub_questions_and_answers(survey: QuestionSet) {
    let q1 = survey.get("Q1").unwrap();
    assert!(matches!(q1.get("11"), Some(Child::Question(q)) if q.title() == "SQ001"));
    assert!(matches!(q1.get("SQ002"), Some(Child::Question(q)) if q.qid() == "12"));

    let q10 = survey.get("Q10").unwrap();
    assert!(matches!(q10.get("301"), Some(Child::Answer(a)) if a.code() == "A2"));
    assert!(matches!(q10.get("A10"), Some(Child::Answer(a)) if a.aid() == Some("302")));
    assert!(q10.get("missing").is_none());
}

#[rstest]
fn given_sub_question_qid_when_finding_then_searches_whole_tree(survey: QuestionSet) {
    let sub = survey.find("12").unwrap();
    assert_eq!(sub.title(), "SQ002");
    assert!(sub.is_subquestion());
    assert!(survey.get("12").is_none());
    match sub.parent() {
        Parent::Question(parent) => assert_eq!(parent.title(), "Q1"),
        Parent::Root(_) => panic!("sub-question should have a question parent"),
    }
}

#[rstest]
fn given_column_name_when_resolving_then_digs_into_sub_questions(survey: QuestionSet) {
    assert_eq!(survey.resolve_column("Q1[SQ001]").unwrap().qid(), "11");
    assert_eq!(survey.resolve_column("Q10").unwrap().qid(), "30");
    assert!(survey.resolve_column("Q1[SQ999]").is_none());
    assert!(survey.resolve_column("Q1[SQ001").is_none());
    assert_eq!(survey.path(&["Q1", "SQ002"]).unwrap().qid(), "12");
}

#[rstest]
fn given_raw_labels_when_reading_then_prefers_strings_then_field_then_title(survey: QuestionSet) {
    assert_eq!(survey.get("Q1").unwrap().label(), "Pick colours");
    assert_eq!(survey.get("Q10").unwrap().label(), "Tenth");
    assert_eq!(survey.get("q2").unwrap().label(), "q2");
    let q10 = survey.get("Q10").unwrap();
    assert_eq!(q10.answer("A2").unwrap().label(), "Two");
    assert_eq!(q10.answer("A1").unwrap().label(), "A1");
}

#[rstest]
fn given_n_definitions_when_building_then_n_top_level_entries() {
    let defs: Vec<QuestionDef> = (1..=25)
        .map(|i| QuestionDef::new(i.to_string(), format!("Q{}", i), "T"))
        .collect();
    let set = TreeBuilder::new().build(defs).unwrap();
    assert_eq!(set.len(), 25);
    for i in 1..=25 {
        assert_eq!(set.get(&i.to_string()).unwrap().title(), format!("Q{}", i));
    }
    assert_eq!(set.total_questions(), 25);
}

#[rstest]
fn given_tree_when_walking_depth_first_then_parents_precede_children(survey: QuestionSet) {
    let walk: Vec<&str> = survey.iter_depth_first().map(|q| q.title()).collect();
    assert_eq!(walk, vec!["Q1", "SQ001", "SQ002", "q2", "Q10"]);
    assert_eq!(survey.depth(), 2);
}

// ============================================================
// Read-only data interface and serialization
// ============================================================

#[rstest]
fn given_tree_when_assigning_then_read_only(survey: QuestionSet) {
    let q1 = survey.get("Q1").unwrap();
    assert!(q1.contains("strings"));
    assert_eq!(q1.lookup("type"), Some(&json!("M")));
    assert!(matches!(
        q1.assign("type", json!("L")),
        Err(DomainError::ReadOnly { .. })
    ));
    assert!(matches!(survey.remove("Q1"), Err(DomainError::ReadOnly { .. })));
    assert!(survey.contains("Q10"));
}

#[rstest]
fn given_serialized_tree_when_rebuilding_then_identical_order(survey: QuestionSet) {
    let json = survey.to_json();
    let definitions: Vec<QuestionDef> = serde_json::from_value(json.clone()).unwrap();

    let rebuilt = TreeBuilder::new().build(definitions).unwrap();

    assert_eq!(rebuilt.to_json(), json);
    assert_eq!(titles(&rebuilt), titles(&survey));
}

// ============================================================
// Flat rows and build errors
// ============================================================

#[test]
fn given_flat_rows_when_building_then_nests_by_parent_qid() {
    let questions: Vec<QuestionDef> = serde_json::from_value(json!([
        {"qid": 2, "parent_qid": 1, "title": "SQ1", "type": "T"},
        {"qid": 1, "parent_qid": 0, "title": "Q1", "type": "M"},
        {"qid": 3, "parent_qid": 0, "title": "Q2", "type": "L"}
    ]))
    .unwrap();
    let answers: Vec<AnswerDef> = serde_json::from_value(json!([
        {"aid": 9, "qid": 3, "code": "A1", "answer": "Yes"}
    ]))
    .unwrap();

    let set = TreeBuilder::new()
        .build_payload(DefinitionPayload::Flat { questions, answers })
        .unwrap();

    assert_eq!(titles(&set), vec!["Q1", "Q2"]);
    assert_eq!(set.get("Q1").unwrap().subquestion("SQ1").unwrap().qid(), "2");
    assert_eq!(set.get("Q2").unwrap().answer("A1").unwrap().label(), "Yes");
}

#[test]
fn given_duplicate_qid_when_building_then_errors() {
    let defs = vec![
        QuestionDef::new("1", "Q1", "M").with_subquestion(QuestionDef::new("2", "SQ1", "T")),
        QuestionDef::new("2", "Q2", "T"),
    ];
    let result = TreeBuilder::new().build(defs);
    assert_eq!(result.unwrap_err(), DomainError::DuplicateQid("2".into()));
}

#[test]
fn given_flat_rows_without_top_level_when_building_then_cycle_detected() {
    let mut a = QuestionDef::new("1", "A", "T");
    a.parent_qid = Some("2".into());
    let mut b = QuestionDef::new("2", "B", "T");
    b.parent_qid = Some("1".into());

    let result = TreeBuilder::new().build_from_rows(vec![a, b], vec![]);

    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
}

#[test]
fn given_unreachable_rows_when_building_then_skipped() {
    let root = QuestionDef::new("1", "Q1", "T");
    let mut looped = QuestionDef::new("5", "X", "T");
    looped.parent_qid = Some("5".into());

    let set = TreeBuilder::new().build_from_rows(vec![root, looped], vec![]).unwrap();

    assert_eq!(set.total_questions(), 1);
    assert!(set.find("5").is_none());
}

#[test]
fn given_filter_when_building_then_only_allowed_top_level_titles_kept() {
    use surveykit::domain::{AccessFilter, RuleSet};
    let filter = AccessFilter::new(None, Some(RuleSet::pattern(["^_"])));
    let defs = vec![
        QuestionDef::new("1", "Q1", "T"),
        QuestionDef::new("2", "_hidden", "T"),
    ];

    let set = TreeBuilder::new().with_filter(filter).build(defs).unwrap();

    assert_eq!(titles(&set), vec!["Q1"]);
}
