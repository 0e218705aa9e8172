use boundary_profile::assessment::likert::SkipReason;
use boundary_profile::assessment::{
    AnswerSet, ClassificationBasis, ItemId, LikertAssessment, LikertResponses, ProfileEngine,
};

fn ratings(per_category: [i64; 4]) -> LikertResponses {
    (1..=20u8)
        .map(|id| {
            let category = usize::from((id - 1) / 5);
            (ItemId(id.to_string()), per_category[category])
        })
        .collect()
}

#[test]
fn standard_bank_and_catalog_line_up() {
    let engine = ProfileEngine::standard().expect("standard engine builds");

    assert_eq!(engine.bank().len(), 8);
    assert_eq!(engine.bank().categories().len(), 4);
    assert!(engine
        .bank()
        .items()
        .iter()
        .all(|item| item.options.len() == 4));
    assert_eq!(engine.catalog().len(), 8);
    assert!(engine.catalog().get("integrative_weaver").is_some());
}

#[test]
fn standard_bank_classifies_a_coordination_heavy_respondent() {
    let engine = ProfileEngine::standard().expect("standard engine builds");
    let categories = engine.bank().categories();

    let answers: AnswerSet = engine
        .bank()
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let wanted = if index < 6 { "C" } else { "R" };
            let option = item
                .options
                .iter()
                .find(|option| categories.code(option.category) == wanted)
                .expect("every item covers every category");
            (item.id.as_str().to_string(), option.label.clone())
        })
        .collect();

    let outcome = engine.evaluate(&answers);

    assert!(outcome.complete);
    assert_eq!(outcome.scores.get_code("C"), Some(6));
    assert_eq!(outcome.scores.get_code("R"), Some(2));
    assert_eq!(outcome.archetype.code, "learning_broker");
    let underused: Vec<_> = outcome.underused.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(underused, vec!["I", "T"]);
}

#[test]
fn likert_equal_ratings_are_integrative() {
    let assessment = LikertAssessment::standard().expect("likert assessment builds");

    let outcome = assessment.evaluate(&ratings([4, 4, 4, 4]));

    assert_eq!(outcome.rated, 20);
    assert_eq!(outcome.archetype.code, "integrative_weaver");
    assert_eq!(outcome.basis, ClassificationBasis::Balanced { spread: 0.0 });
}

#[test]
fn likert_identification_and_coordination_together_navigate() {
    let assessment = LikertAssessment::standard().expect("likert assessment builds");

    let outcome = assessment.evaluate(&ratings([5, 5, 3, 4]));

    assert_eq!(outcome.archetype.code, "system_navigator");
    assert_eq!(
        outcome.basis,
        ClassificationBasis::PrivilegedPair {
            lead: "I".to_string(),
            partner: "C".to_string(),
        }
    );

    let export = serde_json::to_value(outcome.export()).expect("export serializes");
    assert_eq!(export["archetype"], "System Navigator");
    assert_eq!(export["scores"]["I"], 5.0);
    assert_eq!(export["scores"]["R"], 3.0);
}

#[test]
fn likert_out_of_scale_ratings_are_skipped() {
    let assessment = LikertAssessment::standard().expect("likert assessment builds");
    let mut responses = ratings([2, 2, 2, 5]);
    responses.insert(ItemId::new("3"), 9);
    responses.insert(ItemId::new("99"), 3);

    let outcome = assessment.evaluate(&responses);

    assert_eq!(outcome.rated, 19);
    assert_eq!(outcome.skipped.len(), 2);
    assert!(outcome
        .skipped
        .iter()
        .any(|skip| skip.reason == SkipReason::OutOfRange && skip.rating == 9));
    assert!(outcome
        .skipped
        .iter()
        .any(|skip| skip.reason == SkipReason::UnknownStatement));
    assert_eq!(outcome.archetype.code, "ecosystem_catalyst");
}
