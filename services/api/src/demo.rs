use crate::cli::ProfileArgs;
use crate::infra::{
    merge_profile_settings, read_json_file, write_json_file, InMemorySessionRepository,
};
use boundary_profile::assessment::{
    AnswerSet, Archetype, AssessmentService, CategorySet, CategoryStanding, ClassificationBasis,
    ItemId, LikertAssessment, LikertOutcome, LikertResponses, ProfileEngine, ProfileOutcome,
    StaleReason,
};
use boundary_profile::config::{AppConfig, ProfileSettings};
use boundary_profile::error::AppError;
use chrono::Local;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON object mapping item ids to the chosen option label (null = unanswered)
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Write the {scores, archetype} download document to this path
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) profile: ProfileArgs,
}

#[derive(Args, Debug)]
pub(crate) struct LikertArgs {
    /// JSON object mapping statement ids ("1".."20") to a 1-5 rating
    #[arg(long)]
    pub(crate) responses: PathBuf,
    /// Write the {scores, archetype} download document to this path
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the scenario respondent's download document to this path
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
    /// Skip the rating-scale portion of the demo.
    #[arg(long)]
    pub(crate) skip_likert: bool,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        answers,
        export,
        profile,
    } = args;

    let settings = merge_profile_settings(AppConfig::load()?.profile, profile);
    let engine = ProfileEngine::from_settings(&settings)?;
    let answers: AnswerSet = read_json_file(&answers)?;

    let outcome = engine.evaluate(&answers);
    render_profile_outcome(engine.bank().categories(), &outcome);

    if let Some(path) = export {
        write_json_file(&path, &outcome.export())?;
        println!("\nProfile exported to {}", path.display());
    }
    Ok(())
}

pub(crate) fn run_likert(args: LikertArgs) -> Result<(), AppError> {
    let LikertArgs { responses, export } = args;

    let assessment = LikertAssessment::standard()?;
    let responses: LikertResponses = read_json_file(&responses)?;

    let outcome = assessment.evaluate(&responses);
    render_likert_outcome(&outcome);

    if let Some(path) = export {
        write_json_file(&path, &outcome.export())?;
        println!("\nProfile exported to {}", path.display());
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        export,
        skip_likert,
    } = args;

    println!("Boundary-crossing profile demo");
    let engine = Arc::new(ProfileEngine::from_settings(&ProfileSettings::default())?);
    println!(
        "- {} scenario items | {} archetypes | balanced when spread <= {:.2}",
        engine.bank().len(),
        engine.catalog().len(),
        engine.policy().balance_threshold
    );

    let repository = Arc::new(InMemorySessionRepository::default());
    let service = AssessmentService::new(engine.clone(), repository);
    let session = service.start()?;
    println!("\nSession {} (items shuffled for presentation)", session.id);

    let categories = engine.bank().categories();
    for (position, item_id) in session.order.iter().enumerate() {
        let Some(item) = engine.bank().item(item_id) else {
            continue;
        };
        let wanted = scripted_preference(position);
        let Some(option) = item
            .options
            .iter()
            .find(|option| categories.code(option.category) == wanted)
        else {
            continue;
        };
        let progress = service.answer(&session.id, item_id.clone(), Some(option.label.clone()))?;
        println!(
            "  [{}/{}] {} -> {}",
            progress.answered, progress.total, item.prompt, option.label
        );
    }

    let outcome = service.result(&session.id, false)?;
    println!();
    render_profile_outcome(categories, &outcome);
    service.finish(&session.id)?;

    if let Some(path) = export {
        write_json_file(&path, &outcome.export())?;
        println!("\nProfile exported to {}", path.display());
    }

    if skip_likert {
        return Ok(());
    }

    println!("\nRating-scale instrument");
    let assessment = LikertAssessment::standard()?;
    let responses = scripted_ratings(&assessment);
    let outcome = assessment.evaluate(&responses);
    render_likert_outcome(&outcome);

    println!("\nArchetype catalog");
    for archetype in engine.catalog().iter() {
        println!("  - {}: {}", archetype.headline(), archetype.summary);
    }

    Ok(())
}

/// Leans on coordination with a reflective streak.
fn scripted_preference(position: usize) -> &'static str {
    const PREFERENCES: [&str; 8] = ["C", "C", "R", "C", "I", "C", "R", "C"];
    PREFERENCES[position % PREFERENCES.len()]
}

fn scripted_ratings(assessment: &LikertAssessment) -> LikertResponses {
    let categories = assessment.instrument().categories();
    assessment
        .instrument()
        .statements()
        .iter()
        .map(|statement| {
            let rating = match categories.code(statement.category) {
                "I" | "C" => 5,
                "R" => 3,
                _ => 4,
            };
            (statement.id.clone(), rating)
        })
        .collect()
}

fn render_profile_outcome(categories: &CategorySet, outcome: &ProfileOutcome) {
    println!("Profile evaluated {}", Local::now().format("%Y-%m-%d %H:%M"));
    render_archetype(&outcome.archetype, &outcome.basis);
    println!(
        "- {} of {} items answered{}",
        outcome.answered,
        outcome.total_items,
        if outcome.complete { "" } else { " (partial)" }
    );
    println!("Scores:");
    for (category, code, count) in outcome.scores.iter() {
        println!("  - {} ({}): {}", categories.name(category), code, count);
    }
    render_underused(&outcome.underused);

    if !outcome.stale_answers.is_empty() {
        println!("Ignored answers:");
        for stale in &outcome.stale_answers {
            println!(
                "  - {} -> '{}' ({})",
                stale.item_id,
                stale.label,
                stale_reason(&stale.item_id, stale.reason)
            );
        }
    }
}

fn render_likert_outcome(outcome: &LikertOutcome) {
    println!("Ratings evaluated {}", Local::now().format("%Y-%m-%d %H:%M"));
    render_archetype(&outcome.archetype, &outcome.basis);
    println!(
        "- {} of {} statements rated",
        outcome.rated, outcome.total_statements
    );
    println!("Average by mechanism:");
    for (_, code, mean) in outcome.scores.iter() {
        println!("  - {}: {:.2}", code, mean);
    }
    render_underused(&outcome.underused);

    for skipped in &outcome.skipped {
        println!(
            "  Skipped rating {} for statement {} ({:?})",
            skipped.rating, skipped.item_id, skipped.reason
        );
    }
}

fn render_archetype(archetype: &Archetype, basis: &ClassificationBasis) {
    println!("- Archetype: {}", archetype.headline());
    println!("  {}", archetype.summary);
    println!("  Growth tip: {}", archetype.tip);
    println!("  Basis: {}", basis.summary());
}

fn render_underused(underused: &[CategoryStanding]) {
    if underused.is_empty() {
        return;
    }
    let names: Vec<String> = underused
        .iter()
        .map(|standing| format!("{} ({:.2})", standing.name, standing.score))
        .collect();
    println!("Underused mechanisms: {}", names.join(", "));
}

fn stale_reason(item_id: &ItemId, reason: StaleReason) -> String {
    match reason {
        StaleReason::UnknownItem => {
            format!("item {} is not in the current bank", item_id)
        }
        StaleReason::UnknownOption => {
            "option no longer offered".to_string()
        }
    }
}
