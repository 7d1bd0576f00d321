use crate::cli::{AssessArgs, BatchArgs, ValidateArgs, WizardArgs};
use crate::infra::{load_engine, ruleset_source};
use ai_compliance::assessment::{
    wizard::total_weight, AssessmentResult, ComplianceEngine, InputProfile, ProfileCsvImporter,
    RuleSet, RulesetSource, RulesetSummary, SevenPointReview,
};
use ai_compliance::config::AppConfig;
use ai_compliance::error::AppError;
use std::path::PathBuf;

fn engine_for(ruleset: Option<PathBuf>) -> Result<ComplianceEngine, AppError> {
    let config = AppConfig::load()?;
    load_engine(ruleset_source(&config.ruleset, ruleset))
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        profile,
        ruleset,
        json,
    } = args;

    let engine = engine_for(ruleset)?;
    let raw = std::fs::read_to_string(&profile)?;
    let profile: InputProfile = serde_json::from_str(&raw)?;
    let result = engine.evaluate(&profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_assessment(&result, &engine.summary());
    }
    Ok(())
}

pub(crate) fn run_wizard(args: WizardArgs) -> Result<(), AppError> {
    let engine = engine_for(args.ruleset)?;
    let steps = engine.wizard_steps(&args.category)?;

    println!(
        "Assessment wizard: {} ({} steps, total weight {})",
        args.category.trim().to_ascii_lowercase(),
        steps.len(),
        total_weight(&steps)
    );
    for step in &steps {
        match &step.description {
            Some(description) => println!(
                "  {}. {} [{}] - {}",
                step.position, step.title, step.weight, description
            ),
            None => println!("  {}. {} [{}]", step.position, step.title, step.weight),
        }
    }
    Ok(())
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let ruleset = RuleSet::load(RulesetSource::Path(args.ruleset.clone()))
        .map_err(ai_compliance::assessment::EngineError::from)?;
    let summary = ruleset.summary();

    println!("Ruleset {} is valid", args.ruleset.display());
    render_summary(&summary);
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let engine = engine_for(args.ruleset)?;
    let imported = ProfileCsvImporter::from_path(&args.csv)?;
    let summary = engine.summary();

    println!(
        "Batch assessment of {} systems (ruleset {})",
        imported.len(),
        summary.ruleset_version
    );
    let mut rejected = 0usize;
    for row in &imported {
        match engine.evaluate(&row.profile) {
            Ok(result) => println!(
                "- {}: {} | score {} ({}) | {} | assessments: {}",
                row.system_name,
                result.category,
                result.risk_score,
                result.risk_level,
                result.decision.label(),
                assessments_label(&result)
            ),
            Err(err) => {
                rejected += 1;
                println!("- {}: not assessed ({})", row.system_name, err);
            }
        }
    }
    if rejected > 0 {
        println!("{rejected} of {} rows could not be assessed", imported.len());
    }
    Ok(())
}

fn render_assessment(result: &AssessmentResult, summary: &RulesetSummary) {
    let review = SevenPointReview::from_result(result);

    println!("AI Act assessment (ruleset {})", summary.ruleset_version);
    println!(
        "- Category: {} | score {} ({}) | decision {}",
        result.category,
        result.risk_score,
        result.risk_level,
        result.decision.label()
    );
    println!("- Status: {}", result.compliance_status);
    println!("- Required assessments: {}", assessments_label(result));

    println!("Priority actions:");
    for action in &result.action_plan.priority_actions {
        println!("  - {action}");
    }
    if !result.action_plan.later_steps.is_empty() {
        println!("Later steps:");
        for step in &result.action_plan.later_steps {
            println!("  - {step}");
        }
    }
    println!("Requirements:");
    for requirement in &result.requirements {
        println!("  - {requirement}");
    }
    println!("Legal references:");
    for citation in &result.legal_references {
        println!("  - {citation}");
    }

    println!("Seven-point review ({}% overall):", review.overall_percent);
    for point in &review.points {
        println!("  - {}: {}/10", point.title, point.score);
    }
}

fn render_summary(summary: &RulesetSummary) {
    println!(
        "- Version {} (schema {}), effective from {}",
        summary.ruleset_version, summary.schema_version, summary.effective_from
    );
    println!("- {} rules", summary.rule_count);
    let categories: Vec<&str> = summary
        .wizard_categories
        .iter()
        .map(|category| category.as_str())
        .collect();
    println!("- Wizard templates: {}", categories.join(", "));
}

fn assessments_label(result: &AssessmentResult) -> String {
    if result.required_assessments.is_empty() {
        return "none".to_string();
    }
    result
        .required_assessments
        .iter()
        .map(|assessment| assessment.label())
        .collect::<Vec<_>>()
        .join(", ")
}
