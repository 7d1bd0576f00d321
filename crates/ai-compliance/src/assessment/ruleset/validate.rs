use std::collections::{BTreeMap, BTreeSet};

use super::document::{
    GuidanceDoc, PredicateDoc, RuleDoc, RulesetDocument, ScoringDoc,
    VocabularyDoc, WizardStepDoc,
};
use super::{
    AssessmentMeta, Band, CategoryRule, DecisionThresholds, FlagField, Guidance, ObligationModel,
    ObligationRule, Predicate, Rule, RuleCommon, RuleSet, RulesetError, ScoreRule, ScoringModel,
    SetField, StatusTemplates, TagField, TextField, Vocabulary,
};
use crate::assessment::domain::{RequiredAssessment, RiskCategory, WizardStep};

const MAX_SCORE: i32 = 100;

/// Metadata shared by every rule shape.
struct Attachments {
    legal_references: Vec<String>,
    guidance: GuidanceDoc,
    obligations: Vec<RequiredAssessment>,
}

pub(super) fn compile(document: RulesetDocument) -> Result<RuleSet, RulesetError> {
    let RulesetDocument {
        schema_version,
        ruleset_version,
        effective_from,
        vocabulary,
        legal_references,
        scoring,
        compliance_status,
        obligations,
        category_guidance,
        rules,
        wizard,
    } = document;

    if ruleset_version.trim().is_empty() {
        return Err(RulesetError::invalid(
            "document",
            "ruleset_version",
            "must not be empty",
        ));
    }

    let vocabulary = compile_vocabulary(vocabulary)?;

    let mut references = BTreeMap::new();
    for reference in legal_references {
        let id = reference.id.trim().to_string();
        if id.is_empty() {
            return Err(RulesetError::invalid(
                "legal_references",
                "id",
                "must not be empty",
            ));
        }
        if reference.citation.trim().is_empty() {
            return Err(RulesetError::invalid(
                format!("legal_references.{id}"),
                "citation",
                "must not be empty",
            ));
        }
        if references.insert(id.clone(), reference.citation).is_some() {
            return Err(RulesetError::invalid(
                format!("legal_references.{id}"),
                "id",
                "duplicate reference id",
            ));
        }
    }

    let scoring = compile_scoring(scoring, &vocabulary)?;

    let statuses = StatusTemplates {
        go: non_empty_text("compliance_status", "go", compliance_status.go)?,
        conditional_go: non_empty_text(
            "compliance_status",
            "conditional_go",
            compliance_status.conditional_go,
        )?,
        no_go: non_empty_text("compliance_status", "no_go", compliance_status.no_go)?,
        prohibited: non_empty_text(
            "compliance_status",
            "prohibited",
            compliance_status.prohibited,
        )?,
    };

    for data_type in &obligations.personal_data_types {
        if !vocabulary.recognizes(TagField::DataTypes, data_type) {
            return Err(RulesetError::invalid(
                "obligations",
                "personal_data_types",
                format!("'{data_type}' is not in the data_types vocabulary"),
            ));
        }
    }
    let mut assessments = BTreeMap::new();
    for (assessment, meta) in obligations.assessments {
        let location = format!("obligations.assessments.{}", assessment.label());
        check_references(&location, &meta.legal_references, &references)?;
        assessments.insert(
            assessment,
            AssessmentMeta {
                legal_references: meta.legal_references,
                guidance: guidance(meta.guidance),
            },
        );
    }
    let obligations = ObligationModel {
        personal_data_types: obligations.personal_data_types,
        fria_for_unacceptable: obligations.fria_for_unacceptable,
        assessments,
    };

    let mut category_texts = BTreeMap::new();
    for (key, texts) in category_guidance {
        let category = parse_category("category_guidance", &key)?;
        if category_texts.insert(category, guidance(texts)).is_some() {
            return Err(duplicate_category("category_guidance", &key));
        }
    }

    let mut compiled = Vec::with_capacity(rules.len());
    let mut seen_ids = BTreeSet::new();
    let mut seen_priorities: BTreeMap<u32, String> = BTreeMap::new();
    for rule in rules {
        let id = rule.id().trim().to_string();
        if id.is_empty() {
            return Err(RulesetError::invalid(
                format!("rules[{}]", compiled.len()),
                "id",
                "must not be empty",
            ));
        }
        if !seen_ids.insert(id.clone()) {
            return Err(RulesetError::invalid(&id, "id", "duplicate rule id"));
        }
        let rule = compile_rule(id, rule, &vocabulary, &references)?;
        if let Rule::Category(category_rule) = &rule {
            if let Some(other) =
                seen_priorities.insert(category_rule.priority, category_rule.common.id.clone())
            {
                return Err(RulesetError::invalid(
                    &category_rule.common.id,
                    "priority",
                    format!(
                        "priority {} already used by rule '{other}'",
                        category_rule.priority
                    ),
                ));
            }
        }
        compiled.push(rule);
    }

    let (override_order, category_order) = category_orders(&compiled);

    let mut templates = BTreeMap::new();
    for (key, steps) in wizard {
        let category = parse_category("wizard", &key)?;
        if templates
            .insert(category, compile_wizard(category, steps)?)
            .is_some()
        {
            return Err(duplicate_category("wizard", &key));
        }
    }

    Ok(RuleSet {
        schema_version,
        version: ruleset_version,
        effective_from,
        vocabulary,
        references,
        scoring,
        statuses,
        obligations,
        category_guidance: category_texts,
        rules: compiled,
        override_order,
        category_order,
        wizard: templates,
    })
}

fn compile_vocabulary(vocabulary: VocabularyDoc) -> Result<Vocabulary, RulesetError> {
    let VocabularyDoc {
        ai_system_types,
        sectors,
        roles,
        data_types,
        decision_types,
        decision_impacts,
    } = vocabulary;

    Ok(Vocabulary {
        ai_system_types: terms("ai_system_types", ai_system_types)?,
        sectors: terms("sectors", sectors)?,
        roles: terms("roles", roles)?,
        data_types: terms("data_types", data_types)?,
        decision_types: terms("decision_types", decision_types)?,
        decision_impacts: terms("decision_impacts", decision_impacts)?,
    })
}

fn terms(field: &str, raw: Vec<String>) -> Result<Vec<String>, RulesetError> {
    let mut accepted: Vec<String> = Vec::with_capacity(raw.len());
    for term in raw {
        let term = term.trim().to_string();
        if term.is_empty() {
            return Err(RulesetError::invalid(
                "vocabulary",
                field,
                "terms must not be empty",
            ));
        }
        if accepted
            .iter()
            .any(|known| known.eq_ignore_ascii_case(&term))
        {
            return Err(RulesetError::invalid(
                "vocabulary",
                field,
                format!("duplicate term '{term}'"),
            ));
        }
        accepted.push(term);
    }
    Ok(accepted)
}

fn compile_scoring(
    scoring: ScoringDoc,
    vocabulary: &Vocabulary,
) -> Result<ScoringModel, RulesetError> {
    let mut baselines = BTreeMap::new();
    for (key, value) in scoring.baselines {
        let category = parse_category("scoring.baselines", &key)?;
        let baseline = score_value("scoring.baselines", &key, value)?;
        if baselines.insert(category, baseline).is_some() {
            return Err(duplicate_category("scoring.baselines", &key));
        }
    }
    for category in RiskCategory::ALL {
        if !baselines.contains_key(&category) {
            return Err(RulesetError::invalid(
                "scoring.baselines",
                category.as_str(),
                "baseline missing",
            ));
        }
    }

    let mut decision_impact_deltas = BTreeMap::new();
    for (impact, delta) in scoring.decision_impact_deltas {
        if !vocabulary.recognizes(TagField::DecisionImpact, &impact) {
            return Err(RulesetError::invalid(
                "scoring.decision_impact_deltas",
                &impact,
                "not in the decision_impacts vocabulary",
            ));
        }
        let delta = score_value("scoring.decision_impact_deltas", &impact, delta)?;
        if decision_impact_deltas
            .insert(impact.trim().to_ascii_lowercase(), delta)
            .is_some()
        {
            return Err(RulesetError::invalid(
                "scoring.decision_impact_deltas",
                &impact,
                "duplicate decision impact entry",
            ));
        }
    }

    if scoring.bands.is_empty() {
        return Err(RulesetError::invalid(
            "scoring.bands",
            "bands",
            "at least one band is required",
        ));
    }
    let mut bands: Vec<Band> = Vec::with_capacity(scoring.bands.len());
    for band in scoring.bands {
        let label = non_empty_text("scoring.bands", "label", band.label)?;
        let min_score = score_value("scoring.bands", &label, band.min_score)?;
        match bands.last() {
            None if min_score != 0 => {
                return Err(RulesetError::invalid(
                    "scoring.bands",
                    &label,
                    "first band must start at 0",
                ));
            }
            Some(previous) if min_score <= previous.min_score => {
                return Err(RulesetError::invalid(
                    "scoring.bands",
                    &label,
                    "bands must be strictly ascending by min_score",
                ));
            }
            _ => {}
        }
        if bands.iter().any(|known| known.label == label) {
            return Err(RulesetError::invalid(
                "scoring.bands",
                &label,
                "duplicate band label",
            ));
        }
        bands.push(Band { label, min_score });
    }

    let thresholds = scoring.decision_thresholds;
    let go_below = score_value("scoring.decision_thresholds", "go_below", thresholds.go_below)?;
    let no_go_at = score_value("scoring.decision_thresholds", "no_go_at", thresholds.no_go_at)?;
    if go_below > no_go_at {
        return Err(RulesetError::invalid(
            "scoring.decision_thresholds",
            "go_below",
            "must not exceed no_go_at",
        ));
    }

    Ok(ScoringModel {
        baselines,
        personal_data_delta: score_value(
            "scoring",
            "personal_data_delta",
            scoring.personal_data_delta,
        )?,
        automated_decisions_delta: score_value(
            "scoring",
            "automated_decisions_delta",
            scoring.automated_decisions_delta,
        )?,
        decision_impact_deltas,
        bands,
        thresholds: DecisionThresholds { go_below, no_go_at },
    })
}

fn compile_rule(
    id: String,
    rule: RuleDoc,
    vocabulary: &Vocabulary,
    references: &BTreeMap<String, String>,
) -> Result<Rule, RulesetError> {
    match rule {
        RuleDoc::Category {
            priority,
            category,
            when,
            legal_references,
            guidance,
            obligations,
            ..
        } => {
            let category = parse_category(&id, &category)?;
            let common = compile_common(
                id,
                when,
                Attachments {
                    legal_references,
                    guidance,
                    obligations,
                },
                vocabulary,
                references,
            )?;
            Ok(Rule::Category(CategoryRule {
                common,
                category,
                priority,
            }))
        }
        RuleDoc::ScoreAdjustment {
            delta,
            when,
            legal_references,
            guidance,
            obligations,
            ..
        } => {
            if !(-MAX_SCORE..=MAX_SCORE).contains(&delta) {
                return Err(RulesetError::invalid(
                    &id,
                    "delta",
                    format!("{delta} is outside -100..=100"),
                ));
            }
            let common = compile_common(
                id,
                when,
                Attachments {
                    legal_references,
                    guidance,
                    obligations,
                },
                vocabulary,
                references,
            )?;
            Ok(Rule::ScoreAdjustment(ScoreRule {
                common,
                delta: delta as i8,
            }))
        }
        RuleDoc::Obligation {
            assessments,
            when,
            legal_references,
            guidance,
            obligations,
            ..
        } => {
            if assessments.is_empty() {
                return Err(RulesetError::invalid(
                    &id,
                    "assessments",
                    "at least one assessment is required",
                ));
            }
            let common = compile_common(
                id,
                when,
                Attachments {
                    legal_references,
                    guidance,
                    obligations,
                },
                vocabulary,
                references,
            )?;
            Ok(Rule::Obligation(ObligationRule {
                common,
                assessments,
            }))
        }
    }
}

fn compile_common(
    id: String,
    when: PredicateDoc,
    attachments: Attachments,
    vocabulary: &Vocabulary,
    references: &BTreeMap<String, String>,
) -> Result<RuleCommon, RulesetError> {
    let predicate = compile_predicate(&id, "when", when, vocabulary)?;
    check_references(&id, &attachments.legal_references, references)?;

    Ok(RuleCommon {
        id,
        predicate,
        legal_references: attachments.legal_references,
        guidance: guidance(attachments.guidance),
        obligations: attachments.obligations,
    })
}

fn compile_predicate(
    rule: &str,
    path: &str,
    predicate: PredicateDoc,
    vocabulary: &Vocabulary,
) -> Result<Predicate, RulesetError> {
    match predicate {
        PredicateDoc::Always => Ok(Predicate::Always),
        PredicateDoc::All(parts) | PredicateDoc::Any(parts) if parts.is_empty() => Err(
            RulesetError::invalid(rule, path, "combinator needs at least one predicate"),
        ),
        PredicateDoc::All(parts) => Ok(Predicate::All(compile_parts(
            rule, path, "all", parts, vocabulary,
        )?)),
        PredicateDoc::Any(parts) => Ok(Predicate::Any(compile_parts(
            rule, path, "any", parts, vocabulary,
        )?)),
        PredicateDoc::Not(inner) => {
            let inner = compile_predicate(rule, &format!("{path}.not"), *inner, vocabulary)?;
            Ok(Predicate::Not(Box::new(inner)))
        }
        PredicateDoc::TagIn { field, values } => {
            let location = format!("{path}.tag_in.{field}");
            let tag_field = TagField::parse(&field).ok_or_else(|| {
                RulesetError::invalid(rule, &location, "not a tag field of the profile")
            })?;
            if values.is_empty() {
                return Err(RulesetError::invalid(
                    rule,
                    &location,
                    "at least one value is required",
                ));
            }
            if let Some(unknown) = values
                .iter()
                .find(|value| !vocabulary.recognizes(tag_field, value))
            {
                return Err(RulesetError::invalid(
                    rule,
                    &location,
                    format!("'{unknown}' is not in the {} vocabulary", tag_field.name()),
                ));
            }
            Ok(Predicate::TagIn {
                field: tag_field,
                values: values.into_iter().map(|value| value.trim().to_string()).collect(),
            })
        }
        PredicateDoc::Flag { field, value } => {
            let flag = FlagField::parse(&field).ok_or_else(|| {
                RulesetError::invalid(
                    rule,
                    format!("{path}.flag.{field}"),
                    "not a boolean field of the profile",
                )
            })?;
            Ok(Predicate::Flag { field: flag, value })
        }
        PredicateDoc::Mentions { field, keywords } => {
            let location = format!("{path}.mentions.{field}");
            let text = TextField::parse(&field).ok_or_else(|| {
                RulesetError::invalid(rule, &location, "not a text field of the profile")
            })?;
            let keywords: Vec<String> = keywords
                .into_iter()
                .map(|keyword| keyword.trim().to_lowercase())
                .collect();
            if keywords.is_empty() || keywords.iter().any(String::is_empty) {
                return Err(RulesetError::invalid(
                    rule,
                    &location,
                    "keywords must be present and non-empty",
                ));
            }
            Ok(Predicate::Mentions {
                field: text,
                keywords,
            })
        }
        PredicateDoc::NonEmpty { field } => {
            let set = SetField::parse(&field).ok_or_else(|| {
                RulesetError::invalid(
                    rule,
                    format!("{path}.non_empty.{field}"),
                    "not a list field of the profile",
                )
            })?;
            Ok(Predicate::NonEmpty { field: set })
        }
    }
}

fn compile_parts(
    rule: &str,
    path: &str,
    combinator: &str,
    parts: Vec<PredicateDoc>,
    vocabulary: &Vocabulary,
) -> Result<Vec<Predicate>, RulesetError> {
    parts
        .into_iter()
        .enumerate()
        .map(|(index, part)| {
            compile_predicate(
                rule,
                &format!("{path}.{combinator}[{index}]"),
                part,
                vocabulary,
            )
        })
        .collect()
}

fn compile_wizard(
    category: RiskCategory,
    steps: Vec<WizardStepDoc>,
) -> Result<Vec<WizardStep>, RulesetError> {
    let location = format!("wizard.{category}");
    if steps.is_empty() {
        return Err(RulesetError::invalid(
            &location,
            "steps",
            "template must contain at least one step",
        ));
    }

    steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| {
            let title = non_empty_text(&location, format!("steps[{index}].title"), step.title)?;
            if i32::from(step.weight) > MAX_SCORE {
                return Err(RulesetError::invalid(
                    &location,
                    format!("steps[{index}].weight"),
                    "weight must be within 0..=100",
                ));
            }
            Ok(WizardStep {
                position: (index + 1) as u16,
                title,
                description: step.description,
                weight: step.weight,
                completed: false,
            })
        })
        .collect()
}

fn category_orders(rules: &[Rule]) -> (Vec<usize>, Vec<usize>) {
    let mut overrides: Vec<(u32, usize)> = Vec::new();
    let mut ordinary: Vec<(u32, usize)> = Vec::new();
    for (index, rule) in rules.iter().enumerate() {
        if let Rule::Category(rule) = rule {
            if rule.category == RiskCategory::Unacceptable {
                overrides.push((rule.priority, index));
            } else {
                ordinary.push((rule.priority, index));
            }
        }
    }
    overrides.sort_unstable();
    ordinary.sort_unstable();

    (
        overrides.into_iter().map(|(_, index)| index).collect(),
        ordinary.into_iter().map(|(_, index)| index).collect(),
    )
}

fn check_references(
    location: &str,
    ids: &[String],
    references: &BTreeMap<String, String>,
) -> Result<(), RulesetError> {
    match ids.iter().find(|id| !references.contains_key(id.as_str())) {
        Some(unknown) => Err(RulesetError::invalid(
            location,
            "legal_references",
            format!("unknown reference id '{unknown}'"),
        )),
        None => Ok(()),
    }
}

fn parse_category(location: &str, raw: &str) -> Result<RiskCategory, RulesetError> {
    raw.parse()
        .map_err(|_| RulesetError::invalid(location, raw, "not a risk category"))
}

/// Aliases such as `high_risk` name the same category as `high`.
fn duplicate_category(location: &str, key: &str) -> RulesetError {
    RulesetError::invalid(location, key, "duplicate category entry")
}

fn score_value(location: &str, field: &str, value: i32) -> Result<u8, RulesetError> {
    if (0..=MAX_SCORE).contains(&value) {
        Ok(value as u8)
    } else {
        Err(RulesetError::invalid(
            location,
            field,
            format!("{value} is outside 0..=100"),
        ))
    }
}

fn non_empty_text(
    location: &str,
    field: impl Into<String>,
    value: String,
) -> Result<String, RulesetError> {
    if value.trim().is_empty() {
        Err(RulesetError::invalid(location, field, "must not be empty"))
    } else {
        Ok(value)
    }
}

fn guidance(doc: GuidanceDoc) -> Guidance {
    Guidance {
        recommendations: doc.recommendations,
        next_steps: doc.next_steps,
        requirements: doc.requirements,
    }
}
