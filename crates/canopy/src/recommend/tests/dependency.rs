use super::common::*;
use crate::config::DependencyConfig;
use crate::recommend::exclusion::dependency::parse_dependency_rows;

#[test]
fn noisy_headers_are_normalized_at_parse_time() {
    let rows = vec![dependency_row("Santalum album", "Acacia, Eucalyptus")];
    let rules = parse_dependency_rows(&rows, &DependencyConfig::default());

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].focal_species_name, "Santalum album");
    assert_eq!(
        rules[0].good_partners,
        vec!["Acacia".to_string(), "Eucalyptus".to_string()]
    );
    assert_eq!(rules[0].reason, "excluded: no suitable host plant");
}

#[test]
fn rows_without_focal_or_partners_carry_no_constraint() {
    let rows = vec![
        dependency_row("", "Acacia"),
        dependency_row("NA", "Acacia"),
        dependency_row("Santalum album", "  "),
    ];
    assert!(parse_dependency_rows(&rows, &DependencyConfig::default()).is_empty());
}

#[test]
fn species_with_no_dependencies_stays_candidate() {
    let engine = engine_with_dependencies(
        vec![named_species(201, "Acacia"), named_species(202, "Eucalyptus")],
        dependency_config(Vec::new()),
        Vec::new(),
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.candidate_ids, vec![201, 202]);
    assert!(result.excluded_species.is_empty());
}

#[test]
fn focal_species_is_excluded_when_no_partner_is_present() {
    let engine = engine_with_dependencies(
        vec![named_species(301, "Santalum album")],
        dependency_config(Vec::new()),
        vec![dependency_row("Santalum album", "Acacia, Eucalyptus")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert!(result.candidate_ids.is_empty());
    let excluded = &result.excluded_species[0];
    assert_eq!(excluded.id, 301);
    assert!(excluded
        .reasons
        .iter()
        .any(|reason| reason.contains("no suitable host plant")));
}

#[test]
fn focal_species_survives_when_any_partner_is_present() {
    let engine = engine_with_dependencies(
        vec![
            named_species(401, "Santalum album"),
            named_species(402, "Acacia"),
        ],
        dependency_config(Vec::new()),
        vec![dependency_row("Santalum album", "Acacia, Eucalyptus")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.candidate_ids, vec![401, 402]);
    assert!(result.excluded_species.is_empty());
}

#[test]
fn partner_names_match_case_insensitively() {
    let engine = engine_with_dependencies(
        vec![
            named_species(1, "Santalum album"),
            named_species(2, "ACACIA"),
        ],
        dependency_config(Vec::new()),
        vec![dependency_row("santalum ALBUM", "acacia")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.candidate_ids, vec![1, 2]);
}

#[test]
fn chain_resolves_when_row_order_leads_downstream() {
    // C is absent. Row order evaluates B -> C first, so B falls out before
    // A -> B is checked and the chain collapses in a single pass.
    let engine = engine_with_dependencies(
        vec![named_species(501, "A"), named_species(502, "B")],
        dependency_config(Vec::new()),
        vec![dependency_row("B", "C"), dependency_row("A", "B")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert!(result.candidate_ids.is_empty());
    let excluded_ids: Vec<i64> = result.excluded_species.iter().map(|r| r.id).collect();
    assert_eq!(excluded_ids, vec![502, 501]);
}

#[test]
fn chain_is_order_sensitive_by_design() {
    // Same chain, opposite row order: A -> B is checked while B is still a
    // candidate, so A survives. Single-pass, row-order semantics are the
    // contract; chains are not resolved to a fixed point.
    let engine = engine_with_dependencies(
        vec![named_species(501, "A"), named_species(502, "B")],
        dependency_config(Vec::new()),
        vec![dependency_row("A", "B"), dependency_row("B", "C")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.candidate_ids, vec![501]);
    assert_eq!(result.excluded_species.len(), 1);
    assert_eq!(result.excluded_species[0].id, 502);
}

#[test]
fn circular_dependency_is_stable_and_terminates() {
    let engine = engine_with_dependencies(
        vec![named_species(601, "A"), named_species(602, "B")],
        dependency_config(Vec::new()),
        vec![dependency_row("A", "B"), dependency_row("B", "A")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.candidate_ids, vec![601, 602]);
    assert!(result.excluded_species.is_empty());
}

#[test]
fn dependency_filter_skips_species_already_excluded_by_rules() {
    use crate::recommend::values::FieldValue;

    // Focal species fails a hard rule; the dependency pass must not touch it
    // again or duplicate its record.
    let focal = named_species(1, "Santalum album")
        .with_attribute("rainfall_mm_min", FieldValue::Number(800.0));
    let engine = engine_with_dependencies(
        vec![focal],
        dependency_config(exclusion_config().rules),
        vec![dependency_row("Santalum album", "Acacia")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.excluded_species.len(), 1);
    assert_eq!(result.excluded_species[0].reasons.len(), 1);
    assert!(result.excluded_species[0].reasons[0].contains("rainfall below minimum"));
}

#[test]
fn dependency_pass_is_inert_when_disabled() {
    let mut config = dependency_config(Vec::new());
    config.dependency.enabled = false;
    let engine = engine_with_dependencies(
        vec![named_species(301, "Santalum album")],
        config,
        vec![dependency_row("Santalum album", "Acacia")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.candidate_ids, vec![301]);
}

#[test]
fn unknown_partner_names_count_as_absent() {
    let engine = engine_with_dependencies(
        vec![named_species(1, "Santalum album"), named_species(2, "Oak")],
        dependency_config(Vec::new()),
        vec![dependency_row("Santalum album", "Nonexistent, AlsoMissing")],
    );

    let result = engine.run_exclusion(&neutral_farm());
    assert_eq!(result.candidate_ids, vec![2]);
    assert_eq!(result.excluded_species[0].id, 1);
}
