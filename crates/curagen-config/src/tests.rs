#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_validation_settings() {
        let validation = ValidationConfig::default();
        assert!(validation.text_quality_checks);
        assert_eq!(validation.completeness_suggestion_threshold, 50.0);
        assert_eq!(validation.min_descriptive_words, 3);
    }

    #[test]
    fn test_default_scoring_enables_all_builtin_engines() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.enabled_engines, vec!["clingen_sop_v11", "gencc_based", "qualitative_assessment"]);
        assert_eq!(scoring.strict_pmid_min_digits, 7);
        assert_eq!(Config::default().scoring_registry().len(), 3);
    }

    #[test]
    fn test_default_workflow_is_strict() {
        let settings = Config::default().workflow_settings();
        assert!(settings.require_review_before_activation);
        assert!(settings.auto_activate_on_approval);
        assert!(settings.enforce_scope_membership);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.logging.filter, "curagen=info,warn");
        assert_eq!(config.catalog.schema_dir, PathBuf::from("schemas"));
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [validation]
            text_quality_checks = false

            [scoring]
            enabled_engines = ["qualitative_assessment"]

            [workflow]
            auto_activate_on_approval = false
            "#,
        )
        .unwrap();

        assert!(!config.validator_settings().text_quality_checks);
        assert_eq!(config.validator_settings().min_descriptive_words, 3);
        assert_eq!(config.scoring.strict_pmid_min_digits, 7);

        let registry = config.scoring_registry();
        assert!(registry.contains("qualitative_assessment"));
        assert!(!registry.contains("clingen_sop_v11"));

        let workflow = config.workflow_settings();
        assert!(!workflow.auto_activate_on_approval);
        assert!(workflow.require_review_before_activation);
    }

    #[test]
    fn test_unknown_engine_is_rejected() {
        let err = Config::from_toml_str("[scoring]\nenabled_engines = [\"bayesian\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("unknown engine 'bayesian'"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let err = Config::from_toml_str("[validation]\ncompleteness_suggestion_threshold = 150.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::from_toml_str("[scoring]\nstrict_pmid_min_digits = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml_is_a_toml_error() {
        let err = Config::from_toml_str("[validation\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_classify_definition_files() {
        assert_eq!(classify(Path::new("clingen.schema.yaml")), Some((DefinitionKind::Schema, false)));
        assert_eq!(classify(Path::new("clingen.pair.json")), Some((DefinitionKind::Pair, true)));
        assert_eq!(classify(Path::new("gencc.yml")), Some((DefinitionKind::Schema, false)));
        assert_eq!(classify(Path::new("README.md")), None);
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schemas");
        let catalog = Catalog::load_dir(&dir).unwrap();

        let curation = catalog.schema("ClinGen_SOP_v11", None).expect("ClinGen schema bundled");
        assert_eq!(curation.scoring_engine(), Some("clingen_sop_v11"));
        assert!(catalog.schema("ClinGen_Precuration", Some("1.0.0")).is_some());

        assert_eq!(catalog.pairs.len(), 1);
        let pair = &catalog.pairs[0];
        assert_eq!(pair.curation_schema, curation.schema_ref());
    }

    #[test]
    fn test_missing_catalog_dir_is_io_error() {
        let err = Catalog::load_dir("/nonexistent/curagen/schemas").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
