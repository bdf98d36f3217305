// sanitree-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use sanitree_core::config::{self, AliasRule, RedactionRule, SanitizeConfig};

fn write_config(yaml: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml.as_bytes())?;
    Ok(file)
}

#[test]
fn test_load_default_rules() {
    let config = SanitizeConfig::load_default_rules().unwrap();
    assert!(config.rules.iter().any(|r| r.name == "email"));
    let aws = config.rules.iter().find(|r| r.name == "aws_internal_hostname").unwrap();
    assert_eq!(aws.replace_with, "*** AWS INT. HOSTNAME REPLACED ***");
    assert_eq!(config.settings.source_root, Some(PathBuf::from("/data/sanitize/dirty")));
    assert!(config.settings.create_archive());
}

#[test]
fn test_load_from_file() -> Result<()> {
    let file = write_config(
        r#"
settings:
  source_root: /tmp/in
  atomic_writes: true
rules:
  - name: token
    pattern: "tok_[a-z0-9]+"
    replace_with: "[TOKEN]"
aliases:
  - name: user
    label: User
    prefix: user
    pattern: "uid=[0-9]+"
"#,
    )?;
    let config = SanitizeConfig::load_from_file(file.path())?;
    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].pattern, Some("tok_[a-z0-9]+".to_string()));
    assert!(!config.rules[0].opt_in);
    assert_eq!(config.aliases[0].prefix, "user");
    assert!(config.settings.atomic_writes());
    assert_eq!(config.settings.clean_root, None);
    Ok(())
}

#[test]
fn test_load_from_file_rejects_invalid_regex() -> Result<()> {
    let file = write_config(
        r#"
rules:
  - name: broken
    pattern: "([a-z"
    replace_with: "x"
"#,
    )?;
    let err = SanitizeConfig::load_from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("invalid regex pattern"));
    Ok(())
}

#[test]
fn test_load_from_file_rejects_duplicate_names() -> Result<()> {
    let file = write_config(
        r#"
rules:
  - name: dup
    pattern: "a"
  - name: dup
    pattern: "b"
"#,
    )?;
    let err = SanitizeConfig::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Duplicate rule name"));
    Ok(())
}

#[test]
fn test_merge_user_rules_over_defaults() -> Result<()> {
    let default_config = SanitizeConfig::load_default_rules()?;
    let user_config = SanitizeConfig {
        rules: vec![
            RedactionRule {
                name: "email".to_string(),
                pattern: Some("[a-z]+@[a-z.]+".to_string()),
                replace_with: "[EMAIL]".to_string(),
                ..Default::default()
            },
            RedactionRule {
                name: "ticket".to_string(),
                pattern: Some("TICKET-[0-9]+".to_string()),
                replace_with: "[TICKET]".to_string(),
                ..Default::default()
            },
        ],
        aliases: vec![AliasRule {
            name: "mac".to_string(),
            label: "MAC".to_string(),
            prefix: "mac".to_string(),
            pattern: "(?:[0-9a-f]{2}:){5}[0-9a-f]{2}".to_string(),
            description: None,
        }],
        ..Default::default()
    };

    let merged = config::merge_rules(default_config, Some(user_config));
    merged.validate()?;

    let names: Vec<&str> = merged.rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["email", "aws_internal_hostname", "ticket"]);
    assert_eq!(merged.rules[0].replace_with, "[EMAIL]");

    let prefixes: Vec<&str> = merged.aliases.iter().map(|a| a.prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["ipaddr", "host", "mac"]);
    Ok(())
}

#[test]
fn test_user_settings_override_only_named_fields() -> Result<()> {
    let default_config = SanitizeConfig::load_default_rules()?;
    let file = write_config(
        r#"
settings:
  clean_root: /srv/clean
  create_archive: false
"#,
    )?;
    let user_config = SanitizeConfig::load_from_file(file.path())?;
    let merged = config::merge_rules(default_config, Some(user_config));

    assert_eq!(merged.settings.clean_root, Some(PathBuf::from("/srv/clean")));
    assert_eq!(merged.settings.source_root, Some(PathBuf::from("/data/sanitize/dirty")));
    assert!(!merged.settings.create_archive());
    assert!(merged.settings.unpack_archives());
    Ok(())
}

#[test]
fn test_set_active_rules_handles_opt_in_and_disable() {
    let mut config = SanitizeConfig {
        rules: vec![
            RedactionRule {
                name: "always".to_string(),
                pattern: Some("a".to_string()),
                ..Default::default()
            },
            RedactionRule {
                name: "optional".to_string(),
                pattern: Some("b".to_string()),
                opt_in: true,
                ..Default::default()
            },
            RedactionRule {
                name: "noisy".to_string(),
                pattern: Some("c".to_string()),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    assert_eq!(config.active_rules().len(), 2);

    config.set_active_rules(&["optional".to_string()], &["noisy".to_string()]);
    let names: Vec<String> = config.active_rules().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["always".to_string(), "optional".to_string()]);
}

#[test]
fn test_candidate_paths_end_with_system_location() {
    let paths = config::config_candidate_paths();
    assert_eq!(
        paths.last(),
        Some(&PathBuf::from("/etc/sanitree").join(config::USER_CONFIG_FILE_NAME))
    );
}
