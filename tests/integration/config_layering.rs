//! Integration tests for layered configuration loading

use qmaker::config::{ConfigLoader, QMakerConfig};
use qmaker::generation::Backoff;
use qmaker::types::{GenerationMode, QuestionType};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

// Loading reads XDG_CONFIG_HOME, QMAKER_ENV and QMAKER__* variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Runs `f` with the given variables set and an empty global config directory.
fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let xdg = TempDir::new().unwrap();
    let mut all: Vec<(&str, String)> = vec![(
        "XDG_CONFIG_HOME",
        xdg.path().to_string_lossy().into_owned(),
    )];
    all.extend(vars.iter().map(|(k, v)| (*k, v.to_string())));

    let saved: Vec<(&str, Option<String>)> =
        all.iter().map(|(k, _)| (*k, std::env::var(k).ok())).collect();
    for (key, value) in &all {
        std::env::set_var(key, value);
    }
    let result = f();
    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    result
}

fn write_workspace_file(root: &Path, name: &str, contents: &str) {
    let dir = root.join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn empty_workspace_loads_defaults() {
    let workspace = TempDir::new().unwrap();
    let config = with_env(&[], || ConfigLoader::load(workspace.path()).unwrap());
    assert_eq!(config, QMakerConfig::default());
}

#[test]
fn workspace_file_overrides_single_keys() {
    let workspace = TempDir::new().unwrap();
    write_workspace_file(
        workspace.path(),
        "config.toml",
        r#"
[api]
base_url = "https://questions.example.org"

[generation]
total_questions = 45
question_type = "NAT"
backoff = "exponential"
"#,
    );

    let config = with_env(&[], || ConfigLoader::load(workspace.path()).unwrap());
    assert_eq!(config.api.base_url, "https://questions.example.org");
    assert_eq!(config.api.topics_path, "all-topics-with-weightage");
    assert_eq!(config.generation.total_questions, 45);
    assert_eq!(config.generation.question_type, QuestionType::Nat);
    assert_eq!(config.generation.backoff, Backoff::Exponential);
    assert_eq!(config.generation.max_attempts, 3);
}

#[test]
fn environment_overlay_and_variables_win_over_base_file() {
    let workspace = TempDir::new().unwrap();
    write_workspace_file(
        workspace.path(),
        "config.toml",
        "[generation]\nmax_attempts = 2\nmode = \"new_questions\"\n",
    );
    write_workspace_file(
        workspace.path(),
        "exam.toml",
        "[generation]\nmode = \"pyq_solutions\"\n",
    );

    let config = with_env(
        &[
            ("QMAKER_ENV", "exam"),
            ("QMAKER__GENERATION__MAX_ATTEMPTS", "5"),
            ("QMAKER__EXAM__CORRECT_MARKS", "2.5"),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );
    assert_eq!(config.generation.mode, GenerationMode::PyqSolutions);
    assert_eq!(config.generation.max_attempts, 5);
    assert_eq!(config.exam.correct_marks, 2.5);
}

#[test]
fn global_file_sits_below_workspace_files() {
    let workspace = TempDir::new().unwrap();
    write_workspace_file(
        workspace.path(),
        "config.toml",
        "[generation]\ntotal_questions = 12\n",
    );

    let config = with_env(&[], || {
        let global = ConfigLoader::global_config_path().unwrap();
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(
            &global,
            "[generation]\ntotal_questions = 99\nsuccess_delay_ms = 250\n",
        )
        .unwrap();
        ConfigLoader::load(workspace.path()).unwrap()
    });
    assert_eq!(config.generation.total_questions, 12);
    assert_eq!(config.generation.success_delay_ms, 250);
}

#[test]
fn explicit_file_must_exist_and_validation_collects_problems() {
    let dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&dir.path().join("missing.toml")).is_err());

    let path = dir.path().join("broken.toml");
    fs::write(
        &path,
        "[api]\nbase_url = \"ftp://nowhere\"\n\n[generation]\nmax_attempts = 0\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(config.ensure_valid().is_err());
}
