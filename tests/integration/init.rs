//! First-run setup tests.

use crate::common::{Harness, OWNER};
use execman::config::Config;
use execman::init::initialize;
use execman::installer::InstallOutcome;
use execman::registry::Registry;
use execman::test_utils::ScriptedPrompter;
use execman::utils::platform::Platform;

#[tokio::test]
async fn test_init_configures_and_installs_itself() {
    let h = Harness::new();
    h.publish("execman", "v0.3.0", "self");
    let config_path = h.dir.path().join("config").join("config.json");
    std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    std::fs::write(&config_path, r#"{"include_prereleases": true}"#).unwrap();
    let folder = h.dir.path().join("tools");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let report = initialize(
        &h.host,
        &mut prompter,
        &config_path,
        &mut registry,
        &folder,
        &format!("github.com/{OWNER}/execman"),
    )
    .await
    .unwrap();

    assert_eq!(report.install_dir, folder);
    let InstallOutcome::Installed {
        record,
        ..
    } = report.outcome
    else {
        panic!("Expected Installed, got {:?}", report.outcome);
    };
    assert_eq!(record.path, folder.join(Platform::current().executable_name("execman")));
    assert_eq!(std::fs::read_to_string(&record.path).unwrap(), "self");
    assert!(prompter.asked().is_empty());

    let config = Config::load_from(&config_path).await.unwrap();
    assert_eq!(config.default_install_dir, Some(folder));
    assert!(config.include_prereleases);

    let reloaded = Registry::load_from(&h.registry_path()).unwrap();
    assert_eq!(reloaded.get("execman"), Some(&record));
}

#[tokio::test]
async fn test_init_writes_config_and_registry_before_installing() {
    let h = Harness::new();
    let config_path = h.dir.path().join("config.json");
    let folder = h.dir.path().join("tools");

    let mut registry = h.registry();
    let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
    let result = initialize(
        &h.host,
        &mut prompter,
        &config_path,
        &mut registry,
        &folder,
        &format!("github.com/{OWNER}/execman"),
    )
    .await;

    assert!(result.is_err());
    let config = Config::load_from(&config_path).await.unwrap();
    assert_eq!(config.default_install_dir, Some(folder));
    assert!(Registry::load_from(&h.registry_path()).unwrap().is_empty());
    assert!(h.registry_path().exists());
}
