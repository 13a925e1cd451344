use std::sync::Arc;
use tempfile::TempDir;
use vcolors::config::toml_config::TomlConfig;
use vcolors::domain::ports::ColorTableStore;
use vcolors::utils::validation::Validate;
use vcolors::{ColorEngine, DatasetPipeline, LocalStore, Rgb};

#[tokio::test]
async fn test_toml_job_end_to_end() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join("wells.csv"),
        "fid;depth\n10;0\n11;20\n12;40\n13;\n",
    )?;

    let toml_content = format!(
        r#"
[job]
name = "wells"
description = "Well depths"

[dataset]
path = "{dir}/wells.csv"
key_column = "fid"
delimiter = ";"
columns = {{ depth = "double" }}

[colors]
column = "depth"
rules_text = """
0% white
50% 0:0:255
100% black
"""

[transform]
invert = true

[store]
path = "{dir}/colors"
"#,
        dir = dir.path().display()
    );

    let config = TomlConfig::from_toml_str(&toml_content)?;
    config.validate()?;

    let job = config.to_job()?;
    let records = config.record_source();
    let store = LocalStore::new(&config.store.path);
    let pipeline = DatasetPipeline::new(records.clone(), store.clone(), job).with_histogram(Arc::new(records));

    let summary = ColorEngine::new(pipeline).run().await?;
    assert_eq!(summary.dataset, "wells");
    assert!(summary.domain.is_floating_point());
    assert_eq!(summary.breakpoints, 3);

    let table = store.load("wells").await?.expect("table saved");
    assert_eq!(table.lookup(0.0), Rgb::new(0, 0, 0));
    assert_eq!(table.lookup(20.0), Rgb::new(0, 0, 255));
    assert_eq!(table.lookup(40.0), Rgb::new(255, 255, 255));
    Ok(())
}

#[tokio::test]
async fn test_toml_job_keeps_existing_table_when_overwrite_disabled() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("wells.csv"), "cat,depth\n1,5\n2,9\n")?;

    let toml_content = format!(
        r#"
[job]
name = "wells"

[dataset]
path = "{dir}/wells.csv"

[colors]
column = "depth"
color = "grey"

[store]
path = "{dir}/colors"
overwrite = false
"#,
        dir = dir.path().display()
    );

    let config = TomlConfig::from_toml_str(&toml_content)?;
    let store = LocalStore::new(&config.store.path);

    let first = ColorEngine::new(DatasetPipeline::new(config.record_source(), store.clone(), config.to_job()?));
    first.run().await?;

    let second = ColorEngine::new(DatasetPipeline::new(config.record_source(), store.clone(), config.to_job()?));
    let err = second.run().await.unwrap_err();
    assert_eq!(err.severity(), vcolors::utils::error::ErrorSeverity::Low);
    Ok(())
}
