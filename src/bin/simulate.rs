//! Run one study from the command line and print the report as JSON.
//!
//! Usage: `simulate [study.json]`. With no argument a default Steel study
//! runs. `SIM_RUNS` overrides the iteration count and `SIM_SEED` supplies a
//! seed when the study file does not carry one.

use std::fs;

use anyhow::{anyhow, Result};

use lcaforge::report::run_simulation;
use lcaforge::sampler::DEFAULT_NUM_RUNS;
use lcaforge::study::StudyInput;

fn load_input(path: Option<String>) -> Result<StudyInput> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .map_err(|err| anyhow!("failed to read {}: {}", path, err))?;
            serde_json::from_str(&text)
                .map_err(|err| anyhow!("invalid study descriptor in {}: {}", path, err))
        }
        None => Ok(StudyInput::default()),
    }
}

fn main() -> Result<()> {
    let mut input = load_input(std::env::args().nth(1))?;

    let num_runs = std::env::var("SIM_RUNS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_NUM_RUNS);
    if input.seed.is_none() {
        input.seed = std::env::var("SIM_SEED").ok().and_then(|v| v.parse().ok());
    }

    let report = run_simulation(&input, num_runs);
    println!("{}", report.to_json());
    if let Some(err) = &report.error {
        return Err(anyhow!("simulation failed: {}", err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_input_missing_file() {
        let err = load_input(Some("no/such/study.json".to_string())).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_load_input_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "not json").unwrap();

        let err = load_input(Some(path.to_string_lossy().into_owned())).unwrap_err();
        assert!(err.to_string().contains("invalid study descriptor"));
    }

    #[test]
    fn test_load_input_partial_study() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.json");
        fs::write(&path, r#"{"material": "Aluminum", "seed": 7}"#).unwrap();

        let input = load_input(Some(path.to_string_lossy().into_owned())).unwrap();
        assert_eq!(input.material.as_deref(), Some("Aluminum"));
        assert_eq!(input.seed, Some(7));
    }

    #[test]
    fn test_load_input_defaults_without_path() {
        let input = load_input(None).unwrap();
        assert!(input.material.is_none());
        assert!(input.seed.is_none());
    }
}
