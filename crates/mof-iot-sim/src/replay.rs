//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Recorded inlet concentration replay."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;

/// Raw reading representation when deserializing scenarios.
#[derive(Debug, Deserialize)]
pub struct ScenarioReading {
    pub inlet_mg_l: f64,
    #[serde(default)]
    pub label: Option<String>,
}

/// Cycles through recorded inlet concentrations.
#[derive(Debug, Default, Clone)]
pub struct ScenarioReplay {
    readings: Vec<f64>,
    cursor: usize,
}

impl ScenarioReplay {
    pub fn from_path(path: &Path) -> Result<Self> {
        let readings = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::read_json(path)?,
            Some("csv") => Self::read_csv(path)?,
            _ => bail!("unsupported scenario format: {}", path.display()),
        };
        if readings.is_empty() {
            bail!("scenario {} contains no readings", path.display());
        }
        Ok(Self::from_readings(
            readings.into_iter().map(|raw| raw.inlet_mg_l).collect(),
        ))
    }

    /// Negative or non-finite readings are replaced by zero.
    pub fn from_readings(readings: Vec<f64>) -> Self {
        Self {
            readings: readings
                .into_iter()
                .map(|value| if value.is_finite() { value.max(0.0) } else { 0.0 })
                .collect(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn next_inlet(&mut self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let value = self.readings[self.cursor];
        self.cursor = (self.cursor + 1) % self.readings.len();
        Some(value)
    }

    fn read_json(path: &Path) -> Result<Vec<ScenarioReading>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read scenario file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid scenario JSON {}", path.display()))
    }

    fn read_csv(path: &Path) -> Result<Vec<ScenarioReading>> {
        let file = fs::File::open(path)
            .with_context(|| format!("unable to open scenario csv {}", path.display()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let mut readings = Vec::new();
        for row in reader.deserialize::<ScenarioReading>() {
            readings
                .push(row.with_context(|| format!("invalid scenario row in {}", path.display()))?);
        }
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn loads_json_scenarios() -> Result<()> {
        let mut file = Builder::new().suffix(".json").tempfile()?;
        writeln!(
            file,
            "{}",
            r#"[{"inlet_mg_l":48.5,"label":"shift-a"},{"inlet_mg_l":51.0}]"#
        )?;
        file.flush()?;
        let mut replay = ScenarioReplay::from_path(file.path())?;
        assert_eq!(replay.len(), 2);
        assert_eq!(replay.next_inlet(), Some(48.5));
        assert_eq!(replay.next_inlet(), Some(51.0));
        Ok(())
    }

    #[test]
    fn loads_csv_scenarios() -> Result<()> {
        let mut file = Builder::new().suffix(".csv").tempfile()?;
        writeln!(file, "inlet_mg_l,label")?;
        writeln!(file, "49.9,morning")?;
        writeln!(file, "-3.0,sensor-glitch")?;
        file.flush()?;
        let mut replay = ScenarioReplay::from_path(file.path())?;
        assert_eq!(replay.next_inlet(), Some(49.9));
        assert_eq!(replay.next_inlet(), Some(0.0));
        Ok(())
    }

    #[test]
    fn rejects_unknown_extension_and_empty_files() -> Result<()> {
        let file = Builder::new().suffix(".txt").tempfile()?;
        assert!(ScenarioReplay::from_path(file.path()).is_err());

        let mut empty = Builder::new().suffix(".json").tempfile()?;
        writeln!(empty, "[]")?;
        empty.flush()?;
        let err = ScenarioReplay::from_path(empty.path()).unwrap_err();
        assert!(err.to_string().contains("no readings"));
        Ok(())
    }

    #[test]
    fn next_inlet_cycles() {
        let mut replay = ScenarioReplay::from_readings(vec![1.0, 2.0]);
        assert_eq!(replay.next_inlet(), Some(1.0));
        assert_eq!(replay.next_inlet(), Some(2.0));
        assert_eq!(replay.next_inlet(), Some(1.0));
    }
}
