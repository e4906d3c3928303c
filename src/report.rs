use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::processor::{
    AnalysisError,
    derived::{DerivedTable, Distribution},
};

/// One named analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    Table {
        name: String,
        #[serde(flatten)]
        table: DerivedTable,
    },
    Distribution {
        name: String,
        #[serde(flatten)]
        distribution: Distribution,
    },
}

impl Section {
    pub fn name(&self) -> &str {
        match self {
            Section::Table { name, .. } | Section::Distribution { name, .. } => name,
        }
    }
}

/// Collected results of one run, written as JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub source: String,
    pub rows: usize,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn new(source: impl Into<String>, rows: usize) -> Self {
        Report {
            source: source.into(),
            rows,
            sections: Vec::new(),
        }
    }

    pub fn add_table(&mut self, name: impl Into<String>, table: DerivedTable) {
        self.sections.push(Section::Table {
            name: name.into(),
            table,
        });
    }

    pub fn add_distribution(&mut self, name: impl Into<String>, distribution: Distribution) {
        self.sections.push(Section::Distribution {
            name: name.into(),
            distribution,
        });
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), AnalysisError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!(path = %path.display(), sections = self.sections.len(), "report saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Value;
    use serde_json::json;

    #[test]
    fn test_report_json_shape() {
        let mut table = DerivedTable::new(["category", "std_dev"]);
        table.push_row(vec![Value::from("C"), Value::Missing]);

        let mut report = Report::new("data.csv", 5);
        report.add_table("summary", table);

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "source": "data.csv",
                "rows": 5,
                "sections": [{
                    "kind": "table",
                    "name": "summary",
                    "columns": ["category", "std_dev"],
                    "rows": [["C", null]]
                }]
            })
        );
        assert!(report.section("summary").is_some());
        assert!(report.section("missing").is_none());
    }
}
