//! Shared boilerplate referenced from template bodies as `{{> name}}`.
//!
//! Templates never inherit from each other; common code such as the script
//! header or a CSV loader lives here once per language and is spliced in at
//! render time. Fragments may use context placeholders but not other fragments.

use crate::template::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub name: String,
    pub language: Language,
    pub dependencies: Vec<String>,
    pub body: String,
}

impl Fragment {
    pub fn new(name: &str, language: Language, dependencies: &[&str], body: &str) -> Self {
        Self {
            name: name.to_string(),
            language,
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            body: body.to_string(),
        }
    }
}

/// Fragments keyed by name and language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentLibrary {
    fragments: BTreeMap<(String, Language), Fragment>,
}

impl FragmentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment, returning the one it replaced.
    pub fn insert(&mut self, fragment: Fragment) -> Option<Fragment> {
        self.fragments
            .insert((fragment.name.clone(), fragment.language), fragment)
    }

    pub fn get(&self, name: &str, language: Language) -> Option<&Fragment> {
        self.fragments.get(&(name.to_string(), language))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.values()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn builtin() -> Self {
        let mut lib = Self::new();
        for fragment in [
            Fragment::new("header", Language::Python, &[], PY_HEADER),
            Fragment::new("header", Language::R, &[], R_HEADER),
            Fragment::new("csv_loader", Language::Python, &["pandas"], PY_CSV_LOADER),
            Fragment::new("csv_loader", Language::R, &[], R_CSV_LOADER),
            Fragment::new("fasta_loader", Language::Python, &["biopython"], PY_FASTA_LOADER),
            Fragment::new("fasta_loader", Language::R, &["Biostrings"], R_FASTA_LOADER),
            Fragment::new("results_writer", Language::Python, &[], PY_RESULTS_WRITER),
            Fragment::new("results_writer", Language::R, &["jsonlite"], R_RESULTS_WRITER),
        ] {
            lib.insert(fragment);
        }
        lib
    }
}

const PY_HEADER: &str = "\
#!/usr/bin/env python3
# {{method_name}}
#
# Analysis skeleton reconstructed from: {{paper_title}}
# Method as described: {{method_description}}
# Tools reported: {{tools}}
# Datasets reported: {{datasets}}
#
# Parameter values below were taken from the paper where it stated them.
# Check every value against the original methods section before use.";

const R_HEADER: &str = "\
#!/usr/bin/env Rscript
# {{method_name}}
#
# Analysis skeleton reconstructed from: {{paper_title}}
# Method as described: {{method_description}}
# Tools reported: {{tools}}
# Datasets reported: {{datasets}}
#
# Parameter values below were taken from the paper where it stated them.
# Check every value against the original methods section before use.";

const PY_CSV_LOADER: &str = "\
def load_table(path):
    \"\"\"Load a CSV table and drop incomplete rows.\"\"\"
    df = pd.read_csv(path)
    before = len(df)
    df = df.dropna()
    if len(df) < before:
        print(f\"Dropped {before - len(df)} rows with missing values\")
    return df";

const R_CSV_LOADER: &str = "\
load_table <- function(path) {
  df <- read.csv(path, stringsAsFactors = FALSE)
  complete <- df[complete.cases(df), , drop = FALSE]
  if (nrow(complete) < nrow(df)) {
    message(sprintf(\"Dropped %d rows with missing values\", nrow(df) - nrow(complete)))
  }
  complete
}";

const PY_FASTA_LOADER: &str = "\
def load_sequences(path, fmt=\"fasta\"):
    \"\"\"Read sequence records into a list of (id, sequence) pairs.\"\"\"
    return [(rec.id, str(rec.seq)) for rec in SeqIO.parse(path, fmt)]";

const R_FASTA_LOADER: &str = "\
load_sequences <- function(path) {
  Biostrings::readDNAStringSet(path)
}";

const PY_RESULTS_WRITER: &str = "\
def write_results(results, path=\"results.json\"):
    \"\"\"Write a results mapping as JSON.\"\"\"
    with open(path, \"w\") as handle:
        json.dump(results, handle, indent=2, default=str)
    print(f\"Results written to {path}\")";

const R_RESULTS_WRITER: &str = "\
write_results <- function(results, path = \"results.json\") {
  jsonlite::write_json(results, path, auto_unbox = TRUE, pretty = TRUE)
  message(\"Results written to \", path)
}";
