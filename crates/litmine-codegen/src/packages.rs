//! Tool name → installable package, per target language.

use crate::template::Language;
use litmine_model::normalize_name;

const PYTHON_PACKAGES: &[(&[&str], &str)] = &[
    (&["scikit learn", "sklearn", "scikit"], "scikit-learn"),
    (&["pandas"], "pandas"),
    (&["numpy"], "numpy"),
    (&["scipy"], "scipy"),
    (&["statsmodels"], "statsmodels"),
    (&["matplotlib"], "matplotlib"),
    (&["seaborn"], "seaborn"),
    (&["biopython", "bio python"], "biopython"),
    (&["xgboost"], "xgboost"),
    (&["lightgbm"], "lightgbm"),
    (&["tensorflow", "keras"], "tensorflow"),
    (&["pytorch", "torch"], "torch"),
    (&["pydeseq2", "deseq2"], "pydeseq2"),
    (&["lifelines"], "lifelines"),
    (&["scanpy"], "scanpy"),
    (&["networkx"], "networkx"),
    (&["umap", "umap learn"], "umap-learn"),
    (&["pingouin"], "pingouin"),
];

const R_PACKAGES: &[(&[&str], &str)] = &[
    (&["deseq2"], "DESeq2"),
    (&["edger"], "edgeR"),
    (&["limma"], "limma"),
    (&["ggplot2", "ggplot"], "ggplot2"),
    (&["randomforest"], "randomForest"),
    (&["caret"], "caret"),
    (&["survival"], "survival"),
    (&["lme4"], "lme4"),
    (&["seurat"], "Seurat"),
    (&["biostrings"], "Biostrings"),
    (&["glmnet"], "glmnet"),
    (&["e1071"], "e1071"),
    (&["dplyr"], "dplyr"),
    (&["tidyverse"], "tidyverse"),
];

/// Package implied by a tool the paper names, if the tool is known for `language`.
pub fn tool_package(tool: &str, language: Language) -> Option<&'static str> {
    let key = normalize_name(tool);
    if key.is_empty() {
        return None;
    }
    let table = match language {
        Language::Python => PYTHON_PACKAGES,
        Language::R => R_PACKAGES,
    };
    table
        .iter()
        .find(|(names, _)| names.iter().any(|n| *n == key))
        .map(|(_, package)| *package)
}
