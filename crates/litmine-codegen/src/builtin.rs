//! Built-in template set.

use crate::template::{CodeTemplate, Language, Placeholder, PlaceholderKind};
use litmine_model::{MethodCategory, ParamValue};

use PlaceholderKind::{Bool, Float, Integer, Text, TextList};

fn num(n: f64) -> Option<ParamValue> {
    Some(ParamValue::Number(n))
}

fn text(s: &str) -> Option<ParamValue> {
    Some(ParamValue::Text(s.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    category: MethodCategory,
    language: Language,
    description: &str,
    placeholders: Vec<Placeholder>,
    dependencies: &[&str],
    keywords: &[&str],
    body: &str,
) -> CodeTemplate {
    let usage = match language {
        Language::Python => "python {script} <data file>",
        Language::R => "Rscript {script} <data file>",
    };
    CodeTemplate {
        id: id.to_string(),
        category,
        language,
        description: description.to_string(),
        placeholders,
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        usage: usage.to_string(),
        fallback: false,
        body: body.to_string(),
    }
}

pub(crate) fn templates() -> Vec<CodeTemplate> {
    let mut out = vec![
        // ------------------------------------------------------------------
        // Statistical
        // ------------------------------------------------------------------
        template(
            "stat_descriptive",
            MethodCategory::Statistical,
            Language::Python,
            "Summary statistics of the numeric columns",
            vec![Placeholder::optional("columns", TextList, None)
                .with_aliases(&["variables", "measures", "feature_columns"])],
            &[],
            &[
                "descriptive",
                "summary statistics",
                "standard deviation",
                "median",
                "interquartile",
            ],
            PY_DESCRIPTIVE,
        ),
        template(
            "stat_descriptive_r",
            MethodCategory::Statistical,
            Language::R,
            "Summary statistics of the numeric columns",
            vec![Placeholder::optional("columns", TextList, None)
                .with_aliases(&["variables", "measures", "feature_columns"])],
            &[],
            &[
                "descriptive",
                "summary statistics",
                "standard deviation",
                "median",
                "interquartile",
            ],
            R_DESCRIPTIVE,
        ),
        template(
            "stat_t_test",
            MethodCategory::Statistical,
            Language::Python,
            "Two-sample t-test between the groups of a table column",
            vec![
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level", "p_value_threshold"]),
                Placeholder::optional("group_column", Text, text("group"))
                    .with_aliases(&["group", "grouping_variable"]),
                Placeholder::optional("value_column", Text, text("value"))
                    .with_aliases(&["outcome", "response"]),
                Placeholder::optional("equal_var", Bool, text("false"))
                    .with_aliases(&["equal_variance", "equal_variances"]),
            ],
            &["scipy"],
            &["t test", "ttest", "student", "welch", "two sample", "paired"],
            PY_T_TEST,
        ),
        template(
            "stat_t_test_r",
            MethodCategory::Statistical,
            Language::R,
            "Two-sample t-test between the groups of a table column",
            vec![
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level", "p_value_threshold"]),
                Placeholder::optional("group_column", Text, text("group"))
                    .with_aliases(&["group", "grouping_variable"]),
                Placeholder::optional("value_column", Text, text("value"))
                    .with_aliases(&["outcome", "response"]),
                Placeholder::optional("equal_var", Bool, text("false"))
                    .with_aliases(&["equal_variance", "equal_variances"]),
            ],
            &[],
            &["t test", "ttest", "student", "welch", "two sample", "paired"],
            R_T_TEST,
        ),
        template(
            "stat_anova",
            MethodCategory::Statistical,
            Language::Python,
            "One-way ANOVA with a Kruskal-Wallis check across the groups of a column",
            vec![
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level", "p_value_threshold"]),
                Placeholder::optional("group_column", Text, text("group"))
                    .with_aliases(&["group", "grouping_variable", "factor", "treatment"]),
                Placeholder::optional("value_column", Text, text("value"))
                    .with_aliases(&["outcome", "response", "dependent_variable"]),
            ],
            &["scipy"],
            &[
                "anova",
                "analysis of variance",
                "kruskal",
                "kruskal wallis",
                "f test",
                "one way",
            ],
            PY_ANOVA,
        ),
        template(
            "stat_anova_r",
            MethodCategory::Statistical,
            Language::R,
            "One-way ANOVA with a Kruskal-Wallis check across the groups of a column",
            vec![
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level", "p_value_threshold"]),
                Placeholder::optional("group_column", Text, text("group"))
                    .with_aliases(&["group", "grouping_variable", "factor", "treatment"]),
                Placeholder::optional("value_column", Text, text("value"))
                    .with_aliases(&["outcome", "response", "dependent_variable"]),
            ],
            &[],
            &[
                "anova",
                "analysis of variance",
                "kruskal",
                "kruskal wallis",
                "f test",
                "one way",
            ],
            R_ANOVA,
        ),
        template(
            "stat_correlation",
            MethodCategory::Statistical,
            Language::Python,
            "Pairwise correlation matrix with p-values",
            vec![
                Placeholder::optional("method", Text, text("pearson"))
                    .with_aliases(&["correlation_method", "correlation_type"]),
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level"]),
            ],
            &["scipy"],
            &["correlation", "pearson", "spearman", "kendall", "association"],
            PY_CORRELATION,
        ),
        template(
            "stat_correlation_r",
            MethodCategory::Statistical,
            Language::R,
            "Pairwise correlation matrix with p-values",
            vec![
                Placeholder::optional("method", Text, text("pearson"))
                    .with_aliases(&["correlation_method", "correlation_type"]),
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level"]),
            ],
            &[],
            &["correlation", "pearson", "spearman", "kendall", "association"],
            R_CORRELATION,
        ),
        template(
            "stat_regression",
            MethodCategory::Statistical,
            Language::Python,
            "Ordinary least squares regression of a target on covariates",
            vec![
                Placeholder::required("target_column", Text)
                    .with_aliases(&["target", "outcome", "dependent_variable", "response"]),
                Placeholder::optional("feature_columns", TextList, None)
                    .with_aliases(&["features", "covariates", "predictors", "independent_variables"]),
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level"]),
            ],
            &["statsmodels"],
            &["regression", "linear model", "least squares", "ols", "glm", "covariate"],
            PY_REGRESSION,
        ),
        template(
            "stat_regression_r",
            MethodCategory::Statistical,
            Language::R,
            "Ordinary least squares regression of a target on covariates",
            vec![
                Placeholder::required("target_column", Text)
                    .with_aliases(&["target", "outcome", "dependent_variable", "response"]),
                Placeholder::optional("feature_columns", TextList, None)
                    .with_aliases(&["features", "covariates", "predictors", "independent_variables"]),
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["significance_level"]),
            ],
            &[],
            &["regression", "linear model", "least squares", "ols", "glm", "covariate"],
            R_REGRESSION,
        ),
        // ------------------------------------------------------------------
        // Machine learning
        // ------------------------------------------------------------------
        template(
            "ml_random_forest",
            MethodCategory::MachineLearning,
            Language::Python,
            "Random forest classifier with hold-out and cross-validated evaluation",
            vec![
                Placeholder::optional("n_estimators", Integer, num(100.0))
                    .with_aliases(&["num_trees", "n_trees", "trees", "ntree", "number_of_trees"]),
                Placeholder::optional("max_depth", Integer, None).with_aliases(&["depth"]),
                Placeholder::optional("test_size", Float, num(0.2))
                    .with_aliases(&["test_fraction", "test_split"]),
                Placeholder::optional("cv_folds", Integer, num(5.0))
                    .with_aliases(&["cv", "folds", "k_fold", "cross_validation_folds"]),
                Placeholder::optional("random_state", Integer, num(42.0))
                    .with_aliases(&["seed", "random_seed"]),
            ],
            &["scikit-learn"],
            &["random forest", "forest", "ensemble", "decision tree", "bagging"],
            PY_RANDOM_FOREST,
        ),
        template(
            "ml_classifier",
            MethodCategory::MachineLearning,
            Language::Python,
            "Logistic regression and support vector classifiers on scaled features",
            vec![
                Placeholder::optional("c", Float, num(1.0))
                    .with_aliases(&["regularization", "regularization_strength", "cost"]),
                Placeholder::optional("kernel", Text, text("rbf")),
                Placeholder::optional("max_iter", Integer, num(1000.0))
                    .with_aliases(&["iterations", "max_iterations"]),
                Placeholder::optional("test_size", Float, num(0.2))
                    .with_aliases(&["test_fraction", "test_split"]),
                Placeholder::optional("random_state", Integer, num(42.0))
                    .with_aliases(&["seed", "random_seed"]),
            ],
            &["scikit-learn"],
            &[
                "logistic regression",
                "logistic",
                "svm",
                "support vector",
                "classifier",
                "classification",
            ],
            PY_CLASSIFIER,
        ),
        template(
            "ml_kmeans",
            MethodCategory::MachineLearning,
            Language::Python,
            "K-means clustering of scaled numeric columns",
            vec![
                Placeholder::required("n_clusters", Integer)
                    .with_aliases(&["k", "clusters", "num_clusters", "number_of_clusters"]),
                Placeholder::optional("n_init", Integer, num(10.0)),
                Placeholder::optional("random_state", Integer, num(42.0))
                    .with_aliases(&["seed", "random_seed"]),
            ],
            &["scikit-learn"],
            &["k means", "kmeans", "clustering", "cluster", "unsupervised"],
            PY_KMEANS,
        ),
        template(
            "ml_regression",
            MethodCategory::MachineLearning,
            Language::Python,
            "Linear, random forest and gradient boosting regressors compared on a hold-out split",
            vec![
                Placeholder::optional("n_estimators", Integer, num(100.0))
                    .with_aliases(&["num_trees", "n_trees", "trees", "number_of_trees"]),
                Placeholder::optional("learning_rate", Float, num(0.1))
                    .with_aliases(&["eta", "shrinkage"]),
                Placeholder::optional("test_size", Float, num(0.2))
                    .with_aliases(&["test_fraction", "test_split"]),
                Placeholder::optional("cv_folds", Integer, num(5.0))
                    .with_aliases(&["cv", "folds", "k_fold", "cross_validation_folds"]),
                Placeholder::optional("random_state", Integer, num(42.0))
                    .with_aliases(&["seed", "random_seed"]),
            ],
            &["numpy", "scikit-learn"],
            &[
                "regression",
                "regressor",
                "gradient boosting",
                "support vector regression",
                "svr",
                "continuous outcome",
            ],
            PY_ML_REGRESSION,
        ),
        // ------------------------------------------------------------------
        // Bioinformatics
        // ------------------------------------------------------------------
        template(
            "bio_sequence_stats",
            MethodCategory::Bioinformatics,
            Language::Python,
            "Per-sequence length and GC content summary",
            vec![
                Placeholder::optional("sequence_format", Text, text("fasta"))
                    .with_aliases(&["format", "file_format"]),
                Placeholder::optional("min_length", Integer, num(0.0))
                    .with_aliases(&["minimum_length", "length_cutoff"]),
            ],
            &["pandas"],
            &["sequence", "gc content", "composition", "fasta", "nucleotide"],
            PY_SEQUENCE_STATS,
        ),
        template(
            "bio_pairwise_alignment",
            MethodCategory::Bioinformatics,
            Language::Python,
            "Pairwise alignment of the first sequence against the rest",
            vec![
                Placeholder::optional("mode", Text, text("global"))
                    .with_aliases(&["alignment_mode", "alignment_type"]),
                Placeholder::optional("match_score", Float, num(2.0)),
                Placeholder::optional("mismatch_score", Float, num(-1.0))
                    .with_aliases(&["mismatch_penalty"]),
                Placeholder::optional("gap_score", Float, num(-1.0))
                    .with_aliases(&["gap_penalty", "gap_open"]),
            ],
            &["biopython"],
            &[
                "alignment",
                "align",
                "smith waterman",
                "needleman wunsch",
                "blast",
                "homology",
            ],
            PY_PAIRWISE_ALIGNMENT,
        ),
        template(
            "bio_differential_expression",
            MethodCategory::Bioinformatics,
            Language::Python,
            "Differential expression on a count matrix with PyDESeq2",
            vec![
                Placeholder::required("design_factor", Text)
                    .with_aliases(&["condition", "design", "contrast_factor"]),
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["fdr", "padj_threshold", "significance_level"]),
                Placeholder::optional("lfc_threshold", Float, num(1.0))
                    .with_aliases(&["log2fc_threshold", "fold_change_threshold", "log2_fold_change"]),
            ],
            &["pandas", "pydeseq2"],
            &[
                "differential expression",
                "deseq2",
                "edger",
                "limma",
                "rna seq",
                "fold change",
            ],
            PY_DIFFERENTIAL_EXPRESSION,
        ),
        template(
            "bio_differential_expression_r",
            MethodCategory::Bioinformatics,
            Language::R,
            "Differential expression on a count matrix with DESeq2",
            vec![
                Placeholder::required("design_factor", Text)
                    .with_aliases(&["condition", "design", "contrast_factor"]),
                Placeholder::optional("alpha", Float, num(0.05))
                    .with_aliases(&["fdr", "padj_threshold", "significance_level"]),
                Placeholder::optional("lfc_threshold", Float, num(1.0))
                    .with_aliases(&["log2fc_threshold", "fold_change_threshold", "log2_fold_change"]),
            ],
            &["DESeq2"],
            &[
                "differential expression",
                "deseq2",
                "edger",
                "limma",
                "rna seq",
                "fold change",
            ],
            R_DIFFERENTIAL_EXPRESSION,
        ),
    ];

    for (id, language, body) in [
        ("generic", Language::Python, PY_GENERIC),
        ("generic_r", Language::R, R_GENERIC),
    ] {
        let mut generic = template(
            id,
            MethodCategory::Other,
            language,
            "Generic skeleton that loads the input and records the reported settings",
            Vec::new(),
            &[],
            &[],
            body,
        );
        generic.fallback = true;
        out.push(generic);
    }

    out
}

const PY_DESCRIPTIVE: &str = r#"{{> header}}

import json
import sys

import pandas as pd

# Parameters
COLUMNS = {{columns}}


{{> csv_loader}}


{{> results_writer}}


def run_descriptive(df):
    numeric = df[COLUMNS] if COLUMNS else df.select_dtypes(include="number")
    table = numeric.describe()
    print(table)
    return {
        "rows": int(len(df)),
        "summary": table.to_dict(),
        "median": {k: float(v) for k, v in numeric.median().items()},
    }


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv>")
    write_results(run_descriptive(load_table(sys.argv[1])))
"#;

const R_DESCRIPTIVE: &str = r#"{{> header}}

# Parameters
columns <- {{columns}}

{{> csv_loader}}

{{> results_writer}}

run_descriptive <- function(df) {
  numeric <- if (is.null(columns)) df[vapply(df, is.numeric, logical(1))] else df[columns]
  print(summary(numeric))
  list(
    rows = nrow(df),
    mean = lapply(numeric, mean),
    sd = lapply(numeric, sd),
    median = lapply(numeric, median)
  )
}

args <- commandArgs(trailingOnly = TRUE)
if (length(args) < 1) {
  stop("usage: Rscript script.R <data.csv>")
}
write_results(run_descriptive(load_table(args[1])))
"#;

const PY_T_TEST: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from scipy import stats

# Parameters
ALPHA = {{alpha}}
GROUP_COLUMN = {{group_column}}
VALUE_COLUMN = {{value_column}}
EQUAL_VAR = {{equal_var}}


{{> csv_loader}}


{{> results_writer}}


def run_t_test(df):
    groups = df[GROUP_COLUMN].unique()
    if len(groups) != 2:
        raise ValueError(f"expected two groups in {GROUP_COLUMN}, found {len(groups)}")
    a = df.loc[df[GROUP_COLUMN] == groups[0], VALUE_COLUMN]
    b = df.loc[df[GROUP_COLUMN] == groups[1], VALUE_COLUMN]
    statistic, p_value = stats.ttest_ind(a, b, equal_var=EQUAL_VAR)
    return {
        "groups": [str(g) for g in groups],
        "statistic": float(statistic),
        "p_value": float(p_value),
        "significant": bool(p_value < ALPHA),
    }


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv>")
    write_results(run_t_test(load_table(sys.argv[1])))
"#;

const R_T_TEST: &str = r#"{{> header}}

# Parameters
alpha <- {{alpha}}
group_column <- {{group_column}}
value_column <- {{value_column}}
equal_var <- {{equal_var}}

{{> csv_loader}}

{{> results_writer}}

run_t_test <- function(df) {
  groups <- unique(df[[group_column]])
  if (length(groups) != 2) {
    stop(sprintf("expected two groups in %s, found %d", group_column, length(groups)))
  }
  a <- df[df[[group_column]] == groups[1], value_column]
  b <- df[df[[group_column]] == groups[2], value_column]
  test <- t.test(a, b, var.equal = equal_var)
  list(
    groups = as.character(groups),
    statistic = unname(test$statistic),
    p_value = test$p.value,
    significant = test$p.value < alpha
  )
}

args <- commandArgs(trailingOnly = TRUE)
if (length(args) < 1) {
  stop("usage: Rscript script.R <data.csv>")
}
write_results(run_t_test(load_table(args[1])))
"#;

const PY_ANOVA: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from scipy import stats

# Parameters
ALPHA = {{alpha}}
GROUP_COLUMN = {{group_column}}
VALUE_COLUMN = {{value_column}}


{{> csv_loader}}


{{> results_writer}}


def run_anova(df):
    samples = [group[VALUE_COLUMN].values for _, group in df.groupby(GROUP_COLUMN)]
    if len(samples) < 2:
        raise ValueError(f"expected at least two groups in {GROUP_COLUMN}, found {len(samples)}")
    f_stat, p_value = stats.f_oneway(*samples)
    h_stat, kw_p_value = stats.kruskal(*samples)
    return {
        "groups": int(len(samples)),
        "f_statistic": float(f_stat),
        "p_value": float(p_value),
        "significant": bool(p_value < ALPHA),
        "kruskal_h": float(h_stat),
        "kruskal_p_value": float(kw_p_value),
    }


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv>")
    write_results(run_anova(load_table(sys.argv[1])))
"#;

const R_ANOVA: &str = r#"{{> header}}

# Parameters
alpha <- {{alpha}}
group_column <- {{group_column}}
value_column <- {{value_column}}

{{> csv_loader}}

{{> results_writer}}

run_anova <- function(df) {
  groups <- factor(df[[group_column]])
  if (nlevels(groups) < 2) {
    stop(sprintf("expected at least two groups in %s, found %d", group_column, nlevels(groups)))
  }
  values <- df[[value_column]]
  fit <- summary(aov(values ~ groups))[[1]]
  kw <- kruskal.test(values, groups)
  p_value <- fit[["Pr(>F)"]][1]
  list(
    groups = nlevels(groups),
    f_statistic = fit[["F value"]][1],
    p_value = p_value,
    significant = p_value < alpha,
    kruskal_h = unname(kw$statistic),
    kruskal_p_value = kw$p.value
  )
}

args <- commandArgs(trailingOnly = TRUE)
if (length(args) < 1) {
  stop("usage: Rscript script.R <data.csv>")
}
write_results(run_anova(load_table(args[1])))
"#;

const PY_CORRELATION: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from scipy import stats

# Parameters
METHOD = {{method}}
ALPHA = {{alpha}}

TESTS = {
    "pearson": stats.pearsonr,
    "spearman": stats.spearmanr,
    "kendall": stats.kendalltau,
}


{{> csv_loader}}


{{> results_writer}}


def run_correlation(df):
    numeric = df.select_dtypes(include="number")
    test = TESTS.get(METHOD.lower(), stats.pearsonr)
    pairs = []
    columns = list(numeric.columns)
    for i, left in enumerate(columns):
        for right in columns[i + 1:]:
            coefficient, p_value = test(numeric[left], numeric[right])
            pairs.append({
                "left": left,
                "right": right,
                "coefficient": float(coefficient),
                "p_value": float(p_value),
                "significant": bool(p_value < ALPHA),
            })
    return {"method": METHOD, "pairs": pairs}


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv>")
    write_results(run_correlation(load_table(sys.argv[1])))
"#;

const R_CORRELATION: &str = r#"{{> header}}

# Parameters
method <- {{method}}
alpha <- {{alpha}}

{{> csv_loader}}

{{> results_writer}}

run_correlation <- function(df) {
  numeric <- df[vapply(df, is.numeric, logical(1))]
  columns <- names(numeric)
  pairs <- list()
  for (i in seq_along(columns)) {
    for (j in seq_along(columns)) {
      if (j <= i) next
      test <- cor.test(numeric[[i]], numeric[[j]], method = tolower(method))
      pairs[[length(pairs) + 1]] <- list(
        left = columns[i],
        right = columns[j],
        coefficient = unname(test$estimate),
        p_value = test$p.value,
        significant = test$p.value < alpha
      )
    }
  }
  list(method = method, pairs = pairs)
}

args <- commandArgs(trailingOnly = TRUE)
if (length(args) < 1) {
  stop("usage: Rscript script.R <data.csv>")
}
write_results(run_correlation(load_table(args[1])))
"#;

const PY_REGRESSION: &str = r#"{{> header}}

import json
import sys

import pandas as pd
import statsmodels.api as sm

# Parameters
TARGET_COLUMN = {{target_column}}
FEATURE_COLUMNS = {{feature_columns}}
ALPHA = {{alpha}}


{{> csv_loader}}


{{> results_writer}}


def run_regression(df):
    if TARGET_COLUMN is None:
        raise ValueError("TARGET_COLUMN is not set")
    features = FEATURE_COLUMNS or [c for c in df.columns if c != TARGET_COLUMN]
    X = sm.add_constant(df[features].select_dtypes(include="number"))
    model = sm.OLS(df[TARGET_COLUMN], X).fit()
    print(model.summary())
    return {
        "r_squared": float(model.rsquared),
        "coefficients": {k: float(v) for k, v in model.params.items()},
        "significant": [k for k, p in model.pvalues.items() if p < ALPHA],
    }


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv>")
    write_results(run_regression(load_table(sys.argv[1])))
"#;

const R_REGRESSION: &str = r#"{{> header}}

# Parameters
target_column <- {{target_column}}
feature_columns <- {{feature_columns}}
alpha <- {{alpha}}

{{> csv_loader}}

{{> results_writer}}

run_regression <- function(df) {
  if (is.null(target_column)) {
    stop("target_column is not set")
  }
  features <- feature_columns
  if (is.null(features)) {
    features <- setdiff(names(df), target_column)
  }
  model <- lm(reformulate(features, response = target_column), data = df)
  print(summary(model))
  coefs <- summary(model)$coefficients
  list(
    r_squared = summary(model)$r.squared,
    coefficients = as.list(coef(model)),
    significant = rownames(coefs)[coefs[, 4] < alpha]
  )
}

args <- commandArgs(trailingOnly = TRUE)
if (length(args) < 1) {
  stop("usage: Rscript script.R <data.csv>")
}
write_results(run_regression(load_table(args[1])))
"#;

const PY_RANDOM_FOREST: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from sklearn.ensemble import RandomForestClassifier
from sklearn.metrics import accuracy_score, classification_report
from sklearn.model_selection import cross_val_score, train_test_split

# Parameters
N_ESTIMATORS = {{n_estimators}}
MAX_DEPTH = {{max_depth}}
TEST_SIZE = {{test_size}}
CV_FOLDS = {{cv_folds}}
RANDOM_STATE = {{random_state}}


{{> csv_loader}}


{{> results_writer}}


def run_random_forest(df, target_column):
    X = pd.get_dummies(df.drop(columns=[target_column]))
    y = df[target_column]
    X_train, X_test, y_train, y_test = train_test_split(
        X, y, test_size=TEST_SIZE, random_state=RANDOM_STATE, stratify=y
    )
    model = RandomForestClassifier(
        n_estimators=N_ESTIMATORS, max_depth=MAX_DEPTH, random_state=RANDOM_STATE
    )
    model.fit(X_train, y_train)
    predictions = model.predict(X_test)
    print(classification_report(y_test, predictions))
    cv_scores = cross_val_score(model, X, y, cv=CV_FOLDS)
    importances = sorted(
        zip(X.columns, model.feature_importances_), key=lambda item: item[1], reverse=True
    )
    return {
        "accuracy": float(accuracy_score(y_test, predictions)),
        "cv_mean": float(cv_scores.mean()),
        "cv_std": float(cv_scores.std()),
        "top_features": [(name, float(score)) for name, score in importances[:10]],
    }


if __name__ == "__main__":
    if len(sys.argv) < 3:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv> <target column>")
    write_results(run_random_forest(load_table(sys.argv[1]), sys.argv[2]))
"#;

const PY_CLASSIFIER: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from sklearn.linear_model import LogisticRegression
from sklearn.metrics import accuracy_score, f1_score
from sklearn.model_selection import train_test_split
from sklearn.preprocessing import StandardScaler
from sklearn.svm import SVC

# Parameters
C = {{c}}
KERNEL = {{kernel}}
MAX_ITER = {{max_iter}}
TEST_SIZE = {{test_size}}
RANDOM_STATE = {{random_state}}


{{> csv_loader}}


{{> results_writer}}


def run_classifiers(df, target_column):
    X = pd.get_dummies(df.drop(columns=[target_column]))
    y = df[target_column]
    X_train, X_test, y_train, y_test = train_test_split(
        X, y, test_size=TEST_SIZE, random_state=RANDOM_STATE, stratify=y
    )
    scaler = StandardScaler()
    X_train = scaler.fit_transform(X_train)
    X_test = scaler.transform(X_test)
    models = {
        "logistic_regression": LogisticRegression(C=C, max_iter=MAX_ITER),
        "svm": SVC(C=C, kernel=KERNEL, random_state=RANDOM_STATE),
    }
    results = {}
    for name, model in models.items():
        model.fit(X_train, y_train)
        predictions = model.predict(X_test)
        results[name] = {
            "accuracy": float(accuracy_score(y_test, predictions)),
            "f1_weighted": float(f1_score(y_test, predictions, average="weighted")),
        }
    return results


if __name__ == "__main__":
    if len(sys.argv) < 3:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv> <target column>")
    write_results(run_classifiers(load_table(sys.argv[1]), sys.argv[2]))
"#;

const PY_KMEANS: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from sklearn.cluster import KMeans
from sklearn.metrics import silhouette_score
from sklearn.preprocessing import StandardScaler

# Parameters
N_CLUSTERS = {{n_clusters}}
N_INIT = {{n_init}}
RANDOM_STATE = {{random_state}}


{{> csv_loader}}


{{> results_writer}}


def run_kmeans(df):
    if N_CLUSTERS is None:
        raise ValueError("N_CLUSTERS is not set")
    X = StandardScaler().fit_transform(df.select_dtypes(include="number"))
    model = KMeans(n_clusters=N_CLUSTERS, n_init=N_INIT, random_state=RANDOM_STATE)
    labels = model.fit_predict(X)
    return {
        "inertia": float(model.inertia_),
        "silhouette": float(silhouette_score(X, labels)),
        "cluster_sizes": pd.Series(labels).value_counts().sort_index().tolist(),
    }


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv>")
    write_results(run_kmeans(load_table(sys.argv[1])))
"#;

const PY_ML_REGRESSION: &str = r#"{{> header}}

import json
import sys

import numpy as np
import pandas as pd
from sklearn.ensemble import GradientBoostingRegressor, RandomForestRegressor
from sklearn.linear_model import LinearRegression
from sklearn.metrics import mean_squared_error, r2_score
from sklearn.model_selection import cross_val_score, train_test_split

# Parameters
N_ESTIMATORS = {{n_estimators}}
LEARNING_RATE = {{learning_rate}}
TEST_SIZE = {{test_size}}
CV_FOLDS = {{cv_folds}}
RANDOM_STATE = {{random_state}}


{{> csv_loader}}


{{> results_writer}}


def run_regression(df, target_column):
    X = pd.get_dummies(df.drop(columns=[target_column]))
    y = df[target_column]
    X_train, X_test, y_train, y_test = train_test_split(
        X, y, test_size=TEST_SIZE, random_state=RANDOM_STATE
    )
    models = {
        "linear_regression": LinearRegression(),
        "random_forest": RandomForestRegressor(
            n_estimators=N_ESTIMATORS, random_state=RANDOM_STATE
        ),
        "gradient_boosting": GradientBoostingRegressor(
            n_estimators=N_ESTIMATORS, learning_rate=LEARNING_RATE, random_state=RANDOM_STATE
        ),
    }
    results = {}
    for name, model in models.items():
        model.fit(X_train, y_train)
        predictions = model.predict(X_test)
        cv_scores = cross_val_score(model, X, y, cv=CV_FOLDS, scoring="r2")
        results[name] = {
            "rmse": float(np.sqrt(mean_squared_error(y_test, predictions))),
            "r2": float(r2_score(y_test, predictions)),
            "cv_r2_mean": float(cv_scores.mean()),
        }
    return results


if __name__ == "__main__":
    if len(sys.argv) < 3:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv> <target column>")
    write_results(run_regression(load_table(sys.argv[1]), sys.argv[2]))
"#;

const PY_SEQUENCE_STATS: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from Bio import SeqIO

# Parameters
SEQUENCE_FORMAT = {{sequence_format}}
MIN_LENGTH = {{min_length}}


{{> fasta_loader}}


{{> results_writer}}


def gc_content(sequence):
    if not sequence:
        return 0.0
    upper = sequence.upper()
    return 100.0 * (upper.count("G") + upper.count("C")) / len(upper)


def run_sequence_stats(records):
    rows = [
        {"id": rec_id, "length": len(seq), "gc_content": gc_content(seq)}
        for rec_id, seq in records
        if len(seq) >= MIN_LENGTH
    ]
    table = pd.DataFrame(rows)
    print(table.describe())
    return {"sequences": len(rows), "summary": table.describe().to_dict()}


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <sequences file>")
    write_results(run_sequence_stats(load_sequences(sys.argv[1], SEQUENCE_FORMAT)))
"#;

const PY_PAIRWISE_ALIGNMENT: &str = r#"{{> header}}

import json
import sys

from Bio import Align, SeqIO

# Parameters
MODE = {{mode}}
MATCH_SCORE = {{match_score}}
MISMATCH_SCORE = {{mismatch_score}}
GAP_SCORE = {{gap_score}}


{{> fasta_loader}}


{{> results_writer}}


def run_alignment(records):
    if len(records) < 2:
        raise ValueError("need at least two sequences")
    aligner = Align.PairwiseAligner()
    aligner.mode = MODE
    aligner.match_score = MATCH_SCORE
    aligner.mismatch_score = MISMATCH_SCORE
    aligner.gap_score = GAP_SCORE
    query_id, query = records[0]
    hits = []
    for target_id, target in records[1:]:
        hits.append({"query": query_id, "target": target_id, "score": float(aligner.score(query, target))})
    return {"mode": MODE, "alignments": hits}


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <sequences.fasta>")
    write_results(run_alignment(load_sequences(sys.argv[1])))
"#;

const PY_DIFFERENTIAL_EXPRESSION: &str = r#"{{> header}}

import json
import sys

import pandas as pd
from pydeseq2.dds import DeseqDataSet
from pydeseq2.ds import DeseqStats

# Parameters
DESIGN_FACTOR = {{design_factor}}
ALPHA = {{alpha}}
LFC_THRESHOLD = {{lfc_threshold}}


{{> results_writer}}


def run_differential_expression(counts_path, metadata_path):
    if DESIGN_FACTOR is None:
        raise ValueError("DESIGN_FACTOR is not set")
    counts = pd.read_csv(counts_path, index_col=0).T
    metadata = pd.read_csv(metadata_path, index_col=0)
    dds = DeseqDataSet(counts=counts, metadata=metadata, design_factors=DESIGN_FACTOR)
    dds.deseq2()
    stats = DeseqStats(dds, alpha=ALPHA)
    stats.summary()
    table = stats.results_df
    hits = table[(table["padj"] < ALPHA) & (table["log2FoldChange"].abs() >= LFC_THRESHOLD)]
    return {"tested": int(len(table)), "significant": hits.index.tolist()}


if __name__ == "__main__":
    if len(sys.argv) < 3:
        sys.exit(f"usage: python {sys.argv[0]} <counts.csv> <metadata.csv>")
    write_results(run_differential_expression(sys.argv[1], sys.argv[2]))
"#;

const R_DIFFERENTIAL_EXPRESSION: &str = r#"{{> header}}

suppressPackageStartupMessages(library(DESeq2))

# Parameters
design_factor <- {{design_factor}}
alpha <- {{alpha}}
lfc_threshold <- {{lfc_threshold}}

{{> results_writer}}

run_differential_expression <- function(counts_path, metadata_path) {
  if (is.null(design_factor)) {
    stop("design_factor is not set")
  }
  counts <- as.matrix(read.csv(counts_path, row.names = 1))
  metadata <- read.csv(metadata_path, row.names = 1)
  dds <- DESeqDataSetFromMatrix(counts, metadata, design = reformulate(design_factor))
  dds <- DESeq(dds)
  res <- results(dds, alpha = alpha)
  hits <- subset(as.data.frame(res), padj < alpha & abs(log2FoldChange) >= lfc_threshold)
  list(tested = nrow(res), significant = rownames(hits))
}

args <- commandArgs(trailingOnly = TRUE)
if (length(args) < 2) {
  stop("usage: Rscript script.R <counts.csv> <metadata.csv>")
}
write_results(run_differential_expression(args[1], args[2]))
"#;

const PY_GENERIC: &str = r#"{{> header}}

import json
import sys

import pandas as pd

# Parameters reported for this method
PARAMETERS = {{parameters}}


{{> csv_loader}}


{{> results_writer}}


def run_analysis(df):
    # Replace this summary with the procedure the paper describes.
    summary = df.describe(include="all").to_dict()
    return {"parameters": PARAMETERS, "rows": int(len(df)), "summary": summary}


if __name__ == "__main__":
    if len(sys.argv) < 2:
        sys.exit(f"usage: python {sys.argv[0]} <data.csv>")
    write_results(run_analysis(load_table(sys.argv[1])))
"#;

const R_GENERIC: &str = r#"{{> header}}

# Parameters reported for this method
parameters <- {{parameters}}

{{> csv_loader}}

{{> results_writer}}

run_analysis <- function(df) {
  # Replace this summary with the procedure the paper describes.
  list(parameters = parameters, rows = nrow(df), summary = lapply(df, summary))
}

args <- commandArgs(trailingOnly = TRUE)
if (length(args) < 1) {
  stop("usage: Rscript script.R <data.csv>")
}
write_results(run_analysis(load_table(args[1])))
"#;
