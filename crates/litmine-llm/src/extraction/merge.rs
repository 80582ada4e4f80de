//! Cross-passage merging of method records.

use litmine_model::{dice_similarity, normalize_name, DatasetRecord, ExtractedMethod, Workflow};

/// Default similarity above which two same-category names are one method.
pub const DEFAULT_MERGE_SIMILARITY: f64 = 0.8;

/// Whether two records describe the same method.
pub fn same_method(a: &ExtractedMethod, b: &ExtractedMethod, threshold: f64) -> bool {
    if a.category != b.category {
        return false;
    }
    let (na, nb) = (normalize_name(&a.name), normalize_name(&b.name));
    na == nb || dice_similarity(&na, &nb) >= threshold
}

/// Merge records in order. The first record of each group fixes its position.
///
/// Within a group the variant with strictly higher confidence wins (ties keep
/// the earlier one); datasets, tools, languages, passages and flags are unioned.
pub fn merge_methods(records: Vec<ExtractedMethod>, threshold: f64) -> Vec<ExtractedMethod> {
    let mut merged: Vec<ExtractedMethod> = Vec::new();
    for record in records {
        match merged.iter_mut().find(|m| same_method(m, &record, threshold)) {
            Some(existing) => absorb(existing, record),
            None => merged.push(record),
        }
    }
    merged
}

fn absorb(existing: &mut ExtractedMethod, incoming: ExtractedMethod) {
    let blank = ExtractedMethod::new(existing.category, String::new());
    let current = std::mem::replace(existing, blank);
    let (mut winner, loser) = if incoming.confidence > current.confidence {
        (incoming, current)
    } else {
        (current, incoming)
    };

    union_text(&mut winner.datasets, loser.datasets);
    union_text(&mut winner.tools, loser.tools);
    union_text(&mut winner.languages, loser.languages);

    // Parameters the winner did not report are taken from the other variant.
    for (key, value) in loser.parameters {
        winner.parameters.entry(key).or_insert(value);
    }
    if winner.description.is_empty() {
        winner.description = loser.description;
    }
    winner.code_available |= loser.code_available;

    winner.source_passages.extend(loser.source_passages);
    winner.source_passages.sort_unstable();
    winner.source_passages.dedup();

    for flag in loser.flags {
        if !winner.flags.contains(&flag) {
            winner.flags.push(flag);
        }
    }

    *existing = winner;
}

/// Append entries not already present (case-insensitive), keeping first spellings.
pub(crate) fn union_text(into: &mut Vec<String>, from: Vec<String>) {
    for item in from {
        if !into.iter().any(|x| x.eq_ignore_ascii_case(&item)) {
            into.push(item);
        }
    }
}

pub(crate) fn merge_datasets(into: &mut Vec<DatasetRecord>, from: Vec<DatasetRecord>) {
    for record in from {
        let key = normalize_name(&record.name);
        match into.iter_mut().find(|d| normalize_name(&d.name) == key) {
            Some(existing) => {
                for (mine, theirs) in [
                    (&mut existing.description, record.description),
                    (&mut existing.source, record.source),
                    (&mut existing.format, record.format),
                ] {
                    if mine.is_empty() {
                        *mine = theirs;
                    }
                }
                if existing.size.is_none() {
                    existing.size = record.size;
                }
            }
            None => into.push(record),
        }
    }
}

pub(crate) fn merge_workflows(into: &mut Vec<Workflow>, from: Vec<Workflow>) {
    for workflow in from {
        let key = normalize_name(&workflow.name);
        if !into.iter().any(|w| normalize_name(&w.name) == key) {
            into.push(workflow);
        }
    }
}
