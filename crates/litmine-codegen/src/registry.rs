//! Read-only category → template lookup.
//!
//! A registry is validated once when it is built and offers no mutation
//! afterwards. Lookup never fails: exact category, then the related category,
//! then the generic fallback.

use crate::builtin;
use crate::fragments::FragmentLibrary;
use crate::template::{is_identifier, segments, CodeTemplate, Language, Segment, CONTEXT_PLACEHOLDERS};
use litmine_model::MethodCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate template id: {0}")]
    DuplicateTemplate(String),
    #[error("template {template}: unclosed token at byte {offset}")]
    UnclosedToken { template: String, offset: usize },
    #[error("template {template}: invalid token name {name:?}")]
    InvalidToken { template: String, name: String },
    #[error("template {template}: placeholder {name} is used but not declared")]
    UndeclaredPlaceholder { template: String, name: String },
    #[error("template {template}: placeholder {name} is declared twice")]
    DuplicatePlaceholder { template: String, name: String },
    #[error("template {template}: fragment {fragment} not found for {language}")]
    UnknownFragment {
        template: String,
        fragment: String,
        language: Language,
    },
    #[error("fragment {fragment}: {reason}")]
    InvalidFragment { fragment: String, reason: String },
    #[error("no fallback template")]
    MissingFallback,
    #[error("more than one fallback template for {0}")]
    DuplicateFallback(Language),
}

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Related(MethodCategory),
    Fallback,
}

#[derive(Debug, Clone)]
pub struct TemplateSelection<'a> {
    /// Candidates in declaration order; never empty.
    pub templates: Vec<&'a CodeTemplate>,
    pub match_kind: MatchKind,
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<CodeTemplate>,
    fragments: FragmentLibrary,
}

impl TemplateRegistry {
    /// The shipped template and fragment set.
    pub fn builtin() -> Self {
        Self {
            templates: builtin::templates(),
            fragments: FragmentLibrary::builtin(),
        }
    }

    /// Build a registry from caller-supplied definitions.
    pub fn from_templates(
        templates: Vec<CodeTemplate>,
        fragments: FragmentLibrary,
    ) -> Result<Self, RegistryError> {
        validate(&templates, &fragments)?;
        tracing::debug!(
            templates = templates.len(),
            fragments = fragments.len(),
            "template registry built"
        );
        Ok(Self {
            templates,
            fragments,
        })
    }

    pub fn templates(&self) -> &[CodeTemplate] {
        &self.templates
    }

    pub fn fragments(&self) -> &FragmentLibrary {
        &self.fragments
    }

    pub fn get(&self, id: &str) -> Option<&CodeTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Candidate templates for `category`.
    ///
    /// With a language preference, candidates in that language are returned
    /// when the stage has any; otherwise the stage's templates in all
    /// languages are.
    pub fn lookup(&self, category: MethodCategory, language: Option<Language>) -> TemplateSelection<'_> {
        if let Some(templates) = self.stage(language, |t| !t.fallback && t.category == category) {
            return TemplateSelection {
                templates,
                match_kind: MatchKind::Exact,
            };
        }
        if let Some(related) = category.related() {
            if let Some(templates) = self.stage(language, |t| !t.fallback && t.category == related) {
                return TemplateSelection {
                    templates,
                    match_kind: MatchKind::Related(related),
                };
            }
        }
        TemplateSelection {
            templates: self
                .stage(language, |t| t.fallback)
                .unwrap_or_default(),
            match_kind: MatchKind::Fallback,
        }
    }

    fn stage<F>(&self, language: Option<Language>, include: F) -> Option<Vec<&CodeTemplate>>
    where
        F: Fn(&CodeTemplate) -> bool,
    {
        let all: Vec<&CodeTemplate> = self.templates.iter().filter(|t| include(*t)).collect();
        if all.is_empty() {
            return None;
        }
        if let Some(lang) = language {
            let preferred: Vec<&CodeTemplate> =
                all.iter().copied().filter(|t| t.language == lang).collect();
            if !preferred.is_empty() {
                return Some(preferred);
            }
        }
        Some(all)
    }
}

/// Check a template set: ids unique, every token well formed and declared,
/// every fragment present, one fallback per language and at least one overall.
pub fn validate(templates: &[CodeTemplate], fragments: &FragmentLibrary) -> Result<(), RegistryError> {
    for fragment in fragments.iter() {
        let segs = segments(&fragment.body).map_err(|offset| RegistryError::InvalidFragment {
            fragment: fragment.name.clone(),
            reason: format!("unclosed token at byte {offset}"),
        })?;
        for seg in segs {
            match seg {
                Segment::Fragment(name) => {
                    return Err(RegistryError::InvalidFragment {
                        fragment: fragment.name.clone(),
                        reason: format!("references fragment {name}"),
                    })
                }
                Segment::Placeholder(name) if !CONTEXT_PLACEHOLDERS.contains(&name) => {
                    return Err(RegistryError::InvalidFragment {
                        fragment: fragment.name.clone(),
                        reason: format!("uses non-context placeholder {name}"),
                    })
                }
                _ => {}
            }
        }
    }

    let mut ids = BTreeSet::new();
    let mut fallbacks = BTreeSet::new();

    for template in templates {
        if !ids.insert(template.id.as_str()) {
            return Err(RegistryError::DuplicateTemplate(template.id.clone()));
        }
        if template.fallback && !fallbacks.insert(template.language) {
            return Err(RegistryError::DuplicateFallback(template.language));
        }

        let mut declared = BTreeSet::new();
        for placeholder in &template.placeholders {
            if !is_identifier(&placeholder.name) || CONTEXT_PLACEHOLDERS.contains(&placeholder.name.as_str()) {
                return Err(RegistryError::InvalidToken {
                    template: template.id.clone(),
                    name: placeholder.name.clone(),
                });
            }
            if !declared.insert(placeholder.name.as_str()) {
                return Err(RegistryError::DuplicatePlaceholder {
                    template: template.id.clone(),
                    name: placeholder.name.clone(),
                });
            }
        }

        let segs = segments(&template.body).map_err(|offset| RegistryError::UnclosedToken {
            template: template.id.clone(),
            offset,
        })?;
        for seg in segs {
            match seg {
                Segment::Text(_) => {}
                Segment::Fragment(name) => {
                    if !is_identifier(name) {
                        return Err(RegistryError::InvalidToken {
                            template: template.id.clone(),
                            name: name.to_string(),
                        });
                    }
                    if fragments.get(name, template.language).is_none() {
                        return Err(RegistryError::UnknownFragment {
                            template: template.id.clone(),
                            fragment: name.to_string(),
                            language: template.language,
                        });
                    }
                }
                Segment::Placeholder(name) => {
                    if !is_identifier(name) {
                        return Err(RegistryError::InvalidToken {
                            template: template.id.clone(),
                            name: name.to_string(),
                        });
                    }
                    if !declared.contains(name) && !CONTEXT_PLACEHOLDERS.contains(&name) {
                        return Err(RegistryError::UndeclaredPlaceholder {
                            template: template.id.clone(),
                            name: name.to_string(),
                        });
                    }
                }
            }
        }
    }

    if fallbacks.is_empty() {
        return Err(RegistryError::MissingFallback);
    }
    Ok(())
}
