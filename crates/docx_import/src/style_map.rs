//! Style map resolver
//!
//! An ordered table of rules from Word style names to semantic targets.
//! The first matching rule wins; anything unmatched falls back to a plain
//! paragraph or to no mark. The table is read-only for the duration of a
//! conversion and shared behind an `Arc`.

use doc_model::{Mark, NodeKind};
use serde::{Deserialize, Serialize};

/// Whether a rule applies to paragraph or run (character) styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    Paragraph,
    Run,
}

/// Block a paragraph style can become
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "block", content = "level", rename_all = "camelCase")]
pub enum BlockTarget {
    Paragraph,
    Heading(u8),
    Blockquote,
    CodeBlock,
}

impl BlockTarget {
    /// Node kind for the textblock this target produces. Blockquotes wrap
    /// a paragraph.
    pub fn textblock_kind(&self) -> NodeKind {
        match self {
            BlockTarget::Heading(level) => NodeKind::Heading((*level).clamp(1, 6)),
            BlockTarget::CodeBlock => NodeKind::CodeBlock,
            BlockTarget::Paragraph | BlockTarget::Blockquote => NodeKind::Paragraph,
        }
    }
}

/// One mapping rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "camelCase")]
pub enum StyleRule {
    Paragraph {
        #[serde(rename = "styleName")]
        style_name: String,
        target: BlockTarget,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<String>,
    },
    Run {
        #[serde(rename = "styleName")]
        style_name: String,
        target: Mark,
    },
}

impl StyleRule {
    pub fn paragraph(style_name: impl Into<String>, target: BlockTarget) -> Self {
        StyleRule::Paragraph {
            style_name: style_name.into(),
            target,
            class: None,
        }
    }

    pub fn paragraph_with_class(
        style_name: impl Into<String>,
        target: BlockTarget,
        class: impl Into<String>,
    ) -> Self {
        StyleRule::Paragraph {
            style_name: style_name.into(),
            target,
            class: Some(class.into()),
        }
    }

    pub fn run(style_name: impl Into<String>, target: Mark) -> Self {
        StyleRule::Run {
            style_name: style_name.into(),
            target,
        }
    }

    pub fn match_kind(&self) -> MatchKind {
        match self {
            StyleRule::Paragraph { .. } => MatchKind::Paragraph,
            StyleRule::Run { .. } => MatchKind::Run,
        }
    }

    pub fn style_name(&self) -> &str {
        match self {
            StyleRule::Paragraph { style_name, .. } | StyleRule::Run { style_name, .. } => {
                style_name
            }
        }
    }

    fn matches(&self, context: &StyleContext<'_>) -> bool {
        self.match_kind() == context.match_kind
            && self.style_name().eq_ignore_ascii_case(context.style_name)
    }

    fn target(&self) -> SemanticTarget {
        match self {
            StyleRule::Paragraph { target, class, .. } => SemanticTarget::Block {
                target: *target,
                class: class.clone(),
            },
            StyleRule::Run { target, .. } => SemanticTarget::Mark(target.clone()),
        }
    }
}

/// What is being styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleContext<'a> {
    pub match_kind: MatchKind,
    pub style_name: &'a str,
}

impl<'a> StyleContext<'a> {
    pub fn paragraph(style_name: &'a str) -> Self {
        Self {
            match_kind: MatchKind::Paragraph,
            style_name,
        }
    }

    pub fn run(style_name: &'a str) -> Self {
        Self {
            match_kind: MatchKind::Run,
            style_name,
        }
    }
}

/// Result of resolving a style
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticTarget {
    Block {
        target: BlockTarget,
        class: Option<String>,
    },
    Mark(Mark),
    /// Run style with no rule: the run keeps only its direct formatting
    Unmarked,
}

impl SemanticTarget {
    /// Fallback for a context no rule matched
    pub fn default_for(match_kind: MatchKind) -> Self {
        match match_kind {
            MatchKind::Paragraph => SemanticTarget::Block {
                target: BlockTarget::Paragraph,
                class: None,
            },
            MatchKind::Run => SemanticTarget::Unmarked,
        }
    }
}

/// Class hints written onto imported tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableClasses {
    pub table: Option<String>,
    pub row: Option<String>,
    pub cell: Option<String>,
}

impl Default for TableClasses {
    fn default() -> Self {
        Self {
            table: Some("docx-table".to_string()),
            row: Some("docx-tr".to_string()),
            cell: Some("docx-td".to_string()),
        }
    }
}

/// Ordered rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMap {
    rules: Vec<StyleRule>,
    #[serde(default)]
    pub table_classes: TableClasses,
}

impl Default for StyleMap {
    /// The product's rule table
    fn default() -> Self {
        use BlockTarget::*;
        let mut rules = vec![
            StyleRule::paragraph_with_class("Heading 1", Heading(1), "heading-1"),
            StyleRule::paragraph_with_class("Heading 2", Heading(2), "heading-2"),
            StyleRule::paragraph_with_class("Heading 3", Heading(3), "heading-3"),
        ];
        rules.extend((4..=6).map(|level| StyleRule::paragraph(format!("Heading {level}"), Heading(level))));
        rules.extend([
            StyleRule::paragraph_with_class("Title", Heading(1), "title"),
            StyleRule::paragraph_with_class("Subtitle", Heading(2), "subtitle"),
            StyleRule::paragraph("Quote", Blockquote),
            StyleRule::paragraph_with_class("List Paragraph", Paragraph, "list-para"),
            StyleRule::run("Strong", Mark::Bold),
            StyleRule::run("Emphasis", Mark::Italic),
        ]);
        Self {
            rules,
            table_classes: TableClasses::default(),
        }
    }
}

impl StyleMap {
    /// A map with no rules and no table classes
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            table_classes: TableClasses {
                table: None,
                row: None,
                cell: None,
            },
        }
    }

    /// Append a rule; it loses to every rule already present
    pub fn with_rule(mut self, rule: StyleRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Insert a rule ahead of all others
    pub fn prepend_rule(mut self, rule: StyleRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn with_table_classes(mut self, classes: TableClasses) -> Self {
        self.table_classes = classes;
        self
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Resolve a style by ordered scan
    pub fn resolve(&self, context: &StyleContext<'_>) -> SemanticTarget {
        self.rules
            .iter()
            .find(|rule| rule.matches(context))
            .map(StyleRule::target)
            .unwrap_or_else(|| SemanticTarget::default_for(context.match_kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_rules() {
        let map = StyleMap::default();
        assert_eq!(
            map.resolve(&StyleContext::paragraph("heading 1")),
            SemanticTarget::Block {
                target: BlockTarget::Heading(1),
                class: Some("heading-1".into())
            }
        );
        assert_eq!(
            map.resolve(&StyleContext::paragraph("Heading 5")),
            SemanticTarget::Block {
                target: BlockTarget::Heading(5),
                class: None
            }
        );
        assert_eq!(
            map.resolve(&StyleContext::run("Strong")),
            SemanticTarget::Mark(Mark::Bold)
        );
    }

    #[test]
    fn test_match_kind_is_respected() {
        let map = StyleMap::default();
        // "Strong" is only a run rule
        assert_eq!(
            map.resolve(&StyleContext::paragraph("Strong")),
            SemanticTarget::default_for(MatchKind::Paragraph)
        );
        assert_eq!(
            map.resolve(&StyleContext::run("Heading 1")),
            SemanticTarget::Unmarked
        );
    }

    #[test]
    fn test_prepended_rule_wins() {
        let map = StyleMap::default().prepend_rule(StyleRule::paragraph("Heading 1", BlockTarget::Heading(2)));
        assert_eq!(
            map.resolve(&StyleContext::paragraph("Heading 1")),
            SemanticTarget::Block {
                target: BlockTarget::Heading(2),
                class: None
            }
        );

        let map = StyleMap::default().with_rule(StyleRule::paragraph("Heading 1", BlockTarget::Heading(2)));
        assert!(matches!(
            map.resolve(&StyleContext::paragraph("Heading 1")),
            SemanticTarget::Block {
                target: BlockTarget::Heading(1),
                ..
            }
        ));
    }

    #[test]
    fn test_rule_json_shape() {
        let rule: StyleRule = serde_json::from_str(
            r#"{"match":"paragraph","styleName":"Clause","target":{"block":"heading","level":3},"class":"clause"}"#,
        )
        .unwrap();
        assert_eq!(
            rule,
            StyleRule::paragraph_with_class("Clause", BlockTarget::Heading(3), "clause")
        );

        let rule: StyleRule = serde_json::from_str(
            r#"{"match":"run","styleName":"Defined Term","target":{"type":"underline"}}"#,
        )
        .unwrap();
        assert_eq!(rule, StyleRule::run("Defined Term", Mark::Underline));
    }

    fn arb_rule() -> impl Strategy<Value = StyleRule> {
        let names = prop::sample::select(vec!["Heading 1", "Quote", "Strong", "Body", "Note"]);
        prop_oneof![
            (names.clone(), 1u8..=6).prop_map(|(name, level)| StyleRule::paragraph(name, BlockTarget::Heading(level))),
            names.prop_map(|name| StyleRule::run(name, Mark::Italic)),
        ]
    }

    proptest! {
        #[test]
        fn prop_resolution_is_deterministic(
            rules in prop::collection::vec(arb_rule(), 0..8),
            name in prop::sample::select(vec!["Heading 1", "heading 1", "QUOTE", "Strong", "Other"]),
            run in any::<bool>(),
        ) {
            let map = rules.iter().cloned().fold(StyleMap::empty(), StyleMap::with_rule);
            let context = if run { StyleContext::run(name) } else { StyleContext::paragraph(name) };

            let first = map.resolve(&context);
            prop_assert_eq!(&first, &map.clone().resolve(&context));

            // Same answer as the first matching rule, in order
            let expected = rules
                .iter()
                .find(|rule| rule.match_kind() == context.match_kind
                    && rule.style_name().eq_ignore_ascii_case(name))
                .map(StyleRule::target)
                .unwrap_or_else(|| SemanticTarget::default_for(context.match_kind));
            prop_assert_eq!(first, expected);
        }
    }
}
