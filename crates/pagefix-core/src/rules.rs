use std::borrow::Cow;

use regex::{NoExpand, Regex};
use tracing::debug;

use crate::RewriteError;

/// Import paths moved under `@/components/marketing`.
///
/// A rename marked `prefix` matches any import below that directory, so its
/// pattern stops before the closing quote.
struct ImportRename {
    from: &'static str,
    to: &'static str,
    prefix: bool,
}

const MARKETING_RENAMES: [ImportRename; 3] = [
    ImportRename {
        from: "@/components/site-header",
        to: "@/components/marketing/site-header",
        prefix: false,
    },
    ImportRename {
        from: "@/components/site-footer",
        to: "@/components/marketing/site-footer",
        prefix: false,
    },
    ImportRename {
        from: "@/components/features/",
        to: "@/components/marketing/features/",
        prefix: true,
    },
];

const QUOTES: [char; 2] = ['"', '\''];

/// A literal find-and-replace applied to a whole buffer.
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pattern: String,
    replacement: String,
    matcher: Regex,
}

/// Result of applying a [`RuleSet`] to content that contained at least one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub replacements: usize,
}

/// Ordered list of substitution rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<SubstitutionRule>,
}

impl SubstitutionRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, RewriteError> {
        let matcher = Regex::new(&regex::escape(pattern)).map_err(|source| RewriteError::Rule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every occurrence. Returns the input borrowed when nothing matched.
    pub fn apply<'a>(&self, content: &'a str) -> Cow<'a, str> {
        self.matcher
            .replace_all(content, NoExpand(&self.replacement))
    }

    pub fn count(&self, content: &str) -> usize {
        self.matcher.find_iter(content).count()
    }
}

impl RuleSet {
    pub fn new(rules: Vec<SubstitutionRule>) -> Self {
        Self { rules }
    }

    /// The six rules moving shared components into the marketing directory:
    /// every rename for double-quoted imports, then the same for single quotes.
    pub fn marketing() -> Result<Self, RewriteError> {
        let mut rules = Vec::with_capacity(QUOTES.len() * MARKETING_RENAMES.len());
        for quote in QUOTES {
            for rename in &MARKETING_RENAMES {
                let close = if rename.prefix { String::new() } else { quote.to_string() };
                rules.push(SubstitutionRule::new(
                    &format!("from {quote}{}{close}", rename.from),
                    &format!("from {quote}{}{close}", rename.to),
                )?);
            }
        }
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule in order. `None` means no rule matched and the
    /// content should be left exactly as it is.
    pub fn rewrite(&self, content: &str) -> Option<Rewrite> {
        let mut current = Cow::Borrowed(content);
        let mut replacements = 0;

        for rule in &self.rules {
            let found = rule.count(&current);
            if found == 0 {
                continue;
            }
            debug!("Rule '{}' matched {} time(s)", rule.pattern(), found);
            replacements += found;
            current = Cow::Owned(rule.apply(&current).into_owned());
        }

        match current {
            Cow::Borrowed(_) => None,
            Cow::Owned(content) => Some(Rewrite {
                content,
                replacements,
            }),
        }
    }
}
