//! Turns repository-relative paths into short, human-readable labels.

use serde::Deserialize;

/// A directory-prefix rule: paths starting with `prefix` get `label` prepended.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassifierRule {
    pub prefix: String,
    pub label: String,
}

impl ClassifierRule {
    pub fn new(prefix: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            label: label.into(),
        }
    }
}

/// The built-in rule table, checked top to bottom.
pub fn default_rules() -> Vec<ClassifierRule> {
    vec![
        ClassifierRule::new("assets/scripts", "script: "),
        ClassifierRule::new("assets/images", "image: "),
        ClassifierRule::new("assets/styles", "styles: "),
        ClassifierRule::new("assets/templates", "html: "),
    ]
}

/// Ordered prefix rules plus the filename shortening policy.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassifierRule>,
    strip_extension: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules(), true)
    }
}

impl Classifier {
    pub fn new(rules: Vec<ClassifierRule>, strip_extension: bool) -> Self {
        Self {
            rules,
            strip_extension,
        }
    }

    /// Label a path: the first rule whose prefix matches the full path
    /// contributes its label, followed by the shortened filename.
    pub fn classify(&self, path: &str) -> String {
        let name = self.short_name(path);
        match self.rules.iter().find(|r| path.starts_with(&r.prefix)) {
            Some(rule) => format!("{}{}", rule.label, name),
            None => name,
        }
    }

    /// Final path segment, with the last dot-segment removed and remaining
    /// dots turned into spaces when extension stripping is enabled.
    ///
    /// Names without a dot, and dotfiles like `.gitignore`, are returned as-is
    /// rather than shortened to an empty label; dropping the last dot-segment
    /// of `.gitignore` would leave nothing.
    pub fn short_name(&self, path: &str) -> String {
        let file = path.rsplit('/').next().unwrap_or(path);

        if !self.strip_extension {
            return file.to_string();
        }

        match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.split('.').collect::<Vec<_>>().join(" "),
            _ => file.to_string(),
        }
    }
}
