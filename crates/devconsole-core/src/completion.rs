//! Prefix completion over command names.
//!
//! The completer keeps its own copy of the name set; whoever mutates the
//! registry must push the new names with [`Completer::update_names`].

/// Result of a Tab-style completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Nothing matches.
    None,
    /// Exactly one name matches; the input can be replaced with it.
    Unique(String),
    /// Several names match; the host should list them.
    Ambiguous(Vec<String>),
}

/// Case-insensitive prefix matcher.
#[derive(Debug, Clone, Default)]
pub struct Completer {
    names: Vec<String>,
}

impl Completer {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut completer = Self::default();
        completer.update_names(names);
        completer
    }

    /// Replace the known names wholesale.
    pub fn update_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        tracing::debug!(count = self.names.len(), "Auto-complete command list updated");
    }

    /// Names starting with `partial`, ignoring case, in name-set order.
    pub fn suggest(&self, partial: &str) -> Vec<String> {
        if partial.trim().is_empty() {
            return Vec::new();
        }
        let needle = partial.to_lowercase();
        self.names
            .iter()
            .filter(|name| name.to_lowercase().starts_with(&needle))
            .cloned()
            .collect()
    }

    /// Classify the suggestions for `partial`.
    pub fn complete(&self, partial: &str) -> Completion {
        let mut matches = self.suggest(partial);
        match matches.len() {
            0 => Completion::None,
            1 => Completion::Unique(matches.remove(0)),
            _ => Completion::Ambiguous(matches),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_prefix_matches() {
        let completer = Completer::new(["help", "hello", "exit"]);
        let mut found = completer.suggest("he");
        found.sort();
        assert_eq!(found, vec!["hello".to_string(), "help".to_string()]);
    }

    #[test]
    fn test_suggest_is_case_insensitive() {
        let completer = Completer::new(["help", "Spawn_Crate"]);
        assert_eq!(completer.suggest("HE"), vec!["help".to_string()]);
        assert_eq!(completer.suggest("spawn"), vec!["Spawn_Crate".to_string()]);
    }

    #[test]
    fn test_suggest_blank_is_empty() {
        let completer = Completer::new(["help"]);
        assert!(completer.suggest("").is_empty());
        assert!(completer.suggest("   ").is_empty());
    }

    #[test]
    fn test_suggest_does_not_trim_partial() {
        let completer = Completer::new(["help"]);
        assert!(completer.suggest("he ").is_empty());
    }

    #[test]
    fn test_update_replaces_names() {
        let mut completer = Completer::new(["help"]);
        completer.update_names(vec!["exit".to_string()]);
        assert!(completer.suggest("he").is_empty());
        assert_eq!(completer.suggest("e"), vec!["exit".to_string()]);
    }

    #[test]
    fn test_complete_classification() {
        let completer = Completer::new(["help", "hello", "exit"]);
        assert_eq!(completer.complete("ex"), Completion::Unique("exit".to_string()));
        assert_eq!(completer.complete("zz"), Completion::None);
        assert!(matches!(
            completer.complete("hel"),
            Completion::Ambiguous(names) if names.len() == 2
        ));
    }
}
