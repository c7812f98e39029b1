use crate::types::VerbId;

/// A verb definition. The action matrix is the set of verb ids each entity
/// accepts; aliases only affect parsing.
#[derive(Debug, Clone)]
pub struct Verb {
    pub id: VerbId,
    pub name: String,
    pub aliases: Vec<String>,
    pub requires_target: bool,
    pub description: String,
}

impl Verb {
    pub fn new(id: impl Into<String>, requires_target: bool) -> Self {
        let id = VerbId::new(id);
        Self {
            name: id.as_str().to_string(),
            id,
            aliases: Vec::new(),
            requires_target,
            description: String::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn matches(&self, token: &str) -> bool {
        self.id.as_str() == token || self.aliases.iter().any(|a| a == token)
    }
}
