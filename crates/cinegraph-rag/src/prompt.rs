//! Prompt policy and composition.
//!
//! A [`PromptPolicy`] holds everything that varies between assistant
//! personas: the system instruction, the behavioural rules, how many names
//! each list contributes, and the fixed messages used when the pipeline
//! answers without the LLM.

use cinegraph_core::{ContextBundle, MovieRecord};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

/// Message returned when the language model cannot be reached.
pub const FAILURE_MESSAGE: &str = "Failed to reach the assistant. Please try again later.";

/// Named policy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    MovieAssistant,
    CustomerSupport,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::MovieAssistant => "movie_assistant",
            Persona::CustomerSupport => "customer_support",
        }
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie_assistant" => Ok(Persona::MovieAssistant),
            "customer_support" => Ok(Persona::CustomerSupport),
            other => Err(format!("unknown persona: {other}")),
        }
    }
}

/// Maximum names rendered per relationship list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListLimits {
    pub actors: usize,
    pub directors: usize,
    pub genres: usize,
    pub paths: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            actors: 3,
            directors: 2,
            genres: 2,
            paths: 6,
        }
    }
}

/// Persona-specific wording and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPolicy {
    pub persona: Persona,
    pub system: String,
    pub instruction: String,
    pub rules: Vec<String>,
    pub limits: ListLimits,
    /// Answer used when retrieval finds nothing. The LLM is not called.
    pub no_data_message: String,
    /// Answer used when a collaborator fails.
    pub failure_message: String,
    pub empty_query_message: String,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self::movie_assistant()
    }
}

impl PromptPolicy {
    pub fn movie_assistant() -> Self {
        Self {
            persona: Persona::MovieAssistant,
            system: "You are an expert assistant using GraphRAG for knowledge retrieval."
                .to_string(),
            instruction:
                "You are a helpful AI assistant. Based on the following knowledge, answer the user's question:"
                    .to_string(),
            rules: vec![
                "Keep the answer concise and direct.".to_string(),
                "Use only the knowledge below. If it does not contain the answer, say that the information is not available instead of guessing.".to_string(),
            ],
            limits: ListLimits::default(),
            no_data_message:
                "I couldn't find any information about that in the movie database.".to_string(),
            failure_message: FAILURE_MESSAGE.to_string(),
            empty_query_message: "Please ask a question about movies.".to_string(),
        }
    }

    pub fn customer_support() -> Self {
        Self {
            persona: Persona::CustomerSupport,
            system: "You are a friendly customer support assistant for a movie service."
                .to_string(),
            instruction: "Answer the customer's question using only the context below.".to_string(),
            rules: vec![
                "Answer in two or three sentences.".to_string(),
                "If you don't know the answer, say \"I don't have that information.\"".to_string(),
                "If the question is not related to the context, say \"I can't help you with that.\"".to_string(),
                "If the question is too vague, ask for clarification.".to_string(),
            ],
            limits: ListLimits::default(),
            no_data_message: "I don't have that information.".to_string(),
            failure_message: FAILURE_MESSAGE.to_string(),
            empty_query_message: "Could you tell me what you need help with?".to_string(),
        }
    }

    pub fn for_persona(persona: Persona) -> Self {
        match persona {
            Persona::MovieAssistant => Self::movie_assistant(),
            Persona::CustomerSupport => Self::customer_support(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn with_limits(mut self, limits: ListLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_no_data_message(mut self, message: impl Into<String>) -> Self {
        self.no_data_message = message.into();
        self
    }

    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }
}

/// A rendered system instruction and user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

/// Renders a context bundle and question under a policy.
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    policy: PromptPolicy,
}

impl PromptComposer {
    pub fn new(policy: PromptPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PromptPolicy {
        &self.policy
    }

    pub fn compose(&self, bundle: &ContextBundle) -> ComposedPrompt {
        let mut user = String::new();
        user.push_str(&self.policy.instruction);
        user.push_str("\n\n");

        if !self.policy.rules.is_empty() {
            user.push_str("Rules:\n");
            for rule in &self.policy.rules {
                let _ = writeln!(user, "- {rule}");
            }
            user.push('\n');
        }

        user.push_str("Knowledge:\n");
        user.push_str(&self.render_context(bundle));
        let _ = write!(user, "\nQuestion: {}\nAnswer:", bundle.query);

        ComposedPrompt {
            system: self.policy.system.clone(),
            user,
        }
    }

    /// Render every movie in the bundle as a block of labelled lines.
    pub fn render_context(&self, bundle: &ContextBundle) -> String {
        let mut out = String::new();
        for movie in &bundle.movies {
            self.render_movie(&mut out, movie);
            out.push('\n');
        }
        out
    }

    fn render_movie(&self, out: &mut String, movie: &MovieRecord) {
        let limits = &self.policy.limits;

        let _ = writeln!(out, "Movie: {} ({})", movie.title, movie.year);
        let _ = writeln!(out, "Plot: {}", movie.plot);
        push_list(out, "Directors", &movie.directors, limits.directors);
        push_list(out, "Actors", &movie.actors, limits.actors);
        push_list(out, "Genres", &movie.genres, limits.genres);
        push_list(out, "Languages", &movie.languages, usize::MAX);
        push_list(out, "Countries", &movie.countries, usize::MAX);
        let _ = writeln!(
            out,
            "Average rating: {:.2} ({} ratings)",
            movie.ratings.average, movie.ratings.count
        );

        if !movie.paths.is_empty() && limits.paths > 0 {
            out.push_str("Relationships:\n");
            for path in movie.paths.iter().take(limits.paths) {
                let _ = writeln!(out, "- {path}");
            }
        }
    }
}

fn push_list(out: &mut String, label: &str, names: &[String], limit: usize) {
    if names.is_empty() {
        return;
    }
    let shown: Vec<&str> = names.iter().take(limit).map(String::as_str).collect();
    let _ = writeln!(out, "{label}: {}", shown.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinegraph_core::RatingStats;

    fn bundle() -> ContextBundle {
        let mut heat = MovieRecord::new("1")
            .with_title("Heat")
            .with_year(1995)
            .with_directors(vec!["Michael Mann".into()])
            .with_actors(vec![
                "Al Pacino".into(),
                "Robert De Niro".into(),
                "Val Kilmer".into(),
                "Jon Voight".into(),
            ])
            .with_genres(vec!["Crime".into(), "Drama".into(), "Thriller".into()])
            .with_ratings(RatingStats::from_scores(&[4.0, 5.0]));
        heat.paths = heat.derive_paths();
        ContextBundle::new("Who starred in Heat?", vec![heat])
    }

    #[test]
    fn test_list_limits_applied() {
        let text = PromptComposer::default().render_context(&bundle());
        assert!(text.contains("Actors: Al Pacino, Robert De Niro, Val Kilmer\n"));
        assert!(!text.contains("Jon Voight"));
        assert!(text.contains("Genres: Crime, Drama\n"));
        assert!(text.contains("Average rating: 4.50 (2 ratings)"));
    }

    #[test]
    fn test_relationship_paths_rendered() {
        let text = PromptComposer::default().render_context(&bundle());
        assert!(text.contains("- Michael Mann —[DIRECTED]→ Heat"));
    }

    #[test]
    fn test_compose_layout() {
        let prompt = PromptComposer::default().compose(&bundle());
        assert!(prompt.system.contains("GraphRAG"));
        assert!(prompt.user.starts_with("You are a helpful AI assistant."));
        assert!(prompt.user.contains("Knowledge:\nMovie: Heat (1995)"));
        assert!(prompt.user.ends_with("Question: Who starred in Heat?\nAnswer:"));
    }

    #[test]
    fn test_customer_support_rules() {
        let composer = PromptComposer::new(PromptPolicy::customer_support());
        let prompt = composer.compose(&bundle());
        assert!(prompt.user.contains("say \"I don't have that information.\""));
        assert_eq!(composer.policy().no_data_message, "I don't have that information.");
    }

    #[test]
    fn test_persona_parsing() {
        assert_eq!("customer_support".parse::<Persona>(), Ok(Persona::CustomerSupport));
        assert!("pirate".parse::<Persona>().is_err());
        assert_eq!(
            PromptPolicy::for_persona(Persona::MovieAssistant).persona.as_str(),
            "movie_assistant"
        );
    }
}
