use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use super::output::{AgentOutput, Answer, Recommendation};
use super::RetailAgent;

pub const GREETING_WORDS: [&str; 3] = ["hi", "hello", "hey"];

pub const GREETING_ANSWER: &str = "Hi 👋 I’m your Retail AI Assistant.\n\n\
Try asking:\n\
• Dinner ideas\n\
• Popular snacks\n\
• Fruits under $5\n\
• Product recommendations\n\n\
How can I help you today?";
pub const THANKS_ANSWER: &str = "You’re welcome 🙂 Let me know if you need anything else!";
pub const ERROR_ANSWER: &str = "⚠️ Something went wrong while processing your request.";
pub const NOTHING_FOUND_ANSWER: &str =
    "Sorry - I couldn’t find anything related. Try asking differently.";
pub const NO_PRODUCTS_ANSWER: &str = "I couldn’t find matching products. Try another query!";
pub const RECOMMENDATIONS_HEADER: &str = "Here’s what I found for you:\n\n";
pub const RECOMMENDATIONS_TRAILER: &str =
    "These results are ranked using semantic similarity and historical popularity.";
pub const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Thanks,
    Task,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Thanks => "thanks",
            Intent::Task => "task",
        }
    }
}

/// Whole-word greeting match, then `thank` substring, else a task.
pub fn classify(raw_query: &str) -> Intent {
    let lowered = raw_query.trim().to_lowercase();

    let is_greeting = lowered
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|word| GREETING_WORDS.contains(&word));
    if is_greeting {
        return Intent::Greeting;
    }

    if lowered.contains("thank") {
        return Intent::Thanks;
    }

    Intent::Task
}

/// Collapses any agent output shape into answer text.
pub fn normalize(output: AgentOutput) -> Answer {
    let text = match output {
        AgentOutput::PlainText(text) => text,
        AgentOutput::StructuredAnswer { answer } => answer,
        AgentOutput::RecommendationList(items) => render_recommendations(&items),
    };

    if text.trim().is_empty() {
        return Answer::new(NOTHING_FOUND_ANSWER);
    }
    Answer::new(text)
}

fn render_recommendations(items: &[Recommendation]) -> String {
    if items.is_empty() {
        return NO_PRODUCTS_ANSWER.to_string();
    }

    let mut answer = RECOMMENDATIONS_HEADER.to_string();
    for (i, item) in items.iter().take(MAX_RECOMMENDATIONS).enumerate() {
        answer.push_str(&format!(
            "{}. {} (Department: {}, Aisle: {})\n",
            i + 1,
            item.product_name,
            item.department,
            item.aisle
        ));
    }
    answer.push('\n');
    answer.push_str(RECOMMENDATIONS_TRAILER);
    answer
}

/// Top-level entry point. Never fails: every error becomes a fixed answer.
#[derive(Clone)]
pub struct QueryRouter {
    agent: Arc<RetailAgent>,
}

impl QueryRouter {
    pub fn new(agent: Arc<RetailAgent>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &RetailAgent {
        &self.agent
    }

    pub async fn route(&self, raw_query: &str) -> Answer {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("query", %request_id);
        self.route_inner(raw_query).instrument(span).await
    }

    async fn route_inner(&self, raw_query: &str) -> Answer {
        let started = Instant::now();
        let intent = classify(raw_query);

        let answer = match intent {
            Intent::Greeting => Answer::new(GREETING_ANSWER),
            Intent::Thanks => Answer::new(THANKS_ANSWER),
            Intent::Task => match self.agent.run(raw_query).await {
                Ok(output) => normalize(output),
                Err(err) => {
                    tracing::error!("Agent error: {}", err);
                    Answer::new(ERROR_ANSWER)
                }
            },
        };

        tracing::info!(
            intent = intent.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query routed"
        );
        answer
    }
}
