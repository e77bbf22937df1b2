use crate::catalog::CatalogEntry;
use crate::llm::LlmService;
use crate::tools::search::WebSearchService;

/// Persona and formatting rules sent as the system message.
pub const SYSTEM_INSTRUCTIONS: &str = "You are a professional retail assistant.

Rules:
- Do NOT use markdown tables.
- Use short sections with emojis.
- Use bullet points.
- Keep answers concise.
- Always list products as bullets.
- Avoid long paragraphs.
- Be friendly but professional.";

pub const FALLBACK_HEADER: &str = "Here are matching products:\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeBranch {
    /// No catalog hits: web search then generation.
    WebSearch,
    /// Catalog hits rendered into the prompt.
    Catalog,
    /// Catalog hits, generation unusable: bulleted list returned as-is.
    CatalogFallback,
}

impl ComposeBranch {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeBranch::WebSearch => "web_search",
            ComposeBranch::Catalog => "catalog",
            ComposeBranch::CatalogFallback => "catalog_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub answer: String,
    pub branch: ComposeBranch,
}

/// Turns retrieval results into answer text.
#[derive(Clone)]
pub struct ResponseComposer {
    llm: LlmService,
    web: WebSearchService,
}

impl ResponseComposer {
    pub fn new(llm: LlmService, web: WebSearchService) -> Self {
        Self { llm, web }
    }

    /// Names of the generative and web-search backends, in that order.
    pub fn backend_names(&self) -> (&str, &str) {
        (self.llm.provider_name(), self.web.provider_name())
    }

    pub async fn compose(&self, query: &str, hits: &[CatalogEntry]) -> Composition {
        if hits.is_empty() {
            return self.compose_from_web(query).await;
        }

        let bullets = render_bullets(hits);
        let prompt = catalog_prompt(query, &bullets);
        match self.llm.generate(SYSTEM_INSTRUCTIONS, &prompt).await {
            Some(text) if !text.trim().is_empty() => Composition {
                answer: text,
                branch: ComposeBranch::Catalog,
            },
            _ => {
                tracing::warn!("Generation returned no usable text; using product list");
                Composition {
                    answer: fallback_answer(&bullets),
                    branch: ComposeBranch::CatalogFallback,
                }
            }
        }
    }

    async fn compose_from_web(&self, query: &str) -> Composition {
        let snippets = self.web.search(query).await;
        let prompt = web_prompt(query, &snippets);
        let answer = self
            .llm
            .generate(SYSTEM_INSTRUCTIONS, &prompt)
            .await
            .unwrap_or_default();
        Composition {
            answer,
            branch: ComposeBranch::WebSearch,
        }
    }
}

/// One `• name (aisle: aisle)` line per hit, in the given order.
pub fn render_bullets(hits: &[CatalogEntry]) -> String {
    hits.iter()
        .map(|hit| format!("• {} (aisle: {})\n", hit.product_name, hit.aisle))
        .collect()
}

pub fn fallback_answer(bullets: &str) -> String {
    format!("{}{}", FALLBACK_HEADER, bullets)
}

fn catalog_prompt(query: &str, bullets: &str) -> String {
    format!(
        "You are a friendly grocery assistant.\n\n\
         User asked:\n{}\n\n\
         Available products:\n\n{}\n\
         Respond naturally and suggest meals.",
        query, bullets
    )
}

fn web_prompt(query: &str, snippets: &str) -> String {
    format!(
        "Answer conversationally.\n\n\
         Question:\n{}\n\n\
         Internet info:\n{}",
        query, snippets
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, aisle: &str, popularity: u64) -> CatalogEntry {
        CatalogEntry::new(1, name, aisle, "produce", popularity)
    }

    #[test]
    fn bullets_follow_hit_order() {
        let hits = vec![
            entry("Organic Bananas", "fresh fruits", 120),
            entry("Green Bananas", "fresh fruits", 3),
        ];
        assert_eq!(
            render_bullets(&hits),
            "• Organic Bananas (aisle: fresh fruits)\n• Green Bananas (aisle: fresh fruits)\n"
        );
    }

    #[test]
    fn catalog_prompt_embeds_question_and_products() {
        let prompt = catalog_prompt("dinner ideas", "• Pasta (aisle: dry pasta)\n");
        assert!(prompt.contains("User asked:\ndinner ideas"));
        assert!(prompt.contains("• Pasta (aisle: dry pasta)"));
        assert!(prompt.contains("suggest meals"));
    }

    #[test]
    fn web_prompt_embeds_snippets() {
        let prompt = web_prompt("unobtainium widget", "snippet one\nsnippet two");
        assert!(prompt.starts_with("Answer conversationally."));
        assert!(prompt.contains("Question:\nunobtainium widget"));
        assert!(prompt.ends_with("Internet info:\nsnippet one\nsnippet two"));
    }

    #[test]
    fn fallback_starts_with_header() {
        let text = fallback_answer("• Milk (aisle: milk)\n");
        assert_eq!(text, "Here are matching products:\n\n• Milk (aisle: milk)\n");
    }
}
