//! Context Provider - the surface prompt-assembly code talks to
//!
//! Wraps the repository and the formatter. Every operation returns an
//! optional context block: absence means "send the prompt without RAG
//! context", never an error.

use crate::formatter::{ContextWithMetadata, PromptFormatter};
use mathrag_common::config::AppConfig;
use mathrag_common::models::{ContentType, TheoremResult};
use mathrag_search::RagRepository;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ContextProvider {
    repository: Arc<RagRepository>,
    formatter: PromptFormatter,
    limit: usize,
}

impl ContextProvider {
    pub fn new(repository: Arc<RagRepository>, config: &AppConfig) -> Self {
        Self {
            repository,
            formatter: PromptFormatter::new(&config.prompt),
            limit: config.retrieval.default_limit,
        }
    }

    pub fn repository(&self) -> &Arc<RagRepository> {
        &self.repository
    }

    /// Worked-exercise context for the query.
    ///
    /// Blank queries return `None` without touching the repository.
    pub async fn retrieve_context(&self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }
        let result = self.repository.find_relevant_exercises(query, self.limit).await;
        let context = self.formatter.format_context_for_prompt(&result);
        debug!(
            outcome = result.outcome(),
            chars = context.as_ref().map(|c| c.chars().count()),
            "Exercise context retrieved"
        );
        context
    }

    /// Exercise context plus classification and fallback details
    pub async fn retrieve_context_with_metadata(&self, query: &str) -> ContextWithMetadata {
        if query.trim().is_empty() {
            return ContextWithMetadata::empty("empty query");
        }
        let result = self.repository.find_relevant_exercises(query, self.limit).await;
        self.formatter.format_with_metadata(&result)
    }

    /// Context built from the best-matching theorem
    pub async fn retrieve_theorem_context(&self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }
        match self.repository.find_theorem(query).await {
            TheoremResult::Found(theorem) => Some(self.formatter.format_theorem_for_prompt(&theorem)),
            TheoremResult::NotFound { reason } => {
                debug!(%reason, "No theorem context");
                None
            }
        }
    }

    /// Pick theorem or exercise context from what the query asks for,
    /// falling back to the other kind when the first finds nothing.
    pub async fn retrieve_for_prompt(&self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }
        let content_type = self.repository.classify_query_type(query);
        info!(?content_type, "Retrieving prompt context");

        match content_type {
            ContentType::Theorem => match self.retrieve_theorem_context(query).await {
                Some(context) => Some(context),
                None => self.retrieve_context(query).await,
            },
            ContentType::Exercise | ContentType::Unknown => match self.retrieve_context(query).await {
                Some(context) => Some(context),
                None => self.retrieve_theorem_context(query).await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathrag_common::corpus::InMemoryCorpusSource;
    use mathrag_search::RepositoryState;

    const EXERCISES: &str = r#"{
        "exercises": [
            {
                "id": "EDO-001",
                "categoria": "Equazioni Differenziali",
                "sottotipo": "Lineari I Ordine",
                "keywords": ["lineare", "primo ordine"],
                "testo": "Risolvere y' + 2y = e^x",
                "svolgimento": "Fattore integrante e^{2x}"
            },
            {
                "id": "INT-001",
                "categoria": "Integrali",
                "sottotipo": "Per Parti",
                "keywords": ["integrale", "per parti"],
                "testo": "Calcolare ∫ x e^x dx",
                "svolgimento": "x e^x - e^x + C"
            }
        ]
    }"#;

    const THEOREMS: &str = r#"{
        "theorems": [
            {
                "id": "TH-ROLLE",
                "nome": "Teorema di Rolle",
                "categoria": "Derivate",
                "tipo": "teorema",
                "keywords": ["rolle"],
                "enunciato": "Se f(a) = f(b) esiste c con f'(c) = 0",
                "dimostrazione": "Weierstrass e Fermat"
            }
        ]
    }"#;

    fn provider(exercises: &str, theorems: &str) -> ContextProvider {
        let config = AppConfig::default();
        let source = Arc::new(InMemoryCorpusSource::new(exercises.to_string(), theorems.to_string()));
        ContextProvider::new(Arc::new(RagRepository::new(source, &config)), &config)
    }

    #[tokio::test]
    async fn test_empty_query_skips_repository() {
        let provider = provider(EXERCISES, THEOREMS);
        assert!(provider.retrieve_context("").await.is_none());
        assert!(provider.retrieve_context("   ").await.is_none());
        assert!(provider.retrieve_for_prompt("").await.is_none());
        assert!(provider.retrieve_context_with_metadata("").await.context.is_none());
        assert_eq!(provider.repository().state(), RepositoryState::Uninitialized);
    }

    #[tokio::test]
    async fn test_retrieve_context() {
        let provider = provider(EXERCISES, THEOREMS);
        let context = provider
            .retrieve_context("Risolvere l'equazione differenziale lineare")
            .await
            .unwrap();
        assert!(context.contains("(EDO-001)"));
        assert!(context.contains("Fattore integrante"));
        assert!(context.chars().count() <= 4096);
    }

    #[tokio::test]
    async fn test_retrieve_context_with_metadata() {
        let provider = provider(EXERCISES, THEOREMS);
        let metadata = provider.retrieve_context_with_metadata("integrale per parti").await;
        assert_eq!(metadata.category.as_deref(), Some("Integrali"));
        assert_eq!(metadata.subtype.as_deref(), Some("Per Parti"));
        assert!(metadata.exercise_count >= 1);
        assert!(metadata.context.is_some());

        let metadata = provider.retrieve_context_with_metadata("buongiorno").await;
        assert!(metadata.context.is_none());
        assert!(metadata.fallback_reason.is_some());
    }

    #[tokio::test]
    async fn test_retrieve_for_prompt_dispatch() {
        let provider = provider(EXERCISES, THEOREMS);

        let theorem = provider.retrieve_for_prompt("Enunciato del teorema di Rolle").await.unwrap();
        assert!(theorem.contains("Teorema di Rolle"));
        assert!(theorem.contains("Proof:\nWeierstrass e Fermat"));

        let exercise = provider.retrieve_for_prompt("Calcola l'integrale per parti").await.unwrap();
        assert!(exercise.contains("(INT-001)"));
    }

    #[tokio::test]
    async fn test_fallback_to_theorem_when_exercises_missing() {
        let provider = provider("", THEOREMS);
        // Exercise-type query, but only theorems are loaded
        let context = provider.retrieve_for_prompt("Calcola usando il teorema di rolle").await;
        assert!(context.unwrap().contains("Teorema di Rolle"));
        assert!(provider.retrieve_context("rolle").await.is_none());
    }
}
