//! Recognizer registry
//!
//! Maps model names to recognizer backends. The rule-based recognizer is
//! always registered; models served by the NER service are registered when a
//! service URL is configured.

use std::collections::BTreeMap;
use std::sync::Arc;

use entilens_core::{EntilensError, EntityRecognizer, NerConfig, Result};

use crate::ner::{RuleBasedNer, BUILTIN_MODEL};
use crate::remote::{install_hint, RemoteNer};

/// Registry of available recognizers keyed by model name
pub struct RecognizerRegistry {
    recognizers: BTreeMap<String, Arc<dyn EntityRecognizer>>,
    default_model: String,
}

impl RecognizerRegistry {
    /// Create a registry containing only the rule-based recognizer
    pub fn new() -> Self {
        let mut registry = Self {
            recognizers: BTreeMap::new(),
            default_model: BUILTIN_MODEL.to_string(),
        };
        registry.register(Arc::new(RuleBasedNer::new()));
        registry
    }

    /// Build the registry from configuration
    pub fn from_config(config: &NerConfig) -> Result<Self> {
        let mut registry = Self::new();

        match &config.service_url {
            Some(_) => {
                for model in &config.models {
                    registry.register(Arc::new(RemoteNer::from_config(config, model.clone())?));
                }
            }
            None if !config.models.is_empty() => {
                tracing::info!(
                    models = ?config.models,
                    "NER service URL not configured, only the builtin recognizer is registered"
                );
            }
            None => {}
        }

        registry.set_default_model(&config.default_model)?;
        Ok(registry)
    }

    /// Register a recognizer under its model name, replacing any previous one
    pub fn register(&mut self, recognizer: Arc<dyn EntityRecognizer>) {
        self.recognizers
            .insert(recognizer.model().to_string(), recognizer);
    }

    /// Change the model used when a request does not name one
    pub fn set_default_model(&mut self, model: &str) -> Result<()> {
        if !self.recognizers.contains_key(model) {
            return Err(EntilensError::ConfigError(format!(
                "Default model {model} is not registered"
            )));
        }
        self.default_model = model.to_string();
        Ok(())
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Look up a recognizer, falling back to the default model
    pub fn get(&self, model: Option<&str>) -> Result<Arc<dyn EntityRecognizer>> {
        let name = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model);

        self.recognizers
            .get(name)
            .cloned()
            .ok_or_else(|| EntilensError::ModelUnavailable {
                model: name.to_string(),
                reason: install_hint(name),
            })
    }

    /// Registered model names in sorted order
    pub fn models(&self) -> Vec<String> {
        self.recognizers.keys().cloned().collect()
    }

    /// Check each registered model, returning `(name, available)` pairs
    pub async fn availability(&self) -> Vec<(String, bool)> {
        let mut result = Vec::with_capacity(self.recognizers.len());
        for (name, recognizer) in &self.recognizers {
            result.push((name.clone(), recognizer.is_available().await));
        }
        result
    }
}

impl Default for RecognizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_builtin() {
        let registry = RecognizerRegistry::new();
        assert_eq!(registry.models(), vec!["builtin".to_string()]);
        assert_eq!(registry.default_model(), "builtin");
        assert_eq!(registry.get(None).unwrap().model(), "builtin");
        assert_eq!(registry.get(Some("  ")).unwrap().model(), "builtin");
    }

    #[test]
    fn test_unknown_model_is_unavailable() {
        let registry = RecognizerRegistry::new();
        let err = registry.get(Some("en_core_web_trf")).err().unwrap();
        match err {
            EntilensError::ModelUnavailable { model, reason } => {
                assert_eq!(model, "en_core_web_trf");
                assert!(reason.starts_with("Install with"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_config_without_service() {
        let registry = RecognizerRegistry::from_config(&NerConfig::default()).unwrap();
        assert_eq!(registry.models(), vec!["builtin".to_string()]);
    }

    #[test]
    fn test_from_config_with_service() {
        let config = NerConfig {
            service_url: Some("http://localhost:9000".to_string()),
            default_model: "en_core_web_sm".to_string(),
            ..NerConfig::default()
        };
        let registry = RecognizerRegistry::from_config(&config).unwrap();

        assert_eq!(
            registry.models(),
            vec![
                "builtin".to_string(),
                "en_core_web_sm".to_string(),
                "en_core_web_trf".to_string()
            ]
        );
        assert_eq!(registry.get(None).unwrap().model(), "en_core_web_sm");
    }

    #[test]
    fn test_unregistered_default_is_config_error() {
        let config = NerConfig {
            default_model: "en_core_web_sm".to_string(),
            ..NerConfig::default()
        };
        assert!(matches!(
            RecognizerRegistry::from_config(&config),
            Err(EntilensError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_availability() {
        let registry = RecognizerRegistry::new();
        assert_eq!(
            registry.availability().await,
            vec![("builtin".to_string(), true)]
        );
    }
}
