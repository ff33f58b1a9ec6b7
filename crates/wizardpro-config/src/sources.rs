use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.copied().unwrap_or(ConfigSource::Default).to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Keys are sorted so the output is stable for display.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add(
            "model",
            self.defaults
                .model
                .clone()
                .unwrap_or_else(|| crate::DEFAULT_MODEL.to_string()),
        );
        add("state_dir", self.state_dir().display().to_string());
        add("verbose", self.verbose().to_string());
        add("retry_max_attempts", self.retry.max_attempts().to_string());
        add(
            "retry_initial_backoff_secs",
            self.retry.initial_backoff_secs().to_string(),
        );
        add(
            "retry_max_backoff_secs",
            self.retry.max_backoff_secs().to_string(),
        );
        add(
            "retry_rate_limit_min_wait_secs",
            self.retry.rate_limit_min_wait_secs().to_string(),
        );

        let mut phases: Vec<_> = self.phases.iter().collect();
        phases.sort_by(|a, b| a.0.cmp(b.0));
        for (phase, pc) in phases {
            if let Some(model) = &pc.model {
                let source = source_label(self.source_attribution.get("phases"));
                config.insert(format!("phases.{phase}.model"), (model.clone(), source));
            }
        }

        config
    }
}
