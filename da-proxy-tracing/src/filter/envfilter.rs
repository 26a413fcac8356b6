// std
use std::collections::BTreeMap;
// crates
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::EnvFilter;
// internal

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid filter directive `{directive}`")]
    Directive {
        directive: String,
        #[source]
        source: ParseError,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnvFilterConfig {
    /// Crate or module name to the log level enabled for it.
    /// More: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives
    pub filters: BTreeMap<String, String>,
}

impl EnvFilterConfig {
    fn directives(&self) -> Result<Vec<Directive>, FilterError> {
        self.filters
            .iter()
            .map(|(target, level)| {
                let directive = format!("{target}={level}");
                directive
                    .parse()
                    .map_err(|source| FilterError::Directive { directive, source })
            })
            .collect()
    }
}

/// One directive per configured target, each validated on its own.
pub fn create_envfilter_layer(config: EnvFilterConfig) -> Result<EnvFilter, FilterError> {
    Ok(config
        .directives()?
        .into_iter()
        .fold(EnvFilter::default(), EnvFilter::add_directive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(filters: &[(&str, &str)]) -> EnvFilterConfig {
        EnvFilterConfig {
            filters: filters
                .iter()
                .map(|(target, level)| (target.to_string(), level.to_string()))
                .collect(),
        }
    }

    #[test]
    fn builds_directives_per_target() {
        let filter = create_envfilter_layer(config(&[
            ("da_proxy_store", "debug"),
            ("moka", "warn"),
        ]))
        .unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("da_proxy_store=debug"));
        assert!(rendered.contains("moka=warn"));
    }

    #[test]
    fn names_the_rejected_directive() {
        let err = create_envfilter_layer(config(&[
            ("da_proxy_store", "loud"),
            ("moka", "warn"),
        ]))
        .unwrap_err();
        let FilterError::Directive { directive, .. } = err;
        assert_eq!(directive, "da_proxy_store=loud");
    }
}
