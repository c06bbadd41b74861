//! Provider template registry backed by Handlebars.
//!
//! Templates are compiled once at startup and only read afterwards, so a
//! single registry is shared by every request through an `Arc`.
//! - Strict mode: a token naming an unknown field is an error
//! - Every template is rendered against a sample request with all flags off and all flags on,
//!   so unresolved tokens inside conditional sections fail at build time
//! - Substituted values are escaped for HCL quoted strings

use crate::error::ProvisionError;
use crate::render::RenderedDocument;
use crate::request::{Provider, ProvisioningRequest};
use handlebars::Handlebars;
use std::collections::BTreeSet;

const AWS_TEMPLATE: &str = include_str!("../templates/aws.tf.hbs");
const AZURE_TEMPLATE: &str = include_str!("../templates/azure.tf.hbs");
const GCP_TEMPLATE: &str = include_str!("../templates/gcp.tf.hbs");

pub struct TemplateRegistry {
    handlebars: Handlebars<'static>,
    providers: BTreeSet<&'static str>,
}

#[derive(Default)]
pub struct TemplateRegistryBuilder {
    sources: Vec<(Provider, String)>,
}

impl TemplateRegistryBuilder {
    pub fn register(mut self, provider: Provider, source: impl Into<String>) -> Self {
        self.sources.push((provider, source.into()));
        self
    }

    /// Compile every registered template and render it against sample requests.
    pub fn build(self) -> Result<TemplateRegistry, ProvisionError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(hcl_escape);

        let mut providers = BTreeSet::new();
        for (provider, source) in &self.sources {
            let name = provider.as_str();
            handlebars
                .register_template_string(name, source)
                .map_err(|e| ProvisionError::TemplateParse {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;

            for flags in [false, true] {
                handlebars
                    .render(name, &ProvisioningRequest::sample(flags))
                    .map_err(|e| ProvisionError::TemplateParse {
                        name: name.to_string(),
                        reason: e.to_string(),
                    })?;
            }

            tracing::debug!(template = name, "template compiled");
            providers.insert(name);
        }

        Ok(TemplateRegistry {
            handlebars,
            providers,
        })
    }
}

impl TemplateRegistry {
    pub fn builder() -> TemplateRegistryBuilder {
        TemplateRegistryBuilder::default()
    }

    /// Registry holding the bundled template of every known provider.
    pub fn builtin() -> Result<Self, ProvisionError> {
        Self::builder()
            .register(Provider::Aws, AWS_TEMPLATE)
            .register(Provider::Azure, AZURE_TEMPLATE)
            .register(Provider::Gcp, GCP_TEMPLATE)
            .build()
    }

    pub fn contains(&self, provider: Provider) -> bool {
        self.providers.contains(provider.as_str())
    }

    pub fn render(
        &self,
        provider: Provider,
        request: &ProvisioningRequest,
    ) -> Result<RenderedDocument, ProvisionError> {
        if !self.contains(provider) {
            return Err(ProvisionError::UnknownProvider(provider.to_string()));
        }

        let text = self
            .handlebars
            .render(provider.as_str(), request)
            .map_err(|e| ProvisionError::Render {
                provider: provider.to_string(),
                reason: e.to_string(),
            })?;

        Ok(RenderedDocument::new(provider, text))
    }
}

/// Escape a value for use inside an HCL quoted string.
pub fn hcl_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // `${` and `%{` start interpolation; doubling the sigil makes them literal
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
