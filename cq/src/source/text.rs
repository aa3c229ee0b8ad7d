//! Fixed-text source with variable interpolation

use async_trait::async_trait;
use handlebars::Handlebars;
use tracing::debug;

use super::{Source, SourceError, SourceOutput};
use crate::session::Session;

/// Source rendering a fixed Handlebars template against the session's vars
///
/// Missing variables render as empty text rather than failing, so templates
/// can reference vars that earlier nodes may or may not have set.
pub struct StringSource {
    template: String,
    hbs: Handlebars<'static>,
}

impl StringSource {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        debug!(template_len = template.len(), "StringSource::new: called");
        let mut hbs = Handlebars::new();
        // Prompt text is not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        Self { template, hbs }
    }
}

#[async_trait]
impl Source for StringSource {
    async fn content(&self, session: &Session) -> Result<SourceOutput, SourceError> {
        let rendered = self.hbs.render_template(&self.template, &session.vars)?;
        Ok(SourceOutput::text(rendered))
    }
}
