use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use tera::{Context, Tera};

use super::types::EmailError;

/// Renders HTML email templates from a fixed directory.
///
/// Templates are compiled once at startup and looked up by registry name, so
/// request input is never joined into a filesystem path. Names that look like
/// paths are rejected with the same error as unknown names.
pub struct TemplateRenderer {
  tera: Tera,
}

impl TemplateRenderer {
  pub fn new(templates_dir: &Path) -> anyhow::Result<Self> {
    let glob = format!("{}/**/*.html", templates_dir.display());
    let tera = Tera::new(&glob).with_context(|| format!("failed to load templates from {:?}", templates_dir))?;

    Ok(TemplateRenderer { tera })
  }

  pub fn render(&self, template_name: &str, variables: &HashMap<String, String>) -> Result<String, EmailError> {
    if !is_plain_template_name(template_name) {
      return Err(EmailError::TemplateNotFound(template_name.to_string()));
    }

    if !self.tera.get_template_names().any(|name| name == template_name) {
      return Err(EmailError::TemplateNotFound(template_name.to_string()));
    }

    let mut context = Context::new();
    for (key, value) in variables {
      context.insert(key, value);
    }

    self.tera.render(template_name, &context).map_err(|e| {
      tracing::error!(template = template_name, error = %e, "template rendering failed");
      EmailError::TemplateRender(format!("failed to render template '{}'", template_name))
    })
  }
}

fn is_plain_template_name(name: &str) -> bool {
  !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}
