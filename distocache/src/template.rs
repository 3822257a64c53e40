use crate::CacheError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub type StringContext = HashMap<String, String>;

/// Substitutes `$name` tokens with values from a string context.
pub struct TemplateEngine;

impl TemplateEngine {
    pub fn render(text: &str, ctx: &StringContext) -> String {
        let mut names: Vec<&String> = ctx.keys().collect();
        // longest first, so `$ab` is not consumed by `$a`
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.into_iter().fold(text.to_owned(), |acc, name| acc.replace(&format!("${}", name), &ctx[name]))
    }

    pub fn evaluate(path: impl AsRef<Path>, ctx: &StringContext) -> Result<String, CacheError> {
        Ok(Self::render(&fs::read_to_string(path)?, ctx))
    }
}
