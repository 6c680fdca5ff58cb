//! Turns validation failures into user-facing messages.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;

use super::failure::{MessageSource, ValidationFailure};
use super::messages::{MessageStore, FALLBACK_KEY};
use crate::locale::Locale;
use crate::logs::log_debug;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("valid placeholder regex"));

static KEY_TEMPLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{([^{}\s]+)\}$").expect("valid key template regex"));

/// A failure rendered for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMessage {
    pub line_number: usize,
    pub row_number: usize,
    pub column_number: usize,
    pub label: String,
    /// Key or custom template the message was produced from.
    pub key: String,
    pub message: String,
}

/// Resolves failures against a [`MessageStore`] for one locale.
#[derive(Debug, Clone, Default)]
pub struct MessageResolver {
    store: MessageStore,
    locale: Locale,
}

impl MessageResolver {
    pub fn new(store: MessageStore, locale: Locale) -> Self {
        Self { store, locale }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    /// Resolve a single failure.
    ///
    /// Lookup order: custom template, stage key, fallback key. When no
    /// bundle defines any of them the key itself is returned.
    pub fn resolve(&self, failure: &ValidationFailure) -> ResolvedMessage {
        let (key, template) = self.template_for(failure);
        let message = match template {
            Some(template) => self.interpolate(template, failure),
            None => {
                log_debug(format!("No message template for '{}' in locale '{}'", key, self.locale));
                key.clone()
            }
        };

        let (line_number, row_number, column_number, label) = match &failure.context {
            Some(ctx) => (ctx.line_number, ctx.row_number, ctx.column_number, ctx.label.clone()),
            None => (0, 0, 0, String::new()),
        };

        ResolvedMessage {
            line_number,
            row_number,
            column_number,
            label,
            key,
            message,
        }
    }

    /// Resolve every failure, ordered by row then column.
    ///
    /// The sort is stable: failures at the same cell keep their order.
    pub fn resolve_all<'a, I>(&self, failures: I) -> Vec<ResolvedMessage>
    where
        I: IntoIterator<Item = &'a ValidationFailure>,
    {
        let mut failures: Vec<&ValidationFailure> = failures.into_iter().collect();
        failures.sort_by_key(|f| f.position());
        failures.into_iter().map(|f| self.resolve(f)).collect()
    }

    fn template_for<'s>(&'s self, failure: &'s ValidationFailure) -> (String, Option<&'s str>) {
        match &failure.message {
            MessageSource::Template(template) => {
                let referenced = KEY_TEMPLATE_RE
                    .captures(template)
                    .and_then(|caps| caps.get(1))
                    .and_then(|key| self.store.lookup(&self.locale, key.as_str()));
                (template.clone(), Some(referenced.unwrap_or(template.as_str())))
            }
            MessageSource::Key(key) => {
                if let Some(template) = self.store.lookup(&self.locale, key) {
                    return (key.clone(), Some(template));
                }
                match self.store.lookup(&self.locale, FALLBACK_KEY) {
                    Some(template) => (FALLBACK_KEY.to_string(), Some(template)),
                    None => (key.clone(), None),
                }
            }
        }
    }

    fn interpolate(&self, template: &str, failure: &ValidationFailure) -> String {
        let mut values: HashMap<&str, String> = failure
            .variables
            .iter()
            .map(|(name, arg)| (name.as_str(), arg.display.clone()))
            .collect();

        if let Some(ctx) = &failure.context {
            values.insert("lineNumber", ctx.line_number.to_string());
            values.insert("rowNumber", ctx.row_number.to_string());
            values.insert("columnNumber", ctx.column_number.to_string());
            values.insert("label", ctx.label.clone());
        }
        values.insert("validatedValue", failure.validated_value.clone());

        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
