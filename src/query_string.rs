//! Deterministic query strings for the authorize endpoint.
//!
//! Parameters are declared by their wire names (`response_type`,
//! `showSocialLogins`, ...) and resolved against a [`ParamSource`] by their
//! camelized names (`responseType`, `showSocialLogins`, ...). Caller options
//! always win over resolved values and are appended last.

use indexmap::IndexSet;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::types::{ParamValue, RequestOptions};

/// Bytes escaped in parameter values: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Anything that can supply URL parameter values by (camelized) name.
pub trait ParamSource {
    /// Value for `name`, or `None` when nothing usable is configured.
    fn param(&self, name: &str) -> Option<ParamValue>;
}

impl ParamSource for ProviderConfig {
    fn param(&self, name: &str) -> Option<ParamValue> {
        ProviderConfig::param(self, name)
    }
}

/// Normalize a wire parameter name to the property name it is looked up by.
///
/// Separators (`_`, `-`, `.`, whitespace) are dropped and the character that
/// follows each run of them is upper-cased; the first character is lower-cased.
///
/// ```
/// use arcgis_portal_auth::query_string::camelize;
///
/// assert_eq!(camelize("response_type"), "responseType");
/// assert_eq!(camelize("showSocialLogins"), "showSocialLogins");
/// assert_eq!(camelize("Expires-In"), "expiresIn");
/// ```
#[must_use]
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if matches!(c, '_' | '-' | '.') || c.is_whitespace() {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    match out.chars().next() {
        Some(first) if first.is_uppercase() => {
            first.to_lowercase().chain(out.chars().skip(1)).collect()
        }
        _ => out,
    }
}

/// Builds query strings from required and optional parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStringBuilder {
    required: Vec<String>,
    optional: Vec<String>,
}

impl QueryStringBuilder {
    /// Create a builder. Duplicate names within a list are collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a name is both required and optional.
    pub fn new<R, O>(required: R, optional: O) -> Result<Self, Error>
    where
        R: IntoIterator,
        R::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
            let required = uniq(required);
        let optional = uniq(optional);

        if let Some(param) = optional.iter().find(|p| required.contains(p)) {
            return Err(Error::Config(format!(
                "Required parameters cannot also be optional: '{param}'"
            )));
        }

        Ok(Self { required, optional })
    }

    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    #[must_use]
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// Build `name=value&...`: required params, then optional params, then
    /// every option in insertion order. A name given as an option is only
    /// emitted once, with the option's value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] or [`Error::UncamelizedParameter`]
    /// if a required parameter has no value and no option overrides it.
    pub fn build<S: ParamSource + ?Sized>(
        &self,
        source: &S,
        options: &RequestOptions,
    ) -> Result<String, Error> {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        for name in self.required.iter().filter(|n| !options.contains(n)) {
            let value = required_value(source, name)?;
            pairs.push((name.as_str(), encode(&value.to_string())));
        }

        for name in self.optional.iter().filter(|n| !options.contains(n)) {
            if let Some(value) = source.param(&camelize(name)) {
                pairs.push((name.as_str(), encode(&value.to_string())));
            }
        }

        for (name, value) in options.iter() {
            pairs.push((name, encode(value)));
        }

        Ok(pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&"))
    }
}

fn required_value<S: ParamSource + ?Sized>(source: &S, name: &str) -> Result<ParamValue, Error> {
    let camelized = camelize(name);
    if let Some(value) = source.param(&camelized) {
        return Ok(value);
    }
    if camelized != name && source.param(name).is_some() {
        return Err(Error::UncamelizedParameter {
            camelized,
            raw: name.to_string(),
        });
    }
    Err(Error::MissingParameter {
        name: name.to_string(),
        camelized,
    })
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

fn uniq<I>(names: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    names
        .into_iter()
        .map(Into::into)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}
