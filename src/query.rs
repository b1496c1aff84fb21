//! Textual chain syntax.
//!
//! One step is `name` or `name:key=value,key=value`. The CLI takes one step
//! per `-t` flag and presets in `pipeline.toml` are lists of steps, so there
//! is no separator between steps here.
//!
//! ```text
//! canvas:width=200,height=200,mode=center,bg=fff
//! flip-horizontally
//! compress:quality=75
//! ```
//!
//! Values stay strings; each transformation coerces its own parameters.

use crate::params::{Params, ValidationError};
use crate::pipeline::Invocation;
use std::str::FromStr;

impl FromStr for Invocation {
    type Err = ValidationError;

    fn from_str(step: &str) -> Result<Self, Self::Err> {
        let (name, rest) = match step.split_once(':') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (step.trim(), None),
        };
        if name.is_empty() {
            return Err(ValidationError::Invalid {
                name: "transformation".into(),
                value: step.to_string(),
                expected: "a transformation name",
            });
        }

        let mut params = Params::new();
        for pair in rest.into_iter().flat_map(|r| r.split(',')) {
            if pair.trim().is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| ValidationError::Invalid {
                name: name.to_string(),
                value: pair.trim().to_string(),
                expected: "key=value",
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ValidationError::Invalid {
                    name: name.to_string(),
                    value: pair.trim().to_string(),
                    expected: "a non-empty parameter name",
                });
            }
            if params.insert(key, value.trim()).is_some() {
                return Err(ValidationError::Conflict(format!(
                    "Duplicate parameter {key} for {name}"
                )));
            }
        }
        Ok(Invocation::with_params(name, params))
    }
}

/// Parse every step of a chain, stopping at the first malformed one.
pub fn parse_chain<I, S>(steps: I) -> Result<Vec<Invocation>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    steps.into_iter().map(|s| s.as_ref().parse()).collect()
}
