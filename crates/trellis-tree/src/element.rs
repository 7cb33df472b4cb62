//! Page elements
//!
//! An [`Element`] is either display-only content or an input element backed by
//! an [`ElementValidator`] strategy. Input elements contribute one value each
//! to the session's global data record, so their names are unique tree-wide.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Result of validating one raw input
#[derive(Debug, Clone, PartialEq)]
pub struct ElementValidation {
    /// Whether the input is acceptable
    pub ok: bool,
    /// Value to record, if normalisation changed it
    pub normalized_value: Option<Value>,
    /// Participant-facing message when `ok` is false
    pub error_message: Option<String>,
}

impl ElementValidation {
    /// Accept with a normalised value
    #[inline]
    #[must_use]
    pub fn accept(value: Value) -> Self {
        Self {
            ok: true,
            normalized_value: Some(value),
            error_message: None,
        }
    }

    /// Reject with a message
    #[inline]
    #[must_use]
    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            normalized_value: None,
            error_message: Some(message.into()),
        }
    }
}

/// Validation strategy for an input element
pub trait ElementValidator: Send + Sync + fmt::Debug {
    /// Validate a non-empty raw input
    fn validate(&self, raw: &Value) -> ElementValidation;
}

/// Accepts any input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyInput;

impl ElementValidator for AnyInput {
    fn validate(&self, raw: &Value) -> ElementValidation {
        ElementValidation::accept(raw.clone())
    }
}

/// Text input with length bounds, trimmed before checking
#[derive(Debug, Clone, Copy)]
pub struct TextLength {
    pub min: usize,
    pub max: Option<usize>,
}

impl TextLength {
    #[must_use]
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

impl ElementValidator for TextLength {
    fn validate(&self, raw: &Value) -> ElementValidation {
        let Some(text) = raw.as_str() else {
            return ElementValidation::reject("please enter text");
        };
        let text = text.trim();
        let len = text.chars().count();
        if len < self.min {
            return ElementValidation::reject(format!(
                "please enter at least {} characters",
                self.min
            ));
        }
        if let Some(max) = self.max {
            if len > max {
                return ElementValidation::reject(format!(
                    "please enter at most {max} characters"
                ));
            }
        }
        ElementValidation::accept(Value::String(text.to_string()))
    }
}

/// Numeric input within an inclusive range
///
/// Numeric strings are parsed and recorded as numbers.
#[derive(Debug, Clone, Copy)]
pub struct NumberInRange {
    pub min: f64,
    pub max: f64,
}

impl NumberInRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl ElementValidator for NumberInRange {
    fn validate(&self, raw: &Value) -> ElementValidation {
        let number = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(number) = number.filter(|n| n.is_finite()) else {
            return ElementValidation::reject("please enter a number");
        };
        if number < self.min || number > self.max {
            return ElementValidation::reject(format!(
                "please enter a number between {} and {}",
                self.min, self.max
            ));
        }
        match serde_json::Number::from_f64(number) {
            Some(n) => ElementValidation::accept(Value::Number(n)),
            None => ElementValidation::reject("please enter a number"),
        }
    }
}

/// Choice from a fixed set of labels
#[derive(Debug, Clone, Default)]
pub struct OneOf {
    choices: Vec<String>,
}

impl OneOf {
    #[must_use]
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl ElementValidator for OneOf {
    fn validate(&self, raw: &Value) -> ElementValidation {
        match raw.as_str() {
            Some(choice) if self.choices.iter().any(|c| c == choice) => {
                ElementValidation::accept(raw.clone())
            }
            _ => ElementValidation::reject(format!(
                "please choose one of: {}",
                self.choices.join(", ")
            )),
        }
    }
}

/// Input part of an input element
#[derive(Debug, Clone)]
pub struct InputSpec {
    validator: Arc<dyn ElementValidator>,
    force_input: bool,
    raw: Option<Value>,
}

/// Element kinds
#[derive(Debug, Clone)]
pub enum ElementKind {
    /// Display-only content
    Display { content: String },
    /// Input collecting one value
    Input(InputSpec),
}

/// Named unit of display or input living on a page
#[derive(Debug, Clone)]
pub struct Element {
    name: Option<String>,
    kind: ElementKind,
}

impl Element {
    /// Unnamed display element
    #[must_use]
    pub fn display(content: impl Into<String>) -> Self {
        Self {
            name: None,
            kind: ElementKind::Display {
                content: content.into(),
            },
        }
    }

    /// Named display element
    #[must_use]
    pub fn display_named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: ElementKind::Display {
                content: content.into(),
            },
        }
    }

    /// Optional input element
    #[must_use]
    pub fn input(name: impl Into<String>, validator: impl ElementValidator + 'static) -> Self {
        Self::input_with(name, Arc::new(validator))
    }

    /// Optional input element with a shared validator
    #[must_use]
    pub fn input_with(name: impl Into<String>, validator: Arc<dyn ElementValidator>) -> Self {
        Self {
            name: Some(name.into()),
            kind: ElementKind::Input(InputSpec {
                validator,
                force_input: false,
                raw: None,
            }),
        }
    }

    /// Require a non-empty input (no effect on display elements)
    #[must_use]
    pub fn force_input(mut self) -> Self {
        if let ElementKind::Input(spec) = &mut self.kind {
            spec.force_input = true;
        }
        self
    }

    /// Preset the raw input (no effect on display elements)
    #[must_use]
    pub fn with_default(mut self, raw: Value) -> Self {
        if let ElementKind::Input(spec) = &mut self.kind {
            spec.raw = Some(raw);
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(self.kind, ElementKind::Input(_))
    }

    /// Raw input currently stored, if any
    #[must_use]
    pub fn raw(&self) -> Option<&Value> {
        match &self.kind {
            ElementKind::Input(spec) => spec.raw.as_ref(),
            ElementKind::Display { .. } => None,
        }
    }

    /// Store raw input; returns false for display elements
    pub fn set_raw(&mut self, raw: Value) -> bool {
        match &mut self.kind {
            ElementKind::Input(spec) => {
                spec.raw = Some(raw);
                true
            }
            ElementKind::Display { .. } => false,
        }
    }

    /// Validate the stored input
    ///
    /// Display elements are always valid. Missing or empty input is valid
    /// unless the element forces input.
    #[must_use]
    pub fn validate(&self) -> ElementValidation {
        let ElementKind::Input(spec) = &self.kind else {
            return ElementValidation::accept(Value::Null);
        };
        match spec.raw.as_ref().filter(|raw| !is_empty_input(raw)) {
            Some(raw) => {
                let mut result = spec.validator.validate(raw);
                if !result.ok && result.error_message.is_none() {
                    result.error_message = Some(format!(
                        "invalid input for '{}'",
                        self.name.as_deref().unwrap_or_default()
                    ));
                }
                result
            }
            None if spec.force_input => ElementValidation::reject("input required"),
            None => ElementValidation::accept(Value::Null),
        }
    }

    /// Value recorded in the data record
    ///
    /// The normalised value when the input validates, otherwise the raw input
    /// so nothing the participant entered is lost.
    #[must_use]
    pub fn value(&self) -> Value {
        let ElementKind::Input(spec) = &self.kind else {
            return Value::Null;
        };
        let result = self.validate();
        if result.ok {
            result
                .normalized_value
                .or_else(|| spec.raw.clone())
                .unwrap_or(Value::Null)
        } else {
            spec.raw.clone().unwrap_or(Value::Null)
        }
    }
}

fn is_empty_input(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
