use crate::stores::user_store::UserStore;
use thiserror::Error;

/// Read access the validator needs for uniqueness checks
pub trait UserLookup {
    fn userid_taken(&self, userid: &str) -> bool;
}

impl UserLookup for UserStore {
    fn userid_taken(&self, userid: &str) -> bool {
        self.userid_exists(userid)
    }
}

/// A single field check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty after trimming whitespace
    Required,
    /// Equal to the submitted value of another field
    EqualTo(&'static str),
    /// At least this many characters
    MinLength(usize),
    /// One of a fixed set of values
    OneOf(&'static [&'static str]),
    /// No user is registered under this userid yet
    UniqueUserId,
}

/// A named form field and the rules it must pass, in order
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rules: &'static [Rule],
}

/// A submitted form that can be checked against its field descriptors
pub trait FormInput {
    const FIELDS: &'static [FieldSpec];

    /// Submitted value of `field`, empty when the field was not sent
    fn value(&self, field: &str) -> &str;
}

/// Field-level validation failures, at most one message per field
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("{} form field(s) failed validation", .errors.len())]
pub struct FormErrors {
    errors: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` unless it already has one
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push((field, message.into()));
        }
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(name, message)| (*name, message.as_str()))
    }
}

/// Run every field's rules in declaration order.
///
/// The first failing rule on a field stops that field; other fields are
/// still checked so the page can show every problem at once.
pub fn validate<F: FormInput>(form: &F, lookup: &dyn UserLookup) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();

    for field in F::FIELDS {
        let value = form.value(field.name);
        for rule in field.rules {
            if let Some(message) = check_rule::<F>(*rule, field, value, form, lookup) {
                errors.add(field.name, message);
                break;
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rule<F: FormInput>(
    rule: Rule,
    field: &FieldSpec,
    value: &str,
    form: &F,
    lookup: &dyn UserLookup,
) -> Option<String> {
    match rule {
        Rule::Required => value
            .trim()
            .is_empty()
            .then(|| format!("{} is required", field.label)),
        Rule::EqualTo(other) => (value != form.value(other)).then(|| {
            let other_label = F::FIELDS
                .iter()
                .find(|f| f.name == other)
                .map(|f| f.label)
                .unwrap_or(other);
            format!("Does not match {}", other_label.to_lowercase())
        }),
        Rule::MinLength(min) => (value.chars().count() < min)
            .then(|| format!("{} must be at least {} characters", field.label, min)),
        Rule::OneOf(choices) => (!choices.contains(&value)).then(|| "Not a valid choice".to_string()),
        Rule::UniqueUserId => lookup
            .userid_taken(value)
            .then(|| "This user ID is already registered".to_string()),
    }
}
