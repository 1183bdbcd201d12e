//! Declarative attribute schemas
//!
//! Each resource describes its configuration surface with a
//! [`ResourceSchema`]: attribute types, whether they are user supplied or
//! computed, whether changing them forces replacement, and cross-field
//! constraints. [`ResourceSchema::validate`] checks a configuration object
//! against it before any remote call is made.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

/// Value type of an attribute
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// Ordered list of nested blocks
    List(Block),
}

/// Who supplies an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMode {
    Required,
    Optional,
    /// Optional in configuration, filled from the remote object otherwise
    OptionalComputed,
    /// Never configured, only read back
    Computed,
}

/// Extra string format checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// `YYYY-MM-DD`
    Date,
}

/// One attribute of a resource or nested block
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub mode: AttributeMode,
    /// Changing the value replaces the remote object
    pub force_new: bool,
    /// Only read on destroy
    pub destroy_only: bool,
    #[serde(skip_serializing_if = "no_names")]
    pub conflicts_with: &'static [&'static str],
    #[serde(skip_serializing_if = "no_names")]
    pub valid_values: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    #[serde(skip_serializing_if = "is_zero")]
    pub min_items: usize,
}

fn no_names(names: &&'static [&'static str]) -> bool {
    names.is_empty()
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType) -> Self {
        Self {
            name,
            description: "",
            kind,
            mode: AttributeMode::Optional,
            force_new: false,
            destroy_only: false,
            conflicts_with: &[],
            valid_values: &[],
            default: None,
            format: None,
            min_items: 0,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, AttributeType::Int)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn list(name: &'static str, block: Block) -> Self {
        Self::new(name, AttributeType::List(block))
    }

    pub fn required(mut self) -> Self {
        self.mode = AttributeMode::Required;
        self
    }

    pub fn optional_computed(mut self) -> Self {
        self.mode = AttributeMode::OptionalComputed;
        self
    }

    pub fn computed(mut self) -> Self {
        self.mode = AttributeMode::Computed;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn destroy_only(mut self) -> Self {
        self.destroy_only = true;
        self
    }

    pub fn conflicts_with(mut self, names: &'static [&'static str]) -> Self {
        self.conflicts_with = names;
        self
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.valid_values = values;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = n;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Whether users may set this attribute
    pub fn is_configurable(&self) -> bool {
        self.mode != AttributeMode::Computed
    }
}

/// A set of attributes plus constraints across them
#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    /// Groups of attributes of which exactly one must be set
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exactly_one_of: Vec<&'static [&'static str]>,
}

impl Block {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            exactly_one_of: Vec::new(),
        }
    }

    pub fn exactly_one_of(mut self, names: &'static [&'static str]) -> Self {
        self.exactly_one_of.push(names);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn validate(&self, object: &Map<String, Value>, path: &str, errors: &mut Vec<String>) {
        for key in object.keys() {
            if self.attribute(key).is_none() {
                errors.push(format!("{}: unsupported argument", join(path, key)));
            }
        }

        for attribute in &self.attributes {
            let value = object.get(attribute.name).filter(|v| is_set(v));
            validate_attribute(attribute, value, object, path, errors);
        }

        for group in &self.exactly_one_of {
            let set = group
                .iter()
                .filter(|name| object.get(**name).is_some_and(is_set))
                .count();
            if set != 1 {
                let location = if path.is_empty() { "configuration" } else { path };
                errors.push(format!(
                    "{}: exactly one of {} must be set",
                    location,
                    group
                        .iter()
                        .map(|n| format!("`{n}`"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
        }
    }
}

/// Schema of one resource type
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub importable: bool,
    #[serde(flatten)]
    pub block: Block,
}

impl ResourceSchema {
    pub fn new(type_name: &'static str, description: &'static str, block: Block) -> Self {
        Self {
            type_name,
            description,
            importable: true,
            block,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attribute(name)
    }

    /// Configured attributes that differ between `prior` and `planned` but
    /// can only change by replacing the remote object. Unset planned values
    /// keep the prior one.
    pub fn replaced_attributes(&self, prior: &Value, planned: &Value) -> Vec<&'static str> {
        self.block
            .attributes
            .iter()
            .filter(|attribute| attribute.is_configurable() && attribute.force_new)
            .filter(|attribute| {
                let new = planned.get(attribute.name).filter(|v| is_set(v));
                new.is_some() && new != prior.get(attribute.name)
            })
            .map(|attribute| attribute.name)
            .collect()
    }

    /// Check a configuration object, collecting every problem found
    pub fn validate(&self, config: &Value) -> Result<(), Vec<String>> {
        let Some(object) = config.as_object() else {
            return Err(vec!["configuration must be an object".to_string()]);
        };

        let mut errors = Vec::new();
        self.block.validate(object, "", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_attribute(
    attribute: &Attribute,
    value: Option<&Value>,
    siblings: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<String>,
) {
    let name = join(path, attribute.name);

    let Some(value) = value else {
        if attribute.mode == AttributeMode::Required {
            errors.push(format!("{name}: required attribute is missing"));
        }
        return;
    };

    if attribute.mode == AttributeMode::Computed {
        errors.push(format!("{name}: value is computed and cannot be configured"));
        return;
    }

    for other in attribute.conflicts_with {
        // Report each pair once
        if attribute.name < *other && siblings.get(*other).is_some_and(is_set) {
            errors.push(format!(
                "{name}: conflicts with {}",
                join(path, other)
            ));
        }
    }

    match &attribute.kind {
        AttributeType::String => {
            let Some(s) = value.as_str() else {
                errors.push(format!("{name}: expected a string"));
                return;
            };
            if !attribute.valid_values.is_empty()
                && !attribute
                    .valid_values
                    .iter()
                    .any(|valid| valid.eq_ignore_ascii_case(s.trim()))
            {
                errors.push(format!(
                    "{name}: expected one of [{}], got {s:?}",
                    attribute.valid_values.join(", ")
                ));
            }
            if attribute.format == Some(ValueFormat::Date)
                && !s.is_empty()
                && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err()
            {
                errors.push(format!("{name}: {s:?} is not a valid YYYY-MM-DD date"));
            }
        }
        AttributeType::Int => {
            if !(value.is_i64() || value.is_u64()) {
                errors.push(format!("{name}: expected an integer"));
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                errors.push(format!("{name}: expected a boolean"));
            }
        }
        AttributeType::List(block) => {
            let Some(items) = value.as_array() else {
                errors.push(format!("{name}: expected a list"));
                return;
            };
            if items.len() < attribute.min_items {
                errors.push(format!(
                    "{name}: at least {} element(s) required",
                    attribute.min_items
                ));
            }
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{name}.{index}");
                match item.as_object() {
                    Some(object) => block.validate(object, &item_path, errors),
                    None => errors.push(format!("{item_path}: expected an object")),
                }
            }
        }
    }
}

fn is_set(value: &Value) -> bool {
    !value.is_null()
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}
