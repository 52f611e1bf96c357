use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::{
    error::{Constraint, ErrorCategory, ValidationError, ValidationErrors},
    node::{ArraySchema, NumberRules, SchemaKind, SchemaNode, StringRules, StructSchema, UnionSchema},
    path::Path,
};

impl SchemaNode {
    /// Validates `value`, returning the normalized value on success.
    ///
    /// The normalized value keeps only declared struct fields (plus passed
    /// through keys where a struct allows additional properties) and has the
    /// defaults of absent optional fields filled in. On failure every error
    /// found is returned, each located by its path.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationErrors> {
        let mut path = Path::root();
        let mut errors = Vec::new();
        let out = self.check(value, &mut path, &mut errors);
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(ValidationErrors::new(errors))
        }
    }

    /// Whether `value` validates. Errors are discarded.
    pub fn is_valid(&self, value: &Value) -> bool {
        let mut path = Path::root();
        let mut errors = Vec::new();
        self.check(value, &mut path, &mut errors);
        errors.is_empty()
    }

    pub(crate) fn check(
        &self,
        value: &Value,
        path: &mut Path,
        errors: &mut Vec<ValidationError>,
    ) -> Value {
        match &self.kind {
            SchemaKind::Any => value.clone(),
            SchemaKind::Boolean => {
                if !value.is_boolean() {
                    errors.push(mismatch(path, "boolean", value));
                }
                value.clone()
            }
            SchemaKind::String(rules) => {
                self.check_string(rules, value, path, errors);
                value.clone()
            }
            SchemaKind::Number(rules) => self.check_number(rules, value, path, errors),
            SchemaKind::Literal(values) => {
                if !values.contains(value) {
                    self.fail(Constraint::OneOf(values.clone()), value, path, errors);
                }
                value.clone()
            }
            SchemaKind::Struct(s) => check_struct(s, value, path, errors),
            SchemaKind::Array(array) => self.check_array(array, value, path, errors),
            SchemaKind::Record(values) => {
                let Value::Object(map) = value else {
                    errors.push(mismatch(path, "object", value));
                    return value.clone();
                };
                let mut out = Map::new();
                for (key, item) in map {
                    path.push_key(key.as_str());
                    out.insert(key.clone(), values.check(item, path, errors));
                    path.pop();
                }
                Value::Object(out)
            }
            SchemaKind::Union(union) => check_union(union, value, path, errors),
            SchemaKind::Optional(opt) => opt.inner.check(value, path, errors),
            SchemaKind::Deferred(d) => match d.get() {
                Some(node) => node.check(value, path, errors),
                None => {
                    errors.push(ValidationError::UnresolvedReference {
                        path: path.clone(),
                        name: d.name().to_string(),
                    });
                    value.clone()
                }
            },
        }
    }

    fn fail(
        &self,
        constraint: Constraint,
        value: &Value,
        path: &Path,
        errors: &mut Vec<ValidationError>,
    ) {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| constraint.to_string());
        errors.push(ValidationError::Constraint {
            path: path.clone(),
            constraint,
            message,
            actual: value.clone(),
        });
    }

    fn check_string(
        &self,
        rules: &StringRules,
        value: &Value,
        path: &Path,
        errors: &mut Vec<ValidationError>,
    ) {
        let Value::String(s) = value else {
            errors.push(mismatch(path, "string", value));
            return;
        };
        let len = s.chars().count();
        if let Some(min) = rules.min_length
            && len < min
        {
            self.fail(Constraint::MinLength(min), value, path, errors);
        }
        if let Some(max) = rules.max_length
            && len > max
        {
            self.fail(Constraint::MaxLength(max), value, path, errors);
        }
        if let Some(pattern) = &rules.pattern
            && !pattern.is_match(s)
        {
            self.fail(
                Constraint::Pattern(pattern.as_str().to_string()),
                value,
                path,
                errors,
            );
        }
    }

    /// Integer nodes return integral floats such as `1.0` as integers so
    /// the validated tree decodes into integer types.
    fn check_number(
        &self,
        rules: &NumberRules,
        value: &Value,
        path: &Path,
        errors: &mut Vec<ValidationError>,
    ) -> Value {
        let expected = if rules.integer { "integer" } else { "number" };
        let Some(n) = value.as_number() else {
            errors.push(mismatch(path, expected, value));
            return value.clone();
        };
        if rules.integer && !is_integral(n) {
            self.fail(Constraint::Integer, value, path, errors);
            return value.clone();
        }
        let Some(f) = n.as_f64() else {
            errors.push(mismatch(path, expected, value));
            return value.clone();
        };
        if let Some(min) = rules.minimum
            && f < min
        {
            self.fail(Constraint::Minimum(min), value, path, errors);
        }
        if let Some(max) = rules.maximum
            && f > max
        {
            self.fail(Constraint::Maximum(max), value, path, errors);
        }
        if rules.integer {
            Value::Number(as_integer(n))
        } else {
            value.clone()
        }
    }

    fn check_array(
        &self,
        array: &ArraySchema,
        value: &Value,
        path: &mut Path,
        errors: &mut Vec<ValidationError>,
    ) -> Value {
        let Value::Array(items) = value else {
            errors.push(mismatch(path, "array", value));
            return value.clone();
        };
        if let Some(min) = array.min_items
            && items.len() < min
        {
            self.fail(Constraint::MinItems(min), value, path, errors);
        }
        if let Some(max) = array.max_items
            && items.len() > max
        {
            self.fail(Constraint::MaxItems(max), value, path, errors);
        }

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            path.push_index(i);
            out.push(array.items.check(item, path, errors));
            path.pop();
        }

        for key in &array.unique_by {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for (i, item) in out.iter().enumerate() {
                let Some(v) = item.get(key) else {
                    continue;
                };
                if seen.insert(unique_key(v), i).is_some() {
                    let at = path.index(i).key(key.as_str());
                    self.fail(Constraint::UniqueBy(key.clone()), v, &at, errors);
                }
            }
        }
        Value::Array(out)
    }
}

fn check_struct(
    s: &StructSchema,
    value: &Value,
    path: &mut Path,
    errors: &mut Vec<ValidationError>,
) -> Value {
    let Value::Object(map) = value else {
        errors.push(mismatch(path, "object", value));
        return value.clone();
    };

    let mut out = Map::new();
    for field in &s.fields {
        path.push_key(field.name.as_str());
        match map.get(&field.name) {
            Some(v) => {
                out.insert(field.name.clone(), field.schema.check(v, path, errors));
            }
            None => match &field.schema.kind {
                SchemaKind::Optional(opt) => {
                    if let Some(default) = &opt.default {
                        out.insert(field.name.clone(), default.clone());
                    }
                }
                _ => errors.push(ValidationError::Missing { path: path.clone() }),
            },
        }
        path.pop();
    }

    for (key, v) in map {
        if s.field(key).is_some() {
            continue;
        }
        if s.additional_properties {
            out.insert(key.clone(), v.clone());
        } else {
            errors.push(ValidationError::UnknownProperty {
                path: path.key(key.as_str()),
                actual: v.clone(),
            });
        }
    }
    Value::Object(out)
}

fn check_union(
    union: &UnionSchema,
    value: &Value,
    path: &mut Path,
    errors: &mut Vec<ValidationError>,
) -> Value {
    if let Some(disc) = &union.discriminator {
        let Value::Object(map) = value else {
            errors.push(mismatch(path, "object", value));
            return value.clone();
        };
        let Some(tag) = map.get(&disc.field) else {
            errors.push(ValidationError::Missing {
                path: path.key(disc.field.as_str()),
            });
            return value.clone();
        };
        return match disc.variant_for(&union.variants, tag) {
            Some(i) => union.variants[i].check(value, path, errors),
            None => {
                errors.push(ValidationError::UnknownVariant {
                    path: path.key(disc.field.as_str()),
                    discriminator: disc.field.clone(),
                    tag: tag.as_str().map(str::to_string).unwrap_or_else(|| tag.to_string()),
                });
                value.clone()
            }
        };
    }

    // First success wins; otherwise report the attempt that got furthest.
    let mut attempts = Vec::with_capacity(union.variants.len());
    let mut best: Option<(usize, usize)> = None;
    for variant in &union.variants {
        let mut attempt = Vec::new();
        let out = variant.check(value, path, &mut attempt);
        if attempt.is_empty() {
            return out;
        }
        let reach = attempt.iter().map(|e| e.path().depth()).max().unwrap_or(0);
        if best.is_none_or(|(r, _)| reach > r) {
            best = Some((reach, attempts.len()));
        }
        attempts.push(attempt);
    }
    if let Some((reach, i)) = best
        && reach > path.depth()
    {
        errors.extend(attempts.swap_remove(i));
        return value.clone();
    }

    // A lone variant of the right JSON type keeps its own constraint errors.
    let mut typed = attempts
        .into_iter()
        .filter(|a| a.iter().all(|e| e.category() == ErrorCategory::Constraint));
    match (typed.next(), typed.next()) {
        (Some(only), None) => errors.extend(only),
        _ => errors.push(ValidationError::NoMatchingVariant {
            path: path.clone(),
            actual: value.clone(),
        }),
    }
    value.clone()
}

fn mismatch(path: &Path, expected: &str, value: &Value) -> ValidationError {
    ValidationError::TypeMismatch {
        path: path.clone(),
        expected: expected.to_string(),
        actual: value.clone(),
    }
}

fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// `n` as an `i64`/`u64` number when an integral float fits one.
fn as_integer(n: &Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n.clone();
    }
    match n.as_f64() {
        Some(f) if f >= i64::MIN as f64 && f < i64::MAX as f64 => Number::from(f as i64),
        Some(f) if f >= 0.0 && f < u64::MAX as f64 => Number::from(f as u64),
        _ => n.clone(),
    }
}

/// Comparison key for unique-by checks; `1` and `1.0` collide.
fn unique_key(v: &Value) -> String {
    match v {
        Value::Number(n) if is_integral(n) => as_integer(n).to_string(),
        other => other.to_string(),
    }
}
