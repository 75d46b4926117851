//! JSON Schema (draft-07) export of a curation schema, for form builders and
//! external validators.

use serde_json::{json, Map, Value};

use crate::model::{CurationSchema, FieldDefinition, FieldType};

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";
const PMID_MAX: u64 = 9_999_999_999;

pub fn generate_json_schema(schema: &CurationSchema) -> Value {
    let (properties, required) = object_members(&schema.field_definitions);
    let mut doc = json!({
        "$schema": DRAFT_07,
        "type": "object",
        "title": format!("{} v{}", schema.name, schema.version),
        "properties": properties,
        "required": required,
    });
    if let (Some(description), Value::Object(map)) = (&schema.description, &mut doc) {
        map.insert("description".into(), json!(description));
    }
    doc
}

fn object_members(
    fields: &std::collections::BTreeMap<String, FieldDefinition>,
) -> (Map<String, Value>, Vec<String>) {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, def) in fields {
        properties.insert(name.clone(), field_schema(def));
        if def.required {
            required.push(name.clone());
        }
    }
    (properties, required)
}

fn field_schema(def: &FieldDefinition) -> Value {
    let mut prop = Map::new();
    let enum_values = || Value::Array(def.option_values().into_iter().cloned().collect());

    match &def.field_type {
        FieldType::Number | FieldType::Score => {
            prop.insert("type".into(), json!("number"));
        }
        FieldType::Boolean => {
            prop.insert("type".into(), json!("boolean"));
        }
        FieldType::Array => {
            prop.insert("type".into(), json!("array"));
            if let Some(items) = &def.items {
                prop.insert("items".into(), field_schema(items));
            }
        }
        FieldType::Object => {
            prop.insert("type".into(), json!("object"));
            if !def.properties.is_empty() {
                let (properties, required) = object_members(&def.properties);
                prop.insert("properties".into(), Value::Object(properties));
                if !required.is_empty() {
                    prop.insert("required".into(), json!(required));
                }
            }
        }
        FieldType::Date => {
            prop.insert("type".into(), json!("string"));
            prop.insert("format".into(), json!("date"));
        }
        FieldType::Select => {
            prop.insert("type".into(), json!("string"));
            if !def.options.is_empty() {
                prop.insert("enum".into(), enum_values());
            }
        }
        FieldType::Multiselect => {
            prop.insert("type".into(), json!("array"));
            let mut items = json!({"type": "string"});
            if !def.options.is_empty() {
                items["enum"] = enum_values();
            }
            prop.insert("items".into(), items);
            prop.insert("uniqueItems".into(), json!(true));
        }
        FieldType::Email => {
            prop.insert("type".into(), json!("string"));
            prop.insert("format".into(), json!("email"));
        }
        FieldType::Url => {
            prop.insert("type".into(), json!("string"));
            prop.insert("format".into(), json!("uri"));
        }
        FieldType::Pmid => {
            // digit strings or non-negative integers of at most ten digits
            prop.insert("type".into(), json!(["string", "integer"]));
            prop.insert("pattern".into(), json!("^[0-9]{1,10}$"));
            prop.insert("minimum".into(), json!(0));
            prop.insert("maximum".into(), json!(PMID_MAX));
        }
        FieldType::HgncId => {
            prop.insert("type".into(), json!("string"));
            prop.insert("pattern".into(), json!("^HGNC:[0-9]+$"));
        }
        FieldType::Text | FieldType::Unknown(_) => {
            prop.insert("type".into(), json!("string"));
        }
    }

    if let Some(n) = def.min_length {
        prop.insert("minLength".into(), json!(n));
    }
    if let Some(n) = def.max_length {
        prop.insert("maxLength".into(), json!(n));
    }
    if let Some(p) = &def.pattern {
        prop.insert("pattern".into(), json!(p));
    }
    if let Some(n) = def.min_value {
        prop.insert("minimum".into(), json!(n));
    }
    if let Some(n) = def.max_value {
        prop.insert("maximum".into(), json!(n));
    }
    if let Some(n) = def.min_items {
        prop.insert("minItems".into(), json!(n));
    }
    if let Some(n) = def.max_items {
        prop.insert("maxItems".into(), json!(n));
    }
    if let Some(label) = &def.label {
        prop.insert("title".into(), json!(label));
    }
    if let Some(description) = &def.description {
        prop.insert("description".into(), json!(description));
    }
    Value::Object(prop)
}
