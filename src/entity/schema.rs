use std::collections::HashMap;

use serde_json::Value;

use crate::database::store::Row;
use crate::entity::EntityKind;

/// Campuses the party operates on. Meeting scope adds "general".
pub const CAMPUSES: &[&str] = &["rangsit", "tha_prachan", "lampang"];
pub const MEETING_SCOPES: &[&str] = &["general", "rangsit", "tha_prachan", "lampang"];
pub const MOTION_RESULTS: &[&str] = &["passed", "failed", "withdrawn"];

/// Submitted field set: form key to raw string value. Checkbox booleans
/// are encoded as key presence.
pub type FieldSet = HashMap<String, String>;

#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Text,
    /// Absolute URL
    Url,
    /// ISO date, YYYY-MM-DD
    Date,
    /// Checkbox flag: presence means true
    Flag,
    /// One value out of a fixed enumeration
    Choice(&'static [&'static str]),
    /// Set of ids gathered from checkbox keys sharing a prefix,
    /// stored as a loosely-typed JSON list
    IdSet { prefix: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Form field key as submitted by the client
    pub key: &'static str,
    /// Database column the value lands in
    pub column: &'static str,
    pub ty: FieldType,
    pub required: bool,
    /// Value used when the field is absent from the submission
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn required(key: &'static str, column: &'static str, ty: FieldType) -> Self {
        Self { key, column, ty, required: true, default: None }
    }

    const fn optional(key: &'static str, column: &'static str, ty: FieldType) -> Self {
        Self { key, column, ty, required: false, default: None }
    }

    const fn defaulted(key: &'static str, column: &'static str, ty: FieldType, default: &'static str) -> Self {
        Self { key, column, ty, required: false, default: Some(default) }
    }
}

/// Per-entity validation schema. One registry entry per entity type;
/// the generic pipeline dispatches on it instead of each form carrying
/// its own copy of the rules.
#[derive(Debug)]
pub struct EntitySchema {
    pub fields: &'static [FieldSpec],
    /// Column the list view's search box matches against
    pub search_column: &'static str,
}

static POLICY: EntitySchema = EntitySchema {
    fields: &[
        FieldSpec::required("title", "title", FieldType::Text),
        FieldSpec::optional("description", "description", FieldType::Text),
        FieldSpec::defaulted("file_url", "file_url", FieldType::Text, ""),
    ],
    search_column: "title",
};

static COMMITTEE: EntitySchema = EntitySchema {
    fields: &[
        FieldSpec::required("name", "name", FieldType::Text),
        FieldSpec::optional("description", "description", FieldType::Text),
    ],
    search_column: "name",
};

static EVENT: EntitySchema = EntitySchema {
    fields: &[
        FieldSpec::required("title", "title", FieldType::Text),
        FieldSpec::required("description", "description", FieldType::Text),
        FieldSpec::required("eventDate", "event_date", FieldType::Date),
        FieldSpec::optional("location", "location", FieldType::Text),
    ],
    search_column: "title",
};

static NEWS: EntitySchema = EntitySchema {
    fields: &[
        FieldSpec::required("title", "title", FieldType::Text),
        FieldSpec::required("content", "content", FieldType::Text),
        FieldSpec::required("publishDate", "publish_date", FieldType::Date),
        FieldSpec::optional("imageUrl", "image_url", FieldType::Url),
    ],
    search_column: "title",
};

static PERSONNEL: EntitySchema = EntitySchema {
    fields: &[
        FieldSpec::required("name", "name", FieldType::Text),
        FieldSpec::optional("is_party_member", "is_party_member", FieldType::Flag),
        FieldSpec::optional("is_mp", "is_mp", FieldType::Flag),
        FieldSpec::optional("is_executive", "is_executive", FieldType::Flag),
        FieldSpec::required("campus", "campus", FieldType::Choice(CAMPUSES)),
        FieldSpec::optional("committees", "committees", FieldType::IdSet { prefix: "committee-" }),
        FieldSpec::optional("is_active", "is_active", FieldType::Flag),
    ],
    search_column: "name",
};

static MEETING: EntitySchema = EntitySchema {
    fields: &[
        FieldSpec::required("topic", "topic", FieldType::Text),
        FieldSpec::required("date", "meeting_date", FieldType::Date),
        FieldSpec::required("scope", "scope", FieldType::Choice(MEETING_SCOPES)),
    ],
    search_column: "topic",
};

static MOTION: EntitySchema = EntitySchema {
    fields: &[
        FieldSpec::required("title", "title", FieldType::Text),
        FieldSpec::optional("details", "details", FieldType::Text),
        FieldSpec::optional("meeting_id", "meeting_id", FieldType::Text),
        FieldSpec::optional("proposer_id", "proposer_id", FieldType::Text),
        FieldSpec::optional("result", "result", FieldType::Choice(MOTION_RESULTS)),
    ],
    search_column: "title",
};

pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Policy => &POLICY,
        EntityKind::Committee => &COMMITTEE,
        EntityKind::Event => &EVENT,
        EntityKind::News => &NEWS,
        EntityKind::Personnel => &PERSONNEL,
        EntityKind::Meeting => &MEETING,
        EntityKind::Motion => &MOTION,
    }
}

impl EntitySchema {
    /// Map a raw submission onto typed column values. Checkbox flags
    /// become booleans (absent means false), id-set prefixes collapse
    /// into a JSON list. Keys the schema does not declare are dropped.
    ///
    /// Declared defaults fill absent fields only when `apply_defaults`
    /// is set; an update must touch only the submitted fields, so
    /// defaults there would clobber stored values.
    pub fn coerce(&self, fields: &FieldSet, apply_defaults: bool) -> Row {
        let mut row = Row::new();
        for spec in self.fields {
            match spec.ty {
                FieldType::Flag => {
                    row.insert(spec.column.to_string(), Value::Bool(fields.contains_key(spec.key)));
                }
                FieldType::IdSet { prefix } => {
                    let mut ids: Vec<Value> = fields
                        .keys()
                        .filter_map(|k| k.strip_prefix(prefix))
                        .map(|id| Value::String(id.to_string()))
                        .collect();
                    ids.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
                    row.insert(spec.column.to_string(), Value::Array(ids));
                }
                _ => {
                    if let Some(value) = fields.get(spec.key) {
                        row.insert(spec.column.to_string(), Value::String(value.trim().to_string()));
                    } else if let (true, Some(default)) = (apply_defaults, spec.default) {
                        row.insert(spec.column.to_string(), Value::String(default.to_string()));
                    }
                }
            }
        }
        row
    }

    /// Validate coerced values. Errors are keyed by the submitted form
    /// key so the rendering layer can place them inline.
    pub fn validate(&self, row: &Row) -> Result<(), HashMap<String, String>> {
        let mut errors = HashMap::new();

        for spec in self.fields {
            let value = row.get(spec.column);
            let text = value.and_then(|v| v.as_str()).map(str::trim);

            if spec.required && text.map(str::is_empty).unwrap_or(true) {
                errors.insert(spec.key.to_string(), "This field is required".to_string());
                continue;
            }

            let text = match text {
                Some(t) if !t.is_empty() => t,
                _ => continue,
            };

            match spec.ty {
                FieldType::Url => {
                    if url::Url::parse(text).is_err() {
                        errors.insert(spec.key.to_string(), "Must be a valid URL".to_string());
                    }
                }
                FieldType::Date => {
                    if chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err() {
                        errors.insert(
                            spec.key.to_string(),
                            "Must be a valid date (YYYY-MM-DD)".to_string(),
                        );
                    }
                }
                FieldType::Choice(options) => {
                    if !options.contains(&text) {
                        errors.insert(
                            spec.key.to_string(),
                            format!("Must be one of: {}", options.join(", ")),
                        );
                    }
                }
                FieldType::Text | FieldType::Flag | FieldType::IdSet { .. } => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
