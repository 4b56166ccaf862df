//! Add/edit form state for a single entity.
//!
//! The form keeps every value the user entered across failed submissions and
//! holds the server's per-field messages until the next submit.

use crate::api::models::{Entity, EntityId, FieldErrors, FileUpload, MultipartBody, RequestBody};
use crate::api::resource::ResourceApi;
use crate::core::i18n::{Translate, scoped};
use crate::core::notifier::{Level, Notifier};
use crate::error::{ApiError, AppError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fields the server assigns; never sent back on edit.
const SERVER_FIELDS: &[&str] = &["id", "created_at", "updated_at", "deleted_at"];

/// Fields backed by an uploaded file. The server reports them as the stored
/// file's URL, which it will not accept back as input.
const FILE_FIELDS: &[&str] = &["image", "photo", "avatar", "logo"];

fn is_file_field(field: &str) -> bool {
    FILE_FIELDS.contains(&field)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    File(FileUpload),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(Value::String(value))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<FileUpload> for FieldValue {
    fn from(upload: FileUpload) -> Self {
        FieldValue::File(upload)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit(EntityId),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Stored by the server; callers usually navigate away.
    Saved(Entity),
    /// The server reported field errors; they are available via `errors()`.
    Rejected,
    /// Any other failure. Values are kept so the user can retry.
    Failed(AppError),
}

pub struct EntityForm {
    api: Arc<dyn ResourceApi>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translate>,
    mode: FormMode,
    values: BTreeMap<String, FieldValue>,
    stored_files: BTreeMap<String, String>,
    errors: FieldErrors,
}

impl EntityForm {
    pub fn create(
        api: Arc<dyn ResourceApi>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translate>,
    ) -> Self {
        Self {
            api,
            notifier,
            translator,
            mode: FormMode::Create,
            values: BTreeMap::new(),
            stored_files: BTreeMap::new(),
            errors: FieldErrors::default(),
        }
    }

    /// Open an edit form prefilled with the entity's current scalar fields.
    /// File fields start empty; their current URL is kept for display only.
    pub async fn edit(
        api: Arc<dyn ResourceApi>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translate>,
        id: EntityId,
    ) -> crate::Result<Self> {
        let entity = api.get_by_id(&id).await?;
        let mut form = Self::create(api, notifier, translator);
        form.mode = FormMode::Edit(id);
        for (field, value) in entity {
            if SERVER_FIELDS.contains(&field.as_str()) || value.is_object() || value.is_array() {
                continue;
            }
            if is_file_field(&field) {
                if let Value::String(url) = value {
                    form.stored_files.insert(field, url);
                }
                continue;
            }
            form.values.insert(field, FieldValue::Value(value));
        }
        Ok(form)
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn set_file(&mut self, field: &str, upload: FileUpload) {
        self.values
            .insert(field.to_string(), FieldValue::File(upload));
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Scalar value of a field rendered as text.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field)? {
            FieldValue::Value(Value::String(s)) => Some(s.clone()),
            FieldValue::Value(Value::Null) => None,
            FieldValue::Value(other) => Some(other.to_string()),
            FieldValue::File(upload) => Some(upload.file_name.clone()),
        }
    }

    /// URL of the file currently stored for `field` on the server.
    pub fn stored_file(&self, field: &str) -> Option<&str> {
        self.stored_files.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn first_error(&self, field: &str) -> Option<&str> {
        self.errors.first(field)
    }

    /// Encode the current values: multipart when any field carries a file,
    /// JSON otherwise. Null values are left out of multipart bodies, and file
    /// fields are only sent when they hold an actual upload.
    pub fn body(&self) -> RequestBody {
        let has_file = self
            .values
            .values()
            .any(|value| matches!(value, FieldValue::File(_)));
        let sendable = self.values.iter().filter(|(name, value)| {
            !is_file_field(name) || matches!(value, FieldValue::File(_))
        });

        if !has_file {
            let fields: Entity = sendable
                .filter_map(|(name, value)| match value {
                    FieldValue::Value(v) => Some((name.clone(), v.clone())),
                    FieldValue::File(_) => None,
                })
                .collect();
            return RequestBody::Json(fields);
        }

        let mut body = MultipartBody::new();
        for (name, value) in sendable {
            body = match value {
                FieldValue::Value(Value::Null) => body,
                FieldValue::Value(Value::String(s)) => body.text(name.clone(), s.clone()),
                FieldValue::Value(Value::Bool(b)) => body.text(name.clone(), if *b { "1" } else { "0" }),
                FieldValue::Value(other) => body.text(name.clone(), other.to_string()),
                FieldValue::File(upload) => body.file(name.clone(), upload.clone()),
            };
        }
        RequestBody::Multipart(body)
    }

    /// Send the form. Field errors from the server are stored on the form;
    /// entered values are never cleared by a failed submit. Taking `&mut self`
    /// rules out a second submit while one is running.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.errors = FieldErrors::default();

        let body = self.body();
        let result = match &self.mode {
            FormMode::Create => self.api.create(body).await,
            FormMode::Edit(id) => self.api.update(id, body).await,
        };

        let resource = self.api.resource().to_string();
        let t = |key: &str| scoped(self.translator.as_ref(), &resource, key);

        match result {
            Ok(entity) => {
                self.notifier.toast(Level::Success, &t("save_success"));
                SubmitOutcome::Saved(entity)
            }
            Err(AppError::Api(ApiError::Validation { errors, message, .. })) => {
                let detail = if errors.is_empty() {
                    message
                } else {
                    errors.summary()
                };
                self.notifier
                    .alert(Level::Warning, &t("validation_error"), Some(&detail));
                self.errors = errors;
                SubmitOutcome::Rejected
            }
            Err(err) => {
                log::warn!("saving {} failed: {}", resource, err);
                self.notifier
                    .alert(Level::Error, &t("save_error"), Some(&err.display_friendly()));
                SubmitOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{MultipartField, Paginated};
    use crate::core::i18n::Catalog;
    use crate::core::notifier::RecordingNotifier;
    use crate::storage::download::DownloadSink;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::PathBuf;

    struct Unreachable;

    #[async_trait]
    impl ResourceApi for Unreachable {
        fn resource(&self) -> &str {
            "products"
        }
        async fn list(&self) -> crate::Result<Vec<Entity>> {
            unreachable!()
        }
        async fn list_paginated(&self, _: u32, _: Option<&str>) -> crate::Result<Paginated> {
            unreachable!()
        }
        async fn get_by_id(&self, _: &EntityId) -> crate::Result<Entity> {
            unreachable!()
        }
        async fn create(&self, _: RequestBody) -> crate::Result<Entity> {
            unreachable!()
        }
        async fn update(&self, _: &EntityId, _: RequestBody) -> crate::Result<Entity> {
            unreachable!()
        }
        async fn delete_by_id(&self, _: &EntityId) -> crate::Result<()> {
            unreachable!()
        }
        async fn export_pdf(&self, _: &dyn DownloadSink) -> crate::Result<PathBuf> {
            unreachable!()
        }
    }

    fn form() -> EntityForm {
        EntityForm::create(
            Arc::new(Unreachable),
            Arc::new(RecordingNotifier::new(true)),
            Arc::new(Catalog::english()),
        )
    }

    #[test]
    fn test_scalar_fields_encode_as_json() {
        let mut form = form();
        form.set("name", "Widget");
        form.set("price", json!(9.5));

        match form.body() {
            RequestBody::Json(fields) => {
                assert_eq!(Value::Object(fields), json!({"name": "Widget", "price": 9.5}));
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_file_field_switches_to_multipart() {
        let mut form = form();
        form.set("name", "Widget");
        form.set("active", json!(true));
        form.set("discount", Value::Null);
        form.set_file("image", FileUpload::new("w.png", "image/png", vec![0x89, 0x50]));

        let RequestBody::Multipart(body) = form.body() else {
            panic!("expected multipart body");
        };
        let parts = body.parts();
        assert_eq!(parts.len(), 3);
        assert!(parts.contains(&("active".to_string(), MultipartField::Text("1".to_string()))));
        assert!(parts.iter().all(|(name, _)| name != "discount"));
        assert!(
            parts
                .iter()
                .any(|(name, field)| name == "image" && matches!(field, MultipartField::File(_)))
        );
    }

    #[test]
    fn test_file_field_text_is_never_sent() {
        let mut form = form();
        form.set("name", "Widget 2");
        form.set("image", "http://api.test/storage/products/w.png");

        let RequestBody::Json(fields) = form.body() else {
            panic!("expected JSON body");
        };
        assert_eq!(Value::Object(fields), json!({"name": "Widget 2"}));

        form.set_file("manual", FileUpload::new("m.pdf", "application/pdf", vec![1]));
        let RequestBody::Multipart(body) = form.body() else {
            panic!("expected multipart body");
        };
        assert!(body.parts().iter().all(|(name, _)| name != "image"));
    }

    #[test]
    fn test_text_view() {
        let mut form = form();
        form.set("name", "Acme");
        form.set("stock", json!(12));
        assert_eq!(form.text("name").as_deref(), Some("Acme"));
        assert_eq!(form.text("stock").as_deref(), Some("12"));
        assert_eq!(form.text("missing"), None);
        assert_eq!(form.mode(), &FormMode::Create);
    }
}
