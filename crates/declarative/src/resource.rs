//! Typed resources and their type-erased handlers
//!
//! A resource kind is written once as a [`CustomResource`] with typed inputs
//! (`Args`) and outputs (`State`). [`Inferred`] adapts it to the
//! property-map based [`ResourceHandler`] the provider dispatches to.

use crate::context::ApplyContext;
use crate::diff::diff_properties;
use crate::error::{Error, Result};
use crate::property::{PropertyMap, PropertyValue};
use crate::types::{
    CheckFailure, CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest,
    DiffRequest, DiffResponse, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Schema type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    /// Object whose values are all strings
    StringMap,
    Object,
}

impl PropertyType {
    /// Check a value against this type; computed values always pass
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (_, PropertyValue::Computed) => true,
            (Self::String, PropertyValue::String(_)) => true,
            (Self::Integer, PropertyValue::Number(n)) => n.fract() == 0.0,
            (Self::Number, PropertyValue::Number(_)) => true,
            (Self::Boolean, PropertyValue::Bool(_)) => true,
            (Self::StringMap, PropertyValue::Object(map)) => map
                .iter()
                .all(|(_, v)| matches!(v, PropertyValue::String(_) | PropertyValue::Computed)),
            (Self::Object, PropertyValue::Object(_)) => true,
            _ => false,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::StringMap => "a map of strings",
            Self::Object => "an object",
        }
    }
}

/// Description of one input or output property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub required: bool,
    /// Output only known after the resource is created
    pub computed: bool,
    pub description: String,
}

impl PropertySpec {
    pub fn new(name: &str, kind: PropertyType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            computed: false,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Schema of a resource kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    pub description: String,
    pub inputs: Vec<PropertySpec>,
    pub outputs: Vec<PropertySpec>,
}

impl ResourceSchema {
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|p| p.name.as_str())
    }

    pub fn computed_outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs
            .iter()
            .filter(|p| p.computed)
            .map(|p| p.name.as_str())
    }
}

/// A resource kind with typed inputs and outputs
///
/// Only [`create`](CustomResource::create) is mandatory:
/// - `check`: validates inputs against [`schema`](CustomResource::schema)
/// - `diff`: compares inputs; every change forces a replacement
/// - `update`: unsupported, so changes are applied by replacement
/// - `read`: returns the stored id and state unchanged
/// - `delete`: nothing to clean up
pub trait CustomResource: Send + Sync + 'static {
    /// Inputs accepted by the resource
    type Args: Serialize + DeserializeOwned + Send;
    /// Fields that exist on the created resource
    type State: Serialize + DeserializeOwned + Send;

    /// Type name, the last segment of the type token
    const TYPE_NAME: &'static str;

    /// Module the resource is declared in, before module mapping
    const MODULE: &'static str = "provider";

    /// Describe the resource's properties
    fn schema(&self) -> ResourceSchema;

    /// Validate new inputs
    fn check(
        &self,
        _ctx: &ApplyContext,
        _name: &str,
        _olds: &PropertyMap,
        news: &PropertyMap,
    ) -> Result<CheckResponse> {
        Ok(check_inputs::<Self::Args>(
            Self::TYPE_NAME,
            &self.schema(),
            news,
        ))
    }

    /// Create the resource, returning its id and state
    fn create(
        &self,
        ctx: &ApplyContext,
        name: &str,
        args: Self::Args,
    ) -> Result<(String, Self::State)>;

    /// Compare the old state with new inputs
    fn diff(
        &self,
        _ctx: &ApplyContext,
        _id: &str,
        olds: &Self::State,
        news: &Self::Args,
    ) -> Result<DiffResponse> {
        let olds = PropertyMap::from_typed(olds)?;
        let news = PropertyMap::from_typed(news)?;
        let schema = self.schema();
        Ok(diff_properties(&olds, &news, schema.input_names(), true))
    }

    /// Update the resource in place
    fn update(
        &self,
        _ctx: &ApplyContext,
        _id: &str,
        _olds: Self::State,
        _news: Self::Args,
    ) -> Result<Self::State> {
        Err(Error::UpdateUnsupported(Self::TYPE_NAME.to_string()))
    }

    /// Read the live state of the resource
    ///
    /// Returns the id it lives under now, which differs from `id` when the
    /// resource was recreated outside the engine.
    fn read(
        &self,
        _ctx: &ApplyContext,
        id: &str,
        state: Self::State,
    ) -> Result<(String, Self::State)> {
        Ok((id.to_string(), state))
    }

    /// Delete the resource
    fn delete(&self, _ctx: &ApplyContext, _id: &str, _state: Self::State) -> Result<()> {
        Ok(())
    }
}

/// Validate inputs against a schema and decode them into `A`
///
/// Reports every missing required property and every type mismatch. Decoding
/// is only attempted when the schema checks pass.
pub fn check_inputs<A: DeserializeOwned>(
    type_name: &str,
    schema: &ResourceSchema,
    news: &PropertyMap,
) -> CheckResponse {
    let mut failures = Vec::new();

    for spec in &schema.inputs {
        match news.get(&spec.name) {
            None | Some(PropertyValue::Null) if spec.required => failures.push(CheckFailure::new(
                &spec.name,
                format!("missing required property '{}'", spec.name),
            )),
            Some(value) if !value.is_null() && !spec.kind.accepts(value) => {
                failures.push(CheckFailure::new(
                    &spec.name,
                    format!(
                        "expected {}, found {}",
                        spec.kind.describe(),
                        value.kind()
                    ),
                ));
            }
            _ => {}
        }
    }

    if failures.is_empty()
        && !news.contains_computed()
        && let Err(err) = news.to_typed::<A>(type_name, "inputs")
    {
        failures.push(CheckFailure::new("", err.to_string()));
    }

    CheckResponse {
        inputs: news.clone(),
        failures,
    }
}

/// Property-map interface the provider dispatches requests to
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn module(&self) -> &'static str;
    fn schema(&self) -> ResourceSchema;
    fn check(&self, ctx: &ApplyContext, req: &CheckRequest) -> Result<CheckResponse>;
    fn diff(&self, ctx: &ApplyContext, req: &DiffRequest) -> Result<DiffResponse>;
    fn create(&self, ctx: &ApplyContext, req: &CreateRequest) -> Result<CreateResponse>;
    fn update(&self, ctx: &ApplyContext, req: &UpdateRequest) -> Result<UpdateResponse>;
    fn read(&self, ctx: &ApplyContext, req: &ReadRequest) -> Result<ReadResponse>;
    fn delete(&self, ctx: &ApplyContext, req: &DeleteRequest) -> Result<()>;
}

/// Adapter exposing a [`CustomResource`] as a [`ResourceHandler`]
pub struct Inferred<R>(pub R);

impl<R: CustomResource> Inferred<R> {
    fn decode_args(&self, props: &PropertyMap) -> Result<R::Args> {
        props.to_typed(R::TYPE_NAME, "inputs")
    }

    fn decode_state(&self, props: &PropertyMap) -> Result<R::State> {
        props.to_typed(R::TYPE_NAME, "state")
    }

    /// Encode state; in preview, computed outputs are marked unknown
    fn encode_state(&self, ctx: &ApplyContext, state: &R::State) -> Result<PropertyMap> {
        let mut props = PropertyMap::from_typed(state)?;
        if ctx.preview {
            for name in self.0.schema().computed_outputs() {
                props.insert(name, PropertyValue::Computed);
            }
        }
        Ok(props)
    }
}

impl<R: CustomResource> ResourceHandler for Inferred<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn module(&self) -> &'static str {
        R::MODULE
    }

    fn schema(&self) -> ResourceSchema {
        self.0.schema()
    }

    fn check(&self, ctx: &ApplyContext, req: &CheckRequest) -> Result<CheckResponse> {
        self.0.check(ctx, req.urn.name(), &req.olds, &req.news)
    }

    fn diff(&self, ctx: &ApplyContext, req: &DiffRequest) -> Result<DiffResponse> {
        let olds = self.decode_state(&req.olds)?;
        let news = self.decode_args(&req.news)?;
        self.0.diff(ctx, &req.id, &olds, &news)
    }

    fn create(&self, ctx: &ApplyContext, req: &CreateRequest) -> Result<CreateResponse> {
        let args = self.decode_args(&req.properties)?;
        let (id, state) = self.0.create(ctx, req.urn.name(), args)?;
        Ok(CreateResponse {
            id,
            properties: self.encode_state(ctx, &state)?,
        })
    }

    fn update(&self, ctx: &ApplyContext, req: &UpdateRequest) -> Result<UpdateResponse> {
        let olds = self.decode_state(&req.olds)?;
        let news = self.decode_args(&req.news)?;
        let state = self.0.update(ctx, &req.id, olds, news)?;
        Ok(UpdateResponse {
            properties: PropertyMap::from_typed(&state)?,
        })
    }

    fn read(&self, ctx: &ApplyContext, req: &ReadRequest) -> Result<ReadResponse> {
        let state = self.decode_state(&req.properties)?;
        let (id, state) = self.0.read(ctx, &req.id, state)?;
        Ok(ReadResponse {
            id,
            properties: PropertyMap::from_typed(&state)?,
        })
    }

    fn delete(&self, ctx: &ApplyContext, req: &DeleteRequest) -> Result<()> {
        let state = self.decode_state(&req.properties)?;
        self.0.delete(ctx, &req.id, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiffKind;
    use crate::urn::{TypeToken, Urn};

    #[derive(Debug, Serialize, Deserialize)]
    struct CounterArgs {
        start: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct CounterState {
        start: i64,
        value: i64,
    }

    struct Counter;

    impl CustomResource for Counter {
        type Args = CounterArgs;
        type State = CounterState;
        const TYPE_NAME: &'static str = "Counter";

        fn schema(&self) -> ResourceSchema {
            ResourceSchema {
                description: "A counter".into(),
                inputs: vec![PropertySpec::new("start", PropertyType::Integer).required()],
                outputs: vec![
                    PropertySpec::new("start", PropertyType::Integer).required(),
                    PropertySpec::new("value", PropertyType::Integer).computed(),
                ],
            }
        }

        fn create(
            &self,
            _ctx: &ApplyContext,
            name: &str,
            args: CounterArgs,
        ) -> Result<(String, CounterState)> {
            Ok((
                name.to_string(),
                CounterState {
                    start: args.start,
                    value: args.start + 1,
                },
            ))
        }
    }

    fn urn() -> Urn {
        Urn::new(
            "stack",
            "proj",
            TypeToken::parse("test:index:Counter").unwrap(),
            "name",
        )
    }

    #[test]
    fn test_check_reports_missing_and_mistyped() {
        let handler = Inferred(Counter);
        let ctx = ApplyContext::default();

        let missing = handler
            .check(
                &ctx,
                &CheckRequest {
                    urn: urn(),
                    olds: PropertyMap::new(),
                    news: PropertyMap::new(),
                },
            )
            .unwrap();
        assert_eq!(missing.failures.len(), 1);
        assert_eq!(missing.failures[0].property, "start");

        let mistyped = handler
            .check(
                &ctx,
                &CheckRequest {
                    urn: urn(),
                    olds: PropertyMap::new(),
                    news: PropertyMap::new().with("start", 1.5),
                },
            )
            .unwrap();
        assert_eq!(mistyped.failures.len(), 1);
        assert!(mistyped.failures[0].reason.contains("integer"));
    }

    #[test]
    fn test_preview_create_marks_computed() {
        let handler = Inferred(Counter);
        let req = CreateRequest {
            urn: urn(),
            properties: PropertyMap::new().with("start", 1i64),
        };

        let preview = handler.create(&ApplyContext::new(true, false), &req).unwrap();
        assert!(preview.properties.get("value").unwrap().is_computed());

        let real = handler.create(&ApplyContext::default(), &req).unwrap();
        assert_eq!(real.id, "name");
        assert_eq!(real.properties.get("value"), Some(&PropertyValue::Number(2.0)));
    }

    #[test]
    fn test_default_diff_replaces_and_ignores_outputs() {
        let handler = Inferred(Counter);
        let ctx = ApplyContext::default();
        let olds = PropertyMap::new().with("start", 1i64).with("value", 2i64);

        let same = handler
            .diff(
                &ctx,
                &DiffRequest {
                    id: "name".into(),
                    urn: urn(),
                    olds: olds.clone(),
                    news: PropertyMap::new().with("start", 1i64),
                },
            )
            .unwrap();
        assert!(!same.has_changes);

        let changed = handler
            .diff(
                &ctx,
                &DiffRequest {
                    id: "name".into(),
                    urn: urn(),
                    olds,
                    news: PropertyMap::new().with("start", 5i64),
                },
            )
            .unwrap();
        assert!(changed.requires_replace());
        assert_eq!(changed.detailed_diff["start"].kind, DiffKind::UpdateReplace);
    }

    #[test]
    fn test_default_update_unsupported() {
        let handler = Inferred(Counter);
        let err = handler
            .update(
                &ApplyContext::default(),
                &UpdateRequest {
                    id: "name".into(),
                    urn: urn(),
                    olds: PropertyMap::new().with("start", 1i64).with("value", 2i64),
                    news: PropertyMap::new().with("start", 5i64),
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::UpdateUnsupported(_)));
    }
}
