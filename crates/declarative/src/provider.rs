//! Provider - dispatches lifecycle requests to registered resources

use crate::context::ApplyContext;
use crate::error::{Error, Result};
use crate::resource::{CustomResource, Inferred, ResourceHandler};
use crate::types::{
    CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest, DiffRequest,
    DiffResponse, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use crate::urn::{TypeToken, Urn};
use semver::Version;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// A named, versioned set of resource handlers
pub struct Provider {
    name: String,
    version: Version,
    handlers: BTreeMap<TypeToken, Box<dyn ResourceHandler>>,
}

/// Builder for [`Provider`]
pub struct ProviderBuilder {
    name: String,
    version: Version,
    module_map: BTreeMap<String, String>,
    handlers: Vec<Box<dyn ResourceHandler>>,
}

impl ProviderBuilder {
    /// Publish resources declared in module `from` under module `to`
    pub fn module(mut self, from: &str, to: &str) -> Self {
        self.module_map.insert(from.to_string(), to.to_string());
        self
    }

    /// Register a typed resource
    pub fn resource<R: CustomResource>(mut self, resource: R) -> Self {
        self.handlers.push(Box::new(Inferred(resource)));
        self
    }

    pub fn build(self) -> Provider {
        let mut handlers = BTreeMap::new();
        for handler in self.handlers {
            let module = self
                .module_map
                .get(handler.module())
                .map_or(handler.module(), String::as_str);
            let token = TypeToken::new(&self.name, module, handler.type_name());
            log::trace!("Registered resource {}", token);
            handlers.insert(token, handler);
        }

        Provider {
            name: self.name,
            version: self.version,
            handlers,
        }
    }
}

impl Provider {
    pub fn builder(name: &str, version: Version) -> ProviderBuilder {
        ProviderBuilder {
            name: name.to_string(),
            version,
            module_map: BTreeMap::new(),
            handlers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Type tokens of all registered resources
    pub fn tokens(&self) -> impl Iterator<Item = &TypeToken> {
        self.handlers.keys()
    }

    /// Find the handler for a type token
    ///
    /// Falls back to matching `module:Type` when the package differs.
    pub fn handler(&self, token: &TypeToken) -> Result<&dyn ResourceHandler> {
        if let Some(handler) = self.handlers.get(token) {
            return Ok(handler.as_ref());
        }

        let member = token.module_member();
        self.handlers
            .iter()
            .find(|(t, _)| t.module_member() == member)
            .map(|(_, h)| h.as_ref())
            .ok_or_else(|| Error::UnknownResourceType(token.to_string()))
    }

    /// Resolve a type token, accepting a bare type name as shorthand
    pub fn resolve_token(&self, token: &str) -> Result<TypeToken> {
        if token.contains(':') {
            let parsed = TypeToken::parse(token)?;
            self.handler(&parsed)?;
            return Ok(parsed);
        }

        self.handlers
            .keys()
            .find(|t| t.type_name() == token)
            .cloned()
            .ok_or_else(|| Error::UnknownResourceType(token.to_string()))
    }

    fn handler_for(&self, urn: &Urn) -> Result<&dyn ResourceHandler> {
        self.handler(urn.type_token())
    }

    pub fn check(&self, ctx: &ApplyContext, req: CheckRequest) -> Result<CheckResponse> {
        log::debug!("check {}", req.urn);
        self.handler_for(&req.urn)?.check(ctx, &req)
    }

    pub fn diff(&self, ctx: &ApplyContext, req: DiffRequest) -> Result<DiffResponse> {
        log::debug!("diff {}", req.urn);
        self.handler_for(&req.urn)?.diff(ctx, &req)
    }

    pub fn create(&self, ctx: &ApplyContext, req: CreateRequest) -> Result<CreateResponse> {
        log::debug!("create {} (preview: {})", req.urn, ctx.preview);
        self.handler_for(&req.urn)?.create(ctx, &req)
    }

    pub fn update(&self, ctx: &ApplyContext, req: UpdateRequest) -> Result<UpdateResponse> {
        log::debug!("update {} (preview: {})", req.urn, ctx.preview);
        self.handler_for(&req.urn)?.update(ctx, &req)
    }

    pub fn read(&self, ctx: &ApplyContext, req: ReadRequest) -> Result<ReadResponse> {
        log::debug!("read {}", req.urn);
        self.handler_for(&req.urn)?.read(ctx, &req)
    }

    pub fn delete(&self, ctx: &ApplyContext, req: DeleteRequest) -> Result<()> {
        log::debug!("delete {}", req.urn);
        self.handler_for(&req.urn)?.delete(ctx, &req)
    }

    /// Package schema describing every registered resource
    pub fn schema(&self) -> Value {
        let mut resources = Map::new();

        for (token, handler) in &self.handlers {
            let schema = handler.schema();

            let input_properties: Map<String, Value> = schema
                .inputs
                .iter()
                .map(|p| (p.name.clone(), property_schema(p)))
                .collect();
            let properties: Map<String, Value> = schema
                .outputs
                .iter()
                .map(|p| (p.name.clone(), property_schema(p)))
                .collect();
            let required_inputs: Vec<&str> = schema
                .inputs
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.as_str())
                .collect();
            let required: Vec<&str> = schema
                .outputs
                .iter()
                .filter(|p| p.required || p.computed)
                .map(|p| p.name.as_str())
                .collect();

            resources.insert(
                token.to_string(),
                json!({
                    "description": schema.description,
                    "inputProperties": input_properties,
                    "requiredInputs": required_inputs,
                    "properties": properties,
                    "required": required,
                }),
            );
        }

        json!({
            "name": self.name,
            "version": self.version.to_string(),
            "resources": resources,
        })
    }
}

fn property_schema(spec: &crate::resource::PropertySpec) -> Value {
    use crate::resource::PropertyType;

    let mut value = match spec.kind {
        PropertyType::String => json!({ "type": "string" }),
        PropertyType::Integer => json!({ "type": "integer" }),
        PropertyType::Number => json!({ "type": "number" }),
        PropertyType::Boolean => json!({ "type": "boolean" }),
        PropertyType::StringMap => {
            json!({ "type": "object", "additionalProperties": { "type": "string" } })
        }
        PropertyType::Object => json!({ "type": "object" }),
    };
    if !spec.description.is_empty() {
        value["description"] = Value::String(spec.description.clone());
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyMap;
    use crate::resource::{PropertySpec, PropertyType, ResourceSchema};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct EchoArgs {
        text: String,
    }

    struct Echo;

    impl CustomResource for Echo {
        type Args = EchoArgs;
        type State = EchoArgs;
        const TYPE_NAME: &'static str = "Echo";

        fn schema(&self) -> ResourceSchema {
            ResourceSchema {
                description: "Echoes its input".into(),
                inputs: vec![
                    PropertySpec::new("text", PropertyType::String)
                        .required()
                        .describe("Text to echo"),
                ],
                outputs: vec![PropertySpec::new("text", PropertyType::String).required()],
            }
        }

        fn create(
            &self,
            _ctx: &ApplyContext,
            name: &str,
            args: EchoArgs,
        ) -> Result<(String, EchoArgs)> {
            Ok((name.to_string(), args))
        }
    }

    fn provider() -> Provider {
        Provider::builder("echo", Version::new(1, 0, 0))
            .module("provider", "index")
            .resource(Echo)
            .build()
    }

    #[test]
    fn test_module_mapping() {
        let provider = provider();
        let tokens: Vec<String> = provider.tokens().map(ToString::to_string).collect();
        assert_eq!(tokens, vec!["echo:index:Echo"]);
    }

    #[test]
    fn test_lookup_falls_back_to_module_member() {
        let provider = provider();
        let foreign = TypeToken::parse("test:index:Echo").unwrap();
        assert!(provider.handler(&foreign).is_ok());

        let missing = TypeToken::parse("test:index:Missing").unwrap();
        assert!(matches!(
            provider.handler(&missing),
            Err(Error::UnknownResourceType(_))
        ));
    }

    #[test]
    fn test_resolve_token_shorthand() {
        let provider = provider();
        assert_eq!(provider.resolve_token("Echo").unwrap().to_string(), "echo:index:Echo");
        assert_eq!(
            provider.resolve_token("echo:index:Echo").unwrap().to_string(),
            "echo:index:Echo"
        );
        assert!(provider.resolve_token("Nope").is_err());
        assert!(provider.resolve_token("echo:index:Nope").is_err());
    }

    #[test]
    fn test_create_dispatch() {
        let provider = provider();
        let urn = Urn::new(
            "stack",
            "proj",
            TypeToken::parse("test:index:Echo").unwrap(),
            "name",
        );
        let response = provider
            .create(
                &ApplyContext::default(),
                CreateRequest {
                    urn,
                    properties: PropertyMap::new().with("text", "hello"),
                },
            )
            .unwrap();
        assert_eq!(response.id, "name");
        assert_eq!(response.properties.string("text"), Some("hello"));
    }

    #[test]
    fn test_schema() {
        let schema = provider().schema();
        assert_eq!(schema["name"], "echo");
        assert_eq!(schema["version"], "1.0.0");
        let echo = &schema["resources"]["echo:index:Echo"];
        assert_eq!(echo["inputProperties"]["text"]["type"], "string");
        assert_eq!(echo["inputProperties"]["text"]["description"], "Text to echo");
        assert_eq!(echo["requiredInputs"][0], "text");
    }
}
