//! Operation registry: one table drives dispatch, defaults, required checks
//! and the signer precondition.

use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{OperationError, StepError, StepResult};
use crate::operations;
use crate::params::Params;
use crate::schema::ParamSpec;
use crate::session::Session;

/// Everything a handler receives for one item.
pub struct Invocation<'a> {
    pub session: &'a Session,
    /// Parameters after defaults were filled and required ones checked.
    pub params: Params,
    pub cancel: &'a CancellationToken,
}

pub type HandlerFn = for<'a> fn(Invocation<'a>) -> BoxFuture<'a, StepResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerRequirement {
    None,
    Required,
    /// Needed only when the named parameter is absent, since it defaults to the signer.
    WhenMissing(&'static str),
}

#[derive(Clone)]
pub struct OperationDef {
    pub resource: &'static str,
    pub operation: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub signer: SignerRequirement,
    pub handler: HandlerFn,
}

impl std::fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDef")
            .field("resource", &self.resource)
            .field("operation", &self.operation)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl OperationDef {
    pub fn new(
        resource: &'static str,
        operation: &'static str,
        description: &'static str,
        params: &'static [ParamSpec],
        handler: HandlerFn,
    ) -> Self {
        Self {
            resource,
            operation,
            description,
            params,
            signer: SignerRequirement::None,
            handler,
        }
    }

    pub fn requires_signer(mut self) -> Self {
        self.signer = SignerRequirement::Required;
        self
    }

    pub fn signer_when_missing(mut self, parameter: &'static str) -> Self {
        self.signer = SignerRequirement::WhenMissing(parameter);
        self
    }

    /// `resource.operation`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.resource, self.operation)
    }

    pub fn to_json(&self) -> Value {
        let signer = match self.signer {
            SignerRequirement::None => json!(false),
            SignerRequirement::Required => json!(true),
            SignerRequirement::WhenMissing(p) => json!({ "whenMissing": p }),
        };
        json!({
            "resource": self.resource,
            "operation": self.operation,
            "description": self.description,
            "requiresSigner": signer,
            "parameters": self.params.iter().map(ParamSpec::to_json).collect::<Vec<_>>(),
        })
    }

    /// Signer precondition, then defaults, then required checks. No I/O.
    pub fn prepare(&self, session: &Session, mut params: Params) -> StepResult<Params> {
        match self.signer {
            SignerRequirement::None => {}
            SignerRequirement::Required => {
                session.require_signer()?;
            }
            SignerRequirement::WhenMissing(name) => {
                if !params.contains(name) && session.signer().is_none() {
                    return Err(StepError::signer_required());
                }
            }
        }

        for spec in self.params {
            if params.contains(spec.name) {
                continue;
            }
            if let Some(value) = spec.default.literal() {
                params.set(spec.name, value);
            } else if spec.defaults_to_signer() {
                match session.signer() {
                    Some(signer) => params.set(spec.name, json!(signer.address_string())),
                    None => {
                        return Err(StepError::validation(
                            spec.name,
                            "is required when no signing key is configured",
                        ))
                    }
                }
            } else if spec.required {
                return Err(StepError::validation(spec.name, "is required"));
            }
        }
        Ok(params)
    }
}

/// Every operation, in catalog order.
pub fn registry() -> &'static [OperationDef] {
    static REGISTRY: OnceLock<Vec<OperationDef>> = OnceLock::new();
    REGISTRY.get_or_init(operations::all)
}

pub fn find(resource: &str, operation: &str) -> Option<&'static OperationDef> {
    registry()
        .iter()
        .find(|def| def.resource == resource && def.operation == operation)
}

pub fn resources() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for def in registry() {
        if !names.contains(&def.resource) {
            names.push(def.resource);
        }
    }
    names
}

/// Schema listing, optionally limited to one resource.
pub fn schema_json(resource: Option<&str>) -> Value {
    Value::Array(
        registry()
            .iter()
            .filter(|def| resource.map_or(true, |r| def.resource == r))
            .map(OperationDef::to_json)
            .collect(),
    )
}

/// Run one operation for one item.
pub async fn execute(
    session: &Session,
    resource: &str,
    operation: &str,
    params: Value,
    cancel: &CancellationToken,
) -> Result<Value, OperationError> {
    let Some(def) = find(resource, operation) else {
        return Err(OperationError::new(
            format!("{resource}.{operation}"),
            StepError::validation(
                "operation",
                format!("unknown operation '{resource}.{operation}'"),
            ),
        ));
    };
    let name = def.qualified_name();
    let wrap = |error: StepError| OperationError::new(name.clone(), error);

    let params = Params::from_value(params).map_err(wrap)?;
    let params = def.prepare(session, params).map_err(wrap)?;
    if cancel.is_cancelled() {
        return Err(wrap(StepError::Cancelled));
    }
    debug!(operation = %name, "dispatching");
    (def.handler)(Invocation {
        session,
        params,
        cancel,
    })
    .await
    .map_err(wrap)
}
