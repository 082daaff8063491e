mod bundle;
mod common;
mod credential;
mod environment;
mod request;
mod stage;
mod variable;

pub use bundle::{AuthorizationTest, Bundle, Operation, Scenario};
pub use common::{AnyValue, TemplateString, ValueMap};
pub use credential::{AuthRef, Credential, CredentialLocation, CredentialMethod, CredentialType};
pub use environment::{EnvironmentDefinition, EnvironmentSource, EnvironmentVariable};
pub use request::{RequestBody, RequestParameters, RequestTemplate};
pub use stage::{
    ExternalStage, RequestRef, ResponseDefinition, Stage, StageContent, StageReference,
};
pub use variable::{ExchangeSide, VariableAssignment, VariableLocation};
