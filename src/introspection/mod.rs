use serde::Deserialize;
use thiserror::Error;

use crate::executor::{ExecutionError, ExecutionResult};

#[cfg(feature = "cli")]
mod printer;
mod schema;
mod state;

#[cfg(feature = "cli")]
pub use printer::print_schema_overview;
pub use schema::{
    EnumValue, Field, FullType, InputValue, NamedRef, RootOperation, RootSection, Schema,
    TypeKind, TypeRef,
};
pub use state::{Commit, FetchTicket, SchemaState};

pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("{0}")]
    GraphQL(String),
    #[error("response did not contain a schema")]
    MissingSchema,
    #[error("could not decode schema: {0}")]
    Decode(#[from] serde_json::Error),
}

pub fn extract_schema(result: &ExecutionResult) -> Result<Schema, SchemaError> {
    let raw = result
        .payload
        .get("data")
        .and_then(|data| data.get("__schema"))
        .filter(|schema| !schema.is_null());

    match raw {
        Some(schema) => Ok(Schema::deserialize(schema)?),
        None => match result.errors().into_iter().next() {
            Some(error) => Err(SchemaError::GraphQL(error.message)),
            None => Err(SchemaError::MissingSchema),
        },
    }
}

#[cfg(feature = "cli")]
pub async fn fetch_schema(
    executor: &crate::executor::Executor,
    environment: &crate::environment::Environment,
) -> Result<Schema, SchemaError> {
    let result = executor
        .execute(environment, INTROSPECTION_QUERY, None)
        .await?;
    extract_schema(&result)
}
