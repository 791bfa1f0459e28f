use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub auth: Auth,
}

impl Environment {
    pub fn set_auth_method(&mut self, method: AuthMethod) {
        if self.auth.method() != method {
            self.auth = Auth::empty(method);
        }
    }

    pub fn profile(&self) -> EnvironmentProfile {
        EnvironmentProfile {
            name: self.name.clone(),
            url: self.url.clone(),
            auth: self.auth.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub auth: Auth,
}

impl EnvironmentProfile {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            auth: Auth::None,
        }
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Auth {
    #[default]
    None,
    BearerToken {
        token: String,
    },
    ApiKey {
        key: String,
        value: String,
        #[serde(default, rename = "addTo")]
        add_to: ApiKeyPlacement,
    },
    BasicAuth {
        user: String,
        pass: String,
    },
}

impl Auth {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::BearerToken {
            token: token.into(),
        }
    }

    pub fn api_key(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ApiKey {
            key: key.into(),
            value: value.into(),
            add_to: ApiKeyPlacement::Header,
        }
    }

    pub fn basic(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self::BasicAuth {
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn empty(method: AuthMethod) -> Self {
        match method {
            AuthMethod::None => Self::None,
            AuthMethod::BearerToken => Self::bearer(""),
            AuthMethod::ApiKey => Self::api_key("", ""),
            AuthMethod::BasicAuth => Self::basic("", ""),
        }
    }

    pub fn method(&self) -> AuthMethod {
        match self {
            Self::None => AuthMethod::None,
            Self::BearerToken { .. } => AuthMethod::BearerToken,
            Self::ApiKey { .. } => AuthMethod::ApiKey,
            Self::BasicAuth { .. } => AuthMethod::BasicAuth,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Self::None => true,
            Self::BearerToken { token } => !token.is_empty(),
            Self::ApiKey { key, value, .. } => !key.is_empty() && !value.is_empty(),
            Self::BasicAuth { user, pass } => !user.is_empty() && !pass.is_empty(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::None => "no auth".to_string(),
            Self::BearerToken { token } => format!("bearer {}", mask_secret(token)),
            Self::ApiKey { key, value, add_to } => {
                format!("api key {key}={} ({add_to})", mask_secret(value))
            }
            Self::BasicAuth { user, .. } => format!("basic {user}:****"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    None,
    BearerToken,
    ApiKey,
    BasicAuth,
}

impl AuthMethod {
    pub const ALL: [AuthMethod; 4] = [
        AuthMethod::None,
        AuthMethod::BearerToken,
        AuthMethod::ApiKey,
        AuthMethod::BasicAuth,
    ];
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthMethod::None => "None",
            AuthMethod::BearerToken => "Bearer Token",
            AuthMethod::ApiKey => "API Key",
            AuthMethod::BasicAuth => "Basic Auth",
        };
        f.write_str(label)
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "none" => Ok(AuthMethod::None),
            "bearer" | "bearertoken" => Ok(AuthMethod::BearerToken),
            "apikey" => Ok(AuthMethod::ApiKey),
            "basic" | "basicauth" => Ok(AuthMethod::BasicAuth),
            _ => Err(format!("unknown auth method: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiKeyPlacement {
    #[default]
    Header,
    QueryParam,
}

impl fmt::Display for ApiKeyPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeyPlacement::Header => f.write_str("header"),
            ApiKeyPlacement::QueryParam => f.write_str("query param"),
        }
    }
}

impl FromStr for ApiKeyPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "header" => Ok(ApiKeyPlacement::Header),
            "query" | "queryparam" => Ok(ApiKeyPlacement::QueryParam),
            _ => Err(format!("unknown API key placement: {s}")),
        }
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Environment {
        Environment {
            id: "env-1".to_string(),
            name: "Local".to_string(),
            url: "http://localhost:4000/graphql".to_string(),
            auth: Auth::bearer("secret-token"),
        }
    }

    #[test]
    fn switching_auth_method_clears_previous_details() {
        let mut env = sample();
        env.set_auth_method(AuthMethod::BasicAuth);
        assert_eq!(env.auth, Auth::basic("", ""));
    }

    #[test]
    fn keeping_auth_method_preserves_details() {
        let mut env = sample();
        env.set_auth_method(AuthMethod::BearerToken);
        assert_eq!(env.auth, Auth::bearer("secret-token"));
    }

    #[test]
    fn serializes_auth_as_tagged_variant() {
        let mut env = sample();
        env.auth = Auth::api_key("x-api-key", "abc");
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "env-1",
                "name": "Local",
                "url": "http://localhost:4000/graphql",
                "auth": {"method": "apiKey", "key": "x-api-key", "value": "abc", "addTo": "header"}
            })
        );
    }

    #[test]
    fn deserializes_missing_auth_and_placement_with_defaults() {
        let env: Environment = serde_json::from_value(json!({
            "id": "1",
            "name": "n",
            "url": "u"
        }))
        .unwrap();
        assert_eq!(env.auth, Auth::None);

        let auth: Auth =
            serde_json::from_value(json!({"method": "apiKey", "key": "k", "value": "v"})).unwrap();
        assert_eq!(auth, Auth::api_key("k", "v"));
    }

    #[test]
    fn is_complete_requires_all_fields() {
        assert!(Auth::None.is_complete());
        assert!(!Auth::bearer("").is_complete());
        assert!(!Auth::api_key("k", "").is_complete());
        assert!(!Auth::basic("", "p").is_complete());
        assert!(Auth::basic("u", "p").is_complete());
    }

    #[test]
    fn auth_method_parses_loose_spellings() {
        assert_eq!("Bearer Token".parse::<AuthMethod>(), Ok(AuthMethod::BearerToken));
        assert_eq!("api-key".parse::<AuthMethod>(), Ok(AuthMethod::ApiKey));
        assert_eq!("basic".parse::<AuthMethod>(), Ok(AuthMethod::BasicAuth));
        assert!("oauth".parse::<AuthMethod>().is_err());
        assert_eq!("Query Param".parse::<ApiKeyPlacement>(), Ok(ApiKeyPlacement::QueryParam));
        assert_eq!("header".parse::<ApiKeyPlacement>(), Ok(ApiKeyPlacement::Header));
    }

    #[test]
    fn describe_masks_secrets() {
        assert_eq!(Auth::bearer("secret-token").describe(), "bearer secr****");
        assert_eq!(Auth::bearer("abc").describe(), "bearer ****");
        assert_eq!(Auth::basic("admin", "hunter2").describe(), "basic admin:****");
    }
}
