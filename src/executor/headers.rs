use base64::{engine::general_purpose::STANDARD, Engine as _};
use url::Url;

use crate::environment::{ApiKeyPlacement, Auth, Environment};

use super::error::ExecutionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub fn prepare_request(environment: &Environment) -> Result<PreparedRequest, ExecutionError> {
    let mut url = Url::parse(environment.url.trim()).map_err(|err| ExecutionError::InvalidUrl {
        url: environment.url.clone(),
        reason: err.to_string(),
    })?;

    if let Auth::ApiKey {
        key,
        value,
        add_to: ApiKeyPlacement::QueryParam,
    } = &environment.auth
    {
        if !key.is_empty() && !value.is_empty() {
            url.query_pairs_mut().append_pair(key, value);
        }
    }

    Ok(PreparedRequest {
        url,
        headers: build_headers(&environment.auth),
    })
}

pub fn build_headers(auth: &Auth) -> Vec<(String, String)> {
    let mut headers = Vec::with_capacity(3);
    set_header(&mut headers, "Content-Type", "application/json");
    set_header(&mut headers, "Accept", "application/json");

    match auth {
        Auth::BearerToken { token } if !token.is_empty() => {
            set_header(&mut headers, "Authorization", &format!("Bearer {token}"));
        }
        Auth::ApiKey {
            key,
            value,
            add_to: ApiKeyPlacement::Header,
        } if !key.is_empty() && !value.is_empty() => {
            set_header(&mut headers, key, value);
        }
        Auth::BasicAuth { user, pass } if !user.is_empty() && !pass.is_empty() => {
            let encoded = STANDARD.encode(format!("{user}:{pass}"));
            set_header(&mut headers, "Authorization", &format!("Basic {encoded}"));
        }
        _ => {}
    }

    headers
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}
