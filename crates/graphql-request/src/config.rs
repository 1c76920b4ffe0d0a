use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, de};

use crate::{ApiKey, BasicAuth, BearerToken, Headers, NoAuth, RequestBuilder, Variables};

/// Declarative description of a GraphQL request, typically read from a TOML file.
///
/// ```toml
/// endpoint = "https://api.example.com/graphql"
/// query = "query { viewer { id } }"
///
/// [variables]
/// limit = 10
///
/// [headers]
/// X-Trace = "abc"
///
/// [auth]
/// type = "bearer"
/// token = "..."
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphqlRequestConfig {
    pub endpoint: String,
    pub query: String,
    #[serde(default)]
    pub variables: Option<Variables>,
    #[serde(default)]
    pub headers: Option<Headers>,
    #[serde(default, deserialize_with = "deserialize_auth")]
    pub auth: Option<AuthConfig>,
}

fn deserialize_auth<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<AuthConfig>, D::Error> {
    let auth = Option::<AuthConfig>::deserialize(deserializer)?;

    if let Some(AuthConfig::ApiKey {
        header: Some(_),
        query_parameter: Some(_),
        ..
    }) = &auth
    {
        return Err(de::Error::custom(
            "an API key is sent either in a `header` or in a `query_parameter`, not both",
        ));
    }

    Ok(auth)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum AuthConfig {
    None,
    Bearer {
        token: SecretString,
    },
    Basic {
        username: String,
        password: SecretString,
    },
    ApiKey {
        key: SecretString,
        /// Header carrying the key, `X-API-Key` if neither this nor `query_parameter` is set.
        #[serde(default)]
        header: Option<String>,
        /// Query parameter carrying the key. Takes precedence over `header` when a config built in
        /// code sets both; deserialization rejects that combination.
        #[serde(default)]
        query_parameter: Option<String>,
    },
}

impl RequestBuilder<Variables> {
    /// Never fails, invalid values are reported by [`RequestBuilder::build`].
    pub fn from_config(config: GraphqlRequestConfig) -> Self {
        let GraphqlRequestConfig {
            endpoint,
            query,
            variables,
            headers,
            auth,
        } = config;

        let builder = RequestBuilder::new(endpoint, query, variables, headers, None);

        match auth {
            None => builder,
            Some(AuthConfig::None) => builder.with_auth(NoAuth),
            Some(AuthConfig::Bearer { token }) => builder.with_auth(BearerToken::from(token)),
            Some(AuthConfig::Basic { username, password }) => {
                builder.with_auth(BasicAuth::new(username, password.expose_secret().as_str()))
            }
            Some(AuthConfig::ApiKey {
                key,
                header,
                query_parameter,
            }) => {
                let api_key = ApiKey::new(key.expose_secret().as_str());
                let api_key = match (header, query_parameter) {
                    (_, Some(parameter)) => api_key.in_query(parameter),
                    (Some(header), None) => api_key.in_header(header),
                    (None, None) => api_key,
                };
                builder.with_auth(api_key)
            }
        }
    }
}
