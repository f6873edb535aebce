/// Response envelope `{code, message, data}` and page payloads
use crate::error::{ConsoleError, ConsoleResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Domain codes meaning "not signed in" or "token expired"
pub const AUTH_EXPIRED_CODES: [i64; 2] = [1002, 1003];

/// Uniform response wrapper; `code == 0` is success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn parse(body: &str) -> ConsoleResult<Self> {
        serde_json::from_str(body)
            .map_err(|e| ConsoleError::Decode(format!("Malformed response envelope: {}", e)))
    }

    pub fn is_auth_failure(&self) -> bool {
        AUTH_EXPIRED_CODES.contains(&self.code)
    }

    /// Validate the payload against `T`
    ///
    /// A missing `data` field decodes as JSON null, which suits `()` and
    /// `Option<_>` payloads of mutation endpoints.
    pub fn into_data<T: DeserializeOwned>(self) -> ConsoleResult<T> {
        if self.is_auth_failure() {
            return Err(ConsoleError::Authentication(format!(
                "code {}: {}",
                self.code, self.message
            )));
        }
        if self.code != 0 {
            return Err(ConsoleError::Server {
                code: self.code,
                message: self.message,
            });
        }
        serde_json::from_value(self.data)
            .map_err(|e| ConsoleError::Decode(format!("Unexpected response payload: {}", e)))
    }
}

/// One page of a collection as returned by list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct PageData<T> {
    #[serde(default = "Vec::new", alias = "list", alias = "records")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
    }

    #[test]
    fn test_success_payload() {
        let env = Envelope::parse(r#"{"code":0,"message":"ok","data":{"items":[{"id":1}],"total":9}}"#)
            .unwrap();
        let page: PageData<Item> = env.into_data().unwrap();
        assert_eq!(page.items, vec![Item { id: 1 }]);
        assert_eq!(page.total, 9);
    }

    #[test]
    fn test_missing_data_is_unit() {
        let env = Envelope::parse(r#"{"code":0,"message":"saved"}"#).unwrap();
        assert!(env.into_data::<()>().is_ok());
    }

    #[test]
    fn test_auth_codes() {
        for code in AUTH_EXPIRED_CODES {
            let env = Envelope::parse(&format!(r#"{{"code":{},"message":"token expired"}}"#, code))
                .unwrap();
            assert!(matches!(
                env.into_data::<Value>(),
                Err(ConsoleError::Authentication(_))
            ));
        }
    }

    #[test]
    fn test_business_error_keeps_message() {
        let env = Envelope::parse(r#"{"code":4009,"message":"Email already registered","data":null}"#)
            .unwrap();
        match env.into_data::<Value>() {
            Err(ConsoleError::Server { code, message }) => {
                assert_eq!(code, 4009);
                assert_eq!(message, "Email already registered");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch_is_decode_error() {
        let env = Envelope::parse(r#"{"code":0,"data":{"items":"nope"}}"#).unwrap();
        assert!(matches!(
            env.into_data::<PageData<Item>>(),
            Err(ConsoleError::Decode(_))
        ));
    }

    #[test]
    fn test_non_json_body() {
        assert!(matches!(
            Envelope::parse("<html>502 Bad Gateway</html>"),
            Err(ConsoleError::Decode(_))
        ));
    }
}
