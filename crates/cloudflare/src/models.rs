//! Wire models for the subset of the Cloudflare v4 API we consume.

use serde::{Deserialize, Deserializer, Serialize};

/// Read an explicit JSON `null` as the type's default, like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single `{code, message}` entry from an envelope's `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePlan {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A zone as returned by `GET /zones`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account: Option<ZoneAccount>,
    #[serde(default)]
    pub plan: Option<ZonePlan>,
}

/// Envelope of `GET /zones?page=N&per_page=M`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListZonesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<Zone>,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ApiMessage>,
}

impl ListZonesResponse {
    /// Total page count reported by the server, `1` when the metadata is absent.
    pub fn total_pages(&self) -> u32 {
        self.result_info.map(|info| info.total_pages).unwrap_or(1)
    }
}

/// Envelope fields shared by every v4 response. Used to inspect probe bodies
/// without caring about the `result` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub errors: Option<Vec<ApiMessage>>,
}

impl StatusEnvelope {
    /// Message of the first entry in `errors`, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .as_ref()?
            .iter()
            .map(|e| e.message.as_str())
            .find(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_without_account_or_plan() {
        let zone: Zone = serde_json::from_str(r#"{"id":"abc","name":"a.example"}"#).unwrap();
        assert_eq!(zone.name, "a.example");
        assert!(zone.account.is_none());
        assert!(zone.plan.is_none());
    }

    #[test]
    fn test_list_response_total_pages() {
        let body = r#"{
            "success": true,
            "result": [{"id":"1","name":"a.example","account":{"id":"x","name":"acct"},"plan":{"id":"p","name":"Free Website"}}],
            "result_info": {"page":1,"per_page":50,"total_pages":3,"count":1,"total_count":101}
        }"#;
        let resp: ListZonesResponse = serde_json::from_str(body).unwrap();
        assert!(resp.success);
        assert_eq!(resp.total_pages(), 3);
        assert_eq!(resp.result[0].plan.as_ref().unwrap().name, "Free Website");
    }

    #[test]
    fn test_list_response_missing_info_defaults_to_one_page() {
        let resp: ListZonesResponse = serde_json::from_str(r#"{"success":true,"result":[]}"#).unwrap();
        assert_eq!(resp.total_pages(), 1);
    }

    #[test]
    fn test_list_response_null_fields_read_as_empty() {
        let body = r#"{
            "success": false,
            "errors": [{"code": 1003, "message": null}, {"code": 9109, "message": "Invalid access token"}],
            "messages": null,
            "result": null,
            "result_info": null
        }"#;
        let resp: ListZonesResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.success);
        assert!(resp.result.is_empty());
        assert_eq!(resp.total_pages(), 1);
        assert_eq!(resp.errors[0].message, "");
        assert_eq!(resp.errors[1].message, "Invalid access token");

        let bare: ListZonesResponse =
            serde_json::from_str(r#"{"success":null,"errors":null,"result":null}"#).unwrap();
        assert!(!bare.success);
        assert!(bare.errors.is_empty());
    }

    #[test]
    fn test_status_envelope_first_error() {
        let env: StatusEnvelope = serde_json::from_str(
            r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}]}"#,
        )
        .unwrap();
        assert_eq!(env.first_error(), Some("Authentication error"));

        let empty: StatusEnvelope = serde_json::from_str(r#"{"success":false,"errors":[]}"#).unwrap();
        assert_eq!(empty.first_error(), None);
    }
}
