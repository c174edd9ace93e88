//! Typed GraphQL requests and responses for the vendor API.
//!
//! Every value travels as a GraphQL variable; the query documents are
//! constants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Introspection query listing every type with its input fields.
pub const SCHEMA_QUERY: &str = "query { __schema { types { name inputFields { name } } } }";

/// Links cloud accounts to a vendor account.
pub const LINK_ACCOUNT_MUTATION: &str = "mutation LinkAccount($accountId: Int!, $accounts: CloudLinkCloudAccountsInput!) { \
cloudLinkAccount(accountId: $accountId, accounts: $accounts) { \
linkedAccounts { id name authLabel } \
errors { type message linkedAccountId } } }";

/// Enables integrations for a linked account.
pub const CONFIGURE_INTEGRATIONS_MUTATION: &str = "mutation ConfigureIntegrations($accountId: Int!, $integrations: CloudIntegrationsInput!) { \
cloudConfigureIntegration(accountId: $accountId, integrations: $integrations) { \
integrations { id name service { id name } } \
errors { type message } } }";

/// Request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a, V> {
    /// Query document.
    pub query: &'a str,
    /// Variables referenced by the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<V>,
}

impl<'a> GraphQlRequest<'a, ()> {
    /// A request without variables.
    #[must_use]
    pub const fn query(query: &'a str) -> Self {
        Self {
            query,
            variables: None,
        }
    }
}

impl<'a, V> GraphQlRequest<'a, V> {
    /// A request with variables.
    #[must_use]
    pub const fn with_variables(query: &'a str, variables: V) -> Self {
        Self {
            query,
            variables: Some(variables),
        }
    }
}

/// Response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    /// Result data, absent when the request failed outright.
    pub data: Option<T>,
    /// Top-level errors.
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// A top-level GraphQL error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphQlError {
    /// Human readable message.
    pub message: String,
}

// Schema introspection

/// `data` of the introspection query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaData {
    /// The schema.
    #[serde(rename = "__schema")]
    pub schema: Schema,
}

/// Introspected schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// All types.
    #[serde(default)]
    pub types: Vec<SchemaType>,
}

/// One introspected type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaType {
    /// Type name.
    pub name: Option<String>,
    /// Input fields; null for non-input types.
    #[serde(default)]
    pub input_fields: Option<Vec<InputField>>,
}

impl SchemaType {
    /// An input type with the given field names.
    #[must_use]
    pub fn input(name: impl Into<String>, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: Some(name.into()),
            input_fields: Some(
                fields
                    .into_iter()
                    .map(|f| InputField { name: f.into() })
                    .collect(),
            ),
        }
    }
}

/// One input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    /// Field name.
    pub name: String,
}

impl Schema {
    /// Input field names of the named type, or `None` if the type is absent.
    #[must_use]
    pub fn input_fields_of(&self, type_name: &str) -> Option<Vec<&str>> {
        self.types
            .iter()
            .find(|t| t.name.as_deref() == Some(type_name))
            .map(|t| {
                t.input_fields
                    .iter()
                    .flatten()
                    .map(|f| f.name.as_str())
                    .collect()
            })
    }
}

// Account linking

/// Variables of [`LINK_ACCOUNT_MUTATION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAccountVariables {
    /// Vendor account.
    pub account_id: u64,
    /// Cloud accounts to link.
    pub accounts: CloudAccountsInput,
}

/// Cloud accounts to link, by provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudAccountsInput {
    /// AWS accounts.
    pub aws: Vec<AwsLinkInput>,
}

/// One AWS account to link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwsLinkInput {
    /// Display name; the account id.
    pub name: String,
    /// Role the vendor assumes in the account.
    pub arn: String,
}

/// `data` of [`LINK_ACCOUNT_MUTATION`].
#[derive(Debug, Clone, Deserialize)]
pub struct LinkAccountData {
    /// Mutation payload.
    #[serde(rename = "cloudLinkAccount")]
    pub payload: LinkAccountPayload,
}

/// Result of linking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAccountPayload {
    /// Accounts linked by this call.
    #[serde(default)]
    pub linked_accounts: Vec<LinkedAccount>,
    /// Per-account errors.
    #[serde(default)]
    pub errors: Vec<LinkError>,
}

/// A linked cloud account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccount {
    /// Vendor-assigned id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Authentication label, usually the role ARN.
    #[serde(default)]
    pub auth_label: Option<String>,
}

/// A per-account link error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkError {
    /// Error type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Human readable message.
    pub message: String,
    /// Existing linked account, when reported.
    #[serde(default)]
    pub linked_account_id: Option<u64>,
}

impl LinkError {
    /// Whether this error reports an account that is already linked.
    #[must_use]
    pub fn is_already_linked(&self) -> bool {
        self.message.to_ascii_lowercase().contains("already linked")
    }
}

// Integration configuration

/// Variables of [`CONFIGURE_INTEGRATIONS_MUTATION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureIntegrationsVariables {
    /// Vendor account.
    pub account_id: u64,
    /// Integrations to enable, by provider.
    pub integrations: IntegrationsInput,
}

/// Integrations to enable, by provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationsInput {
    /// AWS integrations keyed by slug.
    pub aws: BTreeMap<String, Vec<LinkedAccountRef>>,
}

/// Reference to a linked account inside an integration input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccountRef {
    /// Vendor-assigned linked account id.
    pub linked_account_id: u64,
}

/// `data` of [`CONFIGURE_INTEGRATIONS_MUTATION`].
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigureIntegrationsData {
    /// Mutation payload.
    #[serde(rename = "cloudConfigureIntegration")]
    pub payload: ConfigureIntegrationsPayload,
}

/// Result of configuring integrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigureIntegrationsPayload {
    /// Integrations enabled by this call.
    #[serde(default)]
    pub integrations: Vec<ConfiguredIntegration>,
    /// Per-integration errors.
    #[serde(default)]
    pub errors: Vec<ConfigureError>,
}

/// An enabled integration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfiguredIntegration {
    /// Vendor-assigned integration id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Service the integration belongs to.
    #[serde(default)]
    pub service: Option<ServiceRef>,
}

/// Service reference in a configure payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceRef {
    /// Service id.
    pub id: u64,
    /// Service name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A per-integration configure error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigureError {
    /// Error type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Human readable message.
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn link_variables_shape() {
        let variables = LinkAccountVariables {
            account_id: 7654321,
            accounts: CloudAccountsInput {
                aws: vec![AwsLinkInput {
                    name: "111111111111".to_owned(),
                    arn: "arn:aws:iam::111111111111:role/R_7654321".to_owned(),
                }],
            },
        };
        let request = GraphQlRequest::with_variables(LINK_ACCOUNT_MUTATION, variables);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["variables"]["accountId"], 7654321);
        assert_eq!(value["variables"]["accounts"]["aws"][0]["name"], "111111111111");
        assert!(value["query"].as_str().unwrap().contains("cloudLinkAccount"));
    }

    #[test]
    fn query_without_variables_omits_them() {
        let value = serde_json::to_value(GraphQlRequest::query(SCHEMA_QUERY)).unwrap();
        assert!(value.get("variables").is_none());
    }

    #[test]
    fn configure_variables_shape() {
        let mut aws = BTreeMap::new();
        for slug in ["cloudtrail", "ec2"] {
            aws.insert(
                slug.to_owned(),
                vec![LinkedAccountRef {
                    linked_account_id: 42,
                }],
            );
        }
        let variables = ConfigureIntegrationsVariables {
            account_id: 1,
            integrations: IntegrationsInput { aws },
        };

        let value = serde_json::to_value(&variables).unwrap();
        assert_eq!(
            value["integrations"]["aws"]["ec2"],
            json!([{"linkedAccountId": 42}])
        );
    }

    #[test]
    fn schema_lookup() {
        let response: GraphQlResponse<SchemaData> = serde_json::from_value(json!({
            "data": {"__schema": {"types": [
                {"name": "Query", "inputFields": null},
                {"name": "CloudAwsIntegrationsInput", "inputFields": [{"name": "ec2"}, {"name": "s3"}]}
            ]}}
        }))
        .unwrap();

        let schema = response.data.unwrap().schema;
        assert_eq!(
            schema.input_fields_of("CloudAwsIntegrationsInput"),
            Some(vec!["ec2", "s3"])
        );
        assert_eq!(schema.input_fields_of("Query"), Some(vec![]));
        assert_eq!(schema.input_fields_of("Missing"), None);
    }

    #[test]
    fn link_payload_with_errors() {
        let data: LinkAccountData = serde_json::from_value(json!({
            "cloudLinkAccount": {
                "linkedAccounts": [],
                "errors": [{
                    "type": "ERROR",
                    "message": "AWS account is already linked to account 1",
                    "linkedAccountId": 99
                }]
            }
        }))
        .unwrap();

        assert!(data.payload.linked_accounts.is_empty());
        assert!(data.payload.errors[0].is_already_linked());
        assert_eq!(data.payload.errors[0].linked_account_id, Some(99));
    }

    #[test]
    fn envelope_errors_default_to_empty() {
        let response: GraphQlResponse<LinkAccountData> = serde_json::from_value(json!({
            "data": {"cloudLinkAccount": {"linkedAccounts": [{"id": 5, "name": "a", "authLabel": "arn"}]}}
        }))
        .unwrap();

        assert!(response.errors.is_empty());
        assert_eq!(response.data.unwrap().payload.linked_accounts[0].id, 5);
    }
}
