//! Divvy API client
//!
//! Blocking HTTP adapter for the remote system of record. Every call is
//! a request/response round trip carrying the session's bearer
//! credential; HTTP statuses are mapped onto the core error taxonomy so
//! services never see transport-level detail.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    ExpenseEntry, Group, Invitation, InvitationStatus, Member, Money, SplitPolicy,
};
use crate::ports::{GroupProvider, InvitationProvider};

/// Request timeout; the server is expected to answer interactively
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// API wire models (matching the Divvy server contract)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupDto {
    group_id: Uuid,
    group_name: String,
    created_by_id: Uuid,
    member_expenses: Vec<MemberDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberDto {
    member_id: Uuid,
    username: String,
    total_paid: Money,
}

impl GroupDto {
    fn into_domain(self) -> Group {
        Group {
            id: self.group_id,
            name: self.group_name,
            owner_id: self.created_by_id,
            members: self
                .member_expenses
                .into_iter()
                .map(|m| Member {
                    member_id: m.member_id,
                    display_name: m.username,
                    total_paid: m.total_paid,
                })
                .collect(),
        }
    }
}

/// The inbox endpoint only ever returns pending invitations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvitationDto {
    id: Uuid,
    token: String,
    group_id: Uuid,
    group_name: String,
    created_by: String,
    created_by_email: String,
    invited_at: DateTime<Utc>,
}

impl InvitationDto {
    fn into_domain(self) -> Invitation {
        Invitation {
            id: self.id,
            token: self.token,
            group_id: self.group_id,
            group_name: self.group_name,
            invited_by_name: self.created_by,
            invited_by_email: self.created_by_email,
            status: InvitationStatus::Pending,
            invited_at: self.invited_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGroupRequest<'a> {
    group_name: &'a str,
    created_by_user_id: Uuid,
    member_emails: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddExpenseRequest<'a> {
    group_id: Uuid,
    description: &'a str,
    amount: Money,
    date: DateTime<Utc>,
    category: crate::domain::Category,
    split_type: SplitPolicy,
    split_map: &'a BTreeMap<Uuid, Money>,
}

// =============================================================================
// HTTP provider
// =============================================================================

/// HTTP implementation of the remote system-of-record ports
#[derive(Debug)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl HttpProvider {
    /// Create a client for the given API base URL.
    ///
    /// The URL must be HTTPS, except for localhost during development.
    /// The bearer credential comes from the external auth collaborator;
    /// an absent credential is a precondition failure handled before the
    /// core runs, so it is required here.
    pub fn new(base_url: &str, bearer_token: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid API base URL: {}", e)))?;

        let host = parsed.host_str().unwrap_or("");
        let is_local = host == "localhost" || host == "127.0.0.1";
        if parsed.scheme() != "https" && !is_local {
            return Err(Error::Config(
                "API base URL must use HTTPS outside localhost".to_string(),
            ));
        }

        if bearer_token.is_empty() {
            return Err(Error::Config("bearer credential cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }

    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::transport(format!(
                "request timed out after {} seconds",
                REQUEST_TIMEOUT.as_secs()
            ))
        } else if error.is_connect() {
            Error::transport("unable to reach the Divvy server")
        } else {
            Error::transport(format!("request failed: {}", error))
        }
    }

    /// Map response status onto the error taxonomy
    fn check_response_status(&self, response: &reqwest::blocking::Response) -> Result<()> {
        match response.status().as_u16() {
            200..=299 => Ok(()),
            400 => Err(Error::validation("the server rejected the request as malformed")),
            401 => Err(Error::authorization(
                "authentication failed; the session credential may have expired",
            )),
            403 => Err(Error::authorization("you are not allowed to perform this operation")),
            404 => Err(Error::not_found("the requested resource does not exist")),
            409 | 410 => Err(Error::conflict(
                "the operation conflicts with the server's current state",
            )),
            status => Err(Error::transport(format!("Divvy API error: HTTP {}", status))),
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .map_err(|e| self.map_request_error(e))?;
        self.check_response_status(&response)?;
        response
            .json()
            .map_err(|e| Error::transport(format!("failed to parse server response: {}", e)))
    }
}

impl GroupProvider for HttpProvider {
    fn fetch_groups(&self, user_id: Uuid) -> Result<Vec<Group>> {
        let url = format!("{}/api/groups/member-expenses/{}", self.base_url, user_id);
        let dtos: Vec<GroupDto> = self.get_json(&url)?;
        Ok(dtos.into_iter().map(GroupDto::into_domain).collect())
    }

    fn create_group(&self, owner_id: Uuid, name: &str, invited_emails: &[String]) -> Result<Group> {
        let url = format!("{}/api/groups/create", self.base_url);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&CreateGroupRequest {
                group_name: name,
                created_by_user_id: owner_id,
                member_emails: invited_emails,
            })
            .send()
            .map_err(|e| self.map_request_error(e))?;
        self.check_response_status(&response)?;
        let dto: GroupDto = response
            .json()
            .map_err(|e| Error::transport(format!("failed to parse created group: {}", e)))?;
        Ok(dto.into_domain())
    }

    fn delete_group(&self, _requester_id: Uuid, group_id: Uuid) -> Result<()> {
        let url = format!("{}/api/groups/delete/{}", self.base_url, group_id);
        debug!(%url, "DELETE");
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .map_err(|e| self.map_request_error(e))?;
        self.check_response_status(&response)
    }

    fn add_expense(&self, _requester_id: Uuid, entry: &ExpenseEntry) -> Result<()> {
        let url = format!("{}/api/groups/add-expense", self.base_url);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&AddExpenseRequest {
                group_id: entry.group_id,
                description: &entry.description,
                amount: entry.amount,
                date: entry.date,
                category: entry.category,
                split_type: entry.split,
                split_map: &entry.split_map,
            })
            .send()
            .map_err(|e| self.map_request_error(e))?;
        self.check_response_status(&response)
    }
}

impl InvitationProvider for HttpProvider {
    fn fetch_pending_invitations(&self, _user_id: Uuid) -> Result<Vec<Invitation>> {
        // The server scopes the inbox to the bearer of the credential
        let url = format!("{}/api/group/invite/getall", self.base_url);
        let dtos: Vec<InvitationDto> = self.get_json(&url)?;
        Ok(dtos.into_iter().map(InvitationDto::into_domain).collect())
    }

    fn confirm_invitation(&self, _user_id: Uuid, token: &str) -> Result<()> {
        let url = format!(
            "{}/api/group/invite/confirm-invitation?token={}",
            self.base_url, token
        );
        debug!("GET confirm-invitation");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .map_err(|e| self.map_request_error(e))?;
        self.check_response_status(&response)
    }

    fn decline_invitation(&self, _user_id: Uuid, invitation_id: Uuid) -> Result<()> {
        let url = format!("{}/api/group/invite/decline/{}", self.base_url, invitation_id);
        debug!(%url, "DELETE");
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .map_err(|e| self.map_request_error(e))?;
        self.check_response_status(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_plain_http_outside_localhost() {
        assert!(HttpProvider::new("http://api.divvy.money", "tok").is_err());
        assert!(HttpProvider::new("http://localhost:8080", "tok").is_ok());
        assert!(HttpProvider::new("https://api.divvy.money", "tok").is_ok());
    }

    #[test]
    fn test_rejects_empty_credential_and_bad_url() {
        assert!(HttpProvider::new("https://api.divvy.money", "").is_err());
        assert!(HttpProvider::new("not a url", "tok").is_err());
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let p = HttpProvider::new("https://api.divvy.money/", "tok").unwrap();
        assert_eq!(p.base_url, "https://api.divvy.money");
    }

    #[test]
    fn test_group_dto_maps_to_domain() {
        let json = r#"{
            "groupId": "11111111-1111-1111-1111-111111111111",
            "groupName": "Flat 12b",
            "createdById": "22222222-2222-2222-2222-222222222222",
            "memberExpenses": [
                {"memberId": "22222222-2222-2222-2222-222222222222", "username": "ana", "totalPaid": 33.5},
                {"memberId": "33333333-3333-3333-3333-333333333333", "username": "bo", "totalPaid": "0"}
            ]
        }"#;
        let dto: GroupDto = serde_json::from_str(json).unwrap();
        let group = dto.into_domain();
        assert_eq!(group.name, "Flat 12b");
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.members[0].total_paid.minor_units(), 3350);
        assert!(group.members[1].total_paid.is_zero());
        assert!(group.validate().is_ok());
    }

    #[test]
    fn test_invitation_dto_maps_to_pending() {
        let json = r#"{
            "id": "44444444-4444-4444-4444-444444444444",
            "token": "tok-abc",
            "groupId": "11111111-1111-1111-1111-111111111111",
            "groupName": "Flat 12b",
            "createdBy": "ana",
            "createdByEmail": "ana@example.com",
            "invitedAt": "2026-08-01T12:00:00Z"
        }"#;
        let inv: InvitationDto = serde_json::from_str(json).unwrap();
        let inv = inv.into_domain();
        assert!(inv.is_pending());
        assert_eq!(inv.invited_by_email, "ana@example.com");
    }

    #[test]
    fn test_add_expense_request_wire_shape() {
        let mut split_map = BTreeMap::new();
        split_map.insert(
            Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap(),
            Money::from_minor_units(100).unwrap(),
        );
        let req = AddExpenseRequest {
            group_id: Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap(),
            description: "Dinner",
            amount: Money::from_minor_units(100).unwrap(),
            date: "2026-08-01T12:00:00Z".parse().unwrap(),
            category: crate::domain::Category::Food,
            split_type: SplitPolicy::Equal,
            split_map: &split_map,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["groupId"], "11111111-1111-1111-1111-111111111111");
        assert_eq!(value["splitType"], "equal");
        assert_eq!(value["category"], "Food");
        assert_eq!(
            value["splitMap"]["22222222-2222-2222-2222-222222222222"],
            "1.00"
        );
    }
}
