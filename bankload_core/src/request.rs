//! Outbound operation requests against the banking API.
//!
//! Paths are relative to the API base URL (`http://host:8080/api/v1`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// HTTP methods used by the banking API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Banking account kinds accepted by `POST /account`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Saving,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Saving => "saving",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every operation a session can issue. The tag doubles as the metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetToken,
    CreateAccount,
    GetAllAccounts,
    GetAccount,
    Deposit,
    Withdraw,
    CloseAccount,
    DeleteAccount,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::GetToken,
        Operation::CreateAccount,
        Operation::GetAllAccounts,
        Operation::GetAccount,
        Operation::Deposit,
        Operation::Withdraw,
        Operation::CloseAccount,
        Operation::DeleteAccount,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Operation::GetToken => "getToken",
            Operation::CreateAccount => "createAccount",
            Operation::GetAllAccounts => "getAllAccounts",
            Operation::GetAccount => "getAccount",
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
            Operation::CloseAccount => "closeAccount",
            Operation::DeleteAccount => "deleteAccount",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::GetToken | Operation::GetAllAccounts | Operation::GetAccount => Method::Get,
            Operation::CreateAccount => Method::Post,
            Operation::Deposit | Operation::Withdraw | Operation::CloseAccount => Method::Patch,
            Operation::DeleteAccount => Method::Delete,
        }
    }

    /// Whether the call carries `Authorization: Bearer <token>`
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Operation::GetToken)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single immutable outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    operation: Operation,
    path: String,
    body: Option<Value>,
    auth_token: Option<String>,
}

impl OperationRequest {
    fn new(operation: Operation, path: String, body: Option<Value>, token: Option<&str>) -> Self {
        Self {
            operation,
            path,
            body,
            auth_token: token.map(str::to_string),
        }
    }

    /// `GET /login`
    pub fn login() -> Self {
        Self::new(Operation::GetToken, "/login".to_string(), None, None)
    }

    /// `POST /account` with `{type}`
    pub fn create_account(token: &str, account_type: AccountType) -> Self {
        Self::new(
            Operation::CreateAccount,
            "/account".to_string(),
            Some(json!({ "type": account_type.as_str() })),
            Some(token),
        )
    }

    /// `GET /accounts/all`
    pub fn get_all_accounts(token: &str) -> Self {
        Self::new(
            Operation::GetAllAccounts,
            "/accounts/all".to_string(),
            None,
            Some(token),
        )
    }

    /// `GET /account/{id}`
    pub fn get_account(token: &str, account_id: &str) -> Self {
        Self::new(
            Operation::GetAccount,
            format!("/account/{}", account_id),
            None,
            Some(token),
        )
    }

    /// `PATCH /account/{id}/deposit` with `{amount}`
    pub fn deposit(token: &str, account_id: &str, amount: f64) -> Self {
        Self::new(
            Operation::Deposit,
            format!("/account/{}/deposit", account_id),
            Some(json!({ "amount": amount })),
            Some(token),
        )
    }

    /// `PATCH /account/{id}/withdraw` with `{amount}`
    pub fn withdraw(token: &str, account_id: &str, amount: f64) -> Self {
        Self::new(
            Operation::Withdraw,
            format!("/account/{}/withdraw", account_id),
            Some(json!({ "amount": amount })),
            Some(token),
        )
    }

    /// `PATCH /account/{id}/close`
    pub fn close_account(token: &str, account_id: &str) -> Self {
        Self::new(
            Operation::CloseAccount,
            format!("/account/{}/close", account_id),
            None,
            Some(token),
        )
    }

    /// `DELETE /account/{id}`
    pub fn delete_account(token: &str, account_id: &str) -> Self {
        Self::new(
            Operation::DeleteAccount,
            format!("/account/{}", account_id),
            None,
            Some(token),
        )
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn method(&self) -> Method {
        self.operation.method()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn tag(&self) -> &'static str {
        self.operation.tag()
    }

    /// Token sent as bearer credential. `None` only for login.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Value for the `Authorization` header, if this call is authenticated
    pub fn authorization_header(&self) -> Option<String> {
        self.auth_token
            .as_deref()
            .map(|token| format!("Bearer {}", token))
    }
}
