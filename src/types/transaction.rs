//! Transaction-related types for the transaction gateway
//!
//! This module defines transaction kinds, statuses, the stored record and the
//! authorization outcome that moves a record out of the in-progress state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use super::error::GatewayError;

/// Transaction identifier
///
/// Caller supplied, typically a UUID string. See [`validate_transaction_id`]
/// for the accepted format.
pub type TransactionId = String;

/// Amount in minor currency units
pub type Amount = u64;

/// Registry-unique creation sequence number
///
/// Every created record receives a fresh epoch, so a record recreated after a
/// flush is distinguishable from its predecessor even though the id matches.
pub type Epoch = u64;

/// Maximum length of a transaction id
pub const MAX_TRANSACTION_ID_LEN: usize = 128;

/// Transaction kinds supported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    /// Charge the card for the requested amount
    Sale,

    /// Return funds to the card
    Refund,

    /// Verify the card without moving funds
    Verification,

    /// Query the balance available on the card
    BalanceInquiry,
}

impl TransactionType {
    /// Wire name of the transaction type
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Refund => "refund",
            TransactionType::Verification => "verification",
            TransactionType::BalanceInquiry => "balance-inquiry",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionType::Sale),
            "refund" => Ok(TransactionType::Refund),
            "verification" => Ok(TransactionType::Verification),
            "balance-inquiry" | "balance_inquiry" => Ok(TransactionType::BalanceInquiry),
            other => Err(GatewayError::invalid_transaction_type(other)),
        }
    }
}

/// Lifecycle status of a transaction
///
/// `InProgress` is the only non-terminal status. Once a record reaches a
/// terminal status it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
    /// Waiting for the authorization outcome
    InProgress,

    /// Authorized for the full requested amount
    Approved,

    /// Authorized for less than the requested amount
    PartiallyApproved,

    /// Authorization refused
    Declined,
}

impl TransactionStatus {
    /// Whether the status is final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::InProgress)
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::InProgress => "in-progress",
            TransactionStatus::Approved => "approved",
            TransactionStatus::PartiallyApproved => "partially-approved",
            TransactionStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Card and authorization details reported alongside a terminal outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationDetails {
    pub authorized_amount: Option<Amount>,
    pub authorization_code: Option<String>,
    pub card_type: Option<String>,
    pub masked_card_number: Option<String>,
    pub avs_result: Option<String>,
    pub cvv_result: Option<String>,
}

/// Terminal outcome produced by an authorizer or an operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationOutcome {
    /// Terminal status to apply; never `InProgress`
    pub status: TransactionStatus,

    /// Details recorded together with the status
    pub details: AuthorizationDetails,
}

impl AuthorizationOutcome {
    /// Approval for the given amount
    pub fn approved(authorized_amount: Amount, authorization_code: impl Into<String>) -> Self {
        Self {
            status: TransactionStatus::Approved,
            details: AuthorizationDetails {
                authorized_amount: Some(authorized_amount),
                authorization_code: Some(authorization_code.into()),
                ..AuthorizationDetails::default()
            },
        }
    }

    /// Approval for part of the requested amount
    pub fn partially_approved(
        authorized_amount: Amount,
        authorization_code: impl Into<String>,
    ) -> Self {
        Self {
            status: TransactionStatus::PartiallyApproved,
            details: AuthorizationDetails {
                authorized_amount: Some(authorized_amount),
                authorization_code: Some(authorization_code.into()),
                ..AuthorizationDetails::default()
            },
        }
    }

    /// Refusal
    pub fn declined() -> Self {
        Self {
            status: TransactionStatus::Declined,
            details: AuthorizationDetails {
                authorized_amount: Some(0),
                ..AuthorizationDetails::default()
            },
        }
    }

    /// Attach card details to the outcome
    pub fn with_card(mut self, card_type: &str, masked_card_number: &str) -> Self {
        self.details.card_type = Some(card_type.to_string());
        self.details.masked_card_number = Some(masked_card_number.to_string());
        self
    }
}

/// Stored state of one transaction
///
/// Serializes to the JSON shape returned by the HTTP API. Authorization
/// details are omitted until the record reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    /// Caller-supplied identifier, immutable once set
    pub id: TransactionId,

    /// Kind of transaction
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Current lifecycle status
    pub status: TransactionStatus,

    /// Amount requested by the caller, in minor units
    pub requested_amount: Amount,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_amount: Option<Amount>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_card_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avs_result: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv_result: Option<String>,

    /// Creation sequence number assigned by the registry
    #[serde(skip)]
    pub epoch: Epoch,

    #[serde(skip)]
    pub created_at: SystemTime,
}

impl TransactionRecord {
    /// Create a new in-progress record
    pub fn new(id: TransactionId, tx_type: TransactionType, amount: Amount, epoch: Epoch) -> Self {
        Self {
            id,
            tx_type,
            status: TransactionStatus::InProgress,
            requested_amount: amount,
            authorized_amount: None,
            authorization_code: None,
            card_type: None,
            masked_card_number: None,
            avs_result: None,
            cvv_result: None,
            epoch,
            created_at: SystemTime::now(),
        }
    }

    /// Move the record to the outcome's terminal status
    ///
    /// Applying the status the record already holds is a no-op. Any other
    /// change to a terminal record is rejected and leaves it untouched.
    pub fn apply(&mut self, outcome: AuthorizationOutcome) -> Result<(), GatewayError> {
        if !outcome.status.is_terminal() {
            return Err(GatewayError::invalid_transition(
                &self.id,
                self.status,
                outcome.status,
            ));
        }
        if self.status.is_terminal() {
            if self.status == outcome.status {
                return Ok(());
            }
            return Err(GatewayError::invalid_transition(
                &self.id,
                self.status,
                outcome.status,
            ));
        }

        let details = outcome.details;
        self.status = outcome.status;
        self.authorized_amount = details.authorized_amount;
        self.authorization_code = details.authorization_code;
        self.card_type = details.card_type;
        self.masked_card_number = details.masked_card_number;
        self.avs_result = details.avs_result;
        self.cvv_result = details.cvv_result;
        Ok(())
    }
}

/// Body of a create request
///
/// Fields are kept loose (signed amount, free-form type) so that validation
/// can report precisely what is wrong instead of a generic parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount: i64,

    #[serde(rename = "type")]
    pub tx_type: String,
}

impl CreateTransactionRequest {
    /// Validate the body, returning the parsed type and amount
    pub fn validate(&self) -> Result<(TransactionType, Amount), GatewayError> {
        let tx_type = self.tx_type.parse::<TransactionType>()?;
        if self.amount <= 0 {
            return Err(GatewayError::invalid_amount(self.amount));
        }
        Ok((tx_type, self.amount as Amount))
    }
}

/// Check that a caller-supplied id is usable
///
/// Ids travel in the URL path, so they are restricted to ASCII letters,
/// digits, `-` and `_`.
pub fn validate_transaction_id(id: &str) -> Result<(), GatewayError> {
    if id.is_empty() {
        return Err(GatewayError::invalid_id(id, "must not be empty"));
    }
    if id.len() > MAX_TRANSACTION_ID_LEN {
        return Err(GatewayError::invalid_id(id, "is too long"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(GatewayError::invalid_id(id, "contains invalid characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> TransactionRecord {
        TransactionRecord::new("abc".to_string(), TransactionType::Sale, 100, 1)
    }

    #[rstest]
    #[case::sale("sale", TransactionType::Sale)]
    #[case::refund("refund", TransactionType::Refund)]
    #[case::verification("verification", TransactionType::Verification)]
    #[case::balance_inquiry("balance-inquiry", TransactionType::BalanceInquiry)]
    #[case::balance_inquiry_underscore("balance_inquiry", TransactionType::BalanceInquiry)]
    fn test_transaction_type_parsing(#[case] input: &str, #[case] expected: TransactionType) {
        assert_eq!(input.parse::<TransactionType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_transaction_type_rejected() {
        let err = "purchase".parse::<TransactionType>().unwrap_err();
        assert!(matches!(err, GatewayError::Validation { .. }));
    }

    #[test]
    fn test_new_record_serializes_without_details() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "abc",
                "type": "sale",
                "status": "in-progress",
                "requested_amount": 100
            })
        );
    }

    #[test]
    fn test_approved_record_serializes_details() {
        let mut rec = record();
        rec.apply(AuthorizationOutcome::approved(100, "123456").with_card("VISA", "************1111"))
            .unwrap();

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["authorized_amount"], 100);
        assert_eq!(json["authorization_code"], "123456");
        assert_eq!(json["card_type"], "VISA");
        assert!(json.get("avs_result").is_none());
    }

    #[rstest]
    #[case::approved(AuthorizationOutcome::approved(100, "000001"))]
    #[case::partial(AuthorizationOutcome::partially_approved(40, "000002"))]
    #[case::declined(AuthorizationOutcome::declined())]
    fn test_terminal_outcome_is_idempotent(#[case] outcome: AuthorizationOutcome) {
        let mut rec = record();
        rec.apply(outcome.clone()).unwrap();
        let after_first = rec.clone();

        rec.apply(outcome).unwrap();
        assert_eq!(rec, after_first);
    }

    #[test]
    fn test_terminal_status_cannot_change() {
        let mut rec = record();
        rec.apply(AuthorizationOutcome::approved(100, "000001")).unwrap();

        let err = rec.apply(AuthorizationOutcome::declined()).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidTransition { .. }));
        assert_eq!(rec.status, TransactionStatus::Approved);
        assert_eq!(rec.authorized_amount, Some(100));
    }

    #[test]
    fn test_outcome_back_to_in_progress_rejected() {
        let mut rec = record();
        let outcome = AuthorizationOutcome {
            status: TransactionStatus::InProgress,
            details: AuthorizationDetails::default(),
        };
        assert!(rec.apply(outcome).is_err());
        assert_eq!(rec.status, TransactionStatus::InProgress);
    }

    #[rstest]
    #[case::valid_sale(r#"{"amount": 100, "type": "sale"}"#, Ok((TransactionType::Sale, 100)))]
    #[case::extra_fields(r#"{"amount": 5, "type": "refund", "note": "x"}"#, Ok((TransactionType::Refund, 5)))]
    #[case::zero_amount(r#"{"amount": 0, "type": "sale"}"#, Err(()))]
    #[case::negative_amount(r#"{"amount": -3, "type": "sale"}"#, Err(()))]
    #[case::unknown_type(r#"{"amount": 10, "type": "swipe"}"#, Err(()))]
    fn test_create_request_validation(
        #[case] body: &str,
        #[case] expected: Result<(TransactionType, Amount), ()>,
    ) {
        let request: CreateTransactionRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.validate().map_err(|_| ()), expected);
    }

    #[rstest]
    #[case::uuid("0f8fad5b-d9cb-469f-a165-70867728950e", true)]
    #[case::underscore("txn_42", true)]
    #[case::empty("", false)]
    #[case::dot("a.b", false)]
    #[case::slash("a/b", false)]
    #[case::space("a b", false)]
    fn test_transaction_id_validation(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(validate_transaction_id(id).is_ok(), valid);
    }

    #[test]
    fn test_overlong_transaction_id_rejected() {
        let id = "a".repeat(MAX_TRANSACTION_ID_LEN + 1);
        assert!(validate_transaction_id(&id).is_err());
    }
}
