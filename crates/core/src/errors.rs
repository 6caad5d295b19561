use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::acceptance::AcceptanceStatus;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("quote is no longer editable (acceptance status is {status:?})")]
    QuoteLocked { status: AcceptanceStatus },
    #[error("unknown quote line `{0}`")]
    UnknownLine(String),
    #[error("unit price cannot be negative")]
    NegativeUnitPrice,
    #[error("unsupported VAT rate `{0}` (expected 10 or 20)")]
    UnsupportedVatRate(Decimal),
    #[error("product `{0}` is not offered as an option")]
    NotOptionable(String),
    #[error("signatory name is required")]
    MissingSignatory,
    #[error("terms must be accepted before signing")]
    TermsNotAccepted,
    #[error("a decline reason is required")]
    MissingDeclineReason,
    #[error("introduction was manually edited and will not be regenerated")]
    IntroManuallyEdited,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("quote unavailable")]
    Unavailable,
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("conflicting concurrent update: {0}")]
    Conflict(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            // Deliberately identical for a wrong token, an expired link, and a
            // deleted quote: existence must not leak through the message.
            Self::NotFound { .. } => "This quote is unavailable or the link has expired.",
            Self::Conflict { .. } => {
                "The quote changed while you were working. Reload and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::QuoteLocked { .. }) => Self::Conflict {
                message: "quote can no longer be modified".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Unavailable => Self::NotFound {
                message: "quote unavailable".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Conflict(message) => {
                Self::Conflict { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn validation_error_maps_to_bad_request_with_correlation_id() {
        let interface =
            ApplicationError::from(DomainError::MissingSignatory).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, .. } if correlation_id == "req-1"
        ));
    }

    #[test]
    fn unavailable_maps_to_a_single_opaque_not_found_message() {
        let interface = ApplicationError::Unavailable.into_interface("req-2");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.user_message(), "This quote is unavailable or the link has expired.");
    }

    #[test]
    fn locked_quote_maps_to_conflict() {
        let interface = ApplicationError::from(DomainError::QuoteLocked {
            status: crate::domain::acceptance::AcceptanceStatus::Accepted,
        })
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Conflict { .. }));
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::Persistence("database lock timeout".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }
}
