pub mod config;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod pricing;
pub mod render;
pub mod token;
pub mod viewer;

pub use domain::acceptance::{
    AcceptanceRecord, AcceptanceState, AcceptanceStatus, DeclineRecord,
};
pub use domain::client::Client;
pub use domain::product::{Product, ProductId};
pub use domain::quote::{
    IntroText, Quote, QuoteId, QuoteKind, QuoteLine, QuoteLineId, QuoteOptions, QuoteStatus,
    QuoteVatRate,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use notify::{
    InMemoryNotificationSink, Notification, NotificationKind, NotificationSink, NotifyError,
};
pub use pricing::{calculate, round_money, PricedLine, QuoteTotals};
pub use render::{build_document, DocumentLine, DocumentPayload, DocumentTotals};
pub use token::{public_quote_url, AccessToken, PaymentLinkToken};
