use serde::{Deserialize, Serialize};

/// Client contact details embedded in a quote.
///
/// The quote owns its own copy; linking to an external CRM/ERP record happens
/// through `extrabat_id` and is handled by collaborators, not by the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub extrabat_id: Option<i64>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn has_email(&self) -> bool {
        self.email.trim().contains('@')
    }
}

#[cfg(test)]
mod tests {
    use super::Client;

    #[test]
    fn full_name_joins_and_trims() {
        let client = Client {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            ..Client::default()
        };
        assert_eq!(client.full_name(), "Jean Dupont");

        let last_only = Client { last_name: "Dupont".to_string(), ..Client::default() };
        assert_eq!(last_only.full_name(), "Dupont");
    }

    #[test]
    fn has_email_requires_an_at_sign() {
        let mut client = Client::default();
        assert!(!client.has_email());

        client.email = "jean@example.com".to_string();
        assert!(client.has_email());
    }
}
