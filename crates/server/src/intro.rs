//! Introduction text generation for the quote document.
//!
//! The generator is deterministic and template-based, summarizing the quoted
//! equipment by category. The aggregate's intro state decides whether the
//! result may be applied: a manual edit locks the field.

use devisio_core::domain::quote::Quote;

pub trait IntroGenerator: Send + Sync {
    fn generate(&self, quote: &Quote) -> String;
}

const FALLBACK_INTRO: &str = "La solution proposée vise à sécuriser vos accès et à assurer une \
détection fiable des événements, avec une gestion simple au quotidien. Les équipements \
sélectionnés ont été dimensionnés pour répondre à votre configuration et permettre un usage \
clair et efficace, sur site comme à distance.";

#[derive(Default)]
pub struct TemplateIntroGenerator;

impl IntroGenerator for TemplateIntroGenerator {
    fn generate(&self, quote: &Quote) -> String {
        let quoted: Vec<&str> = quote
            .lines
            .iter()
            .filter(|line| line.quantity > 0)
            .map(|line| line.name.as_str())
            .collect();

        if quoted.is_empty() {
            return FALLBACK_INTRO.to_string();
        }

        let equipment = match quoted.as_slice() {
            [single] => single.to_string(),
            [rest @ .., last] => format!("{} et {last}", rest.join(", ")),
            [] => unreachable!("guarded by the is_empty check above"),
        };

        format!(
            "Nous vous proposons une solution articulée autour des équipements suivants : \
             {equipment}. {FALLBACK_INTRO}"
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use devisio_core::domain::client::Client;
    use devisio_core::domain::product::{Product, ProductId};
    use devisio_core::domain::quote::{Quote, QuoteKind};

    use super::{IntroGenerator, TemplateIntroGenerator, FALLBACK_INTRO};

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId(id.to_string()),
            reference: format!("REF-{id}"),
            name: name.to_string(),
            category: "Intrusion".to_string(),
            description: String::new(),
            price_ht: Decimal::from(100),
            default_vat_rate: Decimal::from(20),
            active: true,
            optionable: false,
            upsell: false,
        }
    }

    #[test]
    fn empty_quotes_get_the_fallback_text() {
        let quote =
            Quote::create(Client::default(), "Alarme", QuoteKind::NewInstallation, Utc::now());
        assert_eq!(TemplateIntroGenerator.generate(&quote), FALLBACK_INTRO);
    }

    #[test]
    fn generated_intro_names_the_ordered_equipment_only() {
        let mut quote =
            Quote::create(Client::default(), "Alarme", QuoteKind::NewInstallation, Utc::now());
        quote
            .add_or_update_line(&product("hub", "la centrale d'alarme"), Some(1))
            .expect("line");
        quote
            .add_or_update_line(&product("cam", "les détecteurs à prise d'images"), Some(2))
            .expect("line");
        quote.add_or_update_line(&product("keypad", "le clavier"), Some(0)).expect("proposal");

        let intro = TemplateIntroGenerator.generate(&quote);
        assert!(intro.contains("la centrale d'alarme et les détecteurs à prise d'images"));
        assert!(!intro.contains("clavier"), "zero-quantity proposals stay out of the intro");
    }

    #[test]
    fn generation_is_deterministic() {
        let mut quote =
            Quote::create(Client::default(), "Alarme", QuoteKind::NewInstallation, Utc::now());
        quote.add_or_update_line(&product("hub", "la centrale"), Some(1)).expect("line");

        assert_eq!(
            TemplateIntroGenerator.generate(&quote),
            TemplateIntroGenerator.generate(&quote)
        );
    }
}
