//! Client-side adjustment surface, reached only through the opaque access
//! token. The client may nudge effective quantities (floor 1) and pick
//! optional add-ons (floor 0) while acceptance is pending; base line content,
//! client info and pricing stay staff-only. Overrides live next to, never in
//! place of, the staff quantity.

use crate::domain::product::Product;
use crate::domain::quote::{Quote, QuoteLineId};
use crate::errors::DomainError;

impl Quote {
    /// Apply `delta` to the line's effective quantity (override when present,
    /// staff quantity otherwise), flooring at 1: the client may reduce but
    /// never remove a line, only staff can. An override that lands back on
    /// the staff quantity is dropped rather than stored.
    pub fn adjust_line_quantity(
        &mut self,
        line_id: &QuoteLineId,
        delta: i64,
    ) -> Result<u32, DomainError> {
        self.ensure_editable()?;
        let staff_quantity = self
            .line(line_id)
            .ok_or_else(|| DomainError::UnknownLine(line_id.0.clone()))?
            .quantity;

        let current = self.quantity_overrides.get(line_id).copied().unwrap_or(staff_quantity);
        let next = (i64::from(current) + delta).clamp(1, i64::from(u32::MAX)) as u32;

        if next == staff_quantity {
            self.quantity_overrides.remove(line_id);
        } else {
            self.quantity_overrides.insert(line_id.clone(), next);
        }
        self.invalidate_payment_link();
        Ok(next)
    }

    /// Apply `delta` to an optional product's selected quantity, flooring at
    /// 0; reaching 0 removes the selection entirely.
    pub fn select_add_on(&mut self, product: &Product, delta: i64) -> Result<u32, DomainError> {
        self.ensure_editable()?;
        if !product.optionable {
            return Err(DomainError::NotOptionable(product.id.0.clone()));
        }

        let current = self.selected_add_ons.get(&product.id).copied().unwrap_or(0);
        let next = (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32;

        if next == 0 {
            self.selected_add_ons.remove(&product.id);
        } else {
            self.selected_add_ons.insert(product.id.clone(), next);
        }
        self.invalidate_payment_link();
        Ok(next)
    }
}
