// ============================================================================
// Calcul du plan de sortie
// ============================================================================
// Pour chaque ligne :
//   tokens vendus = tokens détenus × % / 100
//   produit       = tokens vendus × prix cible
//   coût          = tokens vendus × prix d'entrée
//   profit        = produit − coût
//
// Les pourcentages ne sont jamais plafonnés : un total > 100% est signalé,
// pas corrigé. Seul le reliquat de tokens est borné à 0.
// ============================================================================

use crate::models::{ExitPlan, RowId};

/// Convertit une saisie en nombre, 0 si elle n'est pas numérique
pub fn parse_amount(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Division gardée : 0 si le dénominateur n'est pas strictement positif
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Résultat d'une ligne (le texte saisi est renvoyé tel quel)
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    pub id: RowId,
    pub target_price_text: String,
    pub sell_percent_text: String,
    pub target_price: f64,
    pub sell_percent: f64,
    pub tokens_sold: f64,
    pub proceeds: f64,
    pub cost_basis: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

/// Totaux du plan
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExitSummary {
    pub total_sell_percent: f64,
    pub sold_tokens: f64,
    pub total_proceeds: f64,
    pub total_cost_basis: f64,
    pub total_profit: f64,
    pub total_profit_percent: f64,
    pub remaining_tokens: f64,
    pub average_exit_price: f64,
}

/// Répartition des pourcentages de vente
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Allocation {
    /// Exactement 100%
    Complete,
    /// Plus de 100% : avertissement
    Over { total: f64 },
    /// Moins de 100% : une partie des tokens reste invendue
    Under { total: f64 },
}

impl Allocation {
    pub fn from_total(total: f64) -> Self {
        if total > 100.0 {
            Allocation::Over { total }
        } else if total < 100.0 {
            Allocation::Under { total }
        } else {
            Allocation::Complete
        }
    }

    /// Note affichée sous le tableau (None si la répartition est complète)
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Allocation::Complete => None,
            Allocation::Over { .. } => Some("Total Sell % is above 100%. Reduce percentages."),
            Allocation::Under { .. } => Some("Tip: Total Sell % below 100% → some tokens remain unsold."),
        }
    }

    /// Vrai pour une sur-allocation
    pub fn is_warning(&self) -> bool {
        matches!(self, Allocation::Over { .. })
    }
}

/// Rapport complet, recalculé à chaque rendu
#[derive(Debug, Clone, PartialEq)]
pub struct ExitReport {
    pub entry_price: f64,
    pub total_tokens: f64,
    /// entrée × tokens détenus
    pub invested: f64,
    pub rows: Vec<RowOutcome>,
    pub summary: ExitSummary,
    pub allocation: Allocation,
}

/// Calcule le rapport d'un plan
pub fn compute(plan: &ExitPlan) -> ExitReport {
    let entry_price = parse_amount(&plan.entry_price);
    let total_tokens = parse_amount(&plan.total_tokens);

    let rows: Vec<RowOutcome> = plan
        .rows
        .iter()
        .map(|row| {
            let target_price = parse_amount(&row.target_price);
            let sell_percent = parse_amount(&row.sell_percent);
            let tokens_sold = total_tokens * sell_percent / 100.0;
            let proceeds = tokens_sold * target_price;
            let cost_basis = tokens_sold * entry_price;
            let profit = proceeds - cost_basis;

            RowOutcome {
                id: row.id,
                target_price_text: row.target_price.clone(),
                sell_percent_text: row.sell_percent.clone(),
                target_price,
                sell_percent,
                tokens_sold,
                proceeds,
                cost_basis,
                profit,
                profit_percent: ratio(profit, cost_basis) * 100.0,
            }
        })
        .collect();

    let total_sell_percent: f64 = rows.iter().map(|r| r.sell_percent).sum();
    let sold_tokens: f64 = rows.iter().map(|r| r.tokens_sold).sum();
    let total_proceeds: f64 = rows.iter().map(|r| r.proceeds).sum();
    let total_cost_basis = sold_tokens * entry_price;
    let total_profit = total_proceeds - total_cost_basis;

    let summary = ExitSummary {
        total_sell_percent,
        sold_tokens,
        total_proceeds,
        total_cost_basis,
        total_profit,
        total_profit_percent: ratio(total_profit, total_cost_basis) * 100.0,
        remaining_tokens: (total_tokens - sold_tokens).max(0.0),
        average_exit_price: ratio(total_proceeds, sold_tokens),
    };

    ExitReport {
        entry_price,
        total_tokens,
        invested: entry_price * total_tokens,
        rows,
        summary,
        allocation: Allocation::from_total(total_sell_percent),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowField;

    /// Plan vide avec entrée/tokens donnés et des lignes (prix, %)
    fn plan(entry: &str, tokens: &str, rows: &[(&str, &str)]) -> ExitPlan {
        let mut plan = ExitPlan::new();
        plan.rows.clear();
        plan.set_entry_price(entry);
        plan.set_total_tokens(tokens);
        for (price, pct) in rows {
            let id = plan.add_row();
            plan.edit_row(id, RowField::TargetPrice, price);
            plan.edit_row(id, RowField::SellPercent, pct);
        }
        plan
    }

    #[test]
    fn test_parse_amount_fallback() {
        assert_eq!(parse_amount(" 2.5 "), 2.5);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[test]
    fn test_single_row() {
        let report = compute(&plan("1", "1000", &[("2", "50")]));
        let row = &report.rows[0];

        assert_eq!(row.tokens_sold, 500.0);
        assert_eq!(row.proceeds, 1000.0);
        assert_eq!(row.profit, 500.0);
        assert_eq!(row.profit_percent, 100.0);
        assert_eq!(report.summary.remaining_tokens, 500.0);
        assert_eq!(report.summary.average_exit_price, 2.0);
        assert_eq!(report.invested, 1000.0);
        assert_eq!(report.allocation, Allocation::Under { total: 50.0 });
    }

    #[test]
    fn test_over_allocation_is_reported_not_clamped() {
        let report = compute(&plan("1", "1000", &[("2", "100"), ("3", "50")]));

        assert_eq!(report.summary.total_sell_percent, 150.0);
        assert_eq!(report.summary.sold_tokens, 1500.0);
        assert_eq!(report.summary.remaining_tokens, 0.0);
        // 1000×2 + 500×3 − 1500×1
        assert_eq!(report.summary.total_profit, 2000.0);
        assert!(report.allocation.is_warning());
        assert_eq!(
            report.allocation.message(),
            Some("Total Sell % is above 100%. Reduce percentages.")
        );
    }

    #[test]
    fn test_zero_cost_basis_gives_zero_percent() {
        let report = compute(&plan("0", "1000", &[("2", "100")]));
        assert_eq!(report.rows[0].profit_percent, 0.0);
        assert_eq!(report.summary.total_profit_percent, 0.0);

        let report = compute(&plan("1", "1000", &[]));
        assert_eq!(report.summary.average_exit_price, 0.0);
        assert_eq!(report.summary.remaining_tokens, 1000.0);
    }

    #[test]
    fn test_raw_text_echoed() {
        let report = compute(&plan("1", "1000", &[("two", "50%")]));
        let row = &report.rows[0];

        assert_eq!(row.target_price_text, "two");
        assert_eq!(row.sell_percent_text, "50%");
        assert_eq!(row.tokens_sold, 0.0);
        assert_eq!(row.proceeds, 0.0);
    }

    #[test]
    fn test_default_plan_is_complete() {
        let report = compute(&ExitPlan::new());
        assert_eq!(report.allocation, Allocation::Complete);
        assert_eq!(report.allocation.message(), None);
        assert_eq!(report.summary.remaining_tokens, 0.0);
    }
}
