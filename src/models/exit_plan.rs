// ============================================================================
// Structure : ExitPlan
// ============================================================================
// Plan de prise de profits tel que saisi par l'utilisateur
//
// CONCEPT : Texte brut conservé
// - Les champs numériques restent des String (ce que l'utilisateur a tapé)
// - La conversion en nombre (avec repli à 0) se fait au calcul,
//   voir engine::exit_plan::parse_amount
// - Le texte saisi est toujours réaffiché tel quel
// ============================================================================

use serde::{Deserialize, Serialize};

/// Identifiant d'une ligne de take-profit
pub type RowId = u64;

/// Une ligne : vendre `sell_percent` % des tokens au prix `target_price`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeProfitRow {
    pub id: RowId,
    pub target_price: String,
    pub sell_percent: String,
}

/// Champ éditable d'une ligne
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    TargetPrice,
    SellPercent,
}

/// Plan complet : entrée, quantité détenue, lignes ordonnées
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPlan {
    /// Coin sélectionné (optionnel, sert au pré-remplissage du prix d'entrée)
    pub coin_id: Option<String>,

    /// Prix d'entrée (texte brut)
    pub entry_price: String,

    /// Nombre de tokens détenus (texte brut)
    pub total_tokens: String,

    /// Lignes de take-profit, dans l'ordre de saisie
    pub rows: Vec<TakeProfitRow>,

    /// Prochain id de ligne (monotone, jamais réutilisé)
    next_id: RowId,

    /// Le pré-remplissage du prix d'entrée a déjà eu lieu pour ce coin
    auto_filled: bool,
}

/// Lignes par défaut : (prix, %)
const DEFAULT_ROWS: [(&str, &str); 3] = [("1.5", "30"), ("2.0", "30"), ("3.0", "40")];

impl ExitPlan {
    /// Plan par défaut : entrée 1, 1000 tokens, 30/30/40 % à 1.5/2.0/3.0
    pub fn new() -> Self {
        let mut plan = Self {
            coin_id: None,
            entry_price: "1".to_string(),
            total_tokens: "1000".to_string(),
            rows: Vec::new(),
            next_id: 1,
            auto_filled: false,
        };
        for (price, pct) in DEFAULT_ROWS {
            plan.push_row(price, pct);
        }
        plan
    }

    fn fresh_id(&mut self) -> RowId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_row(&mut self, price: &str, pct: &str) -> RowId {
        let id = self.fresh_id();
        self.rows.push(TakeProfitRow {
            id,
            target_price: price.to_string(),
            sell_percent: pct.to_string(),
        });
        id
    }

    /// Ajoute une ligne vide en fin de plan et retourne son id
    pub fn add_row(&mut self) -> RowId {
        self.push_row("", "")
    }

    /// Supprime une ligne par id (false si l'id est inconnu)
    pub fn remove_row(&mut self, id: RowId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        self.rows.len() != before
    }

    /// Modifie un champ d'une ligne, sans toucher aux autres
    pub fn edit_row(&mut self, id: RowId, field: RowField, text: &str) -> bool {
        match self.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                match field {
                    RowField::TargetPrice => row.target_price = text.to_string(),
                    RowField::SellPercent => row.sell_percent = text.to_string(),
                }
                true
            }
            None => false,
        }
    }

    pub fn row(&self, id: RowId) -> Option<&TakeProfitRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn set_entry_price(&mut self, text: &str) {
        self.entry_price = text.to_string();
    }

    pub fn set_total_tokens(&mut self, text: &str) {
        self.total_tokens = text.to_string();
    }

    /// Revient au plan par défaut (coin désélectionné)
    ///
    /// Les ids continuent de croître : une ligne supprimée ne ressuscite jamais
    pub fn reset(&mut self) {
        let next_id = self.next_id;
        *self = Self::new();
        self.rows.clear();
        self.next_id = next_id;
        for (price, pct) in DEFAULT_ROWS {
            self.push_row(price, pct);
        }
    }

    /// Garde les 3 premières lignes (créées si absentes) et répartit 30/30/40
    pub fn auto_split_three(&mut self) {
        self.rows.truncate(3);
        while self.rows.len() < 3 {
            let (price, _) = DEFAULT_ROWS[self.rows.len()];
            self.push_row(price, "");
        }
        for (row, (_, pct)) in self.rows.iter_mut().zip(DEFAULT_ROWS) {
            row.sell_percent = pct.to_string();
        }
    }

    /// Sélectionne un coin et pré-remplit le prix d'entrée si besoin
    ///
    /// CONCEPT : Pré-remplissage unique par sélection
    /// - Seulement si price > 0
    /// - Seulement si l'entrée a encore l'air d'une valeur par défaut
    ///   ("", "0", "1", ou un texte qui vaut 0)
    /// - 6 décimales sous 1, sinon 2
    pub fn select_coin(&mut self, coin_id: &str, price: f64) {
        if self.coin_id.as_deref() != Some(coin_id) {
            self.auto_filled = false;
        }
        self.coin_id = Some(coin_id.to_string());

        if self.auto_filled || !(price.is_finite() && price > 0.0) {
            return;
        }

        let current = self.entry_price.trim();
        let parsed = current.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0);
        let looks_default = current.is_empty() || current == "0" || current == "1" || parsed == 0.0;

        if looks_default {
            self.entry_price = if price < 1.0 {
                format!("{:.6}", price)
            } else {
                format!("{:.2}", price)
            };
            self.auto_filled = true;
        }
    }
}

impl Default for ExitPlan {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
