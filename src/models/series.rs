// ============================================================================
// Séries temporelles de prix
// ============================================================================
// PricePoint : un échantillon brut (timestamp ms, prix)
// NormalizedPoint : le même échantillon exprimé en % depuis le début
// MergedRow : une ligne de la vue comparée (jusqu'à 3 séries)
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::SlotPosition;

/// Échantillon brut d'une série de prix
///
/// Invariant : dans une série source, les timestamps sont croissants et uniques
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Timestamp Unix en millisecondes
    pub t: i64,
    /// Prix
    pub v: f64,
}

impl PricePoint {
    pub fn new(t: i64, v: f64) -> Self {
        Self { t, v }
    }
}

/// Échantillon normalisé : prix + % depuis le premier point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub t: i64,
    pub v: f64,
    pub pct: f64,
}

/// Période demandée à l'endpoint chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartRange {
    /// 7 jours
    Week,
    /// 30 jours
    Month,
    /// 90 jours
    Quarter,
    /// 365 jours
    Year,
}

impl ChartRange {
    /// Nombre de jours envoyé à l'API
    pub fn days(&self) -> u32 {
        match self {
            ChartRange::Week => 7,
            ChartRange::Month => 30,
            ChartRange::Quarter => 90,
            ChartRange::Year => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartRange::Week => "7d",
            ChartRange::Month => "30d",
            ChartRange::Quarter => "90d",
            ChartRange::Year => "1y",
        }
    }

    /// Format des labels de l'axe X
    ///
    /// Jusqu'à 30 jours : jour/mois, au-delà : mois/année
    pub fn axis_format(&self) -> &'static str {
        if self.days() <= 30 {
            "%d/%m"
        } else {
            "%m/%y"
        }
    }

    /// Période suivante (cycle)
    pub fn next(&self) -> ChartRange {
        match self {
            ChartRange::Week => ChartRange::Month,
            ChartRange::Month => ChartRange::Quarter,
            ChartRange::Quarter => ChartRange::Year,
            ChartRange::Year => ChartRange::Week,
        }
    }

    /// Période précédente (cycle)
    pub fn previous(&self) -> ChartRange {
        match self {
            ChartRange::Week => ChartRange::Year,
            ChartRange::Month => ChartRange::Week,
            ChartRange::Quarter => ChartRange::Month,
            ChartRange::Year => ChartRange::Quarter,
        }
    }
}

impl Default for ChartRange {
    fn default() -> Self {
        ChartRange::Year
    }
}

/// Ligne de la vue comparée, jointe sur le timestamp exact
///
/// CONCEPT : Champs absents omis
/// - Une série sans point à ce timestamp laisse ses champs à None
/// - À la sérialisation, les None disparaissent (pas de remplissage à 0)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedRow {
    pub t: i64,

    #[serde(rename = "Ap", skip_serializing_if = "Option::is_none")]
    pub a_pct: Option<f64>,
    #[serde(rename = "Aprice", skip_serializing_if = "Option::is_none")]
    pub a_price: Option<f64>,

    #[serde(rename = "Bp", skip_serializing_if = "Option::is_none")]
    pub b_pct: Option<f64>,
    #[serde(rename = "Bprice", skip_serializing_if = "Option::is_none")]
    pub b_price: Option<f64>,

    #[serde(rename = "Cp", skip_serializing_if = "Option::is_none")]
    pub c_pct: Option<f64>,
    #[serde(rename = "Cprice", skip_serializing_if = "Option::is_none")]
    pub c_price: Option<f64>,
}

impl MergedRow {
    pub fn new(t: i64) -> Self {
        Self {
            t,
            ..Self::default()
        }
    }

    /// Renseigne la cellule (pct, prix) d'un slot
    pub fn set(&mut self, slot: SlotPosition, point: &NormalizedPoint) {
        let (pct, price) = match slot {
            SlotPosition::A => (&mut self.a_pct, &mut self.a_price),
            SlotPosition::B => (&mut self.b_pct, &mut self.b_price),
            SlotPosition::C => (&mut self.c_pct, &mut self.c_price),
        };
        *pct = Some(point.pct);
        *price = Some(point.v);
    }

    /// Retourne (pct, prix) d'un slot s'il est présent à ce timestamp
    pub fn get(&self, slot: SlotPosition) -> Option<(f64, f64)> {
        match slot {
            SlotPosition::A => self.a_pct.zip(self.a_price),
            SlotPosition::B => self.b_pct.zip(self.b_price),
            SlotPosition::C => self.c_pct.zip(self.c_price),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_range_days() {
        assert_eq!(ChartRange::Week.days(), 7);
        assert_eq!(ChartRange::Year.days(), 365);
        assert_eq!(ChartRange::Year.next(), ChartRange::Week); // Boucle
        assert_eq!(ChartRange::Week.previous(), ChartRange::Year);
        assert_eq!(ChartRange::Month.axis_format(), "%d/%m");
        assert_eq!(ChartRange::Quarter.axis_format(), "%m/%y");
    }

    #[test]
    fn test_merged_row_omits_absent_series() {
        let mut row = MergedRow::new(1);
        row.set(SlotPosition::B, &NormalizedPoint { t: 1, v: 20.0, pct: 0.0 });

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({ "t": 1, "Bp": 0.0, "Bprice": 20.0 }));
        assert_eq!(row.get(SlotPosition::A), None);
        assert_eq!(row.get(SlotPosition::B), Some((0.0, 20.0)));
    }
}
