// ============================================================================
// Structure : CoinSnapshot
// ============================================================================
// Représente l'état d'un coin au moment du dernier fetch réussi
//
// CONCEPTS RUST :
// 1. Données immuables : un snapshot n'est jamais modifié champ par champ,
//    il est remplacé en entier au fetch suivant
// 2. Enums Copy : Segment, SortField, SortDirection sont de simples valeurs
// ============================================================================

use serde::{Deserialize, Serialize};

/// Snapshot de marché d'un coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSnapshot {
    /// Identifiant stable (ex: "bitcoin")
    pub id: String,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// Symbole en majuscules (ex: "BTC")
    pub symbol: String,

    /// URL du logo (optionnelle)
    pub image: Option<String>,

    /// Prix courant (>= 0)
    pub price: f64,

    /// Variation sur 24h en pourcentage (signée)
    pub change_24h: f64,

    /// Capitalisation
    pub market_cap: f64,

    /// Volume échangé sur 24h
    pub volume_24h: f64,

    /// Historique court (sparkline 7 jours), vide si non fourni
    pub sparkline: Vec<f64>,
}

impl CoinSnapshot {
    /// Constructeur minimal, pratique pour les tests et les données de démo
    pub fn new(id: &str, name: &str, symbol: &str, price: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            image: None,
            price,
            change_24h: 0.0,
            market_cap: 0.0,
            volume_24h: 0.0,
            sparkline: Vec::new(),
        }
    }

    /// Retourne la valeur du champ numérique utilisé pour le tri
    pub fn sort_key(&self, field: SortField) -> f64 {
        match field {
            SortField::Price => self.price,
            SortField::Change24h => self.change_24h,
            SortField::MarketCap => self.market_cap,
            SortField::Volume24h => self.volume_24h,
        }
    }

    /// Label court "Nom (SYM)"
    pub fn short_label(&self) -> String {
        format!("{} ({})", self.name, self.symbol.to_uppercase())
    }
}

/// Partition classée de l'univers suivi
///
/// CONCEPT : Une page de l'endpoint markets = un segment
/// - Top100 : rangs 1 à 100 (page 1)
/// - Top200 : rangs 101 à 200 (page 2)
/// - Top300 : rangs 201 à 300 (page 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Top100,
    Top200,
    Top300,
}

impl Segment {
    /// Numéro de page côté API (commence à 1)
    pub fn page(&self) -> u32 {
        match self {
            Segment::Top100 => 1,
            Segment::Top200 => 2,
            Segment::Top300 => 3,
        }
    }

    /// Label pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Top100 => "Top 100",
            Segment::Top200 => "#101-200",
            Segment::Top300 => "#201-300",
        }
    }

    /// Segment suivant (cycle)
    pub fn next(&self) -> Segment {
        match self {
            Segment::Top100 => Segment::Top200,
            Segment::Top200 => Segment::Top300,
            Segment::Top300 => Segment::Top100,
        }
    }

    /// Segment précédent (cycle)
    pub fn previous(&self) -> Segment {
        match self {
            Segment::Top100 => Segment::Top300,
            Segment::Top200 => Segment::Top100,
            Segment::Top300 => Segment::Top200,
        }
    }
}

impl Default for Segment {
    fn default() -> Self {
        Segment::Top100
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Champ numérique de tri
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Price,
    Change24h,
    MarketCap,
    Volume24h,
}

impl SortField {
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Price => "Price",
            SortField::Change24h => "24h",
            SortField::MarketCap => "Market Cap",
            SortField::Volume24h => "Volume (24h)",
        }
    }

    /// Champ suivant (cycle, touche 's')
    pub fn next(&self) -> SortField {
        match self {
            SortField::Price => SortField::Change24h,
            SortField::Change24h => SortField::MarketCap,
            SortField::MarketCap => SortField::Volume24h,
            SortField::Volume24h => SortField::Price,
        }
    }
}

/// Sens du tri
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(&self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Spécification de tri : champ + sens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Clic sur une colonne : même champ → inverse le sens, sinon tri descendant
    pub fn toggled(&self, field: SortField) -> SortSpec {
        if self.field == field {
            SortSpec::new(field, self.direction.flipped())
        } else {
            SortSpec::new(field, SortDirection::Desc)
        }
    }
}

impl Default for SortSpec {
    /// Tri par défaut : capitalisation décroissante (ordre du classement)
    fn default() -> Self {
        SortSpec::new(SortField::MarketCap, SortDirection::Desc)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_pages() {
        assert_eq!(Segment::Top100.page(), 1);
        assert_eq!(Segment::Top300.page(), 3);
        assert_eq!(Segment::Top100.next(), Segment::Top200);
        assert_eq!(Segment::Top100.previous(), Segment::Top300);
        assert_eq!(Segment::Top300.previous(), Segment::Top200);
        assert_eq!(Segment::Top300.next(), Segment::Top100); // Boucle
    }

    #[test]
    fn test_sort_spec_toggle() {
        let sort = SortSpec::default();
        let flipped = sort.toggled(SortField::MarketCap);
        assert_eq!(flipped.direction, SortDirection::Asc);

        let other = flipped.toggled(SortField::Price);
        assert_eq!(other, SortSpec::new(SortField::Price, SortDirection::Desc));
    }

    #[test]
    fn test_sort_key() {
        let mut coin = CoinSnapshot::new("bitcoin", "Bitcoin", "BTC", 43120.55);
        coin.volume_24h = 24.5e9;
        assert_eq!(coin.sort_key(SortField::Price), 43120.55);
        assert_eq!(coin.sort_key(SortField::Volume24h), 24.5e9);
        assert_eq!(coin.short_label(), "Bitcoin (BTC)");
    }
}
