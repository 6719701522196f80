// ============================================================================
// Structure : ComparisonSlot
// ============================================================================
// Les coins sélectionnés pour la comparaison : A et B obligatoires, C optionnel
//
// Invariant : jamais deux fois le même id parmi A/B/C
// ============================================================================

use serde::{Deserialize, Serialize};

/// Position d'un coin dans la comparaison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotPosition {
    A,
    B,
    C,
}

impl SlotPosition {
    pub fn label(&self) -> &'static str {
        match self {
            SlotPosition::A => "A",
            SlotPosition::B => "B",
            SlotPosition::C => "C",
        }
    }

    /// Label de repli quand le coin n'est pas dans les segments chargés
    pub fn fallback_label(&self) -> &'static str {
        match self {
            SlotPosition::A => "Coin A",
            SlotPosition::B => "Coin B",
            SlotPosition::C => "Coin C",
        }
    }
}

/// Raison d'un refus d'affectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRejection {
    /// Id vide pour A ou B (obligatoires)
    EmptyId,
    /// Id déjà utilisé par un autre slot
    Duplicate(SlotPosition),
}

/// Sélection A/B/C
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSlot {
    a: String,
    b: String,
    c: Option<String>,
}

impl ComparisonSlot {
    pub fn get(&self, slot: SlotPosition) -> Option<&str> {
        match slot {
            SlotPosition::A => Some(self.a.as_str()),
            SlotPosition::B => Some(self.b.as_str()),
            SlotPosition::C => self.c.as_deref(),
        }
    }

    /// Slots occupés, dans l'ordre A, B, C
    pub fn occupied(&self) -> Vec<(SlotPosition, &str)> {
        [SlotPosition::A, SlotPosition::B, SlotPosition::C]
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|id| (slot, id)))
            .collect()
    }

    /// Affecte un coin à un slot
    ///
    /// - A/B : id vide refusé
    /// - C : id vide = retire C
    /// - Doublon avec un autre slot : refusé, la sélection reste inchangée
    pub fn assign(&mut self, slot: SlotPosition, id: &str) -> Result<(), SlotRejection> {
        let id = id.trim();

        if id.is_empty() {
            return match slot {
                SlotPosition::C => {
                    self.c = None;
                    Ok(())
                }
                _ => Err(SlotRejection::EmptyId),
            };
        }

        // Vérifie les doublons contre les autres slots
        for (other, other_id) in self.occupied() {
            if other != slot && other_id == id {
                return Err(SlotRejection::Duplicate(other));
            }
        }

        match slot {
            SlotPosition::A => self.a = id.to_string(),
            SlotPosition::B => self.b = id.to_string(),
            SlotPosition::C => self.c = Some(id.to_string()),
        }
        Ok(())
    }

    /// Échange A et B (C ne bouge pas)
    pub fn swap_ab(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
    }
}

impl Default for ComparisonSlot {
    /// Bitcoin contre Ethereum, sans C
    fn default() -> Self {
        Self {
            a: "bitcoin".to_string(),
            b: "ethereum".to_string(),
            c: None,
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
