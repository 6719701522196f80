// ============================================================================
// Tickets de génération
// ============================================================================
// Chaque requête reçoit un ticket (classe, numéro). Une nouvelle requête de
// la même classe incrémente le compteur : la réponse d'une requête
// dépassée porte un ancien numéro et est ignorée à l'arrivée.
// ============================================================================

/// Classe de requête (un compteur par classe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Snapshot du segment affiché
    Markets,
    /// Séries de la comparaison
    Comparison,
}

/// Ticket capturé à l'émission d'une requête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub class: RequestClass,
    pub generation: u64,
}

/// Compteurs de génération, strictement croissants
#[derive(Debug, Clone, Default)]
pub struct Generations {
    markets: u64,
    comparison: u64,
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&mut self, class: RequestClass) -> &mut u64 {
        match class {
            RequestClass::Markets => &mut self.markets,
            RequestClass::Comparison => &mut self.comparison,
        }
    }

    /// Émet un nouveau ticket (invalide tous les précédents de cette classe)
    pub fn issue(&mut self, class: RequestClass) -> Ticket {
        let counter = self.counter(class);
        *counter += 1;
        Ticket {
            class,
            generation: *counter,
        }
    }

    pub fn current(&self, class: RequestClass) -> u64 {
        match class {
            RequestClass::Markets => self.markets,
            RequestClass::Comparison => self.comparison,
        }
    }

    /// Vrai si le ticket est le dernier émis pour sa classe
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current(ticket.class) == ticket.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut generations = Generations::new();
        let first = generations.issue(RequestClass::Markets);
        let second = generations.issue(RequestClass::Markets);

        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));
    }

    #[test]
    fn test_classes_are_independent() {
        let mut generations = Generations::new();
        let markets = generations.issue(RequestClass::Markets);
        generations.issue(RequestClass::Comparison);
        generations.issue(RequestClass::Comparison);

        assert!(generations.is_current(markets));
        assert_eq!(generations.current(RequestClass::Comparison), 2);
    }
}
