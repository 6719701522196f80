// ============================================================================
// Composition de la vue marché
// ============================================================================
// Liste affichée = f(base, recherche, filtre watchlist, tri)
//
// Fonctions pures : les entrées ne sont jamais modifiées, chaque appel
// produit un nouveau Vec
// ============================================================================

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::models::{CoinSnapshot, Segment, SortDirection, SortSpec, WatchlistSet};

/// Filtre texte : sous-chaîne insensible à la casse sur le nom OU le symbole
///
/// Une requête vide (ou faite d'espaces) laisse tout passer
pub fn matches_search(coin: &CoinSnapshot, search: &str) -> bool {
    let query = search.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    coin.name.to_lowercase().contains(&query) || coin.symbol.to_lowercase().contains(&query)
}

/// Construit la vue triée et filtrée
///
/// CONCEPT RUST : sort_by est stable
/// - Les éléments de clé égale gardent leur ordre relatif d'entrée
/// - Le sens descendant inverse le comparateur (pas le résultat), la
///   stabilité est donc conservée dans les deux sens
/// - f64::total_cmp donne un ordre total (NaN compris)
pub fn compose(
    base: &[CoinSnapshot],
    search: &str,
    watchlist_active: bool,
    watchlist: &WatchlistSet,
    sort: SortSpec,
) -> Vec<CoinSnapshot> {
    let mut view: Vec<CoinSnapshot> = base
        .iter()
        .filter(|coin| matches_search(coin, search))
        .filter(|coin| !watchlist_active || watchlist.contains(&coin.id))
        .cloned()
        .collect();

    view.sort_by(|a, b| {
        let ordering = a.sort_key(sort.field).total_cmp(&b.sort_key(sort.field));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    view
}

/// Union de tous les segments chargés, dans l'ordre des segments
///
/// Un coin présent dans plusieurs segments n'apparaît qu'une fois
pub fn union_segments(loaded: &BTreeMap<Segment, Arc<Vec<CoinSnapshot>>>) -> Vec<CoinSnapshot> {
    let mut seen = HashSet::new();
    loaded
        .values()
        .flat_map(|coins| coins.iter())
        .filter(|coin| seen.insert(coin.id.clone()))
        .cloned()
        .collect()
}

/// Base de la vue
///
/// - watchlist active : union de tous les segments chargés (un coin suivi
///   hors du segment courant doit rester visible)
/// - sinon : le segment courant seul (vide s'il n'est pas chargé)
pub fn base_for_view(
    loaded: &BTreeMap<Segment, Arc<Vec<CoinSnapshot>>>,
    active: Segment,
    watchlist_active: bool,
) -> Vec<CoinSnapshot> {
    if watchlist_active {
        union_segments(loaded)
    } else {
        loaded
            .get(&active)
            .map(|coins| coins.as_ref().clone())
            .unwrap_or_default()
    }
}

/// Recherche un coin par id dans tous les segments chargés
pub fn find_coin<'a>(
    loaded: &'a BTreeMap<Segment, Arc<Vec<CoinSnapshot>>>,
    id: &str,
) -> Option<&'a CoinSnapshot> {
    loaded.values().flat_map(|coins| coins.iter()).find(|coin| coin.id == id)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortField;

    fn coin(id: &str, symbol: &str, price: f64) -> CoinSnapshot {
        CoinSnapshot::new(id, &format!("{} Coin", id), symbol, price)
    }

    fn ids(view: &[CoinSnapshot]) -> Vec<&str> {
        view.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_search_matches_name_or_symbol() {
        let base = vec![coin("bitcoin", "BTC", 1.0), coin("ethereum", "ETH", 2.0)];
        let sort = SortSpec::new(SortField::Price, SortDirection::Asc);
        let watchlist = WatchlistSet::new();

        assert_eq!(ids(&compose(&base, "btc", false, &watchlist, sort)), vec!["bitcoin"]);
        assert_eq!(ids(&compose(&base, "ETHER", false, &watchlist, sort)), vec!["ethereum"]);
        assert_eq!(compose(&base, "   ", false, &watchlist, sort).len(), 2);
        assert!(compose(&base, "doge", false, &watchlist, sort).is_empty());
    }

    #[test]
    fn test_result_is_permutation_of_input() {
        let base = vec![
            coin("a", "AAA", 3.0),
            coin("b", "BBB", 1.0),
            coin("c", "CCC", 2.0),
        ];
        let view = compose(&base, "", false, &WatchlistSet::new(), SortSpec::default());

        let mut sorted_ids = ids(&view);
        sorted_ids.sort();
        assert_eq!(sorted_ids, vec!["a", "b", "c"]);
        // Entrée intacte
        assert_eq!(ids(&base), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let base = vec![
            coin("x", "X", 5.0),
            coin("first", "F", 1.0),
            coin("second", "S", 1.0),
            coin("third", "T", 1.0),
        ];
        let watchlist = WatchlistSet::new();

        let asc = compose(&base, "", false, &watchlist, SortSpec::new(SortField::Price, SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["first", "second", "third", "x"]);

        let desc = compose(&base, "", false, &watchlist, SortSpec::new(SortField::Price, SortDirection::Desc));
        assert_eq!(ids(&desc), vec!["x", "first", "second", "third"]);
    }

    #[test]
    fn test_watchlist_uses_union_of_loaded_segments() {
        let mut loaded = BTreeMap::new();
        loaded.insert(Segment::Top100, Arc::new(vec![coin("A", "A", 1.0), coin("B", "B", 2.0)]));
        loaded.insert(Segment::Top200, Arc::new(vec![coin("C", "C", 3.0)]));
        let watchlist = WatchlistSet::from_ids(["C"]);

        let base = base_for_view(&loaded, Segment::Top100, true);
        let view = compose(&base, "", true, &watchlist, SortSpec::default());
        assert_eq!(ids(&view), vec!["C"]);

        let base = base_for_view(&loaded, Segment::Top100, false);
        assert_eq!(ids(&base), vec!["A", "B"]);
    }

    #[test]
    fn test_union_deduplicates() {
        let mut loaded = BTreeMap::new();
        loaded.insert(Segment::Top100, Arc::new(vec![coin("A", "A", 1.0)]));
        loaded.insert(Segment::Top300, Arc::new(vec![coin("A", "A", 1.0), coin("Z", "Z", 1.0)]));

        assert_eq!(ids(&union_segments(&loaded)), vec!["A", "Z"]);
        assert!(find_coin(&loaded, "Z").is_some());
        assert!(find_coin(&loaded, "nope").is_none());
    }

    #[test]
    fn test_unloaded_segment_gives_empty_base() {
        let loaded = BTreeMap::new();
        assert!(base_for_view(&loaded, Segment::Top200, false).is_empty());
    }
}
