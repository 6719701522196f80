// ============================================================================
// Normalisation et fusion des séries de prix
// ============================================================================
// Transforme des séries brutes [t, prix] en performance relative (% depuis
// le premier point), puis les aligne par timestamp exact
//
// Aucune division par zéro n'est levée : un premier prix nul (ou absent)
// donne 0% partout, une variation impossible à calculer donne None
// ============================================================================

use std::collections::BTreeMap;

use crate::models::{MergedRow, NormalizedPoint, PricePoint, SlotPosition};

/// Exprime chaque point en % de variation depuis le premier
///
/// pct[0] vaut toujours 0
pub fn normalize(series: &[PricePoint]) -> Vec<NormalizedPoint> {
    let base = series.first().map(|p| p.v).unwrap_or(0.0);
    let usable = base != 0.0 && base.is_finite();

    series
        .iter()
        .map(|p| NormalizedPoint {
            t: p.t,
            v: p.v,
            pct: if usable { (p.v - base) / base * 100.0 } else { 0.0 },
        })
        .collect()
}

/// Variation en % entre le premier et le dernier point
///
/// None si moins de 2 points ou si le premier prix est nul
pub fn change_over_period(series: &[PricePoint]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first()?.v;
    let last = series.last()?.v;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Jointure externe sur le timestamp exact (sans interpolation)
///
/// CONCEPT RUST : BTreeMap
/// - Les clés restent triées : la sortie est croissante par construction
/// - Une série absente à un timestamp laisse ses champs vides dans la ligne
pub fn merge(a: &[PricePoint], b: &[PricePoint], c: Option<&[PricePoint]>) -> Vec<MergedRow> {
    let mut rows: BTreeMap<i64, MergedRow> = BTreeMap::new();

    let inputs = [(SlotPosition::A, Some(a)), (SlotPosition::B, Some(b)), (SlotPosition::C, c)];
    for (slot, series) in inputs {
        let Some(series) = series else { continue };
        for point in normalize(series) {
            rows.entry(point.t)
                .or_insert_with(|| MergedRow::new(point.t))
                .set(slot, &point);
        }
    }

    rows.into_values().collect()
}

/// Résumé d'une série pour l'en-tête de la comparaison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    /// Dernier prix connu
    pub last_price: Option<f64>,

    /// Variation sur la période affichée
    pub change: Option<f64>,
}

impl SeriesSummary {
    pub fn of(series: &[PricePoint]) -> Self {
        Self {
            last_price: series.last().map(|p| p.v),
            change: change_over_period(series),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i64, f64)]) -> Vec<PricePoint> {
        points.iter().map(|&(t, v)| PricePoint::new(t, v)).collect()
    }

    #[test]
    fn test_normalize_percent_from_start() {
        let normalized = normalize(&series(&[(1, 10.0), (2, 15.0), (3, 5.0)]));
        let pcts: Vec<f64> = normalized.iter().map(|p| p.pct).collect();
        assert_eq!(pcts, vec![0.0, 50.0, -50.0]);
        assert_eq!(normalized[1].v, 15.0);
    }

    #[test]
    fn test_normalize_zero_start_gives_zero_everywhere() {
        let normalized = normalize(&series(&[(1, 0.0), (2, 15.0)]));
        assert!(normalized.iter().all(|p| p.pct == 0.0));
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_change_over_period() {
        assert_eq!(change_over_period(&series(&[(1, 10.0), (2, 12.0)])), Some(20.0));
        assert_eq!(change_over_period(&series(&[(1, 10.0)])), None);
        assert_eq!(change_over_period(&series(&[(1, 0.0), (2, 12.0)])), None);
    }

    #[test]
    fn test_merge_same_timestamp() {
        let rows = merge(&series(&[(1, 10.0)]), &series(&[(1, 20.0)]), None);
        assert_eq!(rows.len(), 1);

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "t": 1, "Ap": 0.0, "Aprice": 10.0, "Bp": 0.0, "Bprice": 20.0 })
        );
    }

    #[test]
    fn test_merge_sparse_grids_stay_sparse() {
        let a = series(&[(1, 10.0), (3, 20.0)]);
        let b = series(&[(2, 5.0), (3, 10.0)]);
        let c = series(&[(4, 1.0)]);

        let rows = merge(&a, &b, Some(&c));
        let times: Vec<i64> = rows.iter().map(|r| r.t).collect();
        assert_eq!(times, vec![1, 2, 3, 4]);

        assert_eq!(rows[0].get(SlotPosition::B), None);
        assert_eq!(rows[1].get(SlotPosition::A), None);
        assert_eq!(rows[2].get(SlotPosition::A), Some((100.0, 20.0)));
        assert_eq!(rows[2].get(SlotPosition::B), Some((100.0, 10.0)));
        assert_eq!(rows[3].get(SlotPosition::C), Some((0.0, 1.0)));
    }

    #[test]
    fn test_summary() {
        let summary = SeriesSummary::of(&series(&[(1, 4.0), (2, 5.0)]));
        assert_eq!(summary.last_price, Some(5.0));
        assert_eq!(summary.change, Some(25.0));
        assert_eq!(SeriesSummary::of(&[]).last_price, None);
    }
}
