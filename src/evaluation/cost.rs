use crate::solver::model::RoutingProblem;

/// Arc cost the search minimizes: travel minutes scaled by the inverse
/// priority weight of the destination, in hundredths. Arcs toward urgent
/// (low-weight) destinations cost more per minute, so delaying them is
/// punished harder than delaying metro legs. The return-to-depot arc is
/// weighted 1.0.
pub fn arc_cost(problem: &RoutingProblem, from: usize, to: usize) -> i64 {
    let tt = problem.time_matrix[from][to];
    let dest = problem.tiers[to];
    let pw = if dest.is_depot() {
        1.0
    } else {
        dest.priority_weight()
    };
    (tt * (1.0 / pw) * 100.0) as i64
}

/// Cumulative arrival minutes along a depot-anchored route, plus the
/// minute the vehicle is back at the depot. `route` holds customer nodes
/// only; the depot bookends are implicit.
pub fn route_arrivals(problem: &RoutingProblem, route: &[usize]) -> (Vec<i64>, i64) {
    let mut arrivals = Vec::with_capacity(route.len());
    let mut t = 0i64;
    let mut prev = 0usize;
    for &node in route {
        t += problem.transit_min(prev, node);
        arrivals.push(t);
        prev = node;
    }
    let return_min = t + problem.transit_min(prev, 0);
    (arrivals, return_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use crate::domain::hospital::{Hospital, Tier};

    fn problem() -> RoutingProblem {
        let hospitals: Vec<Hospital> = [
            ("Source", Tier::Source),
            ("Metro", Tier::Metro),
            ("Remote", Tier::Remote),
        ]
        .into_iter()
        .map(|(name, tier)| Hospital {
            name: name.to_string(),
            lat: 0.0,
            lon: 0.0,
            tier,
            kind: String::new(),
        })
        .collect();
        let matrix = vec![
            vec![0.0, 10.0, 50.0],
            vec![10.0, 0.0, 40.0],
            vec![50.0, 40.0, 0.0],
        ];
        RoutingProblem::new(&hospitals, matrix, 1, 10, &DispatchConfig::default())
    }

    #[test]
    fn urgent_destinations_cost_more_per_minute() {
        let p = problem();
        // Metro weight 3.0: 10 min -> 10 * (1/3) * 100 = 333.
        assert_eq!(arc_cost(&p, 0, 1), 333);
        // Remote weight 1.0: 50 min -> 5000.
        assert_eq!(arc_cost(&p, 0, 2), 5000);
        // Return to depot forces weight 1.0: 10 min -> 1000.
        assert_eq!(arc_cost(&p, 1, 0), 1000);
    }

    #[test]
    fn arrivals_accumulate_truncated_transits() {
        let p = problem();
        let (arrivals, return_min) = route_arrivals(&p, &[1, 2]);
        assert_eq!(arrivals, vec![10, 50]);
        assert_eq!(return_min, 100);
    }

    #[test]
    fn empty_route_returns_immediately() {
        let p = problem();
        let (arrivals, return_min) = route_arrivals(&p, &[]);
        assert!(arrivals.is_empty());
        assert_eq!(return_min, 0);
    }
}
